use std::path::PathBuf;

use clap::Parser;

use crate::classifier::{Architecture, ModelSource};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Serves image classification over HTTP")]
pub struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Scratch directory for uploads, created if missing
    #[arg(long, default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Safetensors weights of the classifier
    #[arg(long, default_value = "models/model.safetensors")]
    pub model: PathBuf,

    /// Fetch the weights from this hub repository instead of `--model`
    #[arg(long)]
    pub hf_repo: Option<String>,

    #[arg(long, default_value = "model.safetensors")]
    pub hf_file: String,

    #[arg(long, value_enum, default_value_t = Architecture::Resnet50)]
    pub arch: Architecture,

    /// File with one class label per line, in model output order
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Largest accepted request body, in megabytes
    #[arg(long, default_value_t = 250)]
    pub body_limit_mb: usize,

    /// How many predictions may run at the same time
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_inferences: u32,
}

impl Args {
    pub fn model_source(&self) -> ModelSource {
        match &self.hf_repo {
            Some(repo) => ModelSource::Hub {
                repo: repo.clone(),
                file: self.hf_file.clone(),
            },
            None => ModelSource::Local(self.model.clone()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}
