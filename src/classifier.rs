use std::path::{Path, PathBuf};

use anyhow::Context;
use candle_core::{DType, Device, Tensor};
use candle_nn::{Func, VarBuilder};
use candle_transformers::models::resnet;
use tracing::info;

use crate::labels::LabelTable;
use crate::load_image::IMAGE_SIZE;

/// A pretrained image classifier.
///
/// One instance is shared by every request, so implementations must be safe
/// to call from several threads at once.
pub trait Classifier: Send + Sync {
    /// Scores a batch holding a single `(1, 3, 299, 299)` image. The result has
    /// one probability per class and sums to roughly one.
    fn predict(&self, batch: &Tensor) -> candle_core::Result<Vec<f32>>;
}

/// Number of scores `classifier` produces, found by scoring a blank image.
pub fn output_dim(classifier: &dyn Classifier) -> candle_core::Result<usize> {
    let blank = Tensor::zeros((1, 3, IMAGE_SIZE, IMAGE_SIZE), DType::F32, &Device::Cpu)?;
    Ok(classifier.predict(&blank)?.len())
}

/// Fails unless `labels` has exactly one entry per classifier output.
pub fn check_labels(classifier: &dyn Classifier, labels: &LabelTable) -> anyhow::Result<()> {
    let outputs = output_dim(classifier).context("measuring classifier output size")?;
    labels.ensure_matches(outputs)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Architecture {
    Resnet18,
    Resnet34,
    Resnet50,
    Resnet101,
    Resnet152,
}

/// ResNet backbone with a linear head sized to the label table.
pub struct ResNetClassifier {
    model: Func<'static>,
    device: Device,
}

impl ResNetClassifier {
    /// Loads safetensors weights. Fails if the head does not have `num_classes` outputs.
    pub fn load(weights: &Path, arch: Architecture, num_classes: usize) -> candle_core::Result<Self> {
        let device = Device::Cpu;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device)? };
        Self::from_var_builder(arch, num_classes, vb, device)
    }

    pub fn from_var_builder(
        arch: Architecture,
        num_classes: usize,
        vb: VarBuilder<'static>,
        device: Device,
    ) -> candle_core::Result<Self> {
        let model = match arch {
            Architecture::Resnet18 => resnet::resnet18(num_classes, vb)?,
            Architecture::Resnet34 => resnet::resnet34(num_classes, vb)?,
            Architecture::Resnet50 => resnet::resnet50(num_classes, vb)?,
            Architecture::Resnet101 => resnet::resnet101(num_classes, vb)?,
            Architecture::Resnet152 => resnet::resnet152(num_classes, vb)?,
        };
        Ok(Self { model, device })
    }
}

impl Classifier for ResNetClassifier {
    fn predict(&self, batch: &Tensor) -> candle_core::Result<Vec<f32>> {
        let logits = batch.to_device(&self.device)?.apply(&self.model)?;
        let probs = candle_nn::ops::softmax_last_dim(&logits)?;
        probs.squeeze(0)?.to_vec1::<f32>()
    }
}

/// Where the classifier weights come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Local(PathBuf),
    Hub { repo: String, file: String },
}

impl ModelSource {
    /// Local path of the weights, downloading them from the hub first if needed.
    pub fn resolve(&self) -> anyhow::Result<PathBuf> {
        match self {
            Self::Local(path) => {
                if !path.is_file() {
                    anyhow::bail!("model weights not found at {}", path.display());
                }
                Ok(path.clone())
            }
            Self::Hub { repo, file } => {
                info!(%repo, %file, "fetching model weights from the hub");
                let api = hf_hub::api::sync::Api::new()?;
                let api = api.model(repo.clone());
                Ok(api.get(file)?)
            }
        }
    }
}
