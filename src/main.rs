use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use figure_classifier::classifier::{self, ResNetClassifier};
use figure_classifier::config::Args;
use figure_classifier::upload::UploadDir;
use figure_classifier::{router, AppState, LabelTable};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let labels = match &args.labels {
        Some(path) => LabelTable::from_file(path)?,
        None => LabelTable::default(),
    };
    let uploads = UploadDir::create(&args.upload_dir)
        .with_context(|| format!("creating upload directory {}", args.upload_dir.display()))?;

    let source = args.model_source();
    let weights = source.resolve()?;
    info!(weights = %weights.display(), arch = ?args.arch, classes = labels.len(), "loading classifier");
    let model = ResNetClassifier::load(&weights, args.arch, labels.len())
        .with_context(|| format!("loading classifier weights from {}", weights.display()))?;

    // Fail now rather than on the first request if the head and labels disagree.
    classifier::check_labels(&model, &labels)?;

    let state = AppState::new(
        Arc::new(model),
        labels,
        uploads,
        args.max_inferences as usize,
    );
    let app = router(state, args.body_limit_bytes());

    let listener = tokio::net::TcpListener::bind(args.bind_addr())
        .await
        .with_context(|| format!("binding {}", args.bind_addr()))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
