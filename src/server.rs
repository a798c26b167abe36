use std::sync::Arc;
use std::time::Instant;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::middleware;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{info, instrument, warn};

use crate::classifier::Classifier;
use crate::error::{json_error_body, ApiError};
use crate::labels::LabelTable;
use crate::predict::{self, Prediction};
use crate::upload::UploadDir;
use crate::validate::{self, Rejection, FILE_FIELD};

/// Everything a request needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    classifier: Arc<dyn Classifier>,
    labels: Arc<LabelTable>,
    uploads: UploadDir,
    inference: Arc<Semaphore>,
}

impl AppState {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        labels: LabelTable,
        uploads: UploadDir,
        max_inferences: usize,
    ) -> Self {
        Self {
            classifier,
            labels: Arc::new(labels),
            uploads,
            inference: Arc::new(Semaphore::new(max_inferences.max(1))),
        }
    }
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(show_form))
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .with_state(state)
        // logging so we can see what's going on
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::map_response(json_error_body))
}

async fn show_form() -> Html<&'static str> {
    Html(
        r#"
        <!doctype html>
        <html>
            <head><title>Figure classifier</title></head>
            <body>
                <form action="/predict" method="post" enctype="multipart/form-data">
                    <label>
                        Upload image:
                        <input type="file" name="file" accept=".png,.jpg,.jpeg,.gif">
                    </label>

                    <input type="submit" value="Classify">
                </form>
            </body>
        </html>
        "#,
    )
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

#[instrument(skip_all)]
async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>, ApiError> {
    // A body that is not multipart at all has no file part either.
    let mut multipart = multipart.map_err(|_| Rejection::MissingFile)?;

    let upload = loop {
        let Some(field) = multipart.next_field().await? else {
            return Err(Rejection::MissingFile.into());
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // Plain form values named `file` do not count as a file part.
        let Some(file_name) = field.file_name() else {
            continue;
        };
        let file = validate::accept(Some(file_name))?;
        break state.uploads.store(&file, field).await?;
    };

    let permit = state
        .inference
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let classifier = state.classifier.clone();
    let labels = state.labels.clone();
    let started = Instant::now();
    // The upload moves with the inference so it outlives a dropped request.
    let result = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let prediction = predict::run(&*classifier, &labels, upload.path());
        if let Err(err) = upload.release() {
            warn!(error = %err, "could not remove uploaded file");
        }
        prediction
    })
    .await;

    let prediction = result.map_err(|e| ApiError::Internal(e.to_string()))??;
    info!(
        predicted_class = %prediction.predicted_class,
        confidence = prediction.confidence,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "prediction complete"
    );
    Ok(Json(prediction))
}
