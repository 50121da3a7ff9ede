//! Annotation handler.

use axum::{extract::State, Json};
use csvw_annotator::{fetch, AnnotatorConfig, Annotation, DelimiterChoice, EncodingChoice};
use serde::Deserialize;
use tracing::info;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Request body for the annotation endpoint.
#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    /// Location of the file (http(s):// or file://).
    pub data_url: String,
    #[serde(default)]
    pub separator: Option<String>,
    #[serde(default)]
    pub header_separator: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl AnnotateRequest {
    fn config(&self) -> Result<AnnotatorConfig, ApiError> {
        let choice = |value: &Option<String>| -> Result<DelimiterChoice, ApiError> {
            match value.as_deref() {
                None | Some("") => Ok(DelimiterChoice::Auto),
                Some(s) => s.parse().map_err(|e: csvw_annotator::AnnotatorError| {
                    ApiError::BadRequest(e.to_string())
                }),
            }
        };

        Ok(AnnotatorConfig::default()
            .with_encoding(EncodingChoice::from(self.encoding.clone().unwrap_or_default()))
            .with_delimiter(choice(&self.separator)?)
            .with_header_delimiter(choice(&self.header_separator)?))
    }
}

/// Fetch a file and return its CSVW metadata.
pub async fn annotate(
    State(state): State<AppState>,
    Json(request): Json<AnnotateRequest>,
) -> Result<Json<Annotation>, ApiError> {
    let annotator = state.annotator(request.config()?);
    info!(data_url = %request.data_url, "annotation requested");

    let annotation = tokio::task::spawn_blocking(move || {
        let source = fetch(&request.data_url)?;
        annotator.annotate(&source)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(annotation))
}
