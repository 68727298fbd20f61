//! HTTP handlers for composition endpoints.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::ComposeTextCommand;
use crate::ports::GenerationError;

use super::super::error::ErrorResponse;
use super::super::state::AppState;
use super::dto::{ComposeRequest, ComposeResponse};

/// Compose text for a prompt.
///
/// POST /api/ai/compose
pub async fn compose_text(
    State(state): State<AppState>,
    Json(request): Json<ComposeRequest>,
) -> Result<Json<ComposeResponse>, ComposeApiError> {
    let generated = state
        .composer
        .handle(ComposeTextCommand {
            prompt: request.prompt,
        })
        .await?;

    Ok(Json(generated.into()))
}

#[derive(Debug)]
pub struct ComposeApiError(GenerationError);

impl From<GenerationError> for ComposeApiError {
    fn from(err: GenerationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ComposeApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            GenerationError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            _ => {
                tracing::error!(error = %self.0, "Text composition failed");
                (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR")
            }
        };
        ErrorResponse::new(code, self.0.to_string()).into_response_with(status)
    }
}
