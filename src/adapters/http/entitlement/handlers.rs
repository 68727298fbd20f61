//! HTTP handlers for entitlement endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::{EntitlementView, GetEntitlementQuery};
use crate::domain::entitlement::EntitlementError;
use crate::domain::foundation::UserId;

use super::super::error::ErrorResponse;
use super::super::state::AppState;

/// Get a user's entitlement.
///
/// GET /api/entitlements/:user_id
pub async fn get_entitlement(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<EntitlementView>, EntitlementApiError> {
    let user_id = UserId::new(user_id)?;
    let view = state
        .entitlement_query
        .handle(GetEntitlementQuery {
            user_id: user_id.clone(),
        })
        .await?
        .ok_or(EntitlementError::NotFound(user_id))?;

    Ok(Json(view))
}

/// API error type that converts entitlement errors to HTTP responses.
#[derive(Debug)]
pub struct EntitlementApiError(EntitlementError);

impl<E: Into<EntitlementError>> From<E> for EntitlementApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for EntitlementApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EntitlementError::NotFound(_) => StatusCode::NOT_FOUND,
            EntitlementError::InvalidProductType(_)
            | EntitlementError::InvalidStatus(_)
            | EntitlementError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            EntitlementError::Timeout(_) | EntitlementError::Persistence(_) => {
                tracing::error!(error = %self.0, "Entitlement lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ErrorResponse::new(self.0.code().to_string(), self.0.to_string()).into_response_with(status)
    }
}
