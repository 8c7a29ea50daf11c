//! Bearer-token guard for the cron and ingestion routes

use axum::http::HeaderMap;
use tracing::warn;

use crate::error::ApiError;

/// Check the `Authorization: Bearer` header against a configured
/// secret. An unset secret disables the guarded route entirely.
pub fn require_bearer(headers: &HeaderMap, secret: &Option<String>) -> Result<(), ApiError> {
    let secret = match secret {
        Some(secret) => secret,
        None => {
            return Err(ApiError::Unauthorized(
                "route disabled: no secret configured".to_string(),
            ))
        }
    };

    let presented = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == secret => Ok(()),
        _ => {
            warn!("Rejected request with missing or wrong bearer token");
            Err(ApiError::Unauthorized("invalid bearer token".to_string()))
        }
    }
}
