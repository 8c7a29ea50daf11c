//! PR event ingestion
//!
//! Accepts typed lifecycle events, applies them to the store, and
//! queues any follow-up jobs. Redelivered events are safe: the apply
//! step is idempotent and produces no duplicate jobs.

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use stats::PrEvent;

use crate::auth::require_bearer;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct EventResponse {
    pub ok: bool,
    pub jobs: usize,
}

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(event): Json<PrEvent>,
) -> ApiResult<Json<EventResponse>> {
    require_bearer(&headers, &state.config.ingest_secret)?;

    let jobs = stats::ingest::apply(state.store.as_ingest(), &event).await?;
    let queued = jobs.len();
    for job in jobs {
        state.jobs.enqueue(job).await?;
    }

    if queued > 0 {
        info!("Event ingested, {} follow-up jobs queued", queued);
    }

    Ok(Json(EventResponse {
        ok: true,
        jobs: queued,
    }))
}
