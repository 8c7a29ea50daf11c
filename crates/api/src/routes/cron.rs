//! Scheduled sweep triggers
//!
//! Each handler runs one sweep to completion and returns its counters.
//! An external scheduler is expected to hit these on a timer; the
//! shared cron secret guards them.

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use stats::badges::BadgeSweep;
use stats::reports::ReportSweep;
use stats::stale::StaleSweep;

use crate::auth::require_bearer;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn stale_prs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<StaleSweep>> {
    require_bearer(&headers, &state.config.cron_secret)?;
    let outcome =
        stats::stale::sweep(state.store.as_stats(), state.notifier.as_ref(), Utc::now()).await?;
    Ok(Json(outcome))
}

pub async fn badge_awards(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<BadgeSweep>> {
    require_bearer(&headers, &state.config.cron_secret)?;
    let outcome = stats::badges::sweep(state.store.as_ref(), Utc::now()).await?;
    Ok(Json(outcome))
}

pub async fn weekly_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<ReportSweep>> {
    require_bearer(&headers, &state.config.cron_secret)?;
    let outcome =
        stats::reports::weekly_report(state.store.as_stats(), state.notifier.as_ref(), Utc::now())
            .await?;
    Ok(Json(outcome))
}

pub async fn daily_digest(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<ReportSweep>> {
    require_bearer(&headers, &state.config.cron_secret)?;
    let outcome =
        stats::reports::daily_digest(state.store.as_stats(), state.notifier.as_ref(), Utc::now())
            .await?;
    Ok(Json(outcome))
}
