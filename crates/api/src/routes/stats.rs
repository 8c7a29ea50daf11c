//! Statistics routes
//!
//! Every handler resolves its query window the same way: explicit
//! `from`/`to` when given, otherwise the 30 days ending now.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use common::store::StatsScope;
use stats::conflicts::ConflictStats;
use stats::overview::OverviewStats;
use stats::patterns::BottleneckStats;
use stats::prediction::MergePrediction;
use stats::ranking::ReviewerRank;
use stats::recommendation::ReviewerRecommendation;

use crate::error::{ApiError, ApiResult, OptionExt};
use crate::state::AppState;

/// Window applied when the query leaves `from`/`to` unset
const DEFAULT_WINDOW_DAYS: i64 = 30;

fn default_reviewer_limit() -> usize {
    20
}

fn default_recommendation_limit() -> usize {
    5
}

fn default_kind() -> String {
    "hourly".to_string()
}

fn resolve_scope(
    installation_id: Uuid,
    repo_id: Option<Uuid>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> StatsScope {
    let to = to.unwrap_or_else(Utc::now);
    let from = from.unwrap_or_else(|| to - Duration::days(DEFAULT_WINDOW_DAYS));
    StatsScope {
        installation_id,
        repo_id,
        from,
        to,
    }
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub installation_id: Uuid,
    pub repo_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl StatsQuery {
    fn scope(&self) -> StatsScope {
        resolve_scope(self.installation_id, self.repo_id, self.from, self.to)
    }
}

pub async fn overview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<OverviewStats>> {
    let scope = query.scope();
    let body = stats::overview::overview(state.store.as_stats(), &scope).await?;
    Ok(Json(body))
}

#[derive(Deserialize)]
pub struct PatternsQuery {
    pub installation_id: Uuid,
    pub repo_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// One of "hourly", "daily", "size"
    #[serde(default = "default_kind")]
    pub kind: String,
}

pub async fn patterns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PatternsQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let scope = resolve_scope(query.installation_id, query.repo_id, query.from, query.to);
    let store = state.store.as_stats();

    let body = match query.kind.as_str() {
        "hourly" => serde_json::to_value(stats::patterns::hourly_patterns(store, &scope).await?),
        "daily" => serde_json::to_value(stats::patterns::daily_patterns(store, &scope).await?),
        "size" => serde_json::to_value(stats::patterns::size_patterns(store, &scope).await?),
        other => {
            return Err(ApiError::BadRequest(format!(
                "unknown pattern kind: {}",
                other
            )))
        }
    }
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(body))
}

pub async fn bottleneck(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<BottleneckStats>> {
    let scope = query.scope();
    let body = stats::patterns::bottlenecks(state.store.as_stats(), &scope).await?;
    Ok(Json(body))
}

pub async fn conflicts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<ConflictStats>> {
    let scope = query.scope();
    let body = stats::conflicts::conflict_patterns(state.store.as_stats(), &scope).await?;
    Ok(Json(body))
}

#[derive(Deserialize)]
pub struct ReviewersQuery {
    pub installation_id: Uuid,
    pub repo_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_reviewer_limit")]
    pub limit: usize,
}

pub async fn reviewers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReviewersQuery>,
) -> ApiResult<Json<Vec<ReviewerRank>>> {
    let scope = resolve_scope(query.installation_id, query.repo_id, query.from, query.to);
    let body = stats::ranking::reviewer_ranking(state.store.as_stats(), &scope, query.limit).await?;
    Ok(Json(body))
}

#[derive(Deserialize)]
pub struct PredictionQuery {
    pub installation_id: Uuid,
}

pub async fn prediction(
    State(state): State<Arc<AppState>>,
    Path(pr_id): Path<Uuid>,
    Query(query): Query<PredictionQuery>,
) -> ApiResult<Json<MergePrediction>> {
    let body = stats::prediction::predict(
        state.store.as_stats(),
        query.installation_id,
        pr_id,
        Utc::now(),
    )
    .await?
    .not_found("no prediction for this pull request")?;
    Ok(Json(body))
}

#[derive(Deserialize)]
pub struct RecommendationsQuery {
    pub installation_id: Uuid,
    pub repo_id: Uuid,
    pub exclude_author: Option<Uuid>,
    #[serde(default = "default_recommendation_limit")]
    pub limit: usize,
}

pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecommendationsQuery>,
) -> ApiResult<Json<Vec<ReviewerRecommendation>>> {
    let body = stats::recommendation::recommend(
        state.store.as_stats(),
        query.installation_id,
        query.repo_id,
        query.exclude_author,
        query.limit,
        Utc::now(),
    )
    .await?;
    Ok(Json(body))
}
