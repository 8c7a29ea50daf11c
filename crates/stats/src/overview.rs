//! Overview statistics and period-over-period trends

use common::models::{PrState, PullRequest};
use common::store::{StatsScope, StatsStore};
use common::Result;
use serde::Serialize;

/// Aggregate PR statistics for one window, trended against the window
/// immediately before it
#[derive(Debug, Clone, Serialize)]
pub struct OverviewStats {
    pub total_prs: usize,
    pub merged_prs: usize,
    pub open_prs: usize,
    pub closed_prs: usize,
    pub avg_merge_time_ms: f64,
    pub median_merge_time_ms: f64,
    pub avg_first_review_ms: f64,
    pub avg_revision_count: f64,
    pub merge_rate: f64,
    pub merge_time_trend_pct: f64,
    pub first_review_trend_pct: f64,
}

/// Mean of a sample, 0 when empty
pub fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

/// Median of a sample: mean of the middle two on even length, 0 when
/// empty
pub fn median(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Percent change against a previous value, 0 when there is no previous
pub fn trend_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

pub(crate) struct MergeAverages {
    pub avg_merge_ms: f64,
    pub avg_first_review_ms: f64,
}

/// Average merge and first-review durations over merged PRs with a
/// measured merge time. PRs still missing a duration are excluded, not
/// zeroed.
pub(crate) fn merge_averages(prs: &[PullRequest]) -> MergeAverages {
    let merged: Vec<&PullRequest> = prs
        .iter()
        .filter(|pr| pr.state == PrState::Merged && pr.time_to_merge_ms.is_some())
        .collect();

    let merge_times: Vec<i64> = merged.iter().filter_map(|pr| pr.time_to_merge_ms).collect();
    let first_review_times: Vec<i64> = merged
        .iter()
        .filter_map(|pr| pr.time_to_first_review_ms)
        .collect();

    MergeAverages {
        avg_merge_ms: mean(&merge_times),
        avg_first_review_ms: mean(&first_review_times),
    }
}

/// Aggregate one window of PRs; `previous` is the window before it and
/// only feeds the trend figures
pub fn compute(prs: &[PullRequest], previous: &[PullRequest]) -> OverviewStats {
    let total = prs.len();
    let merged = prs.iter().filter(|pr| pr.state == PrState::Merged).count();
    let open = prs
        .iter()
        .filter(|pr| matches!(pr.state, PrState::Open | PrState::Draft))
        .count();
    let closed = prs.iter().filter(|pr| pr.state == PrState::Closed).count();

    let measured: Vec<&PullRequest> = prs
        .iter()
        .filter(|pr| pr.state == PrState::Merged && pr.time_to_merge_ms.is_some())
        .collect();
    let merge_times: Vec<i64> = measured.iter().filter_map(|pr| pr.time_to_merge_ms).collect();
    let revision_counts: Vec<i64> = measured
        .iter()
        .map(|pr| i64::from(pr.revision_count))
        .collect();

    let current = merge_averages(prs);
    let prior = merge_averages(previous);

    OverviewStats {
        total_prs: total,
        merged_prs: merged,
        open_prs: open,
        closed_prs: closed,
        avg_merge_time_ms: current.avg_merge_ms,
        median_merge_time_ms: median(&merge_times),
        avg_first_review_ms: current.avg_first_review_ms,
        avg_revision_count: mean(&revision_counts),
        merge_rate: if total == 0 {
            0.0
        } else {
            merged as f64 / total as f64 * 100.0
        },
        merge_time_trend_pct: trend_pct(current.avg_merge_ms, prior.avg_merge_ms),
        first_review_trend_pct: trend_pct(current.avg_first_review_ms, prior.avg_first_review_ms),
    }
}

/// Overview for a scope, trending against the window before it
pub async fn overview(store: &dyn StatsStore, scope: &StatsScope) -> Result<OverviewStats> {
    let current = store.prs_created_in(scope).await?;
    let previous = store.prs_created_in(&scope.previous()).await?;
    Ok(compute(&current, &previous))
}
