//! Weighted merge-time prediction for a single open PR.
//!
//! Four signals from the trailing 90 days feed a weighted mean: the
//! author's own merge history (0.4), merged PRs of the same size
//! bucket (0.2), merged PRs created on the same weekday within two
//! hours (0.2), and the current workload of the PR's pending reviewers
//! (0.2). Absent signals drop out and the weights re-proportion over
//! what remains; the workload signal always contributes, so every open
//! PR gets a prediction.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use common::format::SizeBucket;
use common::models::{ConfidenceLevel, PrState, PullRequest};
use common::store::{StatsScope, StatsStore};
use common::Result;
use serde::Serialize;
use uuid::Uuid;

use crate::overview::mean;

const WINDOW_DAYS: i64 = 90;
const AUTHOR_HISTORY_LIMIT: i64 = 50;
const AUTHOR_WEIGHT: f64 = 0.4;
const SIZE_WEIGHT: f64 = 0.2;
const DAY_HOUR_WEIGHT: f64 = 0.2;
const WORKLOAD_WEIGHT: f64 = 0.2;
/// Each pending request on the busiest assigned reviewer adds an hour
const WORKLOAD_MS_PER_PENDING: f64 = 3_600_000.0;
/// A prediction is never earlier than 30 minutes out
const MIN_REMAINING_MS: f64 = 1_800_000.0;

/// Weighted mean that re-proportions over the signals that actually
/// contributed
#[derive(Debug, Default)]
pub struct WeightedMean {
    entries: Vec<(f64, f64)>,
}

impl WeightedMean {
    pub fn push(&mut self, value: f64, weight: f64) {
        self.entries.push((value, weight));
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// None when nothing contributed
    pub fn mean(&self) -> Option<f64> {
        let total = self.total_weight();
        if total <= 0.0 {
            return None;
        }
        Some(self.entries.iter().map(|(v, w)| v * w).sum::<f64>() / total)
    }
}

/// Per-signal averages behind a prediction; 0 where a signal had no
/// data
#[derive(Debug, Clone, Serialize)]
pub struct PredictionFactors {
    pub author_history_ms: f64,
    pub pr_size_ms: f64,
    pub day_hour_ms: f64,
    pub reviewer_workload_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergePrediction {
    pub predicted_merge_at: DateTime<Utc>,
    pub confidence: ConfidenceLevel,
    pub factors: PredictionFactors,
}

/// Confidence from the number of historical PRs behind the estimate
/// (the workload signal contributes no samples)
pub fn confidence_for(samples: usize) -> ConfidenceLevel {
    if samples >= 20 {
        ConfidenceLevel::High
    } else if samples >= 5 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Average measured merge time and sample count, None on no samples
fn avg_merge_time<'a, I>(prs: I) -> Option<(f64, usize)>
where
    I: IntoIterator<Item = &'a PullRequest>,
{
    let times: Vec<i64> = prs.into_iter().filter_map(|pr| pr.time_to_merge_ms).collect();
    if times.is_empty() {
        None
    } else {
        Some((mean(&times), times.len()))
    }
}

/// Predict when an open PR will merge. Returns None when the PR is
/// missing, not open, or belongs to another installation.
pub async fn predict(
    store: &dyn StatsStore,
    installation_id: Uuid,
    pr_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<MergePrediction>> {
    let pr = match store.pr_by_id(pr_id).await? {
        Some(pr) => pr,
        None => return Ok(None),
    };
    if pr.state != PrState::Open {
        return Ok(None);
    }
    let repo = match store.repo_by_id(pr.repo_id).await? {
        Some(repo) => repo,
        None => return Ok(None),
    };
    if repo.installation_id != installation_id {
        return Ok(None);
    }

    let window_start = now - Duration::days(WINDOW_DAYS);
    let mut acc = WeightedMean::default();
    let mut samples = 0usize;

    let history = store
        .merged_prs_by_author(
            installation_id,
            pr.author_id,
            Some(window_start),
            AUTHOR_HISTORY_LIMIT,
        )
        .await?;
    let author_factor = avg_merge_time(&history);
    if let Some((avg, n)) = author_factor {
        acc.push(avg, AUTHOR_WEIGHT);
        samples += n;
    }

    let merged = store
        .prs_merged_in(&StatsScope {
            installation_id,
            repo_id: None,
            from: window_start,
            to: now,
        })
        .await?;

    let bucket = SizeBucket::for_pr(&pr);
    let size_factor = avg_merge_time(merged.iter().filter(|p| SizeBucket::for_pr(p) == bucket));
    if let Some((avg, n)) = size_factor {
        acc.push(avg, SIZE_WEIGHT);
        samples += n;
    }

    let weekday = pr.created_at.weekday();
    let hour = pr.created_at.hour() as i64;
    let time_factor = avg_merge_time(merged.iter().filter(|p| {
        p.created_at.weekday() == weekday && (p.created_at.hour() as i64 - hour).abs() <= 2
    }));
    if let Some((avg, n)) = time_factor {
        acc.push(avg, DAY_HOUR_WEIGHT);
        samples += n;
    }

    let pending = store.pending_requests_for_pr(pr.id).await?;
    let reviewer_ids: Vec<Uuid> = pending.iter().map(|req| req.reviewer_id).collect();
    let counts = store.pending_request_counts(&reviewer_ids).await?;
    let max_pending = reviewer_ids
        .iter()
        .filter_map(|id| counts.get(id))
        .copied()
        .max()
        .unwrap_or(0);
    let workload_ms = max_pending as f64 * WORKLOAD_MS_PER_PENDING;
    acc.push(workload_ms, WORKLOAD_WEIGHT);

    let predicted = match acc.mean() {
        Some(ms) => ms,
        None => return Ok(None),
    };

    let elapsed = (now - pr.created_at).num_milliseconds() as f64;
    let remaining = (predicted - elapsed).max(MIN_REMAINING_MS);
    let predicted_merge_at = now + Duration::milliseconds(remaining as i64);

    Ok(Some(MergePrediction {
        predicted_merge_at,
        confidence: confidence_for(samples),
        factors: PredictionFactors {
            author_history_ms: author_factor.map(|(avg, _)| avg).unwrap_or(0.0),
            pr_size_ms: size_factor.map(|(avg, _)| avg).unwrap_or(0.0),
            day_hour_ms: time_factor.map(|(avg, _)| avg).unwrap_or(0.0),
            reviewer_workload_ms: workload_ms,
        },
    }))
}
