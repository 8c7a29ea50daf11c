//! Merge-conflict patterns.
//!
//! Unlike the merge-time patterns these run over every PR created in
//! the window, merged or not, because conflicts happen to open PRs too.
//! Rates are fractions in `[0, 1]`, not percentages.

use chrono::{Datelike, Timelike};
use common::format::{day_name, SizeBucket};
use common::models::PullRequest;
use common::store::{StatsScope, StatsStore};
use common::Result;
use serde::Serialize;

use crate::overview::mean;

#[derive(Debug, Clone, Serialize)]
pub struct DayConflicts {
    pub day: u32,
    pub day_name: &'static str,
    pub rate: f64,
    pub conflict_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourConflicts {
    pub hour: u32,
    pub rate: f64,
    pub conflict_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeConflicts {
    pub bucket: &'static str,
    pub rate: f64,
    pub conflict_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictStats {
    pub total_prs: usize,
    pub conflict_count: usize,
    pub conflict_rate: f64,
    pub avg_resolution_ms: f64,
    pub by_day: Vec<DayConflicts>,
    pub by_hour: Vec<HourConflicts>,
    pub by_size: Vec<SizeConflicts>,
}

/// A PR counts as conflicted once a conflict was ever detected on it,
/// resolved or not
fn had_conflict(pr: &PullRequest) -> bool {
    pr.has_conflict || pr.conflict_detected_at.is_some()
}

fn rate(conflicts: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    conflicts as f64 / total as f64
}

/// Conflict incidence over every PR created in the window
pub fn compute(prs: &[PullRequest]) -> ConflictStats {
    let total = prs.len();
    let conflicted = prs.iter().filter(|pr| had_conflict(pr)).count();

    let resolution_times: Vec<i64> = prs
        .iter()
        .filter_map(|pr| match (pr.conflict_detected_at, pr.conflict_resolved_at) {
            (Some(detected), Some(resolved)) => Some((resolved - detected).num_milliseconds()),
            _ => None,
        })
        .collect();

    let by_day = (0..7)
        .map(|day| {
            let in_bucket: Vec<&PullRequest> = prs
                .iter()
                .filter(|pr| pr.created_at.weekday().num_days_from_sunday() == day)
                .collect();
            let conflicts = in_bucket.iter().filter(|pr| had_conflict(pr)).count();
            DayConflicts {
                day,
                day_name: day_name(day as usize),
                rate: rate(conflicts, in_bucket.len()),
                conflict_count: conflicts,
                total_count: in_bucket.len(),
            }
        })
        .collect();

    let by_hour = (0..24)
        .map(|hour| {
            let in_bucket: Vec<&PullRequest> = prs
                .iter()
                .filter(|pr| pr.created_at.hour() == hour)
                .collect();
            let conflicts = in_bucket.iter().filter(|pr| had_conflict(pr)).count();
            HourConflicts {
                hour,
                rate: rate(conflicts, in_bucket.len()),
                conflict_count: conflicts,
                total_count: in_bucket.len(),
            }
        })
        .collect();

    let by_size = SizeBucket::ALL
        .iter()
        .map(|bucket| {
            let in_bucket: Vec<&PullRequest> = prs
                .iter()
                .filter(|pr| SizeBucket::for_pr(pr) == *bucket)
                .collect();
            let conflicts = in_bucket.iter().filter(|pr| had_conflict(pr)).count();
            SizeConflicts {
                bucket: bucket.as_str(),
                rate: rate(conflicts, in_bucket.len()),
                conflict_count: conflicts,
                total_count: in_bucket.len(),
            }
        })
        .collect();

    ConflictStats {
        total_prs: total,
        conflict_count: conflicted,
        conflict_rate: rate(conflicted, total),
        avg_resolution_ms: mean(&resolution_times),
        by_day,
        by_hour,
        by_size,
    }
}

pub async fn conflict_patterns(
    store: &dyn StatsStore,
    scope: &StatsScope,
) -> Result<ConflictStats> {
    let prs = store.prs_created_in(scope).await?;
    Ok(compute(&prs))
}
