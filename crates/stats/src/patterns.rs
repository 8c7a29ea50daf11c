//! Merge-time patterns by hour, weekday, and PR size, plus the review
//! pipeline bottleneck breakdown.
//!
//! Every bucketed analysis returns the full bucket range (24 hours, 7
//! days, 4 sizes) so charts never have holes; empty buckets carry a
//! zero average. Bucketing uses the PR's creation time in UTC.

use chrono::{Datelike, Timelike};
use common::format::{day_name, SizeBucket};
use common::models::PullRequest;
use common::store::{StatsScope, StatsStore};
use common::Result;
use serde::Serialize;

use crate::overview::{mean, median};

#[derive(Debug, Clone, Serialize)]
pub struct HourlyPattern {
    pub hour: u32,
    pub avg_merge_time_ms: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyPattern {
    pub day: u32,
    pub day_name: &'static str,
    pub avg_merge_time_ms: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SizePattern {
    pub bucket: &'static str,
    pub label: &'static str,
    pub avg_merge_time_ms: f64,
    pub median_merge_time_ms: f64,
    pub count: usize,
}

/// Where merged PRs spend their time: waiting for the first review,
/// getting from first review to approval, and from approval to merge.
/// Each stage averages only the PRs that have both of its endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct BottleneckStats {
    pub avg_wait_first_review_ms: f64,
    pub avg_review_to_approval_ms: f64,
    pub avg_approval_to_merge_ms: f64,
    pub avg_total_ms: f64,
}

/// Merged PRs that actually have a measured merge time
fn measured(prs: &[PullRequest]) -> Vec<(&PullRequest, i64)> {
    prs.iter()
        .filter_map(|pr| pr.time_to_merge_ms.map(|ms| (pr, ms)))
        .collect()
}

/// Average merge time per creation hour (UTC), all 24 buckets
pub fn hourly(prs: &[PullRequest]) -> Vec<HourlyPattern> {
    let samples = measured(prs);
    (0..24)
        .map(|hour| {
            let times: Vec<i64> = samples
                .iter()
                .filter(|(pr, _)| pr.created_at.hour() == hour)
                .map(|(_, ms)| *ms)
                .collect();
            HourlyPattern {
                hour,
                avg_merge_time_ms: mean(&times),
                count: times.len(),
            }
        })
        .collect()
}

/// Average merge time per creation weekday, all 7 buckets, 0 = Sunday
pub fn daily(prs: &[PullRequest]) -> Vec<DailyPattern> {
    let samples = measured(prs);
    (0..7)
        .map(|day| {
            let times: Vec<i64> = samples
                .iter()
                .filter(|(pr, _)| pr.created_at.weekday().num_days_from_sunday() == day)
                .map(|(_, ms)| *ms)
                .collect();
            DailyPattern {
                day,
                day_name: day_name(day as usize),
                avg_merge_time_ms: mean(&times),
                count: times.len(),
            }
        })
        .collect()
}

/// Average and median merge time per size bucket, all 4 buckets
pub fn by_size(prs: &[PullRequest]) -> Vec<SizePattern> {
    let samples = measured(prs);
    SizeBucket::ALL
        .iter()
        .map(|bucket| {
            let times: Vec<i64> = samples
                .iter()
                .filter(|(pr, _)| SizeBucket::for_pr(pr) == *bucket)
                .map(|(_, ms)| *ms)
                .collect();
            SizePattern {
                bucket: bucket.as_str(),
                label: bucket.label(),
                avg_merge_time_ms: mean(&times),
                median_merge_time_ms: median(&times),
                count: times.len(),
            }
        })
        .collect()
}

/// Stage averages over merged PRs with a known first-review duration.
/// `avg_total_ms` is the sum of the three stage averages, so it reads
/// as the typical end-to-end path even though the stages draw on
/// different subsets.
pub fn bottleneck(prs: &[PullRequest]) -> BottleneckStats {
    let population: Vec<&PullRequest> = prs
        .iter()
        .filter(|pr| pr.time_to_first_review_ms.is_some())
        .collect();

    let first_review: Vec<i64> = population
        .iter()
        .filter_map(|pr| pr.time_to_first_review_ms)
        .collect();

    let review_to_approval: Vec<i64> = population
        .iter()
        .filter_map(|pr| match (pr.first_review_at, pr.first_approval_at) {
            (Some(review), Some(approval)) => Some((approval - review).num_milliseconds()),
            _ => None,
        })
        .collect();

    let approval_to_merge: Vec<i64> = population
        .iter()
        .filter_map(|pr| match (pr.first_approval_at, pr.merged_at) {
            (Some(approval), Some(merged)) => Some((merged - approval).num_milliseconds()),
            _ => None,
        })
        .collect();

    let avg_wait = mean(&first_review);
    let avg_review = mean(&review_to_approval);
    let avg_approval = mean(&approval_to_merge);

    BottleneckStats {
        avg_wait_first_review_ms: avg_wait,
        avg_review_to_approval_ms: avg_review,
        avg_approval_to_merge_ms: avg_approval,
        avg_total_ms: avg_wait + avg_review + avg_approval,
    }
}

pub async fn hourly_patterns(
    store: &dyn StatsStore,
    scope: &StatsScope,
) -> Result<Vec<HourlyPattern>> {
    let prs = store.prs_merged_in(scope).await?;
    Ok(hourly(&prs))
}

pub async fn daily_patterns(
    store: &dyn StatsStore,
    scope: &StatsScope,
) -> Result<Vec<DailyPattern>> {
    let prs = store.prs_merged_in(scope).await?;
    Ok(daily(&prs))
}

pub async fn size_patterns(store: &dyn StatsStore, scope: &StatsScope) -> Result<Vec<SizePattern>> {
    let prs = store.prs_merged_in(scope).await?;
    Ok(by_size(&prs))
}

pub async fn bottlenecks(store: &dyn StatsStore, scope: &StatsScope) -> Result<BottleneckStats> {
    let prs = store.prs_merged_in(scope).await?;
    Ok(bottleneck(&prs))
}
