//! Reviewer recommendation scoring.
//!
//! Candidates are people who reviewed in the target repo in the last
//! 90 days (the PR author excluded). A repo with no review history
//! falls back to a capped sample of installation-wide activity. Each
//! candidate scores out of 100: experience up to 40, response speed up
//! to 30, available bandwidth up to 30.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use common::store::{ReviewWithContext, StatsScope, StatsStore};
use common::Result;
use serde::Serialize;
use uuid::Uuid;

use crate::overview::mean;

const WINDOW_DAYS: i64 = 90;
const FALLBACK_SAMPLE: i64 = 200;
const EXPERIENCE_MAX: f64 = 40.0;
const SPEED_MAX: f64 = 30.0;
const WORKLOAD_MAX: f64 = 30.0;
/// Average response of an hour or better earns full speed marks
const SPEED_FLOOR_MS: f64 = 3_600_000.0;
/// A day or worse earns none
const SPEED_CEIL_MS: f64 = 86_400_000.0;
/// Each pending review request costs this many workload points
const WORKLOAD_PENALTY: f64 = 6.0;

pub const REASON_EXPERIENCE: &str = "extensive repo experience";
pub const REASON_SPEED: &str = "fast response";
pub const REASON_WORKLOAD: &str = "low current load";
pub const REASON_FALLBACK: &str = "available teammate";

#[derive(Debug, Clone, Serialize)]
pub struct ReviewerRecommendation {
    pub login: String,
    pub avatar_url: Option<String>,
    pub score: i32,
    pub review_count: usize,
    pub avg_response_ms: f64,
    pub pending_reviews: i64,
    pub reasons: Vec<&'static str>,
}

/// 0-40, proportional to the busiest reviewer in the pool
pub fn experience_score(review_count: usize, max_count: usize) -> f64 {
    if max_count == 0 {
        return 0.0;
    }
    review_count as f64 / max_count as f64 * EXPERIENCE_MAX
}

/// 0-30, linear between the floor and ceiling; no data scores 0
pub fn speed_score(avg_response_ms: Option<f64>) -> f64 {
    match avg_response_ms {
        Some(avg) => (SPEED_MAX
            * (1.0 - (avg - SPEED_FLOOR_MS) / (SPEED_CEIL_MS - SPEED_FLOOR_MS)))
            .clamp(0.0, SPEED_MAX),
        None => 0.0,
    }
}

/// 0-30, docked per pending request, floored at 0
pub fn workload_score(pending: i64) -> f64 {
    (WORKLOAD_MAX - WORKLOAD_PENALTY * pending as f64).max(0.0)
}

/// Score a candidate pool against the pending-request counts
pub fn compute(
    reviews: &[ReviewWithContext],
    pending: &HashMap<Uuid, i64>,
    limit: usize,
) -> Vec<ReviewerRecommendation> {
    struct Candidate {
        login: String,
        avatar_url: Option<String>,
        review_count: usize,
        response_times: Vec<i64>,
    }

    let mut by_reviewer: HashMap<Uuid, Candidate> = HashMap::new();
    for item in reviews {
        let entry = by_reviewer
            .entry(item.reviewer.id)
            .or_insert_with(|| Candidate {
                login: item.reviewer.login.clone(),
                avatar_url: item.reviewer.avatar_url.clone(),
                review_count: 0,
                response_times: Vec::new(),
            });
        entry.review_count += 1;
        if let Some(ms) = item.review.response_time_ms {
            entry.response_times.push(ms);
        }
    }

    let max_count = by_reviewer
        .values()
        .map(|c| c.review_count)
        .max()
        .unwrap_or(0);

    let mut recs: Vec<ReviewerRecommendation> = by_reviewer
        .into_iter()
        .map(|(user_id, c)| {
            let avg = if c.response_times.is_empty() {
                None
            } else {
                Some(mean(&c.response_times))
            };
            let pending_count = pending.get(&user_id).copied().unwrap_or(0);

            let experience = experience_score(c.review_count, max_count);
            let speed = speed_score(avg);
            let workload = workload_score(pending_count);

            let mut reasons = Vec::new();
            if experience >= 30.0 {
                reasons.push(REASON_EXPERIENCE);
            }
            if speed >= 20.0 {
                reasons.push(REASON_SPEED);
            }
            if workload >= 24.0 {
                reasons.push(REASON_WORKLOAD);
            }
            if reasons.is_empty() {
                reasons.push(REASON_FALLBACK);
            }

            ReviewerRecommendation {
                login: c.login,
                avatar_url: c.avatar_url,
                score: (experience + speed + workload).round() as i32,
                review_count: c.review_count,
                avg_response_ms: avg.unwrap_or(0.0),
                pending_reviews: pending_count,
                reasons,
            }
        })
        .collect();

    recs.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.review_count.cmp(&a.review_count))
            .then_with(|| a.login.cmp(&b.login))
    });
    recs.truncate(limit);
    recs
}

fn drop_author(pool: &mut Vec<ReviewWithContext>, exclude_author: Option<Uuid>) {
    if let Some(author) = exclude_author {
        pool.retain(|r| r.reviewer.id != author);
    }
}

/// Recommend up to `limit` reviewers for a repo
pub async fn recommend(
    store: &dyn StatsStore,
    installation_id: Uuid,
    repo_id: Uuid,
    exclude_author: Option<Uuid>,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<Vec<ReviewerRecommendation>> {
    let from = now - Duration::days(WINDOW_DAYS);

    let mut pool = store
        .reviews_in(&StatsScope {
            installation_id,
            repo_id: Some(repo_id),
            from,
            to: now,
        })
        .await?;
    drop_author(&mut pool, exclude_author);

    if pool.is_empty() {
        pool = store
            .recent_reviews(installation_id, from, now, FALLBACK_SAMPLE)
            .await?;
        drop_author(&mut pool, exclude_author);
    }

    let mut reviewer_ids: Vec<Uuid> = pool.iter().map(|r| r.reviewer.id).collect();
    reviewer_ids.sort_unstable();
    reviewer_ids.dedup();
    let pending = store.pending_request_counts(&reviewer_ids).await?;

    Ok(compute(&pool, &pending, limit))
}
