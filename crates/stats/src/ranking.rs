//! Reviewer response-time ranking

use std::cmp::Ordering;
use std::collections::HashMap;

use common::models::ReviewState;
use common::store::{ReviewWithContext, StatsScope, StatsStore};
use common::Result;
use serde::Serialize;
use uuid::Uuid;

use crate::overview::mean;

/// One reviewer's aggregate before rank and percentile assignment. The
/// badge sweep consumes the full sorted list; the API serves the
/// ranked, truncated form.
#[derive(Debug, Clone)]
pub struct RankedReviewer {
    pub user_id: Uuid,
    pub login: String,
    pub avatar_url: Option<String>,
    pub review_count: usize,
    pub approval_count: usize,
    /// None when no review had a resolvable response time
    pub avg_response_ms: Option<f64>,
    pub approval_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewerRank {
    pub rank: usize,
    pub login: String,
    pub avatar_url: Option<String>,
    pub avg_response_ms: f64,
    pub review_count: usize,
    pub approval_rate: f64,
    pub percentile: i32,
}

struct Accum {
    login: String,
    avatar_url: Option<String>,
    response_times: Vec<i64>,
    review_count: usize,
    approval_count: usize,
}

/// Group reviews by reviewer and sort fastest-first; reviewers without
/// any resolvable response time sort last
pub fn rank_reviewers(reviews: &[ReviewWithContext]) -> Vec<RankedReviewer> {
    let mut by_reviewer: HashMap<Uuid, Accum> = HashMap::new();

    for item in reviews {
        let entry = by_reviewer
            .entry(item.reviewer.id)
            .or_insert_with(|| Accum {
                login: item.reviewer.login.clone(),
                avatar_url: item.reviewer.avatar_url.clone(),
                response_times: Vec::new(),
                review_count: 0,
                approval_count: 0,
            });
        entry.review_count += 1;
        if item.review.state == ReviewState::Approved {
            entry.approval_count += 1;
        }
        match item.review.response_time_ms {
            Some(ms) => entry.response_times.push(ms),
            None => {
                // No stored response time: fall back to time since the
                // PR opened, counted only when positive
                let fallback =
                    (item.review.submitted_at - item.pr_created_at).num_milliseconds();
                if fallback > 0 {
                    entry.response_times.push(fallback);
                }
            }
        }
    }

    let mut ranked: Vec<RankedReviewer> = by_reviewer
        .into_iter()
        .map(|(user_id, acc)| {
            let avg = if acc.response_times.is_empty() {
                None
            } else {
                Some(mean(&acc.response_times))
            };
            RankedReviewer {
                user_id,
                login: acc.login,
                avatar_url: acc.avatar_url,
                review_count: acc.review_count,
                approval_count: acc.approval_count,
                avg_response_ms: avg,
                approval_rate: acc.approval_count as f64 / acc.review_count as f64 * 100.0,
            }
        })
        .collect();

    ranked.sort_by(compare);
    ranked
}

/// Fastest first; the no-data group goes last, busiest of them first.
/// Login breaks remaining ties so the order is stable across runs.
fn compare(a: &RankedReviewer, b: &RankedReviewer) -> Ordering {
    match (a.avg_response_ms, b.avg_response_ms) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.review_count.cmp(&a.review_count))
    .then_with(|| a.login.cmp(&b.login))
}

/// Share of the field this rank beats, 100 for a lone reviewer.
/// Computed over the full field before truncation.
fn percentile(index: usize, total: usize) -> i32 {
    if total <= 1 {
        return 100;
    }
    ((1.0 - index as f64 / (total - 1) as f64) * 100.0).round() as i32
}

/// Rank, percentile, and truncate to `limit`
pub fn compute(reviews: &[ReviewWithContext], limit: usize) -> Vec<ReviewerRank> {
    let ranked = rank_reviewers(reviews);
    let total = ranked.len();

    ranked
        .into_iter()
        .enumerate()
        .take(limit)
        .map(|(i, r)| ReviewerRank {
            rank: i + 1,
            login: r.login,
            avatar_url: r.avatar_url,
            avg_response_ms: r.avg_response_ms.unwrap_or(0.0),
            review_count: r.review_count,
            approval_rate: r.approval_rate,
            percentile: percentile(i, total),
        })
        .collect()
}

pub async fn reviewer_ranking(
    store: &dyn StatsStore,
    scope: &StatsScope,
    limit: usize,
) -> Result<Vec<ReviewerRank>> {
    let reviews = store.reviews_in(scope).await?;
    Ok(compute(&reviews, limit))
}
