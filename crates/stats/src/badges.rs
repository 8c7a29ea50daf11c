//! Weekly badge awards.
//!
//! Each criterion is evaluated independently over the trailing seven
//! days and awards are keyed by ISO week, so re-running a sweep inside
//! the same week awards nothing new. Single-winner criteria break ties
//! deterministically by login.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::format::iso_week_period;
use common::models::{Badge, BadgeTier, PullRequest, ReviewState};
use common::store::{ReviewWithContext, StatsScope, Store};
use common::Result;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::hot_streak::FAST_MERGE_MS;
use crate::overview::mean;
use crate::ranking::{rank_reviewers, RankedReviewer};

/// Badge ids
pub mod defs {
    pub const REVIEW_KING: &str = "review-king";
    pub const LIGHTNING_REVIEWER: &str = "lightning-reviewer";
    pub const STREAK_MASTER: &str = "streak-master";
    pub const MOST_HELPFUL: &str = "most-helpful";
    pub const FASTEST_APPROVER: &str = "fastest-approver";
    pub const SMALL_PR_CHAMPION: &str = "small-pr-champion";
    pub const CONSISTENCY_STAR: &str = "consistency-star";
}

const SMALL_PR_LINES: i64 = 100;
const STREAK_RUN: usize = 3;
const CONSISTENCY_DAYS: usize = 5;

/// The full badge catalog, ensured in the store before each sweep
pub fn definitions() -> Vec<Badge> {
    vec![
        Badge {
            id: defs::REVIEW_KING.to_string(),
            name: "Review King".to_string(),
            description: "Most reviews this week".to_string(),
            emoji: "👑".to_string(),
            tier: BadgeTier::Gold,
        },
        Badge {
            id: defs::LIGHTNING_REVIEWER.to_string(),
            name: "Lightning Reviewer".to_string(),
            description: "Fastest average review response this week".to_string(),
            emoji: "⚡".to_string(),
            tier: BadgeTier::Gold,
        },
        Badge {
            id: defs::STREAK_MASTER.to_string(),
            name: "Streak Master".to_string(),
            description: "Three consecutive PRs merged within an hour".to_string(),
            emoji: "🔥".to_string(),
            tier: BadgeTier::Silver,
        },
        Badge {
            id: defs::MOST_HELPFUL.to_string(),
            name: "Most Helpful".to_string(),
            description: "Most change requests this week".to_string(),
            emoji: "🛠️".to_string(),
            tier: BadgeTier::Silver,
        },
        Badge {
            id: defs::FASTEST_APPROVER.to_string(),
            name: "Fastest Approver".to_string(),
            description: "Fastest average time to approval".to_string(),
            emoji: "✅".to_string(),
            tier: BadgeTier::Bronze,
        },
        Badge {
            id: defs::SMALL_PR_CHAMPION.to_string(),
            name: "Small PR Champion".to_string(),
            description: "Keeps PRs small and reviewable".to_string(),
            emoji: "🎯".to_string(),
            tier: BadgeTier::Bronze,
        },
        Badge {
            id: defs::CONSISTENCY_STAR.to_string(),
            name: "Consistency Star".to_string(),
            description: "Reviewed on five consecutive days".to_string(),
            emoji: "⭐".to_string(),
            tier: BadgeTier::Silver,
        },
    ]
}

/// Most reviews this week; every ranked reviewer has at least one
pub fn review_king(rankings: &[RankedReviewer]) -> Option<Uuid> {
    rankings
        .iter()
        .max_by(|a, b| {
            a.review_count
                .cmp(&b.review_count)
                .then_with(|| b.login.cmp(&a.login))
        })
        .map(|r| r.user_id)
}

/// Fastest average response among reviewers with at least three
/// reviews; rankings are already sorted fastest-first
pub fn lightning_reviewer(rankings: &[RankedReviewer]) -> Option<Uuid> {
    rankings
        .iter()
        .find(|r| r.review_count >= 3 && matches!(r.avg_response_ms, Some(avg) if avg > 0.0))
        .map(|r| r.user_id)
}

/// Authors with three consecutive merges each landing within an hour
pub fn streak_masters(merged: &[PullRequest]) -> Vec<Uuid> {
    let mut by_author: HashMap<Uuid, Vec<&PullRequest>> = HashMap::new();
    for pr in merged {
        by_author.entry(pr.author_id).or_default().push(pr);
    }

    let mut winners: Vec<Uuid> = by_author
        .into_iter()
        .filter_map(|(author, mut prs)| {
            prs.sort_by_key(|pr| pr.merged_at);
            let fast: Vec<bool> = prs
                .iter()
                .map(|pr| matches!(pr.time_to_merge_ms, Some(ms) if ms <= FAST_MERGE_MS))
                .collect();
            fast.windows(STREAK_RUN)
                .any(|w| w.iter().all(|f| *f))
                .then_some(author)
        })
        .collect();
    winners.sort_unstable();
    winners
}

/// Most change requests, at least five of them
pub fn most_helpful(reviews: &[ReviewWithContext]) -> Option<Uuid> {
    let mut counts: HashMap<Uuid, (usize, &str)> = HashMap::new();
    for item in reviews {
        if item.review.state == ReviewState::ChangesRequested {
            let entry = counts
                .entry(item.reviewer.id)
                .or_insert((0, item.reviewer.login.as_str()));
            entry.0 += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, (count, _))| *count >= 5)
        .max_by(|(_, (ca, la)), (_, (cb, lb))| ca.cmp(cb).then_with(|| lb.cmp(la)))
        .map(|(id, _)| id)
}

/// Fastest average approval response over at least two measured
/// approvals
pub fn fastest_approver(reviews: &[ReviewWithContext]) -> Option<Uuid> {
    let mut samples: HashMap<Uuid, (Vec<i64>, &str)> = HashMap::new();
    for item in reviews {
        if item.review.state == ReviewState::Approved {
            if let Some(ms) = item.review.response_time_ms {
                let entry = samples
                    .entry(item.reviewer.id)
                    .or_insert((Vec::new(), item.reviewer.login.as_str()));
                entry.0.push(ms);
            }
        }
    }
    samples
        .into_iter()
        .filter(|(_, (times, _))| times.len() >= 2)
        .map(|(id, (times, login))| (id, mean(&times), login))
        .min_by(|(_, a, la), (_, b, lb)| a.total_cmp(b).then_with(|| la.cmp(lb)))
        .map(|(id, _, _)| id)
}

/// Authors keeping at least 80% of three or more PRs at 100 lines or
/// under
pub fn small_pr_champions(created: &[PullRequest]) -> Vec<Uuid> {
    let mut by_author: HashMap<Uuid, (usize, usize)> = HashMap::new();
    for pr in created {
        let entry = by_author.entry(pr.author_id).or_default();
        entry.0 += 1;
        if i64::from(pr.additions) + i64::from(pr.deletions) <= SMALL_PR_LINES {
            entry.1 += 1;
        }
    }
    let mut winners: Vec<Uuid> = by_author
        .into_iter()
        .filter(|(_, (total, small))| *total >= 3 && *small as f64 / *total as f64 >= 0.8)
        .map(|(id, _)| id)
        .collect();
    winners.sort_unstable();
    winners
}

/// Reviewers active on five consecutive calendar days (UTC)
pub fn consistency_stars(reviews: &[ReviewWithContext]) -> Vec<Uuid> {
    let mut days: HashMap<Uuid, BTreeSet<NaiveDate>> = HashMap::new();
    for item in reviews {
        days.entry(item.reviewer.id)
            .or_default()
            .insert(item.review.submitted_at.date_naive());
    }
    let mut winners: Vec<Uuid> = days
        .into_iter()
        .filter(|(_, dates)| has_consecutive_run(dates, CONSISTENCY_DAYS))
        .map(|(id, _)| id)
        .collect();
    winners.sort_unstable();
    winners
}

fn has_consecutive_run(dates: &BTreeSet<NaiveDate>, run: usize) -> bool {
    if run <= 1 {
        return !dates.is_empty();
    }
    let mut streak = 1;
    let mut prev: Option<NaiveDate> = None;
    for date in dates {
        match prev {
            Some(p) if *date == p + Duration::days(1) => {
                streak += 1;
                if streak >= run {
                    return true;
                }
            }
            Some(_) => streak = 1,
            None => {}
        }
        prev = Some(*date);
    }
    false
}

/// Every (user, badge) pair earned over one week of activity
pub fn weekly_awards(
    rankings: &[RankedReviewer],
    reviews: &[ReviewWithContext],
    merged: &[PullRequest],
    created: &[PullRequest],
) -> Vec<(Uuid, &'static str)> {
    let mut awards = Vec::new();
    if let Some(user) = review_king(rankings) {
        awards.push((user, defs::REVIEW_KING));
    }
    if let Some(user) = lightning_reviewer(rankings) {
        awards.push((user, defs::LIGHTNING_REVIEWER));
    }
    for user in streak_masters(merged) {
        awards.push((user, defs::STREAK_MASTER));
    }
    if let Some(user) = most_helpful(reviews) {
        awards.push((user, defs::MOST_HELPFUL));
    }
    if let Some(user) = fastest_approver(reviews) {
        awards.push((user, defs::FASTEST_APPROVER));
    }
    for user in small_pr_champions(created) {
        awards.push((user, defs::SMALL_PR_CHAMPION));
    }
    for user in consistency_stars(reviews) {
        awards.push((user, defs::CONSISTENCY_STAR));
    }
    awards
}

/// Counters returned by one sweep run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BadgeSweep {
    pub installations: usize,
    pub awarded: usize,
}

/// Evaluate and award the weekly badges for every active installation
pub async fn sweep(store: &dyn Store, now: DateTime<Utc>) -> Result<BadgeSweep> {
    let period = iso_week_period(now);
    let mut outcome = BadgeSweep::default();

    for badge in definitions() {
        store.ensure_badge(&badge).await?;
    }

    for installation in store.all_installations().await? {
        match sweep_installation(store, installation.id, &period, now).await {
            Ok(awarded) => {
                outcome.installations += 1;
                outcome.awarded += awarded;
            }
            Err(e) => {
                error!(
                    "Badge sweep failed for {}: {}",
                    installation.account_login, e
                );
            }
        }
    }

    info!("Badge sweep for {}: {} new awards", period, outcome.awarded);
    Ok(outcome)
}

async fn sweep_installation(
    store: &dyn Store,
    installation_id: Uuid,
    period: &str,
    now: DateTime<Utc>,
) -> Result<usize> {
    let scope = StatsScope {
        installation_id,
        repo_id: None,
        from: now - Duration::days(7),
        to: now,
    };

    let reviews = store.reviews_in(&scope).await?;
    let merged = store.prs_merged_in(&scope).await?;
    let created = store.prs_created_in(&scope).await?;
    let rankings = rank_reviewers(&reviews);

    let mut awarded = 0;
    for (user_id, badge_id) in weekly_awards(&rankings, &reviews, &merged, &created) {
        if store.award_badge(user_id, badge_id, period).await? {
            awarded += 1;
            info!("🏆 Badge {} newly awarded to user {:?}", badge_id, user_id);
        }
    }
    Ok(awarded)
}
