//! Stale-PR sweep.
//!
//! Open PRs are classified by how far through review they got, so the
//! three alert categories never overlap: no review yet, reviewed but
//! not approved, approved but unmerged.

use chrono::{DateTime, Duration, Utc};
use common::models::{Installation, ReviewState};
use common::notify::{Alert, Notifier, PrRef};
use common::store::{StaleCandidate, StatsStore};
use common::Result;
use serde::Serialize;
use tracing::{error, info, warn};

/// Hours a reviewed-but-unapproved PR may sit after its latest review
const REVIEWED_STALE_HOURS: i64 = 24;
/// Hours an approved PR may sit unmerged
const APPROVED_STALE_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleCategory {
    AwaitingFirstReview,
    ReviewedNotApproved,
    ApprovedUnmerged,
}

/// Classify one open PR, returning how long it has been waiting.
/// `threshold_hours` only applies to the awaiting-first-review case;
/// the other two categories use fixed thresholds.
pub fn classify(
    candidate: &StaleCandidate,
    threshold_hours: i64,
    now: DateTime<Utc>,
) -> Option<(StaleCategory, i64)> {
    let pr = &candidate.pr;

    if pr.first_review_at.is_none() {
        let waiting = now - pr.created_at;
        if waiting >= Duration::hours(threshold_hours) {
            return Some((
                StaleCategory::AwaitingFirstReview,
                waiting.num_milliseconds(),
            ));
        }
        return None;
    }

    if let Some(approved_at) = pr.first_approval_at {
        let waiting = now - approved_at;
        if waiting >= Duration::hours(APPROVED_STALE_HOURS) {
            return Some((StaleCategory::ApprovedUnmerged, waiting.num_milliseconds()));
        }
        return None;
    }

    // Reviewed but not approved, measured from the latest review
    if let Some(last_review) = candidate.last_review_at {
        let waiting = now - last_review;
        if waiting >= Duration::hours(REVIEWED_STALE_HOURS) {
            return Some((
                StaleCategory::ReviewedNotApproved,
                waiting.num_milliseconds(),
            ));
        }
    }
    None
}

fn alert_for(candidate: &StaleCandidate, category: StaleCategory, waiting_ms: i64) -> Alert {
    let pr = PrRef {
        repo: format!("{}/{}", candidate.repo_owner, candidate.repo_name),
        number: candidate.pr.number,
        title: candidate.pr.title.clone(),
        author: candidate.author_login.clone(),
    };
    match category {
        StaleCategory::AwaitingFirstReview => Alert::StalePr { pr, waiting_ms },
        StaleCategory::ReviewedNotApproved => Alert::ReviewedButStale {
            pr,
            waiting_ms,
            review_state: candidate
                .latest_review_state
                .clone()
                .unwrap_or(ReviewState::Commented),
        },
        StaleCategory::ApprovedUnmerged => Alert::ApprovedButUnmerged { pr, waiting_ms },
    }
}

/// Counters returned by one sweep run
#[derive(Debug, Clone, Default, Serialize)]
pub struct StaleSweep {
    pub installations: usize,
    pub alerts: usize,
}

/// Sweep every installation with stale alerts enabled. A failing
/// installation is logged and skipped, never aborts the sweep.
pub async fn sweep(
    store: &dyn StatsStore,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<StaleSweep> {
    let mut outcome = StaleSweep::default();

    for installation in store.all_installations().await? {
        match sweep_installation(store, notifier, &installation, now).await {
            Ok(Some(alerts)) => {
                outcome.installations += 1;
                outcome.alerts += alerts;
            }
            Ok(None) => {}
            Err(e) => {
                error!(
                    "Stale sweep failed for {}: {}",
                    installation.account_login, e
                );
            }
        }
    }

    info!(
        "Stale sweep covered {} installations, {} alerts",
        outcome.installations, outcome.alerts
    );
    Ok(outcome)
}

/// Returns None when the installation has stale alerts disabled
async fn sweep_installation(
    store: &dyn StatsStore,
    notifier: &dyn Notifier,
    installation: &Installation,
    now: DateTime<Utc>,
) -> Result<Option<usize>> {
    let settings = match store.notification_settings(installation.id).await? {
        Some(s) => s,
        None => return Ok(None),
    };
    if !settings.stale_pr_alert_enabled {
        return Ok(None);
    }
    let channel = match settings.channel {
        Some(c) => c,
        None => return Ok(None),
    };
    let threshold = i64::from(settings.stale_pr_threshold_hours);

    let mut alerts = 0;
    for candidate in store.stale_candidates(installation.id).await? {
        let (category, waiting_ms) = match classify(&candidate, threshold, now) {
            Some(hit) => hit,
            None => continue,
        };
        let alert = alert_for(&candidate, category, waiting_ms);
        if let Err(e) = notifier.send(&channel, &alert).await {
            warn!(
                "Could not deliver stale alert for PR #{}: {}",
                candidate.pr.number, e
            );
            continue;
        }
        alerts += 1;
    }

    Ok(Some(alerts))
}
