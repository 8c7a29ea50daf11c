//! Weekly report and daily digest sweeps

use chrono::{DateTime, Duration, Utc};
use common::models::{Installation, PrState};
use common::notify::{Alert, Notifier};
use common::store::{StatsScope, StatsStore};
use common::Result;
use serde::Serialize;
use tracing::{error, info};

use crate::overview::merge_averages;
use crate::ranking::rank_reviewers;

/// Counters returned by one report run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSweep {
    pub installations: usize,
    pub sent: usize,
}

/// Send the weekly summary to every installation that wants one. A
/// week with no PR activity sends nothing.
pub async fn weekly_report(
    store: &dyn StatsStore,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<ReportSweep> {
    let mut outcome = ReportSweep::default();

    for installation in store.all_installations().await? {
        match weekly_for(store, notifier, &installation, now).await {
            Ok(Some(sent)) => {
                outcome.installations += 1;
                if sent {
                    outcome.sent += 1;
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!(
                    "Weekly report failed for {}: {}",
                    installation.account_login, e
                );
            }
        }
    }

    info!("Weekly report: {} sent", outcome.sent);
    Ok(outcome)
}

async fn weekly_for(
    store: &dyn StatsStore,
    notifier: &dyn Notifier,
    installation: &Installation,
    now: DateTime<Utc>,
) -> Result<Option<bool>> {
    let settings = match store.notification_settings(installation.id).await? {
        Some(s) => s,
        None => return Ok(None),
    };
    if !settings.weekly_report_enabled {
        return Ok(None);
    }
    let channel = match settings.channel {
        Some(c) => c,
        None => return Ok(None),
    };

    let from = now - Duration::days(7);
    let scope = StatsScope {
        installation_id: installation.id,
        repo_id: None,
        from,
        to: now,
    };

    let prs = store.prs_created_in(&scope).await?;
    if prs.is_empty() {
        return Ok(Some(false));
    }

    let merged = prs.iter().filter(|pr| pr.state == PrState::Merged).count();
    let averages = merge_averages(&prs);

    let reviews = store.reviews_in(&scope).await?;
    let rankings = rank_reviewers(&reviews);
    let top_reviewer = rankings.first().map(|r| (r.login.clone(), r.review_count));

    let alert = Alert::WeeklyReport {
        org: installation.account_login.clone(),
        period: format!("{} - {}", from.format("%m/%d"), now.format("%m/%d")),
        total_prs: prs.len(),
        merged_prs: merged,
        avg_merge_ms: averages.avg_merge_ms.round() as i64,
        avg_first_review_ms: averages.avg_first_review_ms.round() as i64,
        top_reviewer,
    };
    notifier.send(&channel, &alert).await?;
    Ok(Some(true))
}

/// Send the daily activity digest. A day with nothing opened, merged,
/// or reviewed sends nothing, even when PRs are still waiting.
pub async fn daily_digest(
    store: &dyn StatsStore,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<ReportSweep> {
    let mut outcome = ReportSweep::default();

    for installation in store.all_installations().await? {
        match daily_for(store, notifier, &installation, now).await {
            Ok(Some(sent)) => {
                outcome.installations += 1;
                if sent {
                    outcome.sent += 1;
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!(
                    "Daily digest failed for {}: {}",
                    installation.account_login, e
                );
            }
        }
    }

    info!("Daily digest: {} sent", outcome.sent);
    Ok(outcome)
}

async fn daily_for(
    store: &dyn StatsStore,
    notifier: &dyn Notifier,
    installation: &Installation,
    now: DateTime<Utc>,
) -> Result<Option<bool>> {
    let settings = match store.notification_settings(installation.id).await? {
        Some(s) => s,
        None => return Ok(None),
    };
    if !settings.daily_digest_enabled {
        return Ok(None);
    }
    let channel = match settings.channel {
        Some(c) => c,
        None => return Ok(None),
    };

    let scope = StatsScope {
        installation_id: installation.id,
        repo_id: None,
        from: now - Duration::days(1),
        to: now,
    };

    let opened = store.prs_created_in(&scope).await?.len();
    let merged = store.prs_merged_in(&scope).await?.len();
    let reviewed = store.reviews_in(&scope).await?.len();

    if opened == 0 && merged == 0 && reviewed == 0 {
        return Ok(Some(false));
    }

    let awaiting = store
        .stale_candidates(installation.id)
        .await?
        .iter()
        .filter(|c| c.pr.first_review_at.is_none())
        .count();

    let alert = Alert::DailyDigest {
        org: installation.account_login.clone(),
        opened,
        merged,
        reviewed,
        awaiting_review: awaiting,
    };
    notifier.send(&channel, &alert).await?;
    Ok(Some(true))
}
