//! Hot-streak detection for PR authors

use common::models::PullRequest;
use common::notify::{Alert, Notifier};
use common::store::StatsStore;
use common::Result;
use tracing::{info, warn};
use uuid::Uuid;

/// Merges in a row that make a streak
pub const STREAK_LEN: usize = 3;
/// Each merge must have landed within an hour
pub const FAST_MERGE_MS: i64 = 3_600_000;

/// True when the author's most recent merges, newest first, are a full
/// streak of fast ones. A merge without a measured duration breaks the
/// streak.
pub fn is_hot_streak(recent: &[PullRequest]) -> bool {
    recent.len() >= STREAK_LEN
        && recent[..STREAK_LEN]
            .iter()
            .all(|pr| matches!(pr.time_to_merge_ms, Some(ms) if ms <= FAST_MERGE_MS))
}

/// Check an author after a merge and celebrate a streak. Returns true
/// when an alert went out.
pub async fn check(
    store: &dyn StatsStore,
    notifier: &dyn Notifier,
    installation_id: Uuid,
    author_id: Uuid,
) -> Result<bool> {
    let settings = match store.notification_settings(installation_id).await? {
        Some(s) => s,
        None => return Ok(false),
    };
    if !settings.hot_streak_alert_enabled {
        return Ok(false);
    }
    let channel = match settings.channel {
        Some(c) => c,
        None => return Ok(false),
    };

    let recent = store
        .merged_prs_by_author(installation_id, author_id, None, STREAK_LEN as i64)
        .await?;
    if !is_hot_streak(&recent) {
        return Ok(false);
    }

    let author = match store.user_by_id(author_id).await? {
        Some(user) => user,
        None => {
            warn!("Streak detected for unknown author {}", author_id);
            return Ok(false);
        }
    };

    info!("🔥 Hot streak: {} merged {} fast PRs in a row", author.login, STREAK_LEN);
    notifier
        .send(
            &channel,
            &Alert::HotStreak {
                login: author.login,
                count: STREAK_LEN,
            },
        )
        .await?;

    Ok(true)
}
