//! Notification settings queries

use common::models::NotificationSettings;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const COLUMNS: &str = "installation_id, channel, stale_pr_alert_enabled, \
     hot_streak_alert_enabled, auto_praise_enabled, weekly_report_enabled, \
     daily_digest_enabled, stale_pr_threshold_hours";

fn map_settings(row: &PgRow) -> NotificationSettings {
    NotificationSettings {
        installation_id: row.get("installation_id"),
        channel: row.get("channel"),
        stale_pr_alert_enabled: row.get("stale_pr_alert_enabled"),
        hot_streak_alert_enabled: row.get("hot_streak_alert_enabled"),
        auto_praise_enabled: row.get("auto_praise_enabled"),
        weekly_report_enabled: row.get("weekly_report_enabled"),
        daily_digest_enabled: row.get("daily_digest_enabled"),
        stale_pr_threshold_hours: row.get("stale_pr_threshold_hours"),
    }
}

/// Settings for one installation
pub async fn get(
    pool: &PgPool,
    installation_id: Uuid,
) -> Result<Option<NotificationSettings>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM notification_settings WHERE installation_id = $1"
    ))
    .bind(installation_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_settings))
}
