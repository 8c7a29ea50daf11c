//! Badge queries

use common::models::Badge;
use sqlx::PgPool;
use uuid::Uuid;

fn tier_str(badge: &Badge) -> &'static str {
    match badge.tier {
        common::models::BadgeTier::Gold => "gold",
        common::models::BadgeTier::Silver => "silver",
        common::models::BadgeTier::Bronze => "bronze",
    }
}

/// Insert or refresh a badge definition
pub async fn ensure(pool: &PgPool, badge: &Badge) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO badges (id, name, description, emoji, tier)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name,
            description = EXCLUDED.description,
            emoji = EXCLUDED.emoji,
            tier = EXCLUDED.tier
        "#,
    )
    .bind(&badge.id)
    .bind(&badge.name)
    .bind(&badge.description)
    .bind(&badge.emoji)
    .bind(tier_str(badge))
    .execute(pool)
    .await?;
    Ok(())
}

/// Award a badge for one period. Returns false when the user already
/// held it for that period.
pub async fn award(
    pool: &PgPool,
    user_id: Uuid,
    badge_id: &str,
    period: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_badges (user_id, badge_id, period, awarded_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (user_id, badge_id, period) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(badge_id)
    .bind(period)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
