//! Installation queries

use common::models::Installation;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn map_installation(row: &PgRow) -> Installation {
    Installation {
        id: row.get("id"),
        github_id: row.get("github_id"),
        account_login: row.get("account_login"),
        suspended: row.get("suspended"),
        created_at: row.get("created_at"),
    }
}

/// Get or create an installation
pub async fn upsert(
    pool: &PgPool,
    github_id: i64,
    account_login: &str,
) -> Result<Installation, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO installations (id, github_id, account_login, created_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (github_id) DO UPDATE
        SET account_login = EXCLUDED.account_login
        RETURNING id, github_id, account_login, suspended, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(github_id)
    .bind(account_login)
    .fetch_one(pool)
    .await?;

    Ok(map_installation(&row))
}

/// List installations that are not suspended
pub async fn list_active(pool: &PgPool) -> Result<Vec<Installation>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, github_id, account_login, suspended, created_at
        FROM installations
        WHERE suspended = FALSE
        ORDER BY account_login
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_installation).collect())
}
