//! User queries

use common::models::User;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn map_user(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        github_id: row.get("github_id"),
        login: row.get("login"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
    }
}

/// Get or create a user from GitHub data
pub async fn upsert(
    pool: &PgPool,
    github_id: i64,
    login: &str,
    avatar_url: Option<&str>,
) -> Result<User, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO users (id, github_id, login, avatar_url, created_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (github_id) DO UPDATE
        SET login = EXCLUDED.login,
            avatar_url = EXCLUDED.avatar_url
        RETURNING id, github_id, login, avatar_url, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(github_id)
    .bind(login)
    .bind(avatar_url)
    .fetch_one(pool)
    .await?;

    Ok(map_user(&row))
}

pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, github_id, login, avatar_url, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_user))
}
