//! Repository queries

use common::models::Repository;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn map_repo(row: &PgRow) -> Repository {
    Repository {
        id: row.get("id"),
        installation_id: row.get("installation_id"),
        github_id: row.get("github_id"),
        owner: row.get("owner"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

/// Get or create a repository
pub async fn upsert(
    pool: &PgPool,
    installation_id: Uuid,
    github_id: i64,
    owner: &str,
    name: &str,
) -> Result<Repository, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO repositories (id, installation_id, github_id, owner, name, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        ON CONFLICT (github_id) DO UPDATE
        SET owner = EXCLUDED.owner, name = EXCLUDED.name
        RETURNING id, installation_id, github_id, owner, name, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(installation_id)
    .bind(github_id)
    .bind(owner)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(map_repo(&row))
}

pub async fn get_by_id(pool: &PgPool, repo_id: Uuid) -> Result<Option<Repository>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, installation_id, github_id, owner, name, created_at
        FROM repositories
        WHERE id = $1
        "#,
    )
    .bind(repo_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_repo))
}
