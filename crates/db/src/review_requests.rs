//! Review request queries

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::models::ReviewRequest;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn map_request(row: &PgRow) -> ReviewRequest {
    ReviewRequest {
        id: row.get("id"),
        pr_id: row.get("pr_id"),
        reviewer_id: row.get("reviewer_id"),
        requested_at: row.get("requested_at"),
        fulfilled_at: row.get("fulfilled_at"),
    }
}

/// Record a review request
pub async fn create(
    pool: &PgPool,
    pr_id: Uuid,
    reviewer_id: Uuid,
    requested_at: DateTime<Utc>,
    fulfilled_at: Option<DateTime<Utc>>,
) -> Result<ReviewRequest, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO review_requests (id, pr_id, reviewer_id, requested_at, fulfilled_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, pr_id, reviewer_id, requested_at, fulfilled_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(pr_id)
    .bind(reviewer_id)
    .bind(requested_at)
    .bind(fulfilled_at)
    .fetch_one(pool)
    .await?;

    Ok(map_request(&row))
}

/// Latest unfulfilled request for one reviewer on one PR
pub async fn latest_pending(
    pool: &PgPool,
    pr_id: Uuid,
    reviewer_id: Uuid,
) -> Result<Option<ReviewRequest>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, pr_id, reviewer_id, requested_at, fulfilled_at
        FROM review_requests
        WHERE pr_id = $1 AND reviewer_id = $2 AND fulfilled_at IS NULL
        ORDER BY requested_at DESC
        LIMIT 1
        "#,
    )
    .bind(pr_id)
    .bind(reviewer_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_request))
}

/// Mark a request as answered
pub async fn fulfil(
    pool: &PgPool,
    request_id: Uuid,
    fulfilled_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE review_requests SET fulfilled_at = $2 WHERE id = $1")
        .bind(request_id)
        .bind(fulfilled_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Unfulfilled requests on one PR
pub async fn pending_for_pr(
    pool: &PgPool,
    pr_id: Uuid,
) -> Result<Vec<ReviewRequest>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, pr_id, reviewer_id, requested_at, fulfilled_at
        FROM review_requests
        WHERE pr_id = $1 AND fulfilled_at IS NULL
        ORDER BY requested_at ASC
        "#,
    )
    .bind(pr_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_request).collect())
}

/// Unfulfilled request counts per reviewer. Reviewers with no pending
/// requests are absent from the map.
pub async fn pending_counts(
    pool: &PgPool,
    reviewer_ids: &[Uuid],
) -> Result<HashMap<Uuid, i64>, sqlx::Error> {
    if reviewer_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query(
        r#"
        SELECT reviewer_id, COUNT(*) AS pending
        FROM review_requests
        WHERE reviewer_id = ANY($1) AND fulfilled_at IS NULL
        GROUP BY reviewer_id
        "#,
    )
    .bind(reviewer_ids.to_vec())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("reviewer_id"), row.get::<i64, _>("pending")))
        .collect())
}
