//! Review queries

use chrono::{DateTime, Utc};
use common::models::{Review, ReviewState, User};
use common::store::{NewReview, ReviewWithContext, StatsScope};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub(crate) fn parse_review_state(s: &str) -> ReviewState {
    match s {
        "approved" => ReviewState::Approved,
        "changes_requested" => ReviewState::ChangesRequested,
        "dismissed" => ReviewState::Dismissed,
        _ => ReviewState::Commented,
    }
}

pub(crate) fn review_state_str(state: &ReviewState) -> &'static str {
    match state {
        ReviewState::Approved => "approved",
        ReviewState::ChangesRequested => "changes_requested",
        ReviewState::Commented => "commented",
        ReviewState::Dismissed => "dismissed",
    }
}

fn map_review(row: &PgRow) -> Review {
    Review {
        id: row.get("id"),
        pr_id: row.get("pr_id"),
        reviewer_id: row.get("reviewer_id"),
        github_id: row.get("github_id"),
        state: parse_review_state(row.get("state")),
        submitted_at: row.get("submitted_at"),
        response_time_ms: row.get("response_time_ms"),
    }
}

/// Insert a review; on a redelivered github id, return the stored row
/// untouched. The flag is true only for a fresh insert.
pub async fn upsert(pool: &PgPool, review: &NewReview) -> Result<(Review, bool), sqlx::Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO reviews (id, pr_id, reviewer_id, github_id, state, submitted_at, response_time_ms)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (github_id) DO NOTHING
        RETURNING id, pr_id, reviewer_id, github_id, state, submitted_at, response_time_ms
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(review.pr_id)
    .bind(review.reviewer_id)
    .bind(review.github_id)
    .bind(review_state_str(&review.state))
    .bind(review.submitted_at)
    .bind(review.response_time_ms)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = inserted {
        return Ok((map_review(&row), true));
    }

    let existing = sqlx::query(
        r#"
        SELECT id, pr_id, reviewer_id, github_id, state, submitted_at, response_time_ms
        FROM reviews
        WHERE github_id = $1
        "#,
    )
    .bind(review.github_id)
    .fetch_one(pool)
    .await?;

    Ok((map_review(&existing), false))
}

const CONTEXT_COLUMNS: &str = "r.id, r.pr_id, r.reviewer_id, r.github_id, r.state, \
     r.submitted_at, r.response_time_ms, \
     u.id AS user_id, u.github_id AS user_github_id, u.login, u.avatar_url, \
     u.created_at AS user_created_at, \
     pr.created_at AS pr_created_at";

fn map_context(row: &PgRow) -> ReviewWithContext {
    ReviewWithContext {
        review: map_review(row),
        reviewer: User {
            id: row.get("user_id"),
            github_id: row.get("user_github_id"),
            login: row.get("login"),
            avatar_url: row.get("avatar_url"),
            created_at: row.get("user_created_at"),
        },
        pr_created_at: row.get("pr_created_at"),
    }
}

/// Reviews submitted inside the scope window, with reviewer and PR
/// context
pub async fn in_scope(
    pool: &PgPool,
    scope: &StatsScope,
) -> Result<Vec<ReviewWithContext>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {CONTEXT_COLUMNS}
        FROM reviews r
        JOIN users u ON u.id = r.reviewer_id
        JOIN pull_requests pr ON pr.id = r.pr_id
        JOIN repositories repo ON repo.id = pr.repo_id
        WHERE repo.installation_id = $1
          AND ($2::uuid IS NULL OR pr.repo_id = $2)
          AND r.state != 'dismissed'
          AND r.submitted_at >= $3 AND r.submitted_at < $4
        ORDER BY r.submitted_at ASC
        "#,
    ))
    .bind(scope.installation_id)
    .bind(scope.repo_id)
    .bind(scope.from)
    .bind(scope.to)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_context).collect())
}

/// Most recent reviews across the whole installation, newest first
pub async fn recent(
    pool: &PgPool,
    installation_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<ReviewWithContext>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {CONTEXT_COLUMNS}
        FROM reviews r
        JOIN users u ON u.id = r.reviewer_id
        JOIN pull_requests pr ON pr.id = r.pr_id
        JOIN repositories repo ON repo.id = pr.repo_id
        WHERE repo.installation_id = $1
          AND r.state != 'dismissed'
          AND r.submitted_at >= $2 AND r.submitted_at < $3
        ORDER BY r.submitted_at DESC
        LIMIT $4
        "#,
    ))
    .bind(installation_id)
    .bind(from)
    .bind(to)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_context).collect())
}
