//! Pull request queries

#![allow(clippy::too_many_arguments)]

use chrono::{DateTime, Utc};
use common::models::{PrState, PullRequest};
use common::store::{NewPullRequest, StaleCandidate, StatsScope};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::reviews::parse_review_state;

pub(crate) fn parse_pr_state(s: &str) -> PrState {
    match s {
        "draft" => PrState::Draft,
        "merged" => PrState::Merged,
        "closed" => PrState::Closed,
        _ => PrState::Open,
    }
}

pub(crate) fn pr_state_str(state: &PrState) -> &'static str {
    match state {
        PrState::Open => "open",
        PrState::Draft => "draft",
        PrState::Merged => "merged",
        PrState::Closed => "closed",
    }
}

const PR_COLUMNS: &str = "pr.id, pr.repo_id, pr.github_id, pr.number, pr.title, pr.author_id, \
     pr.state, pr.additions, pr.deletions, pr.created_at, pr.first_review_at, \
     pr.first_approval_at, pr.merged_at, pr.closed_at, pr.time_to_first_review_ms, \
     pr.time_to_merge_ms, pr.revision_count, pr.review_cycle_count, pr.has_conflict, \
     pr.conflict_detected_at, pr.conflict_resolved_at";

fn map_pr(row: &PgRow) -> PullRequest {
    PullRequest {
        id: row.get("id"),
        repo_id: row.get("repo_id"),
        github_id: row.get("github_id"),
        number: row.get("number"),
        title: row.get("title"),
        author_id: row.get("author_id"),
        state: parse_pr_state(row.get("state")),
        additions: row.get("additions"),
        deletions: row.get("deletions"),
        created_at: row.get("created_at"),
        first_review_at: row.get("first_review_at"),
        first_approval_at: row.get("first_approval_at"),
        merged_at: row.get("merged_at"),
        closed_at: row.get("closed_at"),
        time_to_first_review_ms: row.get("time_to_first_review_ms"),
        time_to_merge_ms: row.get("time_to_merge_ms"),
        revision_count: row.get("revision_count"),
        review_cycle_count: row.get("review_cycle_count"),
        has_conflict: row.get("has_conflict"),
        conflict_detected_at: row.get("conflict_detected_at"),
        conflict_resolved_at: row.get("conflict_resolved_at"),
    }
}

/// Create a pull request, or refresh its mutable fields on redelivery
pub async fn upsert(pool: &PgPool, pr: &NewPullRequest) -> Result<PullRequest, sqlx::Error> {
    let state = if pr.draft { PrState::Draft } else { PrState::Open };
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO pull_requests AS pr
            (id, repo_id, github_id, number, title, author_id, state, additions, deletions, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (github_id) DO UPDATE
        SET title = EXCLUDED.title,
            additions = EXCLUDED.additions,
            deletions = EXCLUDED.deletions
        RETURNING {PR_COLUMNS}
        "#,
    ))
    .bind(Uuid::new_v4())
    .bind(pr.repo_id)
    .bind(pr.github_id)
    .bind(pr.number)
    .bind(&pr.title)
    .bind(pr.author_id)
    .bind(pr_state_str(&state))
    .bind(pr.additions)
    .bind(pr.deletions)
    .bind(pr.created_at)
    .fetch_one(pool)
    .await?;

    Ok(map_pr(&row))
}

/// Get PR by internal id
pub async fn get_by_id(pool: &PgPool, pr_id: Uuid) -> Result<Option<PullRequest>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {PR_COLUMNS} FROM pull_requests pr WHERE pr.id = $1"
    ))
    .bind(pr_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_pr))
}

/// Get PR by GitHub id
pub async fn get_by_github_id(
    pool: &PgPool,
    github_id: i64,
) -> Result<Option<PullRequest>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {PR_COLUMNS} FROM pull_requests pr WHERE pr.github_id = $1"
    ))
    .bind(github_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_pr))
}

/// Update title and line counts after an edit or push
pub async fn update_details(
    pool: &PgPool,
    pr_id: Uuid,
    title: Option<&str>,
    additions: i32,
    deletions: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE pull_requests
        SET title = COALESCE($2, title),
            additions = $3,
            deletions = $4
        WHERE id = $1
        "#,
    )
    .bind(pr_id)
    .bind(title)
    .bind(additions)
    .bind(deletions)
    .execute(pool)
    .await?;
    Ok(())
}

/// Flip between open and draft
pub async fn set_state(pool: &PgPool, pr_id: Uuid, state: PrState) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE pull_requests SET state = $2 WHERE id = $1")
        .bind(pr_id)
        .bind(pr_state_str(&state))
        .execute(pool)
        .await?;
    Ok(())
}

/// Close or merge a PR and stamp the derived merge duration
pub async fn finish(
    pool: &PgPool,
    pr_id: Uuid,
    state: PrState,
    closed_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    time_to_merge_ms: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE pull_requests
        SET state = $2,
            closed_at = $3,
            merged_at = COALESCE($4, merged_at),
            time_to_merge_ms = COALESCE($5, time_to_merge_ms)
        WHERE id = $1
        "#,
    )
    .bind(pr_id)
    .bind(pr_state_str(&state))
    .bind(closed_at)
    .bind(merged_at)
    .bind(time_to_merge_ms)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn bump_revision_count(pool: &PgPool, pr_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE pull_requests SET revision_count = revision_count + 1 WHERE id = $1")
        .bind(pr_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn bump_review_cycle_count(pool: &PgPool, pr_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE pull_requests SET review_cycle_count = review_cycle_count + 1 WHERE id = $1",
    )
    .bind(pr_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record a conflict, keeping the first detection time
pub async fn mark_conflict(
    pool: &PgPool,
    pr_id: Uuid,
    detected_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE pull_requests
        SET has_conflict = TRUE,
            conflict_detected_at = COALESCE(conflict_detected_at, $2)
        WHERE id = $1
        "#,
    )
    .bind(pr_id)
    .bind(detected_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Clear a conflict once the PR is mergeable again
pub async fn resolve_conflict(
    pool: &PgPool,
    pr_id: Uuid,
    resolved_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE pull_requests
        SET has_conflict = FALSE,
            conflict_resolved_at = $2
        WHERE id = $1 AND has_conflict = TRUE
        "#,
    )
    .bind(pr_id)
    .bind(resolved_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record first review time, only if not already set
pub async fn set_first_review(
    pool: &PgPool,
    pr_id: Uuid,
    at: DateTime<Utc>,
    time_to_first_review_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE pull_requests
        SET first_review_at = $2,
            time_to_first_review_ms = $3
        WHERE id = $1 AND first_review_at IS NULL
        "#,
    )
    .bind(pr_id)
    .bind(at)
    .bind(time_to_first_review_ms)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record first approval time, only if not already set
pub async fn set_first_approval(
    pool: &PgPool,
    pr_id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE pull_requests
        SET first_approval_at = $2
        WHERE id = $1 AND first_approval_at IS NULL
        "#,
    )
    .bind(pr_id)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(())
}

/// PRs created inside the scope window
pub async fn created_in(
    pool: &PgPool,
    scope: &StatsScope,
) -> Result<Vec<PullRequest>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {PR_COLUMNS}
        FROM pull_requests pr
        JOIN repositories repo ON repo.id = pr.repo_id
        WHERE repo.installation_id = $1
          AND ($2::uuid IS NULL OR pr.repo_id = $2)
          AND pr.created_at >= $3 AND pr.created_at < $4
        ORDER BY pr.created_at ASC
        "#,
    ))
    .bind(scope.installation_id)
    .bind(scope.repo_id)
    .bind(scope.from)
    .bind(scope.to)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_pr).collect())
}

/// PRs merged inside the scope window
pub async fn merged_in(
    pool: &PgPool,
    scope: &StatsScope,
) -> Result<Vec<PullRequest>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {PR_COLUMNS}
        FROM pull_requests pr
        JOIN repositories repo ON repo.id = pr.repo_id
        WHERE repo.installation_id = $1
          AND ($2::uuid IS NULL OR pr.repo_id = $2)
          AND pr.state = 'merged'
          AND pr.merged_at >= $3 AND pr.merged_at < $4
        ORDER BY pr.merged_at ASC
        "#,
    ))
    .bind(scope.installation_id)
    .bind(scope.repo_id)
    .bind(scope.from)
    .bind(scope.to)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_pr).collect())
}

/// Most recently merged PRs by one author, newest first
pub async fn merged_by_author(
    pool: &PgPool,
    installation_id: Uuid,
    author_id: Uuid,
    since: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<PullRequest>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {PR_COLUMNS}
        FROM pull_requests pr
        JOIN repositories repo ON repo.id = pr.repo_id
        WHERE repo.installation_id = $1
          AND pr.author_id = $2
          AND pr.state = 'merged'
          AND ($3::timestamptz IS NULL OR pr.merged_at >= $3)
        ORDER BY pr.merged_at DESC
        LIMIT $4
        "#,
    ))
    .bind(installation_id)
    .bind(author_id)
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_pr).collect())
}

/// Open, non-draft PRs in an installation with author, repo, and the
/// latest review attached
pub async fn stale_candidates(
    pool: &PgPool,
    installation_id: Uuid,
) -> Result<Vec<StaleCandidate>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {PR_COLUMNS},
            author.login AS author_login,
            repo.owner AS repo_owner,
            repo.name AS repo_name,
            latest.submitted_at AS last_review_at,
            latest.state AS latest_review_state
        FROM pull_requests pr
        JOIN repositories repo ON repo.id = pr.repo_id
        JOIN users author ON author.id = pr.author_id
        LEFT JOIN LATERAL (
            SELECT r.submitted_at, r.state
            FROM reviews r
            WHERE r.pr_id = pr.id
            ORDER BY r.submitted_at DESC
            LIMIT 1
        ) latest ON TRUE
        WHERE repo.installation_id = $1 AND pr.state = 'open'
        ORDER BY pr.created_at ASC
        "#,
    ))
    .bind(installation_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| StaleCandidate {
            pr: map_pr(row),
            author_login: row.get("author_login"),
            repo_owner: row.get("repo_owner"),
            repo_name: row.get("repo_name"),
            last_review_at: row.get("last_review_at"),
            latest_review_state: row
                .get::<Option<String>, _>("latest_review_state")
                .map(|s| parse_review_state(s.as_str())),
        })
        .collect())
}
