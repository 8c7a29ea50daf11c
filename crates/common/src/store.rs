//! Storage ports.
//!
//! The analytics engines only ever see these traits; the `db` crate
//! provides the Postgres implementation and tests provide an in-memory
//! one. Queries stay coarse (fetch rows for a window, compute in the
//! engine) so every rule lives in testable code rather than SQL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Badge, Installation, NotificationSettings, PrState, PullRequest, Repository, Review,
    ReviewRequest, ReviewState, User,
};

/// Window every statistics query runs over. `repo_id = None` means the
/// whole installation. Ranges are half-open: `from <= t < to`.
#[derive(Debug, Clone)]
pub struct StatsScope {
    pub installation_id: Uuid,
    pub repo_id: Option<Uuid>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl StatsScope {
    /// The same window shifted one full length into the past, used for
    /// trend comparison
    pub fn previous(&self) -> StatsScope {
        let span = self.to - self.from;
        StatsScope {
            installation_id: self.installation_id,
            repo_id: self.repo_id,
            from: self.from - span,
            to: self.from,
        }
    }
}

/// A review joined with its reviewer and the PR's creation time, enough
/// context to compute response times without touching the store again
#[derive(Debug, Clone)]
pub struct ReviewWithContext {
    pub review: Review,
    pub reviewer: User,
    pub pr_created_at: DateTime<Utc>,
}

/// An open, non-draft PR with the context the stale sweep needs
#[derive(Debug, Clone)]
pub struct StaleCandidate {
    pub pr: PullRequest,
    pub author_login: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub last_review_at: Option<DateTime<Utc>>,
    pub latest_review_state: Option<ReviewState>,
}

/// Read-side port for the statistics engines
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// PRs created inside the scope window
    async fn prs_created_in(&self, scope: &StatsScope) -> Result<Vec<PullRequest>>;

    /// PRs merged inside the scope window (keyed on `merged_at`)
    async fn prs_merged_in(&self, scope: &StatsScope) -> Result<Vec<PullRequest>>;

    /// Reviews submitted inside the scope window, with reviewer and PR
    /// context
    async fn reviews_in(&self, scope: &StatsScope) -> Result<Vec<ReviewWithContext>>;

    /// Most recent reviews across the whole installation, newest first
    async fn recent_reviews(
        &self,
        installation_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ReviewWithContext>>;

    async fn pr_by_id(&self, pr_id: Uuid) -> Result<Option<PullRequest>>;

    async fn repo_by_id(&self, repo_id: Uuid) -> Result<Option<Repository>>;

    async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Most recently merged PRs by one author, newest first. `since`
    /// bounds the window when set.
    async fn merged_prs_by_author(
        &self,
        installation_id: Uuid,
        author_id: Uuid,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<PullRequest>>;

    /// Unfulfilled review requests on one PR
    async fn pending_requests_for_pr(&self, pr_id: Uuid) -> Result<Vec<ReviewRequest>>;

    /// Unfulfilled review-request counts per reviewer
    async fn pending_request_counts(
        &self,
        reviewer_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, i64>>;

    async fn all_installations(&self) -> Result<Vec<Installation>>;

    async fn notification_settings(
        &self,
        installation_id: Uuid,
    ) -> Result<Option<NotificationSettings>>;

    /// Open, non-draft PRs in an installation with the context the
    /// stale sweep and daily digest need
    async fn stale_candidates(&self, installation_id: Uuid) -> Result<Vec<StaleCandidate>>;
}

/// Write-side port for badge definitions and awards
#[async_trait]
pub trait BadgeStore: Send + Sync {
    /// Insert or refresh a badge definition
    async fn ensure_badge(&self, badge: &Badge) -> Result<()>;

    /// Award a badge for one period. Returns false when the user already
    /// held it for that period, so re-runs never double-award.
    async fn award_badge(&self, user_id: Uuid, badge_id: &str, period: &str) -> Result<bool>;
}

/// New PR payload for ingestion
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub repo_id: Uuid,
    pub author_id: Uuid,
    pub github_id: i64,
    pub number: i32,
    pub title: String,
    pub draft: bool,
    pub additions: i32,
    pub deletions: i32,
    pub created_at: DateTime<Utc>,
}

/// New review payload for ingestion
#[derive(Debug, Clone)]
pub struct NewReview {
    pub pr_id: Uuid,
    pub reviewer_id: Uuid,
    pub github_id: i64,
    pub state: ReviewState,
    pub submitted_at: DateTime<Utc>,
    pub response_time_ms: Option<i64>,
}

/// Write-side port for the event ingestion pipeline. Every method is a
/// small idempotent statement so redelivered events converge.
#[async_trait]
pub trait IngestStore: Send + Sync {
    async fn upsert_installation(&self, github_id: i64, account_login: &str)
        -> Result<Installation>;

    async fn upsert_repository(
        &self,
        installation_id: Uuid,
        github_id: i64,
        owner: &str,
        name: &str,
    ) -> Result<Repository>;

    async fn upsert_user(
        &self,
        github_id: i64,
        login: &str,
        avatar_url: Option<&str>,
    ) -> Result<User>;

    /// Insert a PR, or refresh its mutable fields when the github id is
    /// already known (webhook redelivery)
    async fn upsert_pr(&self, pr: &NewPullRequest) -> Result<PullRequest>;

    async fn pr_by_github_id(&self, github_id: i64) -> Result<Option<PullRequest>>;

    async fn update_pr_details(
        &self,
        pr_id: Uuid,
        title: Option<&str>,
        additions: i32,
        deletions: i32,
    ) -> Result<()>;

    async fn set_pr_state(&self, pr_id: Uuid, state: PrState) -> Result<()>;

    /// Close or merge a PR and stamp the derived merge duration
    async fn finish_pr(
        &self,
        pr_id: Uuid,
        state: PrState,
        closed_at: DateTime<Utc>,
        merged_at: Option<DateTime<Utc>>,
        time_to_merge_ms: Option<i64>,
    ) -> Result<()>;

    async fn bump_revision_count(&self, pr_id: Uuid) -> Result<()>;

    async fn bump_review_cycle_count(&self, pr_id: Uuid) -> Result<()>;

    /// Record a detected conflict; keeps the first detection time on
    /// repeat reports
    async fn mark_conflict(&self, pr_id: Uuid, detected_at: DateTime<Utc>) -> Result<()>;

    /// Clear a conflict once the PR is mergeable again
    async fn resolve_conflict(&self, pr_id: Uuid, resolved_at: DateTime<Utc>) -> Result<()>;

    async fn create_review_request(
        &self,
        pr_id: Uuid,
        reviewer_id: Uuid,
        requested_at: DateTime<Utc>,
        fulfilled_at: Option<DateTime<Utc>>,
    ) -> Result<ReviewRequest>;

    /// Latest unfulfilled request for one reviewer on one PR
    async fn latest_pending_request(
        &self,
        pr_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<Option<ReviewRequest>>;

    async fn fulfil_review_request(
        &self,
        request_id: Uuid,
        fulfilled_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Insert a review, or return the existing one for the same github
    /// id. The flag is true only for a fresh insert.
    async fn upsert_review(&self, review: &NewReview) -> Result<(Review, bool)>;

    /// Stamp first-review time and duration if not already set
    async fn set_first_review(
        &self,
        pr_id: Uuid,
        at: DateTime<Utc>,
        time_to_first_review_ms: i64,
    ) -> Result<()>;

    /// Stamp first-approval time if not already set
    async fn set_first_approval(&self, pr_id: Uuid, at: DateTime<Utc>) -> Result<()>;
}

/// Everything the application needs from storage
pub trait Store: StatsStore + BadgeStore + IngestStore {
    /// View the full store through the read-side port
    fn as_stats(&self) -> &dyn StatsStore;

    /// View the full store through the lifecycle write port
    fn as_ingest(&self) -> &dyn IngestStore;
}

impl<T: StatsStore + BadgeStore + IngestStore> Store for T {
    fn as_stats(&self) -> &dyn StatsStore {
        self
    }

    fn as_ingest(&self) -> &dyn IngestStore {
        self
    }
}
