//! Postgres implementation of the storage ports

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::models::{
    Badge, Installation, NotificationSettings, PrState, PullRequest, Repository, Review,
    ReviewRequest, User,
};
use common::store::{
    BadgeStore, IngestStore, NewPullRequest, NewReview, ReviewWithContext, StaleCandidate,
    StatsScope, StatsStore,
};
use common::{Error, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{badges, installations, prs, repos, review_requests, reviews, settings, users};

/// Extension trait to convert sqlx errors to the domain error
trait DbResultExt<T> {
    fn store_err(self) -> Result<T>;
}

impl<T> DbResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn store_err(self) -> Result<T> {
        self.map_err(|e| Error::Store(e.to_string()))
    }
}

/// Storage backed by the Postgres pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsStore for PgStore {
    async fn prs_created_in(&self, scope: &StatsScope) -> Result<Vec<PullRequest>> {
        prs::created_in(&self.pool, scope).await.store_err()
    }

    async fn prs_merged_in(&self, scope: &StatsScope) -> Result<Vec<PullRequest>> {
        prs::merged_in(&self.pool, scope).await.store_err()
    }

    async fn reviews_in(&self, scope: &StatsScope) -> Result<Vec<ReviewWithContext>> {
        reviews::in_scope(&self.pool, scope).await.store_err()
    }

    async fn recent_reviews(
        &self,
        installation_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ReviewWithContext>> {
        reviews::recent(&self.pool, installation_id, from, to, limit)
            .await
            .store_err()
    }

    async fn pr_by_id(&self, pr_id: Uuid) -> Result<Option<PullRequest>> {
        prs::get_by_id(&self.pool, pr_id).await.store_err()
    }

    async fn repo_by_id(&self, repo_id: Uuid) -> Result<Option<Repository>> {
        repos::get_by_id(&self.pool, repo_id).await.store_err()
    }

    async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        users::get_by_id(&self.pool, user_id).await.store_err()
    }

    async fn merged_prs_by_author(
        &self,
        installation_id: Uuid,
        author_id: Uuid,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<PullRequest>> {
        prs::merged_by_author(&self.pool, installation_id, author_id, since, limit)
            .await
            .store_err()
    }

    async fn pending_requests_for_pr(&self, pr_id: Uuid) -> Result<Vec<ReviewRequest>> {
        review_requests::pending_for_pr(&self.pool, pr_id)
            .await
            .store_err()
    }

    async fn pending_request_counts(
        &self,
        reviewer_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, i64>> {
        review_requests::pending_counts(&self.pool, reviewer_ids)
            .await
            .store_err()
    }

    async fn all_installations(&self) -> Result<Vec<Installation>> {
        installations::list_active(&self.pool).await.store_err()
    }

    async fn notification_settings(
        &self,
        installation_id: Uuid,
    ) -> Result<Option<NotificationSettings>> {
        settings::get(&self.pool, installation_id).await.store_err()
    }

    async fn stale_candidates(&self, installation_id: Uuid) -> Result<Vec<StaleCandidate>> {
        prs::stale_candidates(&self.pool, installation_id)
            .await
            .store_err()
    }
}

#[async_trait]
impl BadgeStore for PgStore {
    async fn ensure_badge(&self, badge: &Badge) -> Result<()> {
        badges::ensure(&self.pool, badge).await.store_err()
    }

    async fn award_badge(&self, user_id: Uuid, badge_id: &str, period: &str) -> Result<bool> {
        badges::award(&self.pool, user_id, badge_id, period)
            .await
            .store_err()
    }
}

#[async_trait]
impl IngestStore for PgStore {
    async fn upsert_installation(
        &self,
        github_id: i64,
        account_login: &str,
    ) -> Result<Installation> {
        installations::upsert(&self.pool, github_id, account_login)
            .await
            .store_err()
    }

    async fn upsert_repository(
        &self,
        installation_id: Uuid,
        github_id: i64,
        owner: &str,
        name: &str,
    ) -> Result<Repository> {
        repos::upsert(&self.pool, installation_id, github_id, owner, name)
            .await
            .store_err()
    }

    async fn upsert_user(
        &self,
        github_id: i64,
        login: &str,
        avatar_url: Option<&str>,
    ) -> Result<User> {
        users::upsert(&self.pool, github_id, login, avatar_url)
            .await
            .store_err()
    }

    async fn upsert_pr(&self, pr: &NewPullRequest) -> Result<PullRequest> {
        prs::upsert(&self.pool, pr).await.store_err()
    }

    async fn pr_by_github_id(&self, github_id: i64) -> Result<Option<PullRequest>> {
        prs::get_by_github_id(&self.pool, github_id).await.store_err()
    }

    async fn update_pr_details(
        &self,
        pr_id: Uuid,
        title: Option<&str>,
        additions: i32,
        deletions: i32,
    ) -> Result<()> {
        prs::update_details(&self.pool, pr_id, title, additions, deletions)
            .await
            .store_err()
    }

    async fn set_pr_state(&self, pr_id: Uuid, state: PrState) -> Result<()> {
        prs::set_state(&self.pool, pr_id, state).await.store_err()
    }

    async fn finish_pr(
        &self,
        pr_id: Uuid,
        state: PrState,
        closed_at: DateTime<Utc>,
        merged_at: Option<DateTime<Utc>>,
        time_to_merge_ms: Option<i64>,
    ) -> Result<()> {
        prs::finish(&self.pool, pr_id, state, closed_at, merged_at, time_to_merge_ms)
            .await
            .store_err()
    }

    async fn bump_revision_count(&self, pr_id: Uuid) -> Result<()> {
        prs::bump_revision_count(&self.pool, pr_id).await.store_err()
    }

    async fn bump_review_cycle_count(&self, pr_id: Uuid) -> Result<()> {
        prs::bump_review_cycle_count(&self.pool, pr_id)
            .await
            .store_err()
    }

    async fn mark_conflict(&self, pr_id: Uuid, detected_at: DateTime<Utc>) -> Result<()> {
        prs::mark_conflict(&self.pool, pr_id, detected_at)
            .await
            .store_err()
    }

    async fn resolve_conflict(&self, pr_id: Uuid, resolved_at: DateTime<Utc>) -> Result<()> {
        prs::resolve_conflict(&self.pool, pr_id, resolved_at)
            .await
            .store_err()
    }

    async fn create_review_request(
        &self,
        pr_id: Uuid,
        reviewer_id: Uuid,
        requested_at: DateTime<Utc>,
        fulfilled_at: Option<DateTime<Utc>>,
    ) -> Result<ReviewRequest> {
        review_requests::create(&self.pool, pr_id, reviewer_id, requested_at, fulfilled_at)
            .await
            .store_err()
    }

    async fn latest_pending_request(
        &self,
        pr_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<Option<ReviewRequest>> {
        review_requests::latest_pending(&self.pool, pr_id, reviewer_id)
            .await
            .store_err()
    }

    async fn fulfil_review_request(
        &self,
        request_id: Uuid,
        fulfilled_at: DateTime<Utc>,
    ) -> Result<()> {
        review_requests::fulfil(&self.pool, request_id, fulfilled_at)
            .await
            .store_err()
    }

    async fn upsert_review(&self, review: &NewReview) -> Result<(Review, bool)> {
        reviews::upsert(&self.pool, review).await.store_err()
    }

    async fn set_first_review(
        &self,
        pr_id: Uuid,
        at: DateTime<Utc>,
        time_to_first_review_ms: i64,
    ) -> Result<()> {
        prs::set_first_review(&self.pool, pr_id, at, time_to_first_review_ms)
            .await
            .store_err()
    }

    async fn set_first_approval(&self, pr_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        prs::set_first_approval(&self.pool, pr_id, at).await.store_err()
    }
}
