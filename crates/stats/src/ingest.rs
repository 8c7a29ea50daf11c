//! Lifecycle-event application.
//!
//! Typed PR events are applied through the ingest port. Every write is
//! an idempotent upsert keyed by GitHub ids, so webhook redelivery
//! converges instead of double-counting. Application returns follow-up
//! jobs rather than performing side effects inline.

use chrono::{DateTime, Utc};
use common::format::format_duration;
use common::models::{PrState, PullRequest, Repository, ReviewState};
use common::store::{IngestStore, NewPullRequest, NewReview};
use common::Result;
use serde::Deserialize;
use tracing::{info, warn};

use crate::jobs::Job;

/// Review responses at or under this trigger praise
pub const FAST_RESPONSE_MS: i64 = 1_800_000;

/// Installation and repository identity every event carries
#[derive(Debug, Clone, Deserialize)]
pub struct EventContext {
    pub installation_github_id: i64,
    pub account_login: String,
    pub repo_github_id: i64,
    pub repo_owner: String,
    pub repo_name: String,
}

/// The PR fields events carry
#[derive(Debug, Clone, Deserialize)]
pub struct PrSnapshot {
    pub github_id: i64,
    pub number: i32,
    pub title: String,
    pub author_github_id: i64,
    pub author_login: String,
    #[serde(default)]
    pub author_avatar_url: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub additions: i32,
    #[serde(default)]
    pub deletions: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewerRef {
    pub github_id: i64,
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSnapshot {
    pub github_id: i64,
    pub state: ReviewState,
    pub submitted_at: DateTime<Utc>,
}

/// One PR lifecycle event, tagged by the GitHub action name
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PrEvent {
    Opened {
        context: EventContext,
        pr: PrSnapshot,
    },
    Reopened {
        context: EventContext,
        pr: PrSnapshot,
    },
    Edited {
        context: EventContext,
        pr: PrSnapshot,
    },
    Synchronize {
        context: EventContext,
        pr: PrSnapshot,
        mergeable: Option<bool>,
        occurred_at: DateTime<Utc>,
    },
    ReadyForReview {
        context: EventContext,
        pr: PrSnapshot,
    },
    ConvertedToDraft {
        context: EventContext,
        pr: PrSnapshot,
    },
    Closed {
        context: EventContext,
        pr: PrSnapshot,
        merged: bool,
        occurred_at: DateTime<Utc>,
    },
    ReviewRequested {
        context: EventContext,
        pr: PrSnapshot,
        reviewer: ReviewerRef,
        requested_at: DateTime<Utc>,
    },
    ReviewSubmitted {
        context: EventContext,
        pr: PrSnapshot,
        reviewer: ReviewerRef,
        review: ReviewSnapshot,
    },
}

/// Apply one event, returning the follow-up jobs it produced
pub async fn apply(store: &dyn IngestStore, event: &PrEvent) -> Result<Vec<Job>> {
    match event {
        PrEvent::Opened { context, pr } => opened(store, context, pr, true).await,
        PrEvent::Reopened { context, pr } => opened(store, context, pr, false).await,
        PrEvent::Edited { context, pr } => edited(store, context, pr).await,
        PrEvent::Synchronize {
            context,
            pr,
            mergeable,
            occurred_at,
        } => synchronize(store, context, pr, *mergeable, *occurred_at).await,
        PrEvent::ReadyForReview { context, pr } => set_draft(store, context, pr, false).await,
        PrEvent::ConvertedToDraft { context, pr } => set_draft(store, context, pr, true).await,
        PrEvent::Closed {
            context,
            pr,
            merged,
            occurred_at,
        } => closed(store, context, pr, *merged, *occurred_at).await,
        PrEvent::ReviewRequested {
            context,
            pr,
            reviewer,
            requested_at,
        } => review_requested(store, context, pr, reviewer, *requested_at).await,
        PrEvent::ReviewSubmitted {
            context,
            pr,
            reviewer,
            review,
        } => review_submitted(store, context, pr, reviewer, review).await,
    }
}

async fn ensure_context(store: &dyn IngestStore, context: &EventContext) -> Result<Repository> {
    let installation = store
        .upsert_installation(context.installation_github_id, &context.account_login)
        .await?;
    store
        .upsert_repository(
            installation.id,
            context.repo_github_id,
            &context.repo_owner,
            &context.repo_name,
        )
        .await
}

async fn ensure_pr(
    store: &dyn IngestStore,
    repo: &Repository,
    pr: &PrSnapshot,
) -> Result<PullRequest> {
    let author = store
        .upsert_user(
            pr.author_github_id,
            &pr.author_login,
            pr.author_avatar_url.as_deref(),
        )
        .await?;
    store
        .upsert_pr(&NewPullRequest {
            repo_id: repo.id,
            author_id: author.id,
            github_id: pr.github_id,
            number: pr.number,
            title: pr.title.clone(),
            draft: pr.draft,
            additions: pr.additions,
            deletions: pr.deletions,
            created_at: pr.created_at,
        })
        .await
}

async fn opened(
    store: &dyn IngestStore,
    context: &EventContext,
    pr: &PrSnapshot,
    fresh: bool,
) -> Result<Vec<Job>> {
    info!(
        "PR #{} {} in {}/{} by {}",
        pr.number,
        if fresh { "opened" } else { "reopened" },
        context.repo_owner,
        context.repo_name,
        pr.author_login
    );
    let repo = ensure_context(store, context).await?;
    let record = ensure_pr(store, &repo, pr).await?;

    // A reopened PR comes back as open
    if !fresh && record.state == PrState::Closed {
        store.set_pr_state(record.id, PrState::Open).await?;
    }

    if fresh && !pr.draft {
        return Ok(vec![Job::PredictMerge {
            pr_id: record.id,
            installation_id: repo.installation_id,
        }]);
    }
    Ok(Vec::new())
}

async fn edited(
    store: &dyn IngestStore,
    context: &EventContext,
    pr: &PrSnapshot,
) -> Result<Vec<Job>> {
    ensure_context(store, context).await?;
    match store.pr_by_github_id(pr.github_id).await? {
        Some(record) => {
            store
                .update_pr_details(record.id, Some(&pr.title), pr.additions, pr.deletions)
                .await?;
        }
        None => warn!("Edited event for unknown PR #{}", pr.number),
    }
    Ok(Vec::new())
}

async fn synchronize(
    store: &dyn IngestStore,
    context: &EventContext,
    pr: &PrSnapshot,
    mergeable: Option<bool>,
    occurred_at: DateTime<Utc>,
) -> Result<Vec<Job>> {
    ensure_context(store, context).await?;
    let record = match store.pr_by_github_id(pr.github_id).await? {
        Some(record) => record,
        None => {
            warn!("Synchronize event for unknown PR #{}", pr.number);
            return Ok(Vec::new());
        }
    };

    // A push after review started counts as a revision
    if record.first_review_at.is_some() {
        store.bump_revision_count(record.id).await?;
    }

    if mergeable == Some(false) {
        if !record.has_conflict {
            store.mark_conflict(record.id, occurred_at).await?;
            info!("Conflict detected on PR #{}", record.number);
        }
    } else if record.has_conflict {
        store.resolve_conflict(record.id, occurred_at).await?;
        info!("Conflict resolved on PR #{}", record.number);
    }

    Ok(Vec::new())
}

async fn set_draft(
    store: &dyn IngestStore,
    context: &EventContext,
    pr: &PrSnapshot,
    draft: bool,
) -> Result<Vec<Job>> {
    ensure_context(store, context).await?;
    match store.pr_by_github_id(pr.github_id).await? {
        Some(record) => {
            let state = if draft { PrState::Draft } else { PrState::Open };
            store.set_pr_state(record.id, state).await?;
        }
        None => warn!("Draft transition for unknown PR #{}", pr.number),
    }
    Ok(Vec::new())
}

async fn closed(
    store: &dyn IngestStore,
    context: &EventContext,
    pr: &PrSnapshot,
    merged: bool,
    occurred_at: DateTime<Utc>,
) -> Result<Vec<Job>> {
    let repo = ensure_context(store, context).await?;
    let record = match store.pr_by_github_id(pr.github_id).await? {
        Some(record) => record,
        None => {
            warn!("Close event for unknown PR #{}", pr.number);
            return Ok(Vec::new());
        }
    };

    if merged {
        let time_to_merge = (occurred_at - record.created_at).num_milliseconds();
        store
            .finish_pr(
                record.id,
                PrState::Merged,
                occurred_at,
                Some(occurred_at),
                Some(time_to_merge),
            )
            .await?;
        info!(
            "PR #{} merged after {}",
            record.number,
            format_duration(time_to_merge)
        );
        return Ok(vec![Job::HotStreakCheck {
            author_id: record.author_id,
            installation_id: repo.installation_id,
        }]);
    }

    store
        .finish_pr(record.id, PrState::Closed, occurred_at, None, None)
        .await?;
    Ok(Vec::new())
}

async fn review_requested(
    store: &dyn IngestStore,
    context: &EventContext,
    pr: &PrSnapshot,
    reviewer: &ReviewerRef,
    requested_at: DateTime<Utc>,
) -> Result<Vec<Job>> {
    ensure_context(store, context).await?;
    let record = match store.pr_by_github_id(pr.github_id).await? {
        Some(record) => record,
        None => {
            warn!("Review request for unknown PR #{}", pr.number);
            return Ok(Vec::new());
        }
    };

    let user = store
        .upsert_user(reviewer.github_id, &reviewer.login, reviewer.avatar_url.as_deref())
        .await?;
    store
        .create_review_request(record.id, user.id, requested_at, None)
        .await?;
    Ok(Vec::new())
}

async fn review_submitted(
    store: &dyn IngestStore,
    context: &EventContext,
    pr: &PrSnapshot,
    reviewer: &ReviewerRef,
    review: &ReviewSnapshot,
) -> Result<Vec<Job>> {
    info!(
        "Review on PR #{} in {}/{} by {}",
        pr.number, context.repo_owner, context.repo_name, reviewer.login
    );
    let repo = ensure_context(store, context).await?;
    let record = match store.pr_by_github_id(pr.github_id).await? {
        Some(record) => record,
        None => {
            warn!("Review for unknown PR #{}", pr.number);
            return Ok(Vec::new());
        }
    };

    let user = store
        .upsert_user(reviewer.github_id, &reviewer.login, reviewer.avatar_url.as_deref())
        .await?;

    // Response time runs from the matching review request, or from the
    // PR opening when the review was unsolicited
    let pending = store.latest_pending_request(record.id, user.id).await?;
    let response_time_ms = match &pending {
        Some(request) => (review.submitted_at - request.requested_at).num_milliseconds(),
        None => (review.submitted_at - record.created_at).num_milliseconds(),
    };

    let (_, created) = store
        .upsert_review(&NewReview {
            pr_id: record.id,
            reviewer_id: user.id,
            github_id: review.github_id,
            state: review.state.clone(),
            submitted_at: review.submitted_at,
            response_time_ms: Some(response_time_ms),
        })
        .await?;
    if !created {
        // Redelivered event; everything below already happened
        return Ok(Vec::new());
    }

    match pending {
        Some(request) => {
            store
                .fulfil_review_request(request.id, review.submitted_at)
                .await?;
        }
        None => {
            // Backfill a fulfilled request so workload accounting stays
            // consistent for unsolicited reviews
            store
                .create_review_request(
                    record.id,
                    user.id,
                    record.created_at,
                    Some(review.submitted_at),
                )
                .await?;
        }
    }

    if record.first_review_at.is_none() {
        let ttfr = (review.submitted_at - record.created_at).num_milliseconds();
        store
            .set_first_review(record.id, review.submitted_at, ttfr)
            .await?;
    }
    if review.state == ReviewState::Approved && record.first_approval_at.is_none() {
        store
            .set_first_approval(record.id, review.submitted_at)
            .await?;
    }
    if review.state == ReviewState::ChangesRequested {
        store.bump_review_cycle_count(record.id).await?;
    }

    if response_time_ms <= FAST_RESPONSE_MS {
        return Ok(vec![Job::PraiseFastReview {
            installation_id: repo.installation_id,
            reviewer_login: user.login,
            response_time_ms,
        }]);
    }
    Ok(Vec::new())
}
