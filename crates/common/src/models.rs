//! Domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A GitHub App installation, the tenancy boundary for every analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installation {
    pub id: Uuid,
    pub github_id: i64,
    pub account_login: String,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
}

/// A tracked GitHub repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: Uuid,
    pub installation_id: Uuid,
    pub github_id: i64,
    pub owner: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A GitHub user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub github_id: i64,
    pub login: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A pull request with its event-derived timing metrics.
/// Millisecond fields stay `None` until the corresponding lifecycle
/// event has been observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: Uuid,
    pub repo_id: Uuid,
    pub github_id: i64,
    pub number: i32,
    pub title: String,
    pub author_id: Uuid,
    pub state: PrState,
    pub additions: i32,
    pub deletions: i32,
    pub created_at: DateTime<Utc>,
    pub first_review_at: Option<DateTime<Utc>>,
    pub first_approval_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub time_to_first_review_ms: Option<i64>,
    pub time_to_merge_ms: Option<i64>,
    pub revision_count: i32,
    pub review_cycle_count: i32,
    pub has_conflict: bool,
    pub conflict_detected_at: Option<DateTime<Utc>>,
    pub conflict_resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Draft,
    Merged,
    Closed,
}

/// A PR review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub pr_id: Uuid,
    pub reviewer_id: Uuid,
    pub github_id: i64,
    pub state: ReviewState,
    pub submitted_at: DateTime<Utc>,
    pub response_time_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
}

/// A request for a specific reviewer; pending until fulfilled by that
/// reviewer's submitted review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub id: Uuid,
    pub pr_id: Uuid,
    pub reviewer_id: Uuid,
    pub requested_at: DateTime<Utc>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

/// A badge definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub tier: BadgeTier,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Gold,
    Silver,
    Bronze,
}

/// A badge held by a user for one award period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBadge {
    pub user_id: Uuid,
    pub badge_id: String,
    pub period: String,
    pub awarded_at: DateTime<Utc>,
}

/// Per-installation notification settings, read-only to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub installation_id: Uuid,
    pub channel: Option<String>,
    pub stale_pr_alert_enabled: bool,
    pub hot_streak_alert_enabled: bool,
    pub auto_praise_enabled: bool,
    pub weekly_report_enabled: bool,
    pub daily_digest_enabled: bool,
    pub stale_pr_threshold_hours: i32,
}

/// How much history backs a merge-time prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}
