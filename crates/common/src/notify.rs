//! Outbound notification port.
//!
//! Engines emit [`Alert`] values; a [`Notifier`] delivers them to a
//! channel. The default [`LogNotifier`] writes them to the log, which
//! keeps the engines decoupled from any chat product.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::format::format_duration;
use crate::models::{ConfidenceLevel, ReviewState};

/// Minimal PR identity for alert text
#[derive(Debug, Clone)]
pub struct PrRef {
    pub repo: String,
    pub number: i32,
    pub title: String,
    pub author: String,
}

/// One notification produced by an engine
#[derive(Debug, Clone)]
pub enum Alert {
    StalePr {
        pr: PrRef,
        waiting_ms: i64,
    },
    ReviewedButStale {
        pr: PrRef,
        waiting_ms: i64,
        review_state: ReviewState,
    },
    ApprovedButUnmerged {
        pr: PrRef,
        waiting_ms: i64,
    },
    HotStreak {
        login: String,
        count: usize,
    },
    FastReviewPraise {
        reviewer: String,
        response_time_ms: i64,
    },
    MergePrediction {
        pr: PrRef,
        predicted_at: DateTime<Utc>,
        confidence: ConfidenceLevel,
    },
    WeeklyReport {
        org: String,
        period: String,
        total_prs: usize,
        merged_prs: usize,
        avg_merge_ms: i64,
        avg_first_review_ms: i64,
        top_reviewer: Option<(String, usize)>,
    },
    DailyDigest {
        org: String,
        opened: usize,
        merged: usize,
        reviewed: usize,
        awaiting_review: usize,
    },
}

impl Alert {
    /// One-line rendering used by the log notifier and tests
    pub fn summary(&self) -> String {
        match self {
            Alert::StalePr { pr, waiting_ms } => format!(
                "PR #{} has waited {}h for a first review: \"{}\" by {} ({})",
                pr.number,
                waiting_ms / 3_600_000,
                pr.title,
                pr.author,
                pr.repo,
            ),
            Alert::ReviewedButStale {
                pr,
                waiting_ms,
                review_state,
            } => format!(
                "PR #{} has sat {}h since its last review ({}): \"{}\" by {} ({})",
                pr.number,
                waiting_ms / 3_600_000,
                review_state_label(review_state),
                pr.title,
                pr.author,
                pr.repo,
            ),
            Alert::ApprovedButUnmerged { pr, waiting_ms } => format!(
                "PR #{} was approved {}h ago and is still unmerged: \"{}\" by {} ({})",
                pr.number,
                waiting_ms / 3_600_000,
                pr.title,
                pr.author,
                pr.repo,
            ),
            Alert::HotStreak { login, count } => format!(
                "Hot streak! {} merged {} PRs in a row, each within an hour",
                login, count,
            ),
            Alert::FastReviewPraise {
                reviewer,
                response_time_ms,
            } => format!(
                "Lightning review: {} responded in {}",
                reviewer,
                format_duration(*response_time_ms),
            ),
            Alert::MergePrediction {
                pr,
                predicted_at,
                confidence,
            } => format!(
                "PR #{} \"{}\" is predicted to merge around {} (confidence: {})",
                pr.number,
                pr.title,
                predicted_at.format("%Y-%m-%d %H:%M UTC"),
                confidence_label(confidence),
            ),
            Alert::WeeklyReport {
                org,
                period,
                total_prs,
                merged_prs,
                avg_merge_ms,
                avg_first_review_ms,
                top_reviewer,
            } => {
                let top = match top_reviewer {
                    Some((login, count)) => format!("{} ({} reviews)", login, count),
                    None => "N/A".to_string(),
                };
                format!(
                    "{} weekly report ({}): {} PRs, {} merged, avg merge {}, avg first review {}, top reviewer {}",
                    org,
                    period,
                    total_prs,
                    merged_prs,
                    format_duration(*avg_merge_ms),
                    format_duration(*avg_first_review_ms),
                    top,
                )
            }
            Alert::DailyDigest {
                org,
                opened,
                merged,
                reviewed,
                awaiting_review,
            } => format!(
                "{} daily summary: {} opened, {} merged, {} reviews, {} awaiting first review",
                org, opened, merged, reviewed, awaiting_review,
            ),
        }
    }
}

fn review_state_label(state: &ReviewState) -> &'static str {
    match state {
        ReviewState::Approved => "approved",
        ReviewState::ChangesRequested => "changes requested",
        ReviewState::Commented => "commented",
        ReviewState::Dismissed => "dismissed",
    }
}

fn confidence_label(level: &ConfidenceLevel) -> &'static str {
    match level {
        ConfidenceLevel::Low => "low",
        ConfidenceLevel::Medium => "medium",
        ConfidenceLevel::High => "high",
    }
}

/// Delivery port for alerts
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel: &str, alert: &Alert) -> Result<()>;
}

/// Notifier that writes alerts to the application log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, channel: &str, alert: &Alert) -> Result<()> {
        tracing::info!(channel = %channel, "{}", alert.summary());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr() -> PrRef {
        PrRef {
            repo: "acme/widgets".to_string(),
            number: 42,
            title: "Add retry logic".to_string(),
            author: "jay".to_string(),
        }
    }

    #[test]
    fn test_stale_pr_summary_reports_hours() {
        let alert = Alert::StalePr {
            pr: pr(),
            waiting_ms: 26 * 3_600_000,
        };
        let text = alert.summary();
        assert!(text.contains("PR #42"));
        assert!(text.contains("26h"));
        assert!(text.contains("acme/widgets"));
    }

    #[test]
    fn test_weekly_report_summary_without_top_reviewer() {
        let alert = Alert::WeeklyReport {
            org: "acme".to_string(),
            period: "02/07 - 02/14".to_string(),
            total_prs: 12,
            merged_prs: 9,
            avg_merge_ms: 7_200_000,
            avg_first_review_ms: 1_800_000,
            top_reviewer: None,
        };
        let text = alert.summary();
        assert!(text.contains("top reviewer N/A"));
        assert!(text.contains("avg merge 2h"));
    }
}
