//! Tracked background job queue.
//!
//! Event application returns follow-up jobs instead of performing side
//! effects inline; a spawned runner drains them sequentially. Every
//! enqueue hands back a ticket whose state can be watched, so callers
//! and tests observe completion instead of firing and forgetting.

use std::sync::Arc;

use chrono::Utc;
use common::notify::{Alert, Notifier, PrRef};
use common::store::Store;
use common::{Error, Result};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{hot_streak, prediction};

/// Follow-up work produced by event application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    PredictMerge {
        pr_id: Uuid,
        installation_id: Uuid,
    },
    HotStreakCheck {
        author_id: Uuid,
        installation_id: Uuid,
    },
    PraiseFastReview {
        installation_id: Uuid,
        reviewer_login: String,
        response_time_ms: i64,
    },
}

/// Lifecycle of a queued job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

struct QueuedJob {
    job: Job,
    state_tx: watch::Sender<JobState>,
}

/// Handle for observing one queued job
pub struct JobTicket {
    rx: watch::Receiver<JobState>,
}

impl JobTicket {
    pub fn state(&self) -> JobState {
        *self.rx.borrow()
    }

    /// Wait until the job reaches a terminal state
    pub async fn done(&mut self) -> JobState {
        loop {
            let state = *self.rx.borrow();
            if state.is_terminal() {
                return state;
            }
            if self.rx.changed().await.is_err() {
                return *self.rx.borrow();
            }
        }
    }
}

/// Producer half of the queue, cheap to clone into handlers
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
}

impl JobQueue {
    /// Build the queue and the runner that drains it; spawn the runner
    /// with [`JobRunner::run`]
    pub fn new(
        capacity: usize,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
    ) -> (JobQueue, JobRunner) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            JobQueue { tx },
            JobRunner {
                rx,
                store,
                notifier,
            },
        )
    }

    /// Queue a job, waiting for room when the queue is full
    pub async fn enqueue(&self, job: Job) -> Result<JobTicket> {
        let (state_tx, state_rx) = watch::channel(JobState::Queued);
        self.tx
            .send(QueuedJob { job, state_tx })
            .await
            .map_err(|_| Error::Internal("job queue is closed".to_string()))?;
        Ok(JobTicket { rx: state_rx })
    }
}

/// Consumer half, owns the store and notifier the jobs run against
pub struct JobRunner {
    rx: mpsc::Receiver<QueuedJob>,
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
}

impl JobRunner {
    /// Drain jobs until every queue handle is dropped
    pub async fn run(mut self) {
        info!("Job runner started");
        while let Some(queued) = self.rx.recv().await {
            let _ = queued.state_tx.send(JobState::Running);
            let state = match self.execute(&queued.job).await {
                Ok(()) => JobState::Succeeded,
                Err(e) => {
                    error!("Job {:?} failed: {}", queued.job, e);
                    JobState::Failed
                }
            };
            let _ = queued.state_tx.send(state);
        }
        info!("Job runner stopped");
    }

    async fn execute(&self, job: &Job) -> Result<()> {
        match job {
            Job::PredictMerge {
                pr_id,
                installation_id,
            } => self.predict(*pr_id, *installation_id).await,
            Job::HotStreakCheck {
                author_id,
                installation_id,
            } => hot_streak::check(
                self.store.as_stats(),
                self.notifier.as_ref(),
                *installation_id,
                *author_id,
            )
            .await
            .map(|_| ()),
            Job::PraiseFastReview {
                installation_id,
                reviewer_login,
                response_time_ms,
            } => {
                self.praise(*installation_id, reviewer_login, *response_time_ms)
                    .await
            }
        }
    }

    /// Predict a fresh PR's merge time and announce it. Skipped
    /// without a configured channel.
    async fn predict(&self, pr_id: Uuid, installation_id: Uuid) -> Result<()> {
        let settings = match self.store.notification_settings(installation_id).await? {
            Some(s) => s,
            None => return Ok(()),
        };
        let channel = match settings.channel {
            Some(c) => c,
            None => return Ok(()),
        };

        let prediction = match prediction::predict(
            self.store.as_stats(),
            installation_id,
            pr_id,
            Utc::now(),
        )
        .await?
        {
            Some(p) => p,
            None => {
                debug!("No prediction available for PR {}", pr_id);
                return Ok(());
            }
        };

        let pr = match self.store.pr_by_id(pr_id).await? {
            Some(pr) => pr,
            None => return Ok(()),
        };
        let repo = match self.store.repo_by_id(pr.repo_id).await? {
            Some(repo) => repo,
            None => return Ok(()),
        };
        let author = match self.store.user_by_id(pr.author_id).await? {
            Some(user) => user.login,
            None => "unknown".to_string(),
        };

        self.notifier
            .send(
                &channel,
                &Alert::MergePrediction {
                    pr: PrRef {
                        repo: format!("{}/{}", repo.owner, repo.name),
                        number: pr.number,
                        title: pr.title,
                        author,
                    },
                    predicted_at: prediction.predicted_merge_at,
                    confidence: prediction.confidence,
                },
            )
            .await
    }

    /// Thank a reviewer for a fast turnaround, when the installation
    /// opted in
    async fn praise(
        &self,
        installation_id: Uuid,
        reviewer_login: &str,
        response_time_ms: i64,
    ) -> Result<()> {
        let settings = match self.store.notification_settings(installation_id).await? {
            Some(s) => s,
            None => return Ok(()),
        };
        if !settings.auto_praise_enabled {
            return Ok(());
        }
        let channel = match settings.channel {
            Some(c) => c,
            None => return Ok(()),
        };

        self.notifier
            .send(
                &channel,
                &Alert::FastReviewPraise {
                    reviewer: reviewer_login.to_string(),
                    response_time_ms,
                },
            )
            .await
    }
}
