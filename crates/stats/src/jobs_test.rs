#[cfg(test)]
mod tests {
    use crate::jobs::*;
    use crate::tests::fixtures::{
        at, make_pr, make_settings, FailingNotifier, MemStore, RecordingNotifier,
    };
    use std::sync::Arc;

    use common::models::ConfidenceLevel;
    use common::notify::Alert;
    use uuid::Uuid;

    #[test]
    fn test_job_state_terminality() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[tokio::test]
    async fn test_ticket_starts_queued() {
        let store = Arc::new(MemStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let (queue, _runner) = JobQueue::new(8, store, notifier);

        let ticket = queue
            .enqueue(Job::HotStreakCheck {
                author_id: Uuid::new_v4(),
                installation_id: Uuid::new_v4(),
            })
            .await
            .unwrap();
        assert_eq!(ticket.state(), JobState::Queued);
    }

    #[tokio::test]
    async fn test_dropped_runner_resolves_tickets() {
        let store = Arc::new(MemStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let (queue, runner) = JobQueue::new(8, store, notifier);

        let mut ticket = queue
            .enqueue(Job::HotStreakCheck {
                author_id: Uuid::new_v4(),
                installation_id: Uuid::new_v4(),
            })
            .await
            .unwrap();
        drop(runner);

        // the job never ran, but waiting on it still returns
        assert_eq!(ticket.done().await, JobState::Queued);
        assert!(queue
            .enqueue(Job::HotStreakCheck {
                author_id: Uuid::new_v4(),
                installation_id: Uuid::new_v4(),
            })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_job_without_settings_succeeds_quietly() {
        let store = Arc::new(MemStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let (queue, runner) = JobQueue::new(8, store, notifier.clone());
        tokio::spawn(runner.run());

        let mut ticket = queue
            .enqueue(Job::HotStreakCheck {
                author_id: Uuid::new_v4(),
                installation_id: Uuid::new_v4(),
            })
            .await
            .unwrap();
        assert_eq!(ticket.done().await, JobState::Succeeded);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_praise_job_announces() {
        let store = Arc::new(MemStore::new());
        let installation = store.add_installation("acme");
        store.add_settings(make_settings(installation.id));
        let notifier = Arc::new(RecordingNotifier::new());
        let (queue, runner) = JobQueue::new(8, store.clone(), notifier.clone());
        tokio::spawn(runner.run());

        let mut ticket = queue
            .enqueue(Job::PraiseFastReview {
                installation_id: installation.id,
                reviewer_login: "bob".to_string(),
                response_time_ms: 900_000,
            })
            .await
            .unwrap();
        assert_eq!(ticket.done().await, JobState::Succeeded);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "#eng");
        match &sent[0].1 {
            Alert::FastReviewPraise {
                reviewer,
                response_time_ms,
            } => {
                assert_eq!(reviewer, "bob");
                assert_eq!(*response_time_ms, 900_000);
            }
            other => panic!("unexpected alert {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_praise_job_respects_opt_out() {
        let store = Arc::new(MemStore::new());
        let installation = store.add_installation("acme");
        let mut settings = make_settings(installation.id);
        settings.auto_praise_enabled = false;
        store.add_settings(settings);
        let notifier = Arc::new(RecordingNotifier::new());
        let (queue, runner) = JobQueue::new(8, store.clone(), notifier.clone());
        tokio::spawn(runner.run());

        let mut ticket = queue
            .enqueue(Job::PraiseFastReview {
                installation_id: installation.id,
                reviewer_login: "bob".to_string(),
                response_time_ms: 900_000,
            })
            .await
            .unwrap();
        assert_eq!(ticket.done().await, JobState::Succeeded);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_failed_delivery_marks_job_failed() {
        let store = Arc::new(MemStore::new());
        let installation = store.add_installation("acme");
        store.add_settings(make_settings(installation.id));
        let (queue, runner) = JobQueue::new(8, store.clone(), Arc::new(FailingNotifier));
        tokio::spawn(runner.run());

        let mut ticket = queue
            .enqueue(Job::PraiseFastReview {
                installation_id: installation.id,
                reviewer_login: "bob".to_string(),
                response_time_ms: 900_000,
            })
            .await
            .unwrap();
        assert_eq!(ticket.done().await, JobState::Failed);
    }

    #[tokio::test]
    async fn test_predict_job_announces() {
        let store = Arc::new(MemStore::new());
        let installation = store.add_installation("acme");
        let repo = store.add_repo(installation.id, "acme", "widgets");
        let author = store.add_user("dana");
        store.add_settings(make_settings(installation.id));

        let pr = make_pr(repo.id, author.id, 5, at(2026, 2, 10, 9, 0));
        let pr_id = pr.id;
        store.add_pr(pr);

        let notifier = Arc::new(RecordingNotifier::new());
        let (queue, runner) = JobQueue::new(8, store.clone(), notifier.clone());
        tokio::spawn(runner.run());

        let mut ticket = queue
            .enqueue(Job::PredictMerge {
                pr_id,
                installation_id: installation.id,
            })
            .await
            .unwrap();
        assert_eq!(ticket.done().await, JobState::Succeeded);

        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1);
        match &alerts[0] {
            Alert::MergePrediction {
                pr,
                predicted_at: _,
                confidence,
            } => {
                assert_eq!(pr.repo, "acme/widgets");
                assert_eq!(pr.number, 5);
                assert_eq!(pr.author, "dana");
                assert_eq!(*confidence, ConfidenceLevel::Low);
            }
            other => panic!("unexpected alert {:?}", other),
        }
    }
}
