#[cfg(test)]
mod tests {
    use crate::stale::*;
    use crate::tests::fixtures::{
        at, make_pr, make_review, make_settings, FailingNotifier, MemStore, RecordingNotifier,
    };
    use chrono::Duration;
    use common::models::{PullRequest, ReviewState};
    use common::notify::Alert;
    use common::store::StaleCandidate;
    use uuid::Uuid;

    const HOUR: i64 = 3_600_000;

    fn candidate(pr: PullRequest) -> StaleCandidate {
        StaleCandidate {
            pr,
            author_login: "dana".to_string(),
            repo_owner: "acme".to_string(),
            repo_name: "widgets".to_string(),
            last_review_at: None,
            latest_review_state: None,
        }
    }

    fn open_pr(created_at: chrono::DateTime<chrono::Utc>) -> PullRequest {
        make_pr(Uuid::new_v4(), Uuid::new_v4(), 1, created_at)
    }

    // classify tests
    #[test]
    fn test_classify_fresh_pr_is_fine() {
        let now = at(2026, 2, 10, 12, 0);
        let c = candidate(open_pr(now - Duration::hours(1)));
        assert_eq!(classify(&c, 24, now), None);
    }

    #[test]
    fn test_classify_awaiting_first_review() {
        let now = at(2026, 2, 10, 12, 0);
        let c = candidate(open_pr(now - Duration::hours(25)));
        assert_eq!(
            classify(&c, 24, now),
            Some((StaleCategory::AwaitingFirstReview, 25 * HOUR))
        );
    }

    #[test]
    fn test_classify_honours_custom_threshold() {
        let now = at(2026, 2, 10, 12, 0);
        let c = candidate(open_pr(now - Duration::hours(5)));
        assert_eq!(
            classify(&c, 4, now),
            Some((StaleCategory::AwaitingFirstReview, 5 * HOUR))
        );
        let c = candidate(open_pr(now - Duration::hours(3)));
        assert_eq!(classify(&c, 4, now), None);
    }

    #[test]
    fn test_classify_reviewed_not_approved() {
        let now = at(2026, 2, 10, 12, 0);
        let mut pr = open_pr(now - Duration::hours(80));
        pr.first_review_at = Some(now - Duration::hours(30));
        let mut c = candidate(pr);
        c.last_review_at = Some(now - Duration::hours(30));
        c.latest_review_state = Some(ReviewState::ChangesRequested);

        assert_eq!(
            classify(&c, 24, now),
            Some((StaleCategory::ReviewedNotApproved, 30 * HOUR))
        );
    }

    #[test]
    fn test_classify_recent_review_resets_the_clock() {
        let now = at(2026, 2, 10, 12, 0);
        let mut pr = open_pr(now - Duration::hours(80));
        pr.first_review_at = Some(now - Duration::hours(2));
        let mut c = candidate(pr);
        c.last_review_at = Some(now - Duration::hours(2));

        assert_eq!(classify(&c, 24, now), None);
    }

    #[test]
    fn test_classify_approved_but_unmerged() {
        let now = at(2026, 2, 10, 12, 0);
        let mut pr = open_pr(now - Duration::hours(100));
        pr.first_review_at = Some(now - Duration::hours(60));
        pr.first_approval_at = Some(now - Duration::hours(49));
        let c = candidate(pr);

        assert_eq!(
            classify(&c, 24, now),
            Some((StaleCategory::ApprovedUnmerged, 49 * HOUR))
        );
    }

    #[test]
    fn test_classify_approval_shields_review_staleness() {
        // an old review does not matter once the PR is approved
        let now = at(2026, 2, 10, 12, 0);
        let mut pr = open_pr(now - Duration::hours(100));
        pr.first_review_at = Some(now - Duration::hours(30));
        pr.first_approval_at = Some(now - Duration::hours(10));
        let mut c = candidate(pr);
        c.last_review_at = Some(now - Duration::hours(30));

        assert_eq!(classify(&c, 24, now), None);
    }

    // sweep tests
    fn seed_stale_pr(store: &MemStore, now: chrono::DateTime<chrono::Utc>) -> Uuid {
        let installation = store.add_installation("acme");
        let repo = store.add_repo(installation.id, "acme", "widgets");
        let author = store.add_user("dana");
        store.add_pr(make_pr(repo.id, author.id, 7, now - Duration::hours(30)));
        installation.id
    }

    #[tokio::test]
    async fn test_sweep_alerts_on_stale_pr() {
        let store = MemStore::new();
        let now = at(2026, 2, 10, 12, 0);
        let installation_id = seed_stale_pr(&store, now);
        store.add_settings(make_settings(installation_id));
        let notifier = RecordingNotifier::new();

        let outcome = sweep(&store, &notifier, now).await.unwrap();
        assert_eq!(outcome.installations, 1);
        assert_eq!(outcome.alerts, 1);

        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1);
        match &alerts[0] {
            Alert::StalePr { pr, waiting_ms } => {
                assert_eq!(pr.repo, "acme/widgets");
                assert_eq!(pr.number, 7);
                assert_eq!(pr.author, "dana");
                assert_eq!(*waiting_ms, 30 * HOUR);
            }
            other => panic!("unexpected alert {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sweep_reports_reviewed_category() {
        let store = MemStore::new();
        let now = at(2026, 2, 10, 12, 0);
        let installation = store.add_installation("acme");
        let repo = store.add_repo(installation.id, "acme", "widgets");
        let author = store.add_user("dana");
        let reviewer = store.add_user("bob");
        store.add_settings(make_settings(installation.id));

        let mut pr = make_pr(repo.id, author.id, 3, now - Duration::hours(80));
        pr.first_review_at = Some(now - Duration::hours(30));
        let pr_id = pr.id;
        store.add_pr(pr);
        store.add_review(make_review(
            pr_id,
            reviewer.id,
            ReviewState::ChangesRequested,
            now - Duration::hours(30),
            Some(HOUR),
        ));

        let notifier = RecordingNotifier::new();
        let outcome = sweep(&store, &notifier, now).await.unwrap();
        assert_eq!(outcome.alerts, 1);
        match &notifier.alerts()[0] {
            Alert::ReviewedButStale { review_state, .. } => {
                assert_eq!(*review_state, ReviewState::ChangesRequested);
            }
            other => panic!("unexpected alert {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sweep_skips_disabled_installations() {
        let store = MemStore::new();
        let now = at(2026, 2, 10, 12, 0);
        let installation_id = seed_stale_pr(&store, now);
        let mut settings = make_settings(installation_id);
        settings.stale_pr_alert_enabled = false;
        store.add_settings(settings);
        let notifier = RecordingNotifier::new();

        let outcome = sweep(&store, &notifier, now).await.unwrap();
        assert_eq!(outcome.installations, 0);
        assert_eq!(outcome.alerts, 0);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_skips_suspended_installations() {
        let store = MemStore::new();
        let now = at(2026, 2, 10, 12, 0);
        let installation_id = seed_stale_pr(&store, now);
        store.add_settings(make_settings(installation_id));
        store.suspend_installation(installation_id);
        let notifier = RecordingNotifier::new();

        let outcome = sweep(&store, &notifier, now).await.unwrap();
        assert_eq!(outcome.installations, 0);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_survives_delivery_failures() {
        let store = MemStore::new();
        let now = at(2026, 2, 10, 12, 0);
        let installation_id = seed_stale_pr(&store, now);
        store.add_settings(make_settings(installation_id));

        let outcome = sweep(&store, &FailingNotifier, now).await.unwrap();
        assert_eq!(outcome.installations, 1);
        assert_eq!(outcome.alerts, 0);
    }
}
