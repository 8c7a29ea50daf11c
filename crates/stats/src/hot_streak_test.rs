#[cfg(test)]
mod tests {
    use crate::hot_streak::*;
    use crate::tests::fixtures::{at, make_settings, merged_pr, MemStore, RecordingNotifier};
    use common::notify::Alert;
    use uuid::Uuid;

    const HOUR: i64 = 3_600_000;

    fn fast_run(count: usize, merge_ms: i64) -> Vec<common::models::PullRequest> {
        let repo_id = Uuid::new_v4();
        let author_id = Uuid::new_v4();
        (0..count)
            .map(|i| {
                merged_pr(
                    repo_id,
                    author_id,
                    i as i32 + 1,
                    at(2026, 2, 10, 9 + i as u32, 0),
                    merge_ms,
                )
            })
            .collect()
    }

    // is_hot_streak tests
    #[test]
    fn test_is_hot_streak_three_fast_merges() {
        // an hour exactly still counts
        assert!(is_hot_streak(&fast_run(3, HOUR)));
        assert!(is_hot_streak(&fast_run(3, 20 * 60 * 1000)));
    }

    #[test]
    fn test_is_hot_streak_needs_three() {
        assert!(!is_hot_streak(&fast_run(2, HOUR / 2)));
        assert!(!is_hot_streak(&[]));
    }

    #[test]
    fn test_is_hot_streak_slow_merge_breaks_it() {
        let mut run = fast_run(3, HOUR / 2);
        run[1].time_to_merge_ms = Some(HOUR + 1);
        assert!(!is_hot_streak(&run));
    }

    #[test]
    fn test_is_hot_streak_unmeasured_merge_breaks_it() {
        let mut run = fast_run(3, HOUR / 2);
        run[0].time_to_merge_ms = None;
        assert!(!is_hot_streak(&run));
    }

    // check tests
    fn seed_streak(store: &MemStore) -> (Uuid, Uuid) {
        let installation = store.add_installation("acme");
        let repo = store.add_repo(installation.id, "acme", "widgets");
        let author = store.add_user("dana");
        for i in 0..3 {
            store.add_pr(merged_pr(
                repo.id,
                author.id,
                i + 1,
                at(2026, 2, 10, 9 + i as u32, 0),
                30 * 60 * 1000,
            ));
        }
        (installation.id, author.id)
    }

    #[tokio::test]
    async fn test_check_announces_streak() {
        let store = MemStore::new();
        let (installation_id, author_id) = seed_streak(&store);
        store.add_settings(make_settings(installation_id));
        let notifier = RecordingNotifier::new();

        let hit = check(&store, &notifier, installation_id, author_id)
            .await
            .unwrap();
        assert!(hit);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "#eng");
        match &sent[0].1 {
            Alert::HotStreak { login, count } => {
                assert_eq!(login, "dana");
                assert_eq!(*count, 3);
            }
            other => panic!("unexpected alert {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_respects_disabled_flag() {
        let store = MemStore::new();
        let (installation_id, author_id) = seed_streak(&store);
        let mut settings = make_settings(installation_id);
        settings.hot_streak_alert_enabled = false;
        store.add_settings(settings);
        let notifier = RecordingNotifier::new();

        let hit = check(&store, &notifier, installation_id, author_id)
            .await
            .unwrap();
        assert!(!hit);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_check_needs_a_channel() {
        let store = MemStore::new();
        let (installation_id, author_id) = seed_streak(&store);
        let mut settings = make_settings(installation_id);
        settings.channel = None;
        store.add_settings(settings);
        let notifier = RecordingNotifier::new();

        assert!(!check(&store, &notifier, installation_id, author_id)
            .await
            .unwrap());
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_check_without_settings_is_quiet() {
        let store = MemStore::new();
        let (installation_id, author_id) = seed_streak(&store);
        let notifier = RecordingNotifier::new();

        assert!(!check(&store, &notifier, installation_id, author_id)
            .await
            .unwrap());
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_check_two_merges_is_no_streak() {
        let store = MemStore::new();
        let installation = store.add_installation("acme");
        let repo = store.add_repo(installation.id, "acme", "widgets");
        let author = store.add_user("dana");
        store.add_settings(make_settings(installation.id));
        for i in 0..2 {
            store.add_pr(merged_pr(
                repo.id,
                author.id,
                i + 1,
                at(2026, 2, 10, 9 + i as u32, 0),
                30 * 60 * 1000,
            ));
        }
        let notifier = RecordingNotifier::new();

        assert!(!check(&store, &notifier, installation.id, author.id)
            .await
            .unwrap());
        assert_eq!(notifier.count(), 0);
    }
}
