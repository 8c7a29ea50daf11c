#[cfg(test)]
mod tests {
    use crate::badges::*;
    use crate::ranking::RankedReviewer;
    use crate::tests::fixtures::{
        at, make_pr, make_review, make_settings, merged_pr, MemStore,
    };
    use std::collections::HashSet;

    use chrono::Duration;
    use common::models::{Review, ReviewState, User};
    use common::store::ReviewWithContext;
    use uuid::Uuid;

    const HOUR: i64 = 3_600_000;

    fn ranked(login: &str, review_count: usize, avg: Option<f64>) -> RankedReviewer {
        RankedReviewer {
            user_id: Uuid::new_v4(),
            login: login.to_string(),
            avatar_url: None,
            review_count,
            approval_count: 0,
            avg_response_ms: avg,
            approval_rate: 0.0,
        }
    }

    fn ctx(
        reviewer_id: Uuid,
        login: &str,
        state: ReviewState,
        submitted_at: chrono::DateTime<chrono::Utc>,
        response_time_ms: Option<i64>,
    ) -> ReviewWithContext {
        ReviewWithContext {
            review: Review {
                id: Uuid::new_v4(),
                pr_id: Uuid::new_v4(),
                reviewer_id,
                github_id: 0,
                state,
                submitted_at,
                response_time_ms,
            },
            reviewer: User {
                id: reviewer_id,
                github_id: 0,
                login: login.to_string(),
                avatar_url: None,
                created_at: at(2026, 1, 1, 0, 0),
            },
            pr_created_at: submitted_at - Duration::hours(1),
        }
    }

    // catalog tests
    #[test]
    fn test_definitions_are_unique() {
        let defs = definitions();
        assert_eq!(defs.len(), 7);
        let ids: HashSet<String> = defs.iter().map(|b| b.id.clone()).collect();
        assert_eq!(ids.len(), 7);
    }

    // review king tests
    #[test]
    fn test_review_king_most_reviews() {
        let rankings = vec![
            ranked("alpha", 2, Some(HOUR as f64)),
            ranked("beta", 5, Some(HOUR as f64)),
        ];
        assert_eq!(review_king(&rankings), Some(rankings[1].user_id));
    }

    #[test]
    fn test_review_king_tie_goes_alphabetical() {
        let rankings = vec![
            ranked("zed", 4, Some(HOUR as f64)),
            ranked("amy", 4, Some(HOUR as f64)),
        ];
        assert_eq!(review_king(&rankings), Some(rankings[1].user_id));
    }

    #[test]
    fn test_review_king_empty() {
        assert_eq!(review_king(&[]), None);
    }

    // lightning reviewer tests
    #[test]
    fn test_lightning_reviewer_needs_three_reviews() {
        // sorted fastest first, as rank_reviewers returns them
        let rankings = vec![
            ranked("quick", 2, Some(HOUR as f64 / 2.0)),
            ranked("steady", 4, Some(2.0 * HOUR as f64)),
        ];
        assert_eq!(lightning_reviewer(&rankings), Some(rankings[1].user_id));
    }

    #[test]
    fn test_lightning_reviewer_needs_response_data() {
        let rankings = vec![ranked("mute", 6, None)];
        assert_eq!(lightning_reviewer(&rankings), None);
    }

    // streak master tests
    #[test]
    fn test_streak_masters_need_consecutive_fast_merges() {
        let repo_id = Uuid::new_v4();
        let author = Uuid::new_v4();
        let base = at(2026, 2, 9, 9, 0);

        // fast, fast, slow, fast: no run of three
        let mut merged = vec![
            merged_pr(repo_id, author, 1, base, HOUR / 2),
            merged_pr(repo_id, author, 2, base + Duration::hours(2), HOUR / 2),
            merged_pr(repo_id, author, 3, base + Duration::hours(4), 3 * HOUR),
            merged_pr(repo_id, author, 4, base + Duration::hours(6), HOUR / 2),
        ];
        assert!(streak_masters(&merged).is_empty());

        // replacing the slow one completes the run
        merged[2].time_to_merge_ms = Some(HOUR / 2);
        assert_eq!(streak_masters(&merged), vec![author]);
    }

    #[test]
    fn test_streak_masters_sorts_by_merge_order_not_input_order() {
        let repo_id = Uuid::new_v4();
        let author = Uuid::new_v4();
        let base = at(2026, 2, 9, 9, 0);

        // chronologically fast-fast-fast-slow, shuffled in the input
        let merged = vec![
            merged_pr(repo_id, author, 4, base + Duration::hours(6), 3 * HOUR),
            merged_pr(repo_id, author, 2, base + Duration::hours(2), HOUR / 2),
            merged_pr(repo_id, author, 1, base, HOUR / 2),
            merged_pr(repo_id, author, 3, base + Duration::hours(4), HOUR / 2),
        ];
        assert_eq!(streak_masters(&merged), vec![author]);
    }

    // most helpful tests
    #[test]
    fn test_most_helpful_needs_five_change_requests() {
        let bob = Uuid::new_v4();
        let base = at(2026, 2, 9, 9, 0);
        let mut reviews: Vec<ReviewWithContext> = (0..4)
            .map(|i| {
                ctx(
                    bob,
                    "bob",
                    ReviewState::ChangesRequested,
                    base + Duration::hours(i),
                    Some(HOUR),
                )
            })
            .collect();
        assert_eq!(most_helpful(&reviews), None);

        reviews.push(ctx(
            bob,
            "bob",
            ReviewState::ChangesRequested,
            base + Duration::hours(5),
            Some(HOUR),
        ));
        assert_eq!(most_helpful(&reviews), Some(bob));
    }

    #[test]
    fn test_most_helpful_ignores_other_states() {
        let bob = Uuid::new_v4();
        let base = at(2026, 2, 9, 9, 0);
        let reviews: Vec<ReviewWithContext> = (0..6)
            .map(|i| {
                ctx(
                    bob,
                    "bob",
                    ReviewState::Approved,
                    base + Duration::hours(i),
                    Some(HOUR),
                )
            })
            .collect();
        assert_eq!(most_helpful(&reviews), None);
    }

    // fastest approver tests
    #[test]
    fn test_fastest_approver_needs_two_measured_approvals() {
        let solo = Uuid::new_v4();
        let pair = Uuid::new_v4();
        let base = at(2026, 2, 9, 9, 0);
        let reviews = vec![
            ctx(solo, "solo", ReviewState::Approved, base, Some(HOUR / 4)),
            ctx(pair, "pair", ReviewState::Approved, base, Some(HOUR)),
            ctx(
                pair,
                "pair",
                ReviewState::Approved,
                base + Duration::hours(1),
                Some(HOUR),
            ),
        ];
        // solo is faster but has a single sample
        assert_eq!(fastest_approver(&reviews), Some(pair));
    }

    #[test]
    fn test_fastest_approver_picks_lowest_average() {
        let slow = Uuid::new_v4();
        let fast = Uuid::new_v4();
        let base = at(2026, 2, 9, 9, 0);
        let reviews = vec![
            ctx(slow, "slow", ReviewState::Approved, base, Some(4 * HOUR)),
            ctx(
                slow,
                "slow",
                ReviewState::Approved,
                base + Duration::hours(1),
                Some(4 * HOUR),
            ),
            ctx(fast, "fast", ReviewState::Approved, base, Some(HOUR)),
            ctx(
                fast,
                "fast",
                ReviewState::Approved,
                base + Duration::hours(1),
                Some(HOUR),
            ),
        ];
        assert_eq!(fastest_approver(&reviews), Some(fast));
    }

    // small PR champion tests
    #[test]
    fn test_small_pr_champions_ratio() {
        let repo_id = Uuid::new_v4();
        let tidy = Uuid::new_v4();
        let sprawling = Uuid::new_v4();
        let base = at(2026, 2, 9, 9, 0);

        let mut created = Vec::new();
        for i in 0..3 {
            // 60 changed lines
            created.push(make_pr(repo_id, tidy, i + 1, base + Duration::hours(i as i64)));
        }
        for i in 0..3 {
            let mut pr = make_pr(repo_id, sprawling, i + 10, base + Duration::hours(i as i64));
            if i > 0 {
                pr.additions = 400;
            }
            created.push(pr);
        }

        // 1 of 3 small misses the 80% bar
        assert_eq!(small_pr_champions(&created), vec![tidy]);
    }

    #[test]
    fn test_small_pr_champions_need_three_prs() {
        let repo_id = Uuid::new_v4();
        let author = Uuid::new_v4();
        let base = at(2026, 2, 9, 9, 0);
        let created = vec![
            make_pr(repo_id, author, 1, base),
            make_pr(repo_id, author, 2, base + Duration::hours(1)),
        ];
        assert!(small_pr_champions(&created).is_empty());
    }

    // consistency star tests
    #[test]
    fn test_consistency_stars_five_consecutive_days() {
        let bob = Uuid::new_v4();
        let reviews: Vec<ReviewWithContext> = (0..5)
            .map(|d| {
                ctx(
                    bob,
                    "bob",
                    ReviewState::Commented,
                    at(2026, 2, 9 + d, 10, 0),
                    Some(HOUR),
                )
            })
            .collect();
        assert_eq!(consistency_stars(&reviews), vec![bob]);
    }

    #[test]
    fn test_consistency_stars_gap_breaks_the_run() {
        let bob = Uuid::new_v4();
        let reviews: Vec<ReviewWithContext> = [9, 10, 11, 13, 14]
            .iter()
            .map(|d| {
                ctx(
                    bob,
                    "bob",
                    ReviewState::Commented,
                    at(2026, 2, *d, 10, 0),
                    Some(HOUR),
                )
            })
            .collect();
        assert!(consistency_stars(&reviews).is_empty());
    }

    #[test]
    fn test_consistency_stars_multiple_reviews_per_day_count_once() {
        let bob = Uuid::new_v4();
        let mut reviews = Vec::new();
        for d in 0..4 {
            for h in [9, 15] {
                reviews.push(ctx(
                    bob,
                    "bob",
                    ReviewState::Commented,
                    at(2026, 2, 9 + d, h, 0),
                    Some(HOUR),
                ));
            }
        }
        // eight reviews over four days is still a four-day run
        assert!(consistency_stars(&reviews).is_empty());
    }

    // sweep tests
    #[tokio::test]
    async fn test_sweep_awards_once_per_week() {
        let store = MemStore::new();
        let installation = store.add_installation("acme");
        let repo = store.add_repo(installation.id, "acme", "widgets");
        let author = store.add_user("dana");
        let reviewer = store.add_user("bob");
        store.add_settings(make_settings(installation.id));
        let now = at(2026, 2, 13, 12, 0);

        let pr = make_pr(repo.id, author.id, 1, at(2026, 2, 10, 9, 0));
        let pr_id = pr.id;
        store.add_pr(pr);
        store.add_review(make_review(
            pr_id,
            reviewer.id,
            ReviewState::Commented,
            at(2026, 2, 10, 10, 0),
            Some(HOUR),
        ));

        let outcome = sweep(&store, now).await.unwrap();
        assert_eq!(outcome.installations, 1);
        // a single review earns review king and nothing else
        assert_eq!(outcome.awarded, 1);

        let awards = store.awards();
        assert_eq!(awards.len(), 1);
        assert_eq!(awards[0].user_id, reviewer.id);
        assert_eq!(awards[0].badge_id, defs::REVIEW_KING);
        assert_eq!(awards[0].period, "2026-W07");

        // the same week never awards twice
        let again = sweep(&store, now + Duration::days(1)).await.unwrap();
        assert_eq!(again.awarded, 0);
        assert_eq!(store.awards().len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_quiet_installation_awards_nothing() {
        let store = MemStore::new();
        let installation = store.add_installation("acme");
        store.add_settings(make_settings(installation.id));

        let outcome = sweep(&store, at(2026, 2, 13, 12, 0)).await.unwrap();
        assert_eq!(outcome.installations, 1);
        assert_eq!(outcome.awarded, 0);
        assert!(store.awards().is_empty());
    }
}
