#[cfg(test)]
mod tests {
    use crate::recommendation::*;
    use crate::tests::fixtures::{at, make_pr, make_review, next_github_id, MemStore};
    use std::collections::HashMap;

    use chrono::Duration;
    use common::models::{Review, ReviewState, User};
    use common::store::ReviewWithContext;
    use uuid::Uuid;

    const HOUR: i64 = 3_600_000;

    fn user(login: &str) -> User {
        User {
            id: Uuid::new_v4(),
            github_id: next_github_id(),
            login: login.to_string(),
            avatar_url: None,
            created_at: at(2026, 1, 1, 0, 0),
        }
    }

    fn ctx(reviewer: &User, response_time_ms: Option<i64>) -> ReviewWithContext {
        let submitted_at = at(2026, 2, 10, 12, 0);
        ReviewWithContext {
            review: Review {
                id: Uuid::new_v4(),
                pr_id: Uuid::new_v4(),
                reviewer_id: reviewer.id,
                github_id: next_github_id(),
                state: ReviewState::Commented,
                submitted_at,
                response_time_ms,
            },
            reviewer: reviewer.clone(),
            pr_created_at: submitted_at - Duration::hours(1),
        }
    }

    // scoring tests
    #[test]
    fn test_experience_score_proportional_to_busiest() {
        assert_eq!(experience_score(10, 10), 40.0);
        assert_eq!(experience_score(5, 10), 20.0);
        assert_eq!(experience_score(0, 0), 0.0);
    }

    #[test]
    fn test_speed_score_linear_between_bounds() {
        assert_eq!(speed_score(Some(3_600_000.0)), 30.0);
        assert_eq!(speed_score(Some(86_400_000.0)), 0.0);
        // midpoint of the band
        assert_eq!(speed_score(Some(45_000_000.0)), 15.0);
    }

    #[test]
    fn test_speed_score_clamps_and_defaults() {
        // faster than the floor still caps at 30
        assert_eq!(speed_score(Some(1_800_000.0)), 30.0);
        assert_eq!(speed_score(None), 0.0);
    }

    #[test]
    fn test_workload_score_docks_per_pending() {
        assert_eq!(workload_score(0), 30.0);
        assert_eq!(workload_score(1), 24.0);
        assert_eq!(workload_score(5), 0.0);
        assert_eq!(workload_score(10), 0.0);
    }

    // compute tests
    #[test]
    fn test_compute_perfect_candidate_scores_100() {
        let bob = user("bob");
        let reviews: Vec<ReviewWithContext> =
            (0..5).map(|_| ctx(&bob, Some(HOUR))).collect();

        let recs = compute(&reviews, &HashMap::new(), 5);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].login, "bob");
        assert_eq!(recs[0].score, 100);
        assert_eq!(recs[0].review_count, 5);
        assert_eq!(recs[0].avg_response_ms, HOUR as f64);
        assert_eq!(
            recs[0].reasons,
            vec![REASON_EXPERIENCE, REASON_SPEED, REASON_WORKLOAD]
        );
    }

    #[test]
    fn test_compute_weak_candidate_gets_fallback_reason() {
        let ace = user("ace");
        let newcomer = user("newcomer");
        let mut reviews: Vec<ReviewWithContext> =
            (0..10).map(|_| ctx(&ace, Some(HOUR))).collect();
        reviews.push(ctx(&newcomer, None));

        let mut pending = HashMap::new();
        pending.insert(newcomer.id, 2);

        let recs = compute(&reviews, &pending, 5);
        assert_eq!(recs[0].login, "ace");
        assert_eq!(recs[1].login, "newcomer");
        // experience 4, speed 0, workload 18: no reason threshold met
        assert_eq!(recs[1].score, 22);
        assert_eq!(recs[1].pending_reviews, 2);
        assert_eq!(recs[1].reasons, vec![REASON_FALLBACK]);
    }

    #[test]
    fn test_compute_sorts_by_score_and_truncates() {
        let alpha = user("alpha");
        let beta = user("beta");
        let gamma = user("gamma");
        let mut reviews = Vec::new();
        for _ in 0..4 {
            reviews.push(ctx(&alpha, None));
        }
        for _ in 0..2 {
            reviews.push(ctx(&beta, None));
        }
        reviews.push(ctx(&gamma, None));

        let recs = compute(&reviews, &HashMap::new(), 2);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].login, "alpha");
        assert_eq!(recs[1].login, "beta");
        assert!(recs[0].score > recs[1].score);
    }

    #[test]
    fn test_compute_empty_pool() {
        assert!(compute(&[], &HashMap::new(), 5).is_empty());
    }

    // recommend tests
    #[tokio::test]
    async fn test_recommend_excludes_author_and_surfaces_pending() {
        let store = MemStore::new();
        let installation = store.add_installation("acme");
        let repo = store.add_repo(installation.id, "acme", "widgets");
        let dana = store.add_user("dana");
        let bob = store.add_user("bob");
        let eve = store.add_user("eve");
        let now = at(2026, 2, 20, 12, 0);

        let pr = make_pr(repo.id, dana.id, 1, at(2026, 2, 10, 9, 0));
        let pr_id = pr.id;
        store.add_pr(pr);
        let other = make_pr(repo.id, bob.id, 2, at(2026, 2, 11, 9, 0));
        let other_id = other.id;
        store.add_pr(other);

        store.add_review(make_review(
            pr_id,
            bob.id,
            ReviewState::Approved,
            at(2026, 2, 10, 10, 0),
            Some(HOUR),
        ));
        store.add_review(make_review(
            pr_id,
            eve.id,
            ReviewState::Commented,
            at(2026, 2, 10, 11, 0),
            Some(2 * HOUR),
        ));
        store.add_review(make_review(
            other_id,
            dana.id,
            ReviewState::Approved,
            at(2026, 2, 11, 10, 0),
            Some(HOUR),
        ));

        for _ in 0..2 {
            store.add_request(common::models::ReviewRequest {
                id: Uuid::new_v4(),
                pr_id,
                reviewer_id: bob.id,
                requested_at: now - Duration::hours(3),
                fulfilled_at: None,
            });
        }

        let recs = recommend(&store, installation.id, repo.id, Some(dana.id), 5, now)
            .await
            .unwrap();

        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.login != "dana"));
        let bob_rec = recs.iter().find(|r| r.login == "bob").unwrap();
        assert_eq!(bob_rec.pending_reviews, 2);
    }

    #[tokio::test]
    async fn test_recommend_falls_back_to_installation_pool() {
        let store = MemStore::new();
        let installation = store.add_installation("acme");
        let quiet = store.add_repo(installation.id, "acme", "quiet");
        let busy = store.add_repo(installation.id, "acme", "busy");
        let dana = store.add_user("dana");
        let bob = store.add_user("bob");
        let now = at(2026, 2, 20, 12, 0);

        let pr = make_pr(busy.id, dana.id, 1, at(2026, 2, 10, 9, 0));
        let pr_id = pr.id;
        store.add_pr(pr);
        store.add_review(make_review(
            pr_id,
            bob.id,
            ReviewState::Approved,
            at(2026, 2, 10, 10, 0),
            Some(HOUR),
        ));

        let recs = recommend(&store, installation.id, quiet.id, None, 5, now)
            .await
            .unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].login, "bob");

        // the fallback pool honours the author exclusion too
        let recs = recommend(&store, installation.id, quiet.id, Some(bob.id), 5, now)
            .await
            .unwrap();
        assert!(recs.is_empty());
    }
}
