//! Mergelens API Server

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use common::notify::{LogNotifier, Notifier};
use common::store::Store;
use stats::JobQueue;

mod auth;
mod error;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mergelens_api=debug".parse()?)
                .add_directive("stats=debug".parse()?)
                .add_directive("db=debug".parse()?),
        )
        .init();

    info!("📈 Starting Mergelens API");

    // Load configuration
    let config = common::Config::from_env();

    // Connect to database
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let store: Arc<dyn Store> = Arc::new(db::PgStore::new(pool));
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    // Background job runner
    let (jobs, runner) = JobQueue::new(config.job_queue_depth, store.clone(), notifier.clone());
    tokio::spawn(runner.run());

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), store, notifier, jobs));

    // Build router with state
    let app = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/stats/overview", get(routes::stats::overview))
        .route("/api/stats/patterns", get(routes::stats::patterns))
        .route("/api/stats/bottleneck", get(routes::stats::bottleneck))
        .route("/api/stats/conflicts", get(routes::stats::conflicts))
        .route("/api/stats/reviewers", get(routes::stats::reviewers))
        .route(
            "/api/stats/predictions/:pr_id",
            get(routes::stats::prediction),
        )
        .route(
            "/api/stats/recommendations",
            get(routes::stats::recommendations),
        )
        .route("/api/events", post(routes::events::ingest))
        .route("/api/cron/stale-prs", post(routes::cron::stale_prs))
        .route("/api/cron/badge-awards", post(routes::cron::badge_awards))
        .route("/api/cron/weekly-report", post(routes::cron::weekly_report))
        .route("/api/cron/daily-digest", post(routes::cron::daily_digest))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    info!("🚀 Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
