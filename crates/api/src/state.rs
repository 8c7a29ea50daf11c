//! Application state

use std::sync::Arc;

use common::notify::Notifier;
use common::store::Store;
use common::Config;
use stats::JobQueue;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
    pub jobs: JobQueue,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        jobs: JobQueue,
    ) -> Self {
        Self {
            config,
            store,
            notifier,
            jobs,
        }
    }
}
