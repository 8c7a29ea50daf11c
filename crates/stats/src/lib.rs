//! Statistics and prediction engines for Mergelens

pub mod badges;
pub mod conflicts;
pub mod hot_streak;
pub mod ingest;
pub mod jobs;
pub mod overview;
pub mod patterns;
pub mod prediction;
pub mod ranking;
pub mod recommendation;
pub mod reports;
pub mod stale;

pub use ingest::PrEvent;
pub use jobs::{Job, JobQueue, JobRunner, JobState, JobTicket};

#[cfg(test)]
pub(crate) mod tests;

#[cfg(test)]
mod badges_test;
#[cfg(test)]
mod hot_streak_test;
#[cfg(test)]
mod jobs_test;
#[cfg(test)]
mod recommendation_test;
#[cfg(test)]
mod stale_test;
