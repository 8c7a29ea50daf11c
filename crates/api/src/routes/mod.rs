//! API routes

pub mod cron;
pub mod events;
pub mod health;
pub mod stats;
