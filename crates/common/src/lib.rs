//! Common types and utilities for Mergelens

pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod notify;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
