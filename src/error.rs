//! Error types shared by the feed, layout and settings layers.
//! None of these are fatal: callers log them and fall back to a stale or
//! empty calendar.

use chrono::{DateTime, Utc};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    /// Remote feed unreachable or returned an error status.
    #[error("Failed to fetch events: {0}")]
    FetchFailure(String),

    /// Fetch failed and there is no cached payload to fall back on.
    #[error("No events available: fetch failed and no cache present")]
    CacheUnavailable,

    /// Payload is not a JSON array; the whole refresh is abandoned.
    #[error("Failed to parse events payload: {0}")]
    ParseFailure(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    #[error("Event {id} ends before it begins ({begin} > {end})")]
    InvalidRange {
        id: i64,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Malformed event at position {position}: {reason}")]
    Malformed { position: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}
