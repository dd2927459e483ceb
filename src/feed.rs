//! Event feed plumbing: remote fetch with an on-disk fallback copy, payload
//! parsing, and the refresh that turns both into a fresh [`EventIndex`].

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::api::RawEvent;
use crate::calendar::{EventIndex, LayoutOptions};
use crate::error::{EventError, FeedError};

pub const CACHE_FILE_NAME: &str = "events.json";

/// Revision requested from the feed; 0 asks for the latest full list.
pub const LATEST_REVISION: u64 = 0;

/// Anything that can hand over the raw events payload.
///
/// An empty string means "nothing new / unavailable", never an error.
pub trait EventSource {
    fn fetch(&self, revision: u64) -> impl Future<Output = String> + Send;
}

/// The last payload seen from the feed, kept as-is on disk.
#[derive(Debug, Clone)]
pub struct EventCache {
    path: PathBuf,
}

impl EventCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CACHE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "events cache unreadable");
                None
            }
        }
    }

    /// Overwrite the cache only when `payload` differs from `previous`.
    /// Returns whether the file was written.
    pub async fn store_if_changed(&self, previous: Option<&str>, payload: &str) -> io::Result<bool> {
        if previous == Some(payload) {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, payload).await?;
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadOrigin {
    /// Fresh from the feed; `cache_updated` tells whether it differed from disk.
    Remote { cache_updated: bool },
    /// Feed unavailable, served from the cache file.
    Cache,
}

#[derive(Debug, Clone)]
pub struct FeedPayload {
    pub body: String,
    pub origin: PayloadOrigin,
    previous: Option<String>,
}

impl FeedPayload {
    /// Write a remote payload to the cache when it differs from what was on
    /// disk. Only call this once the body is known to parse.
    pub async fn persist(&mut self, cache: &EventCache) {
        if self.origin == PayloadOrigin::Cache {
            return;
        }

        let cache_updated = match cache.store_if_changed(self.previous.as_deref(), &self.body).await {
            Ok(true) => {
                info!(path = %cache.path().display(), "events cache updated");
                true
            }
            Ok(false) => {
                debug!("events unchanged since last fetch");
                false
            }
            Err(e) => {
                warn!(path = %cache.path().display(), error = %e, "failed to write events cache");
                false
            }
        };
        self.origin = PayloadOrigin::Remote { cache_updated };
    }
}

/// Fetch the latest payload, falling back to the cached copy when the feed
/// has nothing for us. Nothing is written here; see [`FeedPayload::persist`].
pub async fn load_payload<S: EventSource>(source: &S, cache: &EventCache) -> Result<FeedPayload, FeedError> {
    let cached = cache.read().await;
    let response = source.fetch(LATEST_REVISION).await;

    if response.is_empty() {
        return match cached {
            Some(body) if !body.trim().is_empty() => {
                info!(path = %cache.path().display(), "using cached events");
                Ok(FeedPayload {
                    body,
                    origin: PayloadOrigin::Cache,
                    previous: None,
                })
            }
            _ => Err(FeedError::CacheUnavailable),
        };
    }

    Ok(FeedPayload {
        body: response,
        origin: PayloadOrigin::Remote { cache_updated: false },
        previous: cached,
    })
}

/// Parse a payload into events. A payload that is not a JSON array fails the
/// whole call; individual entries that do not decode are logged and dropped.
pub fn parse_events(payload: &str) -> Result<Vec<RawEvent>, FeedError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(payload)?;
    let mut events = Vec::with_capacity(entries.len());

    for (position, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<RawEvent>(entry) {
            Ok(event) => events.push(event),
            Err(e) => {
                let err = EventError::Malformed {
                    position,
                    reason: e.to_string(),
                };
                warn!(error = %err, "skipping event");
            }
        }
    }

    Ok(events)
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub index: EventIndex,
    pub origin: PayloadOrigin,
}

/// Run one full refresh: fetch or fall back, parse, persist, build.
///
/// A payload that fails to parse never reaches the cache, so the last good
/// copy stays available for the next offline start.
pub async fn refresh<S: EventSource>(
    source: &S,
    cache: &EventCache,
    options: &LayoutOptions,
) -> Result<Refreshed, FeedError> {
    let mut payload = load_payload(source, cache).await?;
    let events = parse_events(&payload.body)?;
    payload.persist(cache).await;
    let index = EventIndex::build(&events, options);

    info!(
        events = index.event_count(),
        days = index.day_count(),
        origin = ?payload.origin,
        "events refreshed"
    );

    Ok(Refreshed {
        index,
        origin: payload.origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_array_payload_fails() {
        assert!(matches!(
            parse_events(r#"{"id": 1}"#),
            Err(FeedError::ParseFailure(_))
        ));
        assert!(matches!(parse_events("<html>"), Err(FeedError::ParseFailure(_))));
    }

    #[test]
    fn bad_entries_are_dropped() {
        let payload = r#"[
            {"id": 1, "name": "ok", "begin": "2024-05-01 08:00:00Z", "end": "2024-05-01 09:00:00Z"},
            {"id": 2, "name": "bad", "begin": "not a date", "end": "2024-05-01 09:00:00Z"},
            {"name": "no id", "begin": "2024-05-01 08:00:00Z", "end": "2024-05-01 09:00:00Z"}
        ]"#;
        let events = parse_events(payload).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, 1);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_events("[]").unwrap().is_empty());
    }
}
