use anyhow::{Context, Result};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::FeedError;
use crate::feed::EventSource;

pub struct FeedClient {
    client: Client,
    base_url: String,
}

impl FeedClient {
    pub fn new(base_url: String, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn events_url(&self, revision: u64) -> String {
        format!(
            "{}/api/v1/events?revision={}",
            self.base_url.trim_end_matches('/'),
            revision
        )
    }

    /// Fetch the raw events payload. The body is returned untouched so the
    /// caller can compare it byte-for-byte with the cached copy.
    pub async fn fetch_events(&self, revision: u64) -> Result<String, FeedError> {
        let url = self.events_url(revision);
        debug!(%url, "fetching events feed");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::FetchFailure(format!("request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| FeedError::FetchFailure(format!("bad status: {}", e)))?;

        response
            .text()
            .await
            .map_err(|e| FeedError::FetchFailure(format!("failed to read body: {}", e)))
    }
}

impl EventSource for FeedClient {
    fn fetch(&self, revision: u64) -> impl Future<Output = String> + Send {
        async move {
            match self.fetch_events(revision).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "events feed unavailable, falling back to cache");
                    String::new()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_events_url_without_double_slash() {
        let client = FeedClient::new("http://localhost:8000/".to_string(), 5).unwrap();
        assert_eq!(
            client.events_url(0),
            "http://localhost:8000/api/v1/events?revision=0"
        );
    }
}
