//! Job sources.
//!
//! Each source turns a keyword list into raw postings. The [`SourceSet`]
//! queries them in turn; a failing source is logged and skipped so one
//! broken upstream never empties the whole cycle.

mod demo;
mod github;
mod indeed;

pub use demo::DemoSource;
pub use github::GithubJobsSource;
pub use indeed::IndeedSource;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Result;
use crate::domain::RawPosting;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Which sources to query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub github: bool,
    pub indeed: bool,
    /// Indeed publisher id; the Indeed source is skipped without one.
    pub indeed_publisher_id: Option<String>,
    /// Replace the network sources with a fixed sample set.
    pub demo_mode: bool,
}

/// A place postings are fetched from.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Name recorded as the posting's `source`.
    fn name(&self) -> &'static str;

    /// Fetch postings matching any of `keywords`.
    async fn fetch(&self, keywords: &[String]) -> Result<Vec<RawPosting>>;
}

/// HTTP client shared by the network sources.
pub fn default_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(DEFAULT_UA)
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build source HTTP client, using defaults");
            Client::new()
        })
}

/// Ordered collection of sources.
#[derive(Default)]
pub struct SourceSet {
    sources: Vec<Box<dyn JobSource>>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the sources selected by `config`.
    pub fn from_config(config: &SourcesConfig, request_timeout: Duration) -> Self {
        let mut set = Self::new();

        if config.demo_mode {
            info!("Demo mode: using sample postings instead of live sources");
            set.push(DemoSource);
            return set;
        }

        let client = default_client(request_timeout);
        if config.github {
            set.push(GithubJobsSource::new(client.clone()));
        }
        if config.indeed {
            match config.indeed_publisher_id.as_deref() {
                Some(publisher) => set.push(IndeedSource::new(client, publisher)),
                None => warn!("Indeed search enabled but INDEED_PUBLISHER_ID is not set; skipping"),
            }
        }

        if set.is_empty() {
            warn!("No job sources enabled; cycles will observe nothing");
        }
        set
    }

    pub fn push(&mut self, source: impl JobSource + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Query every source in order and concatenate their postings.
    pub async fn fetch_all(&self, keywords: &[String]) -> Vec<RawPosting> {
        let mut all = Vec::new();
        for source in &self.sources {
            match source.fetch(keywords).await {
                Ok(postings) => {
                    info!(source = source.name(), count = postings.len(), "Fetched postings");
                    all.extend(postings);
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Source failed, skipping");
                }
            }
        }
        all
    }
}

/// Run `fetch_one` per keyword; keyword failures are skipped.
///
/// Fails only when every keyword failed, returning the last error.
pub(crate) async fn fetch_per_keyword<'a, F, Fut>(
    source: &'static str,
    keywords: &'a [String],
    fetch_one: F,
) -> Result<Vec<RawPosting>>
where
    F: Fn(&'a str) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<RawPosting>>>,
{
    let mut postings = Vec::new();
    let mut last_error = None;
    let mut succeeded = 0usize;

    for keyword in keywords {
        match fetch_one(keyword).await {
            Ok(found) => {
                succeeded += 1;
                tracing::debug!(source, keyword = %keyword, count = found.len(), "Keyword fetched");
                postings.extend(found);
            }
            Err(e) => {
                warn!(source, keyword = %keyword, error = %e, "Keyword fetch failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if succeeded == 0 => Err(e),
        _ => Ok(postings),
    }
}
