//! Indeed publisher search API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{JobSource, fetch_per_keyword};
use crate::Result;
use crate::domain::RawPosting;

const DEFAULT_ENDPOINT: &str = "https://api.indeed.com/ads/apisearch";

/// Results kept per keyword.
const RESULTS_PER_KEYWORD: usize = 10;

const FALLBACK_LOCATION: &str = "USA";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    jobtitle: String,
    #[serde(default)]
    company: String,
    #[serde(default, rename = "formattedLocation")]
    formatted_location: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    date: String,
}

impl SearchResult {
    fn into_raw(self, source: &str) -> RawPosting {
        let location = self
            .formatted_location
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| FALLBACK_LOCATION.to_string());
        RawPosting {
            title: self.jobtitle,
            organization: self.company,
            location,
            url: self.url,
            description: self.snippet,
            source: source.to_string(),
            posted_date: self.date,
        }
    }
}

pub struct IndeedSource {
    client: Client,
    endpoint: String,
    publisher_id: String,
}

impl IndeedSource {
    pub fn new(client: Client, publisher_id: impl Into<String>) -> Self {
        Self::with_endpoint(client, publisher_id, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(
        client: Client,
        publisher_id: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            publisher_id: publisher_id.into(),
        }
    }

    async fn fetch_keyword(&self, keyword: &str) -> Result<Vec<RawPosting>> {
        let query = format!("{keyword} internship");
        let response: SearchResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("publisher", self.publisher_id.as_str()),
                ("q", query.as_str()),
                ("l", "United States"),
                ("sort", "date"),
                ("radius", "25"),
                ("jt", "internship"),
                ("start", "0"),
                ("limit", "25"),
                ("fromage", "7"),
                ("format", "json"),
                ("v", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .results
            .into_iter()
            .take(RESULTS_PER_KEYWORD)
            .map(|r| r.into_raw(self.name()))
            .collect())
    }
}

#[async_trait]
impl JobSource for IndeedSource {
    fn name(&self) -> &'static str {
        "Indeed"
    }

    async fn fetch(&self, keywords: &[String]) -> Result<Vec<RawPosting>> {
        fetch_per_keyword(self.name(), keywords, |kw| self.fetch_keyword(kw)).await
    }
}
