//! GitHub Jobs JSON API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{JobSource, fetch_per_keyword};
use crate::Result;
use crate::domain::RawPosting;

const DEFAULT_ENDPOINT: &str = "https://jobs.github.com/positions.json";

#[derive(Debug, Deserialize)]
struct GithubPosition {
    #[serde(default)]
    title: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    created_at: String,
}

impl GithubPosition {
    fn into_raw(self, source: &str) -> RawPosting {
        RawPosting {
            title: self.title,
            organization: self.company,
            location: self.location,
            url: self.url,
            description: self.description,
            source: source.to_string(),
            posted_date: self.created_at,
        }
    }
}

pub struct GithubJobsSource {
    client: Client,
    endpoint: String,
}

impl GithubJobsSource {
    pub fn new(client: Client) -> Self {
        Self::with_endpoint(client, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn fetch_keyword(&self, keyword: &str) -> Result<Vec<RawPosting>> {
        let positions: Vec<GithubPosition> = self
            .client
            .get(&self.endpoint)
            .query(&[("description", keyword)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(positions
            .into_iter()
            .map(|p| p.into_raw(self.name()))
            .collect())
    }
}

#[async_trait]
impl JobSource for GithubJobsSource {
    fn name(&self) -> &'static str {
        "GitHub Jobs"
    }

    async fn fetch(&self, keywords: &[String]) -> Result<Vec<RawPosting>> {
        fetch_per_keyword(self.name(), keywords, |kw| self.fetch_keyword(kw)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::one_shot_server;

    #[tokio::test]
    async fn test_fetch_maps_fields() {
        let body = r#"[{"title":"SWE Intern","company":"Acme","location":"Remote","url":"https://x/1","description":"Build things","created_at":"Mon Jan 05 2026"}]"#;
        let (base, server) = one_shot_server("HTTP/1.1 200 OK", body).await;
        let source = GithubJobsSource::with_endpoint(Client::new(), format!("{base}/positions.json"));

        let postings = source.fetch(&["rust intern".to_string()]).await.unwrap();

        assert_eq!(postings.len(), 1);
        let p = &postings[0];
        assert_eq!(p.title, "SWE Intern");
        assert_eq!(p.organization, "Acme");
        assert_eq!(p.url, "https://x/1");
        assert_eq!(p.source, "GitHub Jobs");
        assert_eq!(p.posted_date, "Mon Jan 05 2026");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /positions.json?description=rust+intern"));
    }

    #[tokio::test]
    async fn test_fetch_http_error_is_err() {
        let (base, server) = one_shot_server("HTTP/1.1 503 Service Unavailable", "{}").await;
        let source = GithubJobsSource::with_endpoint(Client::new(), base);

        assert!(source.fetch(&["intern".to_string()]).await.is_err());
        server.await.unwrap();
    }
}
