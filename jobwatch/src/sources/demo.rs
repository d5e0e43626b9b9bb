//! Fixed sample postings for trying the pipeline without network access.

use async_trait::async_trait;

use super::JobSource;
use crate::Result;
use crate::domain::RawPosting;

const SAMPLES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Software Engineer Intern",
        "Acme Corp",
        "Remote",
        "https://jobs.example.com/acme/swe-intern",
        "Work on backend services in a small platform team.",
    ),
    (
        "Data Science Intern",
        "Globex",
        "New York, NY",
        "https://jobs.example.com/globex/ds-intern",
        "Analyze product metrics and build forecasting models.",
    ),
    (
        "Machine Learning Intern",
        "Initech",
        "Austin, TX",
        "https://jobs.example.com/initech/ml-intern",
        "Train and evaluate ranking models.",
    ),
    (
        "Web Developer Intern",
        "Umbrella Labs",
        "Seattle, WA",
        "https://jobs.example.com/umbrella/web-intern",
        "Build internal dashboards.",
    ),
];

/// Source that always returns the same sample postings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSource;

#[async_trait]
impl JobSource for DemoSource {
    fn name(&self) -> &'static str {
        "Demo"
    }

    async fn fetch(&self, _keywords: &[String]) -> Result<Vec<RawPosting>> {
        Ok(SAMPLES
            .iter()
            .map(|(title, organization, location, url, description)| RawPosting {
                title: title.to_string(),
                organization: organization.to_string(),
                location: location.to_string(),
                url: url.to_string(),
                description: description.to_string(),
                source: self.name().to_string(),
                posted_date: String::new(),
            })
            .collect())
    }
}
