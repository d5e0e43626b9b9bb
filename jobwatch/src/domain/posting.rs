//! Posting entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::PostingId;

/// A posting as produced by a job source, before identity is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPosting {
    pub title: String,
    pub organization: String,
    pub location: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub source: String,
    /// Source-supplied date, kept as opaque text.
    #[serde(default)]
    pub posted_date: String,
}

impl RawPosting {
    /// Identifier this posting would be stored under.
    pub fn id(&self) -> PostingId {
        PostingId::derive(&self.title, &self.organization, &self.url)
    }

    /// Attach the derived identifier.
    pub fn identify(self) -> Posting {
        Posting {
            id: self.id(),
            title: self.title,
            organization: self.organization,
            location: self.location,
            url: self.url,
            description: self.description,
            source: self.source,
            posted_date: self.posted_date,
        }
    }
}

/// A posting with its identifier, ready to be stored and delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub id: PostingId,
    pub title: String,
    pub organization: String,
    pub location: String,
    pub url: String,
    pub description: String,
    pub source: String,
    pub posted_date: String,
}

/// Compact view of a stored posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingSummary {
    pub id: PostingId,
    pub title: String,
    pub organization: String,
    pub location: String,
    pub url: String,
    pub source: String,
}

/// Delivery status of a stored posting.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            _ => None,
        }
    }
}

/// Outcome of one delivery attempt on one channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(Self::Sent),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One row of the append-only delivery log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub posting_id: PostingId,
    pub channel: String,
    pub attempted_at: DateTime<Utc>,
    pub outcome: DeliveryOutcome,
}
