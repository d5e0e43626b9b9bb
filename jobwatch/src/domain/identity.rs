//! Posting identity.
//!
//! A posting is identified by a SHA-256 digest over its title, organization and
//! URL, concatenated in that order. Location, description and source never take
//! part, so the same listing re-fetched from another board maps to the same id.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of a rendered identifier (hex-encoded SHA-256).
pub const POSTING_ID_LEN: usize = 64;

/// Stable deduplication key for a posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingId(String);

impl PostingId {
    /// Derive the identifier from the three identity fields.
    ///
    /// Empty fields are hashed as empty strings, so two postings lacking a URL
    /// collide whenever their title and organization match.
    pub fn derive(title: &str, organization: &str, url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(organization.as_bytes());
        hasher.update(url.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an identifier read back from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for PostingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PostingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_fields_same_id() {
        let a = PostingId::derive("SWE Intern", "Acme", "https://x/1");
        let b = PostingId::derive("SWE Intern", "Acme", "https://x/1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_field_changes_id() {
        let base = PostingId::derive("SWE Intern", "Acme", "https://x/1");
        assert_ne!(base, PostingId::derive("SWE Intern II", "Acme", "https://x/1"));
        assert_ne!(base, PostingId::derive("SWE Intern", "Acme Corp", "https://x/1"));
        assert_ne!(base, PostingId::derive("SWE Intern", "Acme", "https://x/2"));
    }

    #[test]
    fn test_fixed_length_hex() {
        let id = PostingId::derive("", "", "");
        assert_eq!(id.as_str().len(), POSTING_ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));

        let long = PostingId::derive(&"t".repeat(10_000), "org", "url");
        assert_eq!(long.as_str().len(), POSTING_ID_LEN);
    }

    #[test]
    fn test_empty_url_collides_on_title_and_org() {
        let a = PostingId::derive("Data Intern", "Globex", "");
        let b = PostingId::derive("Data Intern", "Globex", "");
        assert_eq!(a, b);
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        let id = PostingId::derive("a", "b", "c");
        assert_eq!(
            id.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_short_prefix() {
        let id = PostingId::derive("a", "b", "c");
        assert_eq!(id.short(), "ba7816bf8f01");
        assert_eq!(PostingId::from_stored("abc").short(), "abc");
    }
}
