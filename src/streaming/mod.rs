//! Streaming availability: the watch-provider catalog seam, the provider
//! metadata cache and the link aggregator built on top of them.

pub mod aggregator;
pub mod cache;
pub mod watchmode;

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::media::MovieId;

pub use aggregator::{region_fallback, ProviderLinkAggregator};
pub use cache::ProviderMetadataCache;
pub use watchmode::WatchmodeClient;

/// Identifier of a title inside the watch-provider catalog.
pub type TitleId = u64;
pub type SourceId = u64;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StreamError {
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs carry the api key.
        let err = err.without_url();
        if err.is_decode() {
            StreamError::Parse(err.to_string())
        } else {
            StreamError::Network(err.to_string())
        }
    }
}

/// How a source offers a title. Variant order is the preference order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OfferKind {
    Subscription,
    Free,
    Rental,
    Purchase,
    Other(String),
}

impl OfferKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sub" | "subscription" => OfferKind::Subscription,
            "free" => OfferKind::Free,
            "rent" | "rental" => OfferKind::Rental,
            "buy" | "purchase" => OfferKind::Purchase,
            _ => OfferKind::Other(raw.trim().to_string()),
        }
    }

    /// Lower is preferred.
    pub fn rank(&self) -> u8 {
        match self {
            OfferKind::Subscription => 0,
            OfferKind::Free => 1,
            OfferKind::Rental => 2,
            OfferKind::Purchase => 3,
            OfferKind::Other(_) => 4,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OfferKind::Subscription => "sub",
            OfferKind::Free => "free",
            OfferKind::Rental => "rent",
            OfferKind::Purchase => "buy",
            OfferKind::Other(raw) => raw,
        }
    }
}

impl fmt::Display for OfferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OfferKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(OfferKind::parse(&raw))
    }
}

/// One offer for a title.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderSource {
    pub source_id: SourceId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OfferKind,
    pub region: Option<String>,
    pub web_url: Option<String>,
}

impl ProviderSource {
    /// The outbound link, when it is an absolute http(s) URL.
    pub fn usable_link(&self) -> Option<&str> {
        let link = self.web_url.as_deref()?.trim();
        let url = reqwest::Url::parse(link).ok()?;
        matches!(url.scheme(), "http" | "https").then_some(link)
    }
}

/// Static descriptor of a source.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderMetadata {
    pub id: SourceId,
    pub name: String,
    #[serde(rename = "logo_100px")]
    pub logo_url: Option<String>,
}

/// A deduplicated offer ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingLink {
    pub source_id: SourceId,
    pub name: String,
    pub kind: OfferKind,
    pub region: Option<String>,
    pub web_url: String,
    pub canonical_name: Option<String>,
    pub logo_url: Option<String>,
}

impl StreamingLink {
    pub fn display_name(&self) -> &str {
        self.canonical_name.as_deref().unwrap_or(&self.name)
    }
}

/// The secondary catalog that knows where titles can be watched.
#[async_trait]
pub trait ProviderCatalog: Send + Sync {
    fn name(&self) -> &str;

    /// Maps a metadata catalog movie id to this catalog's title id.
    async fn find_title_id(&self, movie_id: MovieId) -> Result<Option<TitleId>, StreamError>;

    async fn sources(
        &self,
        title_id: TitleId,
        region: Option<&str>,
    ) -> Result<Vec<ProviderSource>, StreamError>;

    async fn all_source_metadata(&self) -> Result<Vec<ProviderMetadata>, StreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_kinds_rank_in_preference_order() {
        let kinds = ["buy", "rent", "free", "sub", "tve"].map(OfferKind::parse);
        let ranks: Vec<u8> = kinds.iter().map(OfferKind::rank).collect();
        assert_eq!(ranks, vec![3, 2, 1, 0, 4]);
        assert_eq!(kinds[4], OfferKind::Other(String::from("tve")));
    }

    #[test]
    fn source_deserializes_catalog_payload() {
        let source: ProviderSource = serde_json::from_str(
            r#"{"source_id":203,"name":"Netflix","type":"sub","region":"US","web_url":"https://www.netflix.com/title/1","format":"HD","price":null}"#,
        )
        .unwrap();
        assert_eq!(source.kind, OfferKind::Subscription);
        assert_eq!(source.usable_link(), Some("https://www.netflix.com/title/1"));
    }

    #[test]
    fn relative_or_missing_links_are_unusable() {
        let mut source = ProviderSource {
            source_id: 1,
            name: String::from("Example"),
            kind: OfferKind::Free,
            region: None,
            web_url: None,
        };
        assert_eq!(source.usable_link(), None);
        source.web_url = Some(String::from("/title/1"));
        assert_eq!(source.usable_link(), None);
        source.web_url = Some(String::from("ftp://example.com/title"));
        assert_eq!(source.usable_link(), None);
    }
}
