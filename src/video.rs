use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::media::{ApiError, Usable};

pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrailerVideo {
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

impl TrailerVideo {
    pub fn is_youtube(&self) -> bool {
        self.site == "YouTube"
    }

    pub fn is_trailer(&self) -> bool {
        matches!(self.video_type.as_str(), "Trailer" | "Teaser")
    }

    pub fn watch_url(&self) -> Option<String> {
        self.is_youtube()
            .then(|| format!("https://www.youtube.com/watch?v={}", self.key))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideosResponse {
    #[serde(default)]
    pub results: Vec<TrailerVideo>,
}

impl Usable for VideosResponse {
    fn is_usable(&self) -> bool {
        !self.results.is_empty()
    }
}

/// Picks a trailer by kind alone: official trailer, any trailer, then teaser.
pub fn select_best_trailer(videos: &[TrailerVideo]) -> Option<&TrailerVideo> {
    videos
        .iter()
        .filter(|v| v.is_youtube())
        .find(|v| v.video_type == "Trailer" && v.official)
        .or_else(|| {
            videos
                .iter()
                .find(|v| v.is_youtube() && v.video_type == "Trailer")
        })
        .or_else(|| {
            videos
                .iter()
                .find(|v| v.is_youtube() && v.video_type == "Teaser")
        })
}

/// View counts for hosted videos.
#[async_trait]
pub trait VideoStats: Send + Sync {
    async fn view_count(&self, video_id: &str) -> Result<u64, ApiError>;
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    items: Vec<StatsItem>,
}

#[derive(Debug, Deserialize)]
struct StatsItem {
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
}

pub struct YoutubeStatsClient {
    api_key: String,
    base_url: String,
    http_client: Arc<reqwest::Client>,
}

impl YoutubeStatsClient {
    pub fn new(api_key: String, http_client: Arc<reqwest::Client>) -> Self {
        Self {
            api_key,
            base_url: String::from(YOUTUBE_API_BASE_URL),
            http_client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl VideoStats for YoutubeStatsClient {
    async fn view_count(&self, video_id: &str) -> Result<u64, ApiError> {
        let response = self
            .http_client
            .get(format!("{}/videos", self.base_url))
            .query(&[
                ("part", "statistics"),
                ("id", video_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http(status.as_u16()));
        }

        let stats: StatsResponse = response.json().await?;
        Ok(stats
            .items
            .first()
            .and_then(|item| item.statistics.view_count.as_deref())
            .and_then(|count| count.parse().ok())
            .unwrap_or(0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTrailer {
    pub video: TrailerVideo,
    pub view_count: u64,
}

/// Keeps hosted trailers and teasers and orders them by view count, most
/// viewed first. A failed statistics lookup counts as zero views.
pub async fn rank_trailers(videos: Vec<TrailerVideo>, stats: &dyn VideoStats) -> Vec<RankedTrailer> {
    let videos: Vec<TrailerVideo> = videos
        .into_iter()
        .filter(|v| v.is_youtube() && v.is_trailer())
        .collect();

    let counts = join_all(videos.iter().map(|video| async move {
        match stats.view_count(&video.key).await {
            Ok(count) => count,
            Err(err) => {
                warn!(video = %video.key, error = %err, "view count lookup failed");
                0
            }
        }
    }))
    .await;

    let mut ranked: Vec<RankedTrailer> = videos
        .into_iter()
        .zip(counts)
        .map(|(video, view_count)| RankedTrailer { video, view_count })
        .collect();
    ranked.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    debug!(count = ranked.len(), "trailers ranked");
    ranked
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn video(key: &str, site: &str, kind: &str, official: bool) -> TrailerVideo {
        TrailerVideo {
            key: key.to_string(),
            name: format!("{kind} {key}"),
            site: site.to_string(),
            video_type: kind.to_string(),
            official,
        }
    }

    struct FixedStats(HashMap<&'static str, Result<u64, ApiError>>);

    #[async_trait]
    impl VideoStats for FixedStats {
        async fn view_count(&self, video_id: &str) -> Result<u64, ApiError> {
            self.0
                .get(video_id)
                .cloned()
                .unwrap_or(Err(ApiError::Http(404)))
        }
    }

    #[test]
    fn best_trailer_prefers_official() {
        let videos = vec![
            video("a", "YouTube", "Teaser", true),
            video("b", "YouTube", "Trailer", false),
            video("c", "YouTube", "Trailer", true),
        ];
        assert_eq!(select_best_trailer(&videos).map(|v| v.key.as_str()), Some("c"));

        let videos = vec![video("a", "Vimeo", "Trailer", true), video("b", "YouTube", "Teaser", false)];
        assert_eq!(select_best_trailer(&videos).map(|v| v.key.as_str()), Some("b"));
    }

    #[tokio::test]
    async fn ranks_by_views_and_treats_failures_as_zero() {
        let stats = FixedStats(HashMap::from([
            ("low", Ok(10)),
            ("high", Ok(5_000)),
            ("broken", Err(ApiError::Network(String::from("timeout")))),
        ]));
        let videos = vec![
            video("broken", "YouTube", "Trailer", true),
            video("low", "YouTube", "Trailer", true),
            video("vimeo", "Vimeo", "Trailer", true),
            video("high", "YouTube", "Teaser", false),
        ];

        let ranked = rank_trailers(videos, &stats).await;
        let order: Vec<(&str, u64)> = ranked
            .iter()
            .map(|r| (r.video.key.as_str(), r.view_count))
            .collect();
        assert_eq!(order, vec![("high", 5_000), ("low", 10), ("broken", 0)]);
    }

    #[tokio::test]
    async fn popular_featurette_never_outranks_a_trailer() {
        let stats = FixedStats(HashMap::from([
            ("bts", Ok(9_000_000)),
            ("clip", Ok(500_000)),
            ("trailer", Ok(1_200)),
        ]));
        let videos = vec![
            video("bts", "YouTube", "Featurette", true),
            video("clip", "YouTube", "Clip", true),
            video("trailer", "YouTube", "Trailer", true),
        ];

        let ranked = rank_trailers(videos, &stats).await;

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].video.key, "trailer");
    }

    #[test]
    fn watch_url_only_for_youtube() {
        assert_eq!(
            video("k1", "YouTube", "Trailer", true).watch_url().as_deref(),
            Some("https://www.youtube.com/watch?v=k1")
        );
        assert_eq!(video("k1", "Vimeo", "Trailer", true).watch_url(), None);
    }
}
