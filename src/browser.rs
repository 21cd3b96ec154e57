use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::media::{ApiError, BrowseRequest, Genre, MovieId, MoviePage};
use crate::settings::AppSettings;
use crate::streaming::{
    ProviderLinkAggregator, ProviderMetadataCache, StreamingLink, WatchmodeClient,
};
use crate::tmdb::TmdbClient;
use crate::video::{VideoStats, YoutubeStatsClient};

const HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Entry point wiring the metadata catalog, the streaming link aggregator and
/// the video statistics service together.
#[derive(Clone)]
pub struct MovieBrowser {
    pub(crate) tmdb: TmdbClient,
    pub(crate) links: Option<ProviderLinkAggregator>,
    pub(crate) stats: Option<Arc<dyn VideoStats>>,
}

impl MovieBrowser {
    pub fn new(
        tmdb: TmdbClient,
        links: Option<ProviderLinkAggregator>,
        stats: Option<Arc<dyn VideoStats>>,
    ) -> Self {
        Self { tmdb, links, stats }
    }

    pub fn from_settings(settings: &AppSettings) -> Result<Self, ApiError> {
        settings.validate()?;

        let http_client = Arc::new(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
                .build()
                .map_err(|e| ApiError::Config(format!("http client: {}", e)))?,
        );

        let tmdb = TmdbClient::from_settings(settings, Arc::clone(&http_client));
        let region = tmdb.region();

        let links = settings.watchmode_api_key().map(|key| {
            let mut catalog = WatchmodeClient::new(key.to_string(), Arc::clone(&http_client));
            if let Some(base_url) = &settings.watchmode_base_url {
                catalog = catalog.with_base_url(base_url.as_str());
            }
            let catalog = Arc::new(catalog);
            let metadata = Arc::new(ProviderMetadataCache::new(catalog.clone()));
            ProviderLinkAggregator::new(catalog, metadata, region.as_deref())
        });

        let stats = settings.youtube_api_key().map(|key| {
            let mut client = YoutubeStatsClient::new(key.to_string(), Arc::clone(&http_client));
            if let Some(base_url) = &settings.youtube_base_url {
                client = client.with_base_url(base_url.as_str());
            }
            Arc::new(client) as Arc<dyn VideoStats>
        });

        info!(
            region = region.as_deref().unwrap_or("none"),
            streaming_links = links.is_some(),
            trailer_stats = stats.is_some(),
            "movie browser ready"
        );
        Ok(Self::new(tmdb, links, stats))
    }

    /// Searches when the request carries text, otherwise discovers with the
    /// request's filters.
    pub async fn browse(&self, request: &BrowseRequest) -> Result<MoviePage, ApiError> {
        if request.is_search() {
            debug!(query = %request.query, "browse: search");
            self.tmdb
                .search(&request.query, request.filters.year, request.filters.page)
                .await
        } else {
            debug!(sort = %request.filters.sort_by, "browse: discover");
            self.tmdb.discover(&request.filters).await
        }
    }

    pub async fn genres(&self) -> Result<Vec<Genre>, ApiError> {
        self.tmdb.genres().await
    }

    /// Streaming links, or none when no watch-provider catalog is configured.
    pub async fn streaming_links(&self, movie_id: MovieId) -> Vec<StreamingLink> {
        match &self.links {
            Some(aggregator) => aggregator.aggregate(movie_id).await,
            None => Vec::new(),
        }
    }
}
