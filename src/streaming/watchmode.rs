use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::media::MovieId;
use crate::streaming::{
    ProviderCatalog, ProviderMetadata, ProviderSource, StreamError, TitleId,
};

pub const WATCHMODE_BASE_URL: &str = "https://api.watchmode.com/v1";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    title_results: Vec<TitleResult>,
}

#[derive(Debug, Deserialize)]
struct TitleResult {
    id: TitleId,
}

pub struct WatchmodeClient {
    api_key: String,
    base_url: String,
    client: Arc<reqwest::Client>,
}

impl WatchmodeClient {
    pub fn new(api_key: String, client: Arc<reqwest::Client>) -> Self {
        Self {
            api_key,
            base_url: String::from(WATCHMODE_BASE_URL),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, StreamError> {
        if self.api_key.trim().is_empty() {
            return Err(StreamError::Config(String::from("watchmode api key is empty")));
        }

        debug!(path, "watch-provider request");
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&[("apiKey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StreamError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(StreamError::Network(format!("HTTP error: {}", status.as_u16())));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ProviderCatalog for WatchmodeClient {
    fn name(&self) -> &str {
        "watchmode"
    }

    async fn find_title_id(&self, movie_id: MovieId) -> Result<Option<TitleId>, StreamError> {
        let movie_id = movie_id.to_string();
        let response: SearchResponse = self
            .get_json(
                "/search/",
                &[("search_field", "tmdb_movie_id"), ("search_value", movie_id.as_str())],
            )
            .await?;
        Ok(response.title_results.first().map(|t| t.id))
    }

    async fn sources(
        &self,
        title_id: TitleId,
        region: Option<&str>,
    ) -> Result<Vec<ProviderSource>, StreamError> {
        let path = format!("/title/{}/sources/", title_id);
        match region {
            Some(region) => self.get_json(&path, &[("regions", region)]).await,
            None => self.get_json(&path, &[]).await,
        }
    }

    async fn all_source_metadata(&self) -> Result<Vec<ProviderMetadata>, StreamError> {
        self.get_json("/sources/", &[]).await
    }
}
