use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::locale::{FallbackChain, LanguageTag, LocaleContext};
use crate::media::{
    ApiError, CastMember, CreditsResponse, DiscoverFilters, Genre, GenreListResponse,
    MovieDetails, MovieId, MoviePage,
};
use crate::resolver::resolve_usable;
use crate::settings::AppSettings;
use crate::video::{TrailerVideo, VideosResponse};

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

type Query = Vec<(&'static str, String)>;

/// Client for the movie metadata catalog. Every text-bearing request walks the
/// language fallback chain.
#[derive(Clone)]
pub struct TmdbClient {
    token: String,
    base_url: String,
    locale: LocaleContext,
    http_client: Arc<reqwest::Client>,
}

impl TmdbClient {
    pub fn new(token: String, locale: LocaleContext) -> Self {
        Self {
            token,
            base_url: String::from(TMDB_BASE_URL),
            locale,
            http_client: Arc::new(reqwest::Client::new()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_http_client(mut self, http_client: Arc<reqwest::Client>) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn from_settings(settings: &AppSettings, http_client: Arc<reqwest::Client>) -> Self {
        let locale = LocaleContext::from_env(settings.language_tags())
            .with_region_override(settings.region.clone());
        Self::new(settings.tmdb_token.clone(), locale)
            .with_base_url(settings.tmdb_base_url())
            .with_http_client(http_client)
    }

    pub fn region(&self) -> Option<String> {
        self.locale.region()
    }

    pub fn chain(&self, original_language: Option<&str>) -> FallbackChain {
        self.locale.chain(original_language)
    }

    async fn fetch_response(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<reqwest::Response, ApiError> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        match response.status().as_u16() {
            401 => Err(ApiError::Unauthorized),
            429 => Err(ApiError::RateLimit),
            s if s >= 400 => Err(ApiError::Http(s)),
            _ => Ok(response),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Query,
    ) -> Result<T, ApiError> {
        debug!(path, ?query, "catalog request");
        self.fetch_response(path, &query)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.without_url().to_string()))
    }

    pub async fn discover(&self, filters: &DiscoverFilters) -> Result<MoviePage, ApiError> {
        let chain = self.chain(None);
        let region = self.region();
        resolve_usable(&chain, |tag| {
            let query = discover_query(filters, &tag, region.as_deref());
            self.fetch_json("/discover/movie", query)
        })
        .await
    }

    pub async fn search(
        &self,
        text: &str,
        year: Option<u32>,
        page: Option<u32>,
    ) -> Result<MoviePage, ApiError> {
        if text.trim().is_empty() {
            return Err(ApiError::InvalidInput(String::from("search text is empty")));
        }
        let chain = self.chain(None);
        resolve_usable(&chain, |tag| {
            let mut query: Query = vec![
                ("include_adult", String::from("false")),
                ("language", tag.to_string()),
                ("page", page.unwrap_or(1).to_string()),
                ("query", text.trim().to_string()),
            ];
            if let Some(year) = year {
                query.push(("year", year.to_string()));
            }
            self.fetch_json("/search/movie", query)
        })
        .await
    }

    pub async fn genres(&self) -> Result<Vec<Genre>, ApiError> {
        let chain = self.chain(None);
        let response: GenreListResponse = resolve_usable(&chain, |tag| {
            self.fetch_json("/genre/movie/list", language_query(&tag))
        })
        .await?;
        Ok(response.genres)
    }

    pub async fn credits(
        &self,
        id: MovieId,
        original_language: Option<&str>,
    ) -> Result<Vec<CastMember>, ApiError> {
        let chain = self.chain(original_language);
        let path = format!("/movie/{}/credits", id);
        let response: CreditsResponse = resolve_usable(&chain, |tag| {
            self.fetch_json(&path, language_query(&tag))
        })
        .await?;

        let mut cast = response.cast;
        cast.sort_by_key(|c| c.order);
        Ok(cast)
    }

    pub async fn videos(
        &self,
        id: MovieId,
        original_language: Option<&str>,
    ) -> Result<Vec<TrailerVideo>, ApiError> {
        let chain = self.chain(original_language);
        let path = format!("/movie/{}/videos", id);
        let response: VideosResponse = resolve_usable(&chain, |tag| {
            self.fetch_json(&path, language_query(&tag))
        })
        .await?;
        Ok(response.results)
    }

    pub async fn details(
        &self,
        id: MovieId,
        original_language: Option<&str>,
    ) -> Result<MovieDetails, ApiError> {
        let chain = self.chain(original_language);
        let path = format!("/movie/{}", id);
        resolve_usable(&chain, |tag| self.fetch_json(&path, language_query(&tag))).await
    }
}

fn language_query(tag: &LanguageTag) -> Query {
    vec![("language", tag.to_string())]
}

fn discover_query(filters: &DiscoverFilters, tag: &LanguageTag, region: Option<&str>) -> Query {
    let mut query: Query = vec![
        ("include_adult", String::from("false")),
        ("include_video", String::from("false")),
        ("language", tag.to_string()),
        ("page", filters.page.unwrap_or(1).to_string()),
        ("sort_by", filters.sort_by.as_query().to_string()),
    ];
    if let Some(year) = filters.year {
        query.push(("year", year.to_string()));
    }
    if let Some(genre_id) = filters.genre_id {
        query.push(("with_genres", genre_id.to_string()));
    }
    if let Some(region) = region {
        query.push(("region", region.to_string()));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SortOption;

    #[test]
    fn discover_query_carries_filters_and_region() {
        let filters = DiscoverFilters {
            sort_by: SortOption::TitleAsc,
            year: Some(1999),
            genre_id: Some(878),
            page: Some(3),
        };
        let tag = LanguageTag::parse("fr-FR").unwrap();
        let query = discover_query(&filters, &tag, Some("FR"));

        let get = |key: &str| {
            query
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("language"), Some("fr-FR"));
        assert_eq!(get("sort_by"), Some("title.asc"));
        assert_eq!(get("year"), Some("1999"));
        assert_eq!(get("with_genres"), Some("878"));
        assert_eq!(get("page"), Some("3"));
        assert_eq!(get("region"), Some("FR"));
    }

    #[test]
    fn discover_query_omits_unset_filters() {
        let tag = LanguageTag::default_tag();
        let query = discover_query(&DiscoverFilters::default(), &tag, None);
        let keys: Vec<&str> = query.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["include_adult", "include_video", "language", "page", "sort_by"]
        );
    }

    #[tokio::test]
    async fn empty_search_text_is_rejected_without_a_request() {
        let client = TmdbClient::new(
            String::from("token"),
            LocaleContext::new(vec![String::from("en-US")], None),
        )
        .with_base_url("http://127.0.0.1:9");
        assert!(matches!(
            client.search("   ", None, None).await,
            Err(ApiError::InvalidInput(_))
        ));
    }
}
