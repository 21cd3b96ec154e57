use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

pub type MovieId = u64;

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Failures raised by the metadata catalog and the video statistics service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error: {0}")]
    Http(u16),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("rate limited")]
    RateLimit,
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs may carry api keys.
        let err = err.without_url();
        if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Payloads that can tell the fallback resolver whether they are worth keeping.
pub trait Usable {
    fn is_usable(&self) -> bool;
}

impl<T> Usable for Vec<T> {
    fn is_usable(&self) -> bool {
        !self.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreListResponse {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl Usable for GenreListResponse {
    fn is_usable(&self) -> bool {
        !self.genres.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    pub original_language: Option<String>,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub adult: bool,
}

impl Movie {
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    }
}

/// One page of discover or search results.
#[derive(Debug, Clone, Deserialize)]
pub struct MoviePage {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

impl MoviePage {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

impl Usable for MoviePage {
    fn is_usable(&self) -> bool {
        !self.results.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: String,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditsResponse {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

impl Usable for CreditsResponse {
    fn is_usable(&self) -> bool {
        !self.cast.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub original_language: Option<String>,
    pub imdb_id: Option<String>,
    pub homepage: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl From<&MovieDetails> for Movie {
    fn from(details: &MovieDetails) -> Self {
        Self {
            id: details.id,
            title: details.title.clone(),
            original_title: details.original_title.clone(),
            original_language: details.original_language.clone(),
            overview: details.overview.clone(),
            poster_path: details.poster_path.clone(),
            backdrop_path: details.backdrop_path.clone(),
            release_date: details.release_date.clone(),
            genre_ids: details.genres.iter().map(|g| g.id).collect(),
            popularity: 0.0,
            vote_average: 0.0,
            vote_count: 0,
            adult: false,
        }
    }
}

impl Usable for MovieDetails {
    fn is_usable(&self) -> bool {
        !self.overview.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    #[default]
    PopularityDesc,
    PopularityAsc,
    TitleAsc,
    TitleDesc,
    RatingDesc,
    ReleaseDateDesc,
}

impl SortOption {
    pub fn as_query(&self) -> &'static str {
        match self {
            SortOption::PopularityDesc => "popularity.desc",
            SortOption::PopularityAsc => "popularity.asc",
            SortOption::TitleAsc => "title.asc",
            SortOption::TitleDesc => "title.desc",
            SortOption::RatingDesc => "vote_average.desc",
            SortOption::ReleaseDateDesc => "primary_release_date.desc",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

impl FromStr for SortOption {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "popularity.desc" => Ok(SortOption::PopularityDesc),
            "popularity.asc" => Ok(SortOption::PopularityAsc),
            "title.asc" => Ok(SortOption::TitleAsc),
            "title.desc" => Ok(SortOption::TitleDesc),
            "vote_average.desc" => Ok(SortOption::RatingDesc),
            "primary_release_date.desc" => Ok(SortOption::ReleaseDateDesc),
            other => Err(ApiError::InvalidInput(format!("unknown sort option: {other}"))),
        }
    }
}

/// Filters applied to a discover request.
#[derive(Debug, Clone, Default)]
pub struct DiscoverFilters {
    pub sort_by: SortOption,
    pub year: Option<u32>,
    pub genre_id: Option<u64>,
    pub page: Option<u32>,
}

/// What the search bar submits: free text plus the discover filters.
#[derive(Debug, Clone, Default)]
pub struct BrowseRequest {
    pub query: String,
    pub filters: DiscoverFilters,
}

impl BrowseRequest {
    pub fn is_search(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

#[derive(Clone, Copy)]
pub enum ImageSize {
    Poster,
    Profile,
}

pub fn image_url(path: &str, size: ImageSize) -> String {
    let size_path = match size {
        ImageSize::Poster => "w500",
        ImageSize::Profile => "w185",
    };
    format!("{}/{}{}", IMAGE_BASE_URL, size_path, path)
}

pub fn truncate_description(description: &str, max_length: usize) -> String {
    if description.chars().count() <= max_length {
        return description.to_string();
    }
    let truncated: String = description.chars().take(max_length).collect();
    format!(
        "{}...",
        truncated.rfind(' ').map_or(truncated.as_str(), |i| &truncated[..i])
    )
}
