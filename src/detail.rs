use tracing::debug;

use crate::browser::MovieBrowser;
use crate::media::{ApiError, CastMember, Movie, MovieId};
use crate::streaming::StreamingLink;
use crate::video::{rank_trailers, select_best_trailer, RankedTrailer, TrailerVideo};

/// Everything the detail overlay shows for one movie. Sections fail
/// independently of each other.
#[derive(Debug, Clone)]
pub struct DetailOverlay {
    pub movie_id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    pub overview: String,
    pub runtime: Result<Option<u32>, ApiError>,
    pub cast: Result<Vec<CastMember>, ApiError>,
    pub trailers: Result<Vec<RankedTrailer>, ApiError>,
    pub streaming_links: Vec<StreamingLink>,
}

impl DetailOverlay {
    pub fn top_cast(&self, count: usize) -> &[CastMember] {
        match &self.cast {
            Ok(cast) => &cast[..cast.len().min(count)],
            Err(_) => &[],
        }
    }

    pub fn best_trailer(&self) -> Option<&RankedTrailer> {
        self.trailers.as_ref().ok().and_then(|t| t.first())
    }
}

/// Orders hosted videos by kind when no view counts are available.
fn order_by_kind(videos: Vec<TrailerVideo>) -> Vec<RankedTrailer> {
    let best_key = select_best_trailer(&videos).map(|v| v.key.clone());
    let mut ranked: Vec<RankedTrailer> = videos
        .into_iter()
        .filter(|v| v.is_youtube() && v.is_trailer())
        .map(|video| RankedTrailer {
            video,
            view_count: 0,
        })
        .collect();
    ranked.sort_by_key(|t| Some(&t.video.key) != best_key.as_ref());
    ranked
}

impl MovieBrowser {
    pub async fn ranked_trailers(
        &self,
        movie_id: MovieId,
        original_language: Option<&str>,
    ) -> Result<Vec<RankedTrailer>, ApiError> {
        let videos = self.tmdb.videos(movie_id, original_language).await?;
        Ok(match &self.stats {
            Some(stats) => rank_trailers(videos, stats.as_ref()).await,
            None => order_by_kind(videos),
        })
    }

    /// Looks the movie up first to learn its original language.
    pub async fn load_detail_overlay_by_id(
        &self,
        movie_id: MovieId,
    ) -> Result<DetailOverlay, ApiError> {
        let details = self.tmdb.details(movie_id, None).await?;
        Ok(self.load_detail_overlay(&Movie::from(&details)).await)
    }

    /// Loads cast, trailers, details and streaming links concurrently for the
    /// selected movie.
    pub async fn load_detail_overlay(&self, movie: &Movie) -> DetailOverlay {
        let original_language = movie.original_language.as_deref();
        debug!(movie_id = movie.id, ?original_language, "loading detail overlay");

        let (cast, trailers, details, streaming_links) = tokio::join!(
            self.tmdb.credits(movie.id, original_language),
            self.ranked_trailers(movie.id, original_language),
            self.tmdb.details(movie.id, original_language),
            self.streaming_links(movie.id),
        );

        let overview = details
            .as_ref()
            .ok()
            .map(|d| d.overview.trim())
            .filter(|o| !o.is_empty())
            .unwrap_or(movie.overview.as_str())
            .to_string();

        DetailOverlay {
            movie_id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            overview,
            runtime: details.map(|d| d.runtime.filter(|r| *r > 0)),
            cast,
            trailers,
            streaming_links,
        }
    }
}
