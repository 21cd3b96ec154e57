//! Movie discovery client: localized catalog lookups with language fallback,
//! aggregated streaming links and trailer ranking.

pub mod browser;
pub mod detail;
pub mod locale;
pub mod media;
pub mod resolver;
pub mod settings;
pub mod streaming;
pub mod tmdb;
pub mod video;

pub use browser::MovieBrowser;
pub use detail::DetailOverlay;
pub use locale::{build_chain, FallbackChain, LanguageTag, LocaleContext};
pub use media::{ApiError, BrowseRequest, DiscoverFilters, Movie, MoviePage, SortOption};
pub use resolver::{resolve, resolve_usable};
pub use settings::AppSettings;
pub use streaming::{ProviderLinkAggregator, ProviderMetadataCache, StreamingLink};
