use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::locale::DEFAULT_REGION;
use crate::media::MovieId;
use crate::streaming::cache::MetadataMap;
use crate::streaming::{
    ProviderCatalog, ProviderMetadataCache, ProviderSource, SourceId, StreamingLink, TitleId,
};

/// Regions tried for sources: the user's, then the global default.
pub fn region_fallback(detected: Option<&str>) -> Vec<String> {
    let mut regions = Vec::with_capacity(2);
    if let Some(region) = detected.map(str::trim).filter(|r| !r.is_empty()) {
        regions.push(region.to_ascii_uppercase());
    }
    if !regions.iter().any(|r| r == DEFAULT_REGION) {
        regions.push(String::from(DEFAULT_REGION));
    }
    regions
}

/// Assembles the deduplicated, preference-sorted streaming links of a movie.
///
/// Never fails: every catalog error degrades to fewer (or no) links.
#[derive(Clone)]
pub struct ProviderLinkAggregator {
    catalog: Arc<dyn ProviderCatalog>,
    metadata: Arc<ProviderMetadataCache>,
    regions: Vec<String>,
}

impl ProviderLinkAggregator {
    pub fn new(
        catalog: Arc<dyn ProviderCatalog>,
        metadata: Arc<ProviderMetadataCache>,
        detected_region: Option<&str>,
    ) -> Self {
        Self {
            catalog,
            metadata,
            regions: region_fallback(detected_region),
        }
    }

    pub async fn aggregate(&self, movie_id: MovieId) -> Vec<StreamingLink> {
        let title_id = match self.catalog.find_title_id(movie_id).await {
            Ok(Some(title_id)) => title_id,
            Ok(None) => {
                debug!(movie_id, catalog = self.catalog.name(), "no cross-catalog mapping");
                return Vec::new();
            }
            Err(err) => {
                warn!(movie_id, error = %err, "title lookup failed");
                return Vec::new();
            }
        };

        let sources = self.first_regional_sources(title_id).await;
        if sources.is_empty() {
            return Vec::new();
        }

        let metadata = self.metadata.get_all().await;
        merge_sources(sources, &metadata)
    }

    async fn first_regional_sources(&self, title_id: TitleId) -> Vec<ProviderSource> {
        for region in &self.regions {
            match self.catalog.sources(title_id, Some(region)).await {
                Ok(sources) if !sources.is_empty() => {
                    debug!(title_id, %region, count = sources.len(), "sources found");
                    return sources;
                }
                Ok(_) => debug!(title_id, %region, "no sources in region"),
                Err(err) => warn!(title_id, %region, error = %err, "source lookup failed"),
            }
        }
        Vec::new()
    }
}

/// Drops link-less sources, keeps the preferred offer per source, attaches
/// metadata and sorts by offer preference.
pub fn merge_sources(sources: Vec<ProviderSource>, metadata: &MetadataMap) -> Vec<StreamingLink> {
    let mut order: Vec<SourceId> = Vec::new();
    let mut best: HashMap<SourceId, ProviderSource> = HashMap::new();

    for source in sources.into_iter().filter(|s| s.usable_link().is_some()) {
        let replace = match best.get(&source.source_id) {
            Some(kept) => source.kind.rank() < kept.kind.rank(),
            None => {
                order.push(source.source_id);
                true
            }
        };
        if replace {
            best.insert(source.source_id, source);
        }
    }

    let mut links: Vec<StreamingLink> = order
        .into_iter()
        .filter_map(|id| best.remove(&id))
        .filter_map(|source| {
            let web_url = source.usable_link()?.to_string();
            let meta = metadata.get(&source.source_id);
            Some(StreamingLink {
                source_id: source.source_id,
                name: source.name,
                kind: source.kind,
                region: source.region,
                web_url,
                canonical_name: meta.map(|m| m.name.clone()),
                logo_url: meta.and_then(|m| m.logo_url.clone()),
            })
        })
        .collect();

    links.sort_by_key(|link| link.kind.rank());
    links
}
