use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::streaming::{ProviderCatalog, ProviderMetadata, SourceId};

pub type MetadataMap = HashMap<SourceId, ProviderMetadata>;

/// Session-long memo of the catalog's source descriptors.
///
/// Built once at startup and shared by handle. The first successful fetch is
/// kept for the cache's lifetime; a failed fetch yields an empty map and is
/// retried on the next call.
pub struct ProviderMetadataCache {
    catalog: Arc<dyn ProviderCatalog>,
    entries: Mutex<Option<Arc<MetadataMap>>>,
}

impl ProviderMetadataCache {
    pub fn new(catalog: Arc<dyn ProviderCatalog>) -> Self {
        Self {
            catalog,
            entries: Mutex::new(None),
        }
    }

    pub async fn get_all(&self) -> Arc<MetadataMap> {
        let mut entries = self.entries.lock().await;
        if let Some(cached) = entries.as_ref() {
            return Arc::clone(cached);
        }

        match self.catalog.all_source_metadata().await {
            Ok(list) => {
                let map: MetadataMap = list.into_iter().map(|m| (m.id, m)).collect();
                debug!(catalog = self.catalog.name(), sources = map.len(), "provider metadata cached");
                let map = Arc::new(map);
                *entries = Some(Arc::clone(&map));
                map
            }
            Err(err) => {
                warn!(catalog = self.catalog.name(), error = %err, "provider metadata unavailable");
                Arc::new(MetadataMap::new())
            }
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.entries.lock().await.is_some()
    }
}
