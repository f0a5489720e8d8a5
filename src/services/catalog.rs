//! Model catalog: the mapping from client-visible model ids to their
//! upstream source and upstream-specific model id.
//!
//! The catalog is built once by discovery at bootstrap and never mutated
//! afterwards, so handlers resolve models without locking.

use std::collections::HashMap;

use crate::api::models::ModelInfo;

/// Where a client-visible model id routes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Base URL of the owning source (key into the source registry)
    pub source_key: String,

    /// Model id to send upstream, which may differ from the client id
    pub upstream_model_id: String,
}

/// Read-only mapping plus the sorted listing projection.
#[derive(Debug, Default)]
pub struct ModelCatalog {
    entries: HashMap<String, CatalogEntry>,
    listing: Vec<ModelInfo>,
}

impl ModelCatalog {
    /// Resolve a client-visible model id.
    pub fn resolve(&self, model_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(model_id)
    }

    /// Enumerable projection, sorted lexicographically by id.
    pub fn list(&self) -> &[ModelInfo] {
        &self.listing
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write side of the catalog, used only during discovery.
///
/// `finish` sorts the listing and freezes the catalog.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: ModelCatalog,
}

impl CatalogBuilder {
    /// Register a model. The first source to claim an id wins; a later
    /// duplicate is dropped and `false` is returned.
    pub fn register(&mut self, entry: CatalogEntry, info: ModelInfo) -> bool {
        if self.catalog.entries.contains_key(&info.id) {
            tracing::debug!(
                model = %info.id,
                source = %entry.source_key,
                "Model id already claimed by an earlier source; dropping"
            );
            return false;
        }
        self.catalog.entries.insert(info.id.clone(), entry);
        self.catalog.listing.push(info);
        true
    }

    pub fn finish(mut self) -> ModelCatalog {
        self.catalog.listing.sort_by(|a, b| a.id.cmp(&b.id));
        self.catalog
    }
}
