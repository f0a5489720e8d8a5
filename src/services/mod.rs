//! Business logic: source registry, model discovery, and the catalog.

pub mod catalog;
pub mod discovery;
pub mod registry;

// Re-export commonly used types
pub use catalog::{CatalogEntry, ModelCatalog};
pub use discovery::ModelDiscovery;
pub use registry::{ProviderSource, SourceRegistry};
