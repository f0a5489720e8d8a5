//! Upstream model discovery.
//!
//! Populates the model catalog exactly once at bootstrap by querying each
//! registered source's `/models` endpoint with linear-backoff retry. A
//! source that exhausts its retries falls back to its statically configured
//! models; a source with no fallback simply contributes nothing. Discovery
//! failures never escape this module.

use thiserror::Error;

use crate::api::models::{ModelInfo, UpstreamModel, UpstreamModelList};
use crate::core::config::FallbackModel;
use crate::core::retry::RetryPolicy;
use crate::services::catalog::{CatalogBuilder, CatalogEntry, ModelCatalog};
use crate::services::registry::{ProviderSource, SourceRegistry};

/// Internal per-attempt failure. Retried and ultimately absorbed; never
/// surfaced to a caller.
#[derive(Debug, Error)]
enum DiscoveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("empty model list")]
    EmptyList,
}

/// One-shot catalog builder over the registered sources.
pub struct ModelDiscovery<'a> {
    registry: &'a SourceRegistry,
    fallback_models: &'a [FallbackModel],
    http_client: &'a reqwest::Client,
    policy: RetryPolicy,
}

impl<'a> ModelDiscovery<'a> {
    pub fn new(
        registry: &'a SourceRegistry,
        fallback_models: &'a [FallbackModel],
        http_client: &'a reqwest::Client,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            registry,
            fallback_models,
            http_client,
            policy,
        }
    }

    /// Query every source in registration order and build the catalog.
    ///
    /// Sources are processed sequentially; one source failing has no effect
    /// on the others.
    pub async fn build_catalog(&self) -> ModelCatalog {
        let mut builder = CatalogBuilder::default();

        for source in self.registry.iter() {
            match self.fetch_models(source).await {
                Some(models) => register_discovered(&mut builder, source, models),
                None => self.register_fallbacks(&mut builder, source),
            }
        }

        let catalog = builder.finish();
        tracing::info!(
            sources = self.registry.len(),
            models = catalog.len(),
            "Model catalog built"
        );
        catalog
    }

    /// Fetch a source's model list, retrying per the policy.
    ///
    /// Returns `None` once all attempts are spent.
    async fn fetch_models(&self, source: &ProviderSource) -> Option<Vec<UpstreamModel>> {
        let url = format!("{}/models", source.base_url.trim_end_matches('/'));

        for attempt in 1..=self.policy.max_attempts {
            let delay = self.policy.delay(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.try_fetch(&url, source).await {
                Ok(models) => {
                    tracing::info!(
                        base_url = %source.base_url,
                        attempt,
                        models = models.len(),
                        "Model discovery succeeded"
                    );
                    return Some(models);
                }
                Err(error) => {
                    tracing::warn!(
                        base_url = %source.base_url,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %error,
                        "Model discovery attempt failed"
                    );
                }
            }
        }

        tracing::warn!(
            base_url = %source.base_url,
            "Model discovery exhausted retries; using fallback entries if any"
        );
        None
    }

    /// A response is accepted only when it is a success status, parses as
    /// JSON with a `data` array, and that array is non-empty.
    async fn try_fetch(
        &self,
        url: &str,
        source: &ProviderSource,
    ) -> Result<Vec<UpstreamModel>, DiscoveryError> {
        let response = self
            .http_client
            .get(url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", source.api_key),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status(status));
        }

        let body: UpstreamModelList = response.json().await?;
        if body.data.is_empty() {
            return Err(DiscoveryError::EmptyList);
        }
        Ok(body.data)
    }

    /// Register this source's static fallback entries after live discovery
    /// has failed for it.
    fn register_fallbacks(&self, builder: &mut CatalogBuilder, source: &ProviderSource) {
        let owner = source.hostname();
        for fallback in self
            .fallback_models
            .iter()
            .filter(|f| f.source_key == source.base_url)
        {
            let entry = CatalogEntry {
                source_key: source.base_url.clone(),
                upstream_model_id: fallback.id.clone(),
            };
            let info = ModelInfo {
                id: fallback.id.clone(),
                object: "model".to_string(),
                owned_by: owner.clone(),
            };
            if builder.register(entry, info) {
                tracing::info!(
                    model = %fallback.id,
                    base_url = %source.base_url,
                    "Registered fallback model"
                );
            }
        }
    }
}

fn register_discovered(
    builder: &mut CatalogBuilder,
    source: &ProviderSource,
    models: Vec<UpstreamModel>,
) {
    let owner = source.hostname();
    let mut registered = 0usize;

    for model in models {
        let entry = CatalogEntry {
            source_key: source.base_url.clone(),
            upstream_model_id: model.id.clone(),
        };
        let info = ModelInfo {
            id: model.id,
            object: model.object.unwrap_or_else(|| "model".to_string()),
            owned_by: model.owned_by.unwrap_or_else(|| owner.clone()),
        };
        if builder.register(entry, info) {
            registered += 1;
        }
    }

    tracing::info!(
        base_url = %source.base_url,
        registered,
        "Registered discovered models"
    );
}
