//! Upstream source registry.
//!
//! Pure data built once at startup: each configured base URL plus the
//! credential looked up from its derived environment variable. Immutable
//! after construction, so request handlers read it without locking.

use url::Url;

use crate::core::config::{api_key_env_name, AppConfig};

/// A single configured upstream source, identified by its base URL.
#[derive(Debug, Clone)]
pub struct ProviderSource {
    /// Base URL, unique across the registry
    pub base_url: String,

    /// Upstream credential; empty when the environment variable was unset
    pub api_key: String,
}

impl ProviderSource {
    /// Hostname of this source, used as the default `owned_by` label.
    pub fn hostname(&self) -> String {
        source_hostname(&self.base_url)
    }
}

/// Hostname of an upstream base URL, falling back to the raw URL when it
/// does not parse.
pub fn source_hostname(base_url: &str) -> String {
    Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| base_url.to_string())
}

/// Ordered collection of upstream sources.
///
/// Order is registration order: discovery walks the registry front to back,
/// which is what gives earlier sources first claim on model ids.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<ProviderSource>,
}

impl SourceRegistry {
    /// Build a registry from an explicit source list.
    pub fn new(sources: Vec<ProviderSource>) -> Self {
        Self { sources }
    }

    /// Build the registry from configuration, resolving each credential
    /// from the environment.
    ///
    /// A missing credential is logged and tolerated; the source is
    /// registered with an empty key and will simply fail authentication
    /// upstream.
    pub fn from_env(config: &AppConfig) -> Self {
        let mut sources = Vec::with_capacity(config.upstream_base_urls.len());
        for base_url in &config.upstream_base_urls {
            let env_name = api_key_env_name(base_url);
            let api_key = match std::env::var(&env_name) {
                Ok(key) => key,
                Err(_) => {
                    tracing::warn!(
                        base_url = %base_url,
                        env_var = %env_name,
                        "No credential found for source; registering with empty key"
                    );
                    String::new()
                }
            };
            tracing::info!(
                base_url = %base_url,
                env_var = %env_name,
                "Registered upstream source"
            );
            sources.push(ProviderSource {
                base_url: base_url.clone(),
                api_key,
            });
        }
        Self { sources }
    }

    /// Look up a source by its base URL.
    pub fn lookup(&self, base_url: &str) -> Option<&ProviderSource> {
        self.sources.iter().find(|s| s.base_url == base_url)
    }

    /// Iterate sources in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ProviderSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
