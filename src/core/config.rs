//! Configuration for the gateway.
//!
//! All configuration comes from environment variables (plus an optional
//! `.env` file loaded at startup), read exactly once. The upstream source
//! list ships with a built-in default and can be overridden with
//! `UPSTREAM_BASE_URLS`.

use url::Url;

/// Built-in upstream base URLs, in registration order.
///
/// Registration order matters: it drives discovery order, and the first
/// source to register a model id owns it.
const DEFAULT_UPSTREAM_BASE_URLS: &[&str] = &[
    "https://kokoai.de/v1",
    "https://text.pollinations.ai/openai",
    "https://api.nyxar.org/v1",
    "https://ai.huan666.de/v1",
    "https://api.damoxing.site/v1",
    "https://api.voct.dev/v1",
    "https://apix.778801.xyz/v1",
];

/// Where unrecognized paths are redirected.
const DEFAULT_REDIRECT_URL: &str = "https://www.fimall.lol/";

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Upstream base URLs, in registration order
    pub upstream_base_urls: Vec<String>,

    /// Shared secret inbound callers must present as a bearer token.
    /// `None` means every authenticated route fails closed with HTTP 500.
    pub proxy_auth_key: Option<String>,

    /// Redirect target for unrecognized paths
    pub redirect_url: String,

    /// Static catalog entries used when live discovery exhausts retries
    pub fallback_models: Vec<FallbackModel>,

    /// Server configuration (host, port)
    pub server: ServerConfig,

    /// Request timeout in seconds for upstream calls
    pub request_timeout_secs: u64,
}

/// A statically configured substitute catalog entry, registered only when
/// live discovery against its source fails.
#[derive(Debug, Clone)]
pub struct FallbackModel {
    /// Client-visible model id; also used as the upstream model id
    pub id: String,

    /// Base URL of the source this entry belongs to
    pub source_key: String,
}

/// Server-specific configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    18000
}

fn default_request_timeout() -> u64 {
    300
}

fn default_fallback_models() -> Vec<FallbackModel> {
    vec![FallbackModel {
        id: "openai".to_string(),
        source_key: "https://text.pollinations.ai/openai".to_string(),
    }]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstream_base_urls: DEFAULT_UPSTREAM_BASE_URLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            proxy_auth_key: None,
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            fallback_models: default_fallback_models(),
            server: ServerConfig::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl AppConfig {
    /// Build configuration from the environment.
    ///
    /// Recognized variables:
    /// - `PROXY_AUTH_KEY`: shared proxy secret (absence is tolerated here
    ///   and rejected per-request)
    /// - `UPSTREAM_BASE_URLS`: comma-separated override of the source list
    /// - `REDIRECT_URL`: fallback redirect target
    /// - `HOST` / `PORT`: bind address
    /// - `REQUEST_TIMEOUT_SECS`: outbound request timeout
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("PROXY_AUTH_KEY") {
            if !key.is_empty() {
                config.proxy_auth_key = Some(key);
            }
        }

        if let Ok(urls) = std::env::var("UPSTREAM_BASE_URLS") {
            let urls: Vec<String> = urls
                .split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !urls.is_empty() {
                config.upstream_base_urls = urls;
            }
        }

        if let Ok(url) = std::env::var("REDIRECT_URL") {
            if !url.is_empty() {
                config.redirect_url = url;
            }
        }

        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }

        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                config.server.port = port;
            }
        }

        if let Ok(timeout_str) = std::env::var("REQUEST_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                config.request_timeout_secs = timeout;
            }
        }

        config
    }
}

/// Derive the credential environment variable name for an upstream base URL.
///
/// The name is the second-level domain label of the hostname, upper-cased
/// (`https://api.example.com/v1` -> `EXAMPLE`). If the URL has no parseable
/// hostname, the full URL is sanitized instead: scheme stripped, `.` `/` `-`
/// replaced by `_`, upper-cased.
pub fn api_key_env_name(base_url: &str) -> String {
    match Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    {
        Some(host) => {
            let labels: Vec<&str> = host.split('.').collect();
            let label = if labels.len() >= 2 {
                labels[labels.len() - 2]
            } else {
                labels[0]
            };
            label.to_uppercase()
        }
        None => base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .to_uppercase()
            .replace(['.', '/', '-'], "_"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_api_key_env_name_second_level_domain() {
        assert_eq!(api_key_env_name("https://api.example.com/v1"), "EXAMPLE");
        assert_eq!(api_key_env_name("https://kokoai.de/v1"), "KOKOAI");
        assert_eq!(
            api_key_env_name("https://text.pollinations.ai/openai"),
            "POLLINATIONS"
        );
        assert_eq!(api_key_env_name("https://apix.778801.xyz/v1"), "778801");
    }

    #[test]
    fn test_api_key_env_name_single_label_host() {
        assert_eq!(api_key_env_name("http://localhost/v1"), "LOCALHOST");
    }

    #[test]
    fn test_api_key_env_name_unparseable_url_is_sanitized() {
        assert_eq!(api_key_env_name("no-scheme.example.com/v1"), "NO_SCHEME_EXAMPLE_COM_V1");
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.upstream_base_urls.len(), 7);
        assert!(config.proxy_auth_key.is_none());
        assert_eq!(config.server.port, 18000);
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.fallback_models.len(), 1);
        assert_eq!(config.fallback_models[0].id, "openai");
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("PROXY_AUTH_KEY", "secret123");
        std::env::set_var(
            "UPSTREAM_BASE_URLS",
            "https://one.example.com/v1, https://two.example.com/v1/",
        );
        std::env::set_var("REDIRECT_URL", "https://elsewhere.example.com/");
        std::env::set_var("PORT", "9999");

        let config = AppConfig::from_env();
        assert_eq!(config.proxy_auth_key.as_deref(), Some("secret123"));
        assert_eq!(
            config.upstream_base_urls,
            vec![
                "https://one.example.com/v1".to_string(),
                "https://two.example.com/v1".to_string(),
            ]
        );
        assert_eq!(config.redirect_url, "https://elsewhere.example.com/");
        assert_eq!(config.server.port, 9999);

        std::env::remove_var("PROXY_AUTH_KEY");
        std::env::remove_var("UPSTREAM_BASE_URLS");
        std::env::remove_var("REDIRECT_URL");
        std::env::remove_var("PORT");
    }

    #[test]
    #[serial]
    fn test_from_env_empty_proxy_key_treated_as_missing() {
        std::env::set_var("PROXY_AUTH_KEY", "");
        let config = AppConfig::from_env();
        assert!(config.proxy_auth_key.is_none());
        std::env::remove_var("PROXY_AUTH_KEY");
    }
}
