//! LLM Gateway - a unified routing proxy for OpenAI-compatible APIs
//!
//! This library fronts several upstream chat-completion providers with a
//! single endpoint:
//!
//! - **Model catalog bootstrap**: each source's model list is discovered at
//!   startup with linear-backoff retry and a static fallback table
//! - **Model resolution**: a client-visible model id maps to exactly one
//!   source and upstream model id (first source to register an id wins)
//! - **Transparent forwarding**: requests are relayed with the source's
//!   credential injected, the path translated, and the `model` field
//!   rewritten; response bodies pass through untouched
//! - **Proxy authentication**: inbound callers present a shared bearer
//!   secret, separate from any upstream credential
//!
//! # Architecture
//!
//! The codebase is organized into three layers:
//!
//! - [`core`]: configuration, errors, retry policy, middleware
//! - [`api`]: HTTP handlers, authentication, and wire models
//! - [`services`]: source registry, discovery, and the model catalog
//!
//! # Configuration
//!
//! Everything comes from the environment (see [`core::config::AppConfig`]):
//! `PROXY_AUTH_KEY` for the inbound secret, one variable per upstream
//! source named after its second-level domain (e.g. `POLLINATIONS`), and
//! optional `UPSTREAM_BASE_URLS`, `REDIRECT_URL`, `HOST`, `PORT`,
//! `REQUEST_TIMEOUT_SECS` overrides.

pub mod api;
pub mod core;
pub mod services;

// Re-export commonly used types for convenience
pub use crate::api::{router, AppState, ModelInfo, ModelList};
pub use crate::core::{AppConfig, AppError, Result, RetryPolicy};
pub use crate::services::{ModelCatalog, ProviderSource, SourceRegistry};
