//! HTTP handlers and shared application state.
//!
//! The state owns the single-flight catalog bootstrap: no matter how many
//! requests race the first one, discovery runs at most once per process
//! lifetime and every caller awaits the same build.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use futures::TryStreamExt;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::api::auth::verify_proxy_auth;
use crate::api::models::ModelList;
use crate::core::config::AppConfig;
use crate::core::retry::RetryPolicy;
use crate::core::{AppError, Result};
use crate::services::catalog::ModelCatalog;
use crate::services::discovery::ModelDiscovery;
use crate::services::registry::SourceRegistry;

/// Inbound path prefix stripped before concatenating with an upstream base
/// URL.
const PROXY_PATH_PREFIX: &str = "/v1";

/// Headers never copied onto the upstream request. Authorization and
/// content type are overridden instead of copied; the rest are owned by the
/// transport.
const SKIPPED_REQUEST_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "transfer-encoding",
    "connection",
    "authorization",
    "content-type",
];

/// Hop-by-hop headers never relayed back from the upstream response.
const SKIPPED_RESPONSE_HEADERS: &[&str] = &["transfer-encoding", "connection"];

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    pub registry: SourceRegistry,
    pub http_client: reqwest::Client,
    pub retry_policy: RetryPolicy,
    catalog: OnceCell<ModelCatalog>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        registry: SourceRegistry,
        http_client: reqwest::Client,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            config,
            registry,
            http_client,
            retry_policy,
            catalog: OnceCell::new(),
        }
    }

    /// The model catalog, built on first use.
    ///
    /// Concurrent first callers all await the same in-flight discovery
    /// pass; once built the catalog is immutable for the process lifetime.
    pub async fn catalog(&self) -> &ModelCatalog {
        self.catalog
            .get_or_init(|| async {
                tracing::info!("Bootstrapping model catalog");
                ModelDiscovery::new(
                    &self.registry,
                    &self.config.fallback_models,
                    &self.http_client,
                    self.retry_policy,
                )
                .build_catalog()
                .await
            })
            .await
    }
}

/// `GET /v1/models`: the catalog listing, sorted by model id.
pub async fn list_models(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response> {
    verify_proxy_auth(&headers, state.config.proxy_auth_key.as_deref())?;

    let catalog = state.catalog().await;
    Ok(Json(ModelList::new(catalog.list().to_vec())).into_response())
}

/// `/v1/*`: resolve the requested model and forward the request to its
/// upstream source.
pub async fn forward_request(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    verify_proxy_auth(&headers, state.config.proxy_auth_key.as_deref())?;

    let mut payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("request body is not valid JSON: {}", e)))?;
    let requested_model = payload
        .get("model")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("missing 'model' field in request body".to_string()))?;

    let catalog = state.catalog().await;
    let entry = catalog
        .resolve(&requested_model)
        .ok_or_else(|| AppError::ModelNotFound(requested_model.clone()))?;

    // Unreachable as long as the catalog only ever references registered
    // sources; surfaced as an internal error if that invariant breaks.
    let source = state.registry.lookup(&entry.source_key).ok_or_else(|| {
        AppError::Internal(format!(
            "no source configured for model '{}'",
            requested_model
        ))
    })?;

    let upstream_path = uri
        .path()
        .strip_prefix(PROXY_PATH_PREFIX)
        .unwrap_or_else(|| uri.path());
    let upstream_url = format!(
        "{}{}",
        source.base_url.trim_end_matches('/'),
        upstream_path
    );

    payload["model"] = Value::String(entry.upstream_model_id.clone());

    tracing::debug!(
        model = %requested_model,
        upstream_model = %entry.upstream_model_id,
        url = %upstream_url,
        "Forwarding request upstream"
    );

    let upstream_method = reqwest::Method::from_bytes(method.as_str().as_bytes())
        .map_err(|_| AppError::BadRequest(format!("unsupported method '{}'", method)))?;

    let mut request = state.http_client.request(upstream_method, &upstream_url);
    for (name, value) in headers.iter() {
        if SKIPPED_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }
        request = request.header(name.as_str(), value.as_bytes());
    }
    request = request
        .header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", source.api_key),
        )
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(serde_json::to_vec(&payload)?);

    let upstream_response = request.send().await.map_err(|error| {
        tracing::error!(
            url = %upstream_url,
            error = %error,
            "Forwarding to upstream failed"
        );
        AppError::Upstream(error)
    })?;

    relay_response(upstream_response)
}

/// Relay an upstream response unchanged: status, headers, and a streamed
/// body.
fn relay_response(upstream: reqwest::Response) -> Result<Response> {
    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut builder = Response::builder().status(status);
    for (name, value) in upstream.headers() {
        if SKIPPED_RESPONSE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let body = Body::from_stream(upstream.bytes_stream().map_err(std::io::Error::other));
    builder
        .body(body)
        .map_err(|e| AppError::Internal(format!("failed to build relay response: {}", e)))
}

/// Any path outside the proxy surface redirects to the configured fallback
/// location. Authentication still applies; only preflight bypasses it.
pub async fn redirect_fallback(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response> {
    verify_proxy_auth(&headers, state.config.proxy_auth_key.as_deref())?;

    tracing::debug!(path = %uri.path(), "Unrecognized path; redirecting");
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, state.config.redirect_url.clone())],
    )
        .into_response())
}
