//! LLM Gateway - main entry point.
//!
//! Wires configuration, the source registry, and the HTTP server together.
//! The model catalog itself is built lazily: the first inbound request (or
//! the background warm-up task, whichever comes first) triggers the one
//! discovery pass for this process lifetime.

use anyhow::Result;
use chrono::Local;
use llm_gateway_rust::{api, AppConfig, AppState, RetryPolicy, SourceRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Time formatter using the local timezone (respects TZ).
struct LocalTime;

impl tracing_subscriber::fmt::time::FormatTime for LocalTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%d %H:%M:%S"))
    }
}

fn init_logging() {
    // Always suppress noisy HTTP library logs, even when RUST_LOG is set to
    // a blanket "info" or "trace".
    let base_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,llm_gateway_rust=debug".to_string());
    let filter_str = format!("{},hyper=warn,h2=warn,reqwest=warn", base_filter);
    let filter = tracing_subscriber::EnvFilter::new(filter_str);

    let no_color = std::env::var("NO_COLOR").is_ok();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTime)
                .with_ansi(!no_color),
        )
        .init();
}

/// Shared HTTP client with connection pooling, used for both discovery and
/// forwarding.
fn create_http_client(config: &AppConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
        .pool_max_idle_per_host(100)
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .tcp_keepalive(std::time::Duration::from_secs(60))
        .build()?;
    Ok(client)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before reading any environment variables)
    dotenvy::dotenv().ok();

    init_logging();

    let config = AppConfig::from_env();
    if config.proxy_auth_key.is_none() {
        tracing::warn!("PROXY_AUTH_KEY is not set; every authenticated route will fail closed");
    }

    let registry = SourceRegistry::from_env(&config);
    tracing::info!(sources = registry.len(), "Source registry configured");

    let http_client = create_http_client(&config)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = Arc::new(AppState::new(
        config,
        registry,
        http_client,
        RetryPolicy::default(),
    ));

    // Warm the catalog in the background; requests arriving first share the
    // same single-flight build instead of starting another one.
    let warmup_state = state.clone();
    tokio::spawn(async move {
        warmup_state.catalog().await;
    });

    let app = api::router(state);

    tracing::info!("Starting LLM Gateway on {}", addr);
    tracing::info!("Model listing: GET /v1/models");
    tracing::info!("Forwarding:    POST /v1/chat/completions (and other /v1/* paths)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
