//! Inbound proxy authentication.
//!
//! Callers authenticate with `Authorization: Bearer <proxy secret>`. The
//! secret is a single shared value, distinct from any upstream credential.
//! An unconfigured secret fails closed: every authenticated route returns a
//! server-configuration error rather than letting traffic through.

use axum::http::HeaderMap;

use crate::core::error::Result;
use crate::core::AppError;

/// Extract the Bearer token from the Authorization header.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

/// Verify the inbound bearer token against the configured proxy secret.
pub fn verify_proxy_auth(headers: &HeaderMap, proxy_auth_key: Option<&str>) -> Result<()> {
    let secret = proxy_auth_key.ok_or_else(|| {
        tracing::error!("PROXY_AUTH_KEY is not set; refusing request");
        AppError::Config("proxy secret is not configured".to_string())
    })?;

    let token = extract_bearer(headers).ok_or(AppError::Unauthorized)?;
    if token.trim() != secret {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
