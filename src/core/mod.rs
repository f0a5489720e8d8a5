//! Core functionality for the gateway.
//!
//! This module contains fundamental components used throughout the
//! application:
//! - Configuration management
//! - Error handling
//! - Retry policy for discovery
//! - HTTP middleware

pub mod config;
pub mod error;
pub mod middleware;
pub mod retry;

// Re-export commonly used types
pub use config::{AppConfig, FallbackModel, ServerConfig};
pub use error::{AppError, Result};
pub use middleware::cors_middleware;
pub use retry::RetryPolicy;
