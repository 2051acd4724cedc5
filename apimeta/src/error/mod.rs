//! Layered error types for the apimeta crate.
//!
//! The error hierarchy is structured for actionable diagnostics:
//! - [`ApiError`] - Top-level error type for all declaration and call operations
//! - [`ArgumentError`] - Argument resolution and validation failures
//! - [`ConfigError`] - API declaration, registry and URL assembly errors
//! - [`MetaError`] - Declarative metadata extraction and parsing errors
//! - [`ClientError`] - Transport (HTTP client and network) errors

mod api_error;
mod argument_error;
mod client_error;
mod config_error;
mod meta_error;

pub use api_error::{ApiError, BoxError};
pub use argument_error::ArgumentError;
pub use client_error::ClientError;
pub use config_error::ConfigError;
pub use meta_error::MetaError;
