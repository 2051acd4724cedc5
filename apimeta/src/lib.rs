//! Declarative REST API consumers.
//!
//! `apimeta` turns API declarations, a method, a URI template and a
//! documentation string carrying a `<meta>` block, into callables that
//! resolve keyword arguments into typed argument groups, send the assembled
//! request through a pluggable transport and post-process the response
//! through a chain of hooks.
//!
//! ## Features
//!
//! - **Argument groups**: `params`, `headers`, `json`, `data`, `cookies`,
//!   `files`, `path`, `multipart` and the predefined `auth` group, with
//!   aliases, defaults, required checks, choice sets and custom validators
//! - **Declarative metadata**: YAML (default) or JSON `<meta>` blocks in the
//!   API documentation configure groups, base URI, timeout and the expected
//!   status code
//! - **Template descriptions**: every call resolves against a fresh copy of
//!   the API's template, so consumer-level defaults merge per key
//! - **Response hooks**: consumer and API hook chains, first value wins
//! - **Async transport**: the default [`client::ReqwestTransport`] is built
//!   on `reqwest` with `tokio`, instrumented with `tracing`
//! - **Layered error handling**: one error enum per concern, aggregated in
//!   [`ApiError`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use apimeta::{Consumer, Kwargs};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), apimeta::ApiError> {
//! let mut api = Consumer::builder("https://httpbin.org", apimeta::client::ReqwestTransport::new()?)
//!     .expected_status_code(200)
//!     .build()?;
//!
//! api.get("/anything/{item}")
//!     .name("fetch_item")
//!     .doc("Fetch one item.\n<meta>\nargs:\n  query: [verbose]\ntimeout: 10\n</meta>")
//!     .jsonify()
//!     .register()?;
//!
//! let kwargs: Kwargs = json!({"item": "42", "verbose": true})
//!     .as_object()
//!     .cloned()
//!     .unwrap_or_default();
//! let _item = api.call("fetch_item", kwargs).await?;
//! # Ok(())
//! # }
//! ```

pub mod api_name;
pub mod arg;
pub mod builder;
pub mod client;
pub mod consumer;
pub mod error;
pub mod hooks;
pub mod meta;
pub mod method;
pub mod request;
pub mod response;
pub mod uri;

// Re-exports for convenience
pub use api_name::{ApiName, ApiNameError};
pub use builder::{Api, ApiBuilder};
pub use consumer::{BoundApi, Consumer, ConsumerBuilder, Declaration, Route, Router};
pub use error::{ApiError, ArgumentError, BoxError, ClientError, ConfigError, MetaError};
pub use hooks::ResponseHook;
pub use method::RestMethod;
pub use request::{Kwargs, RequestDescription};
pub use response::{ApiOutput, Response};
