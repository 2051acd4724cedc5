//! HTTP transports.
//!
//! [`Transport`] is the narrow contract every consumer sends requests
//! through. [`ReqwestTransport`] is the default implementation and maps the
//! standard argument groups onto a `reqwest` request.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use apimeta::client::ReqwestTransport;
//! use apimeta::Consumer;
//!
//! # async fn run() -> Result<(), apimeta::ApiError> {
//! let transport = ReqwestTransport::builder()
//!     .timeout(Duration::from_secs(10))
//!     .default_header("User-Agent", "apimeta-example")?
//!     .build()?;
//! let consumer = Consumer::builder("https://api.github.com", transport).build()?;
//! # Ok(())
//! # }
//! ```

mod reqwest_transport;
mod transport;

pub use reqwest_transport::{ReqwestTransport, ReqwestTransportBuilder};
pub use transport::Transport;
