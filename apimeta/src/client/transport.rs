//! The contract between APIs and the HTTP client that sends their requests.

use std::future::Future;

use crate::error::ApiError;
use crate::request::RequestDescription;
use crate::response::Response;

/// Sends an assembled [`RequestDescription`] and returns the response.
///
/// Implementations decide how the description's groups map onto the wire.
/// Connection pooling, retries and timeouts are the transport's business;
/// the core only hands over the description and post-processes the result.
///
/// ## Examples
///
/// A transport that never touches the network:
///
/// ```rust
/// use apimeta::client::Transport;
/// use apimeta::{ApiError, RequestDescription, Response};
///
/// struct Echo;
///
/// impl Transport for Echo {
///     async fn request(&self, description: &RequestDescription) -> Result<Response, ApiError> {
///         let body = serde_json::to_vec(description).map_err(apimeta::ClientError::from)?;
///         Ok(Response::new(200).with_body(body))
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Sends one request.
    ///
    /// ## Errors
    ///
    /// Returns an error if the description cannot be turned into a request
    /// or the request fails before a response arrives. Non-2xx responses are
    /// not errors at this layer.
    fn request(
        &self,
        description: &RequestDescription,
    ) -> impl Future<Output = Result<Response, ApiError>> + Send;
}
