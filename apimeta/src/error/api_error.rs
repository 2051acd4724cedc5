//! Top-level API error type.

use super::{ArgumentError, ClientError, ConfigError, MetaError};
use crate::response::Response;
use thiserror::Error;

/// Boxed error raised by application code (validators, hooks, handlers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all API operations.
///
/// This enum aggregates all error categories, enabling unified error handling
/// while preserving the ability to match on specific error types when needed.
///
/// ## Examples
///
/// ```rust,ignore
/// use apimeta::ApiError;
///
/// fn handle_error(err: ApiError) {
///     match err {
///         ApiError::Argument(e) => eprintln!("Bad call arguments: {e}"),
///         ApiError::UnexpectedStatusCode { expected, actual, .. } => {
///             eprintln!("Expected {expected}, got {actual}")
///         }
///         other => eprintln!("{other}"),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// Argument resolution or validation failed.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Declaration, registry or URL assembly errors.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Declarative metadata could not be extracted or parsed.
    #[error(transparent)]
    Meta(#[from] MetaError),

    /// HTTP client errors (network, timeout, connection failures).
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The response status differs from the API's declared expectation.
    #[error("status:{actual}, expected:{expected}")]
    UnexpectedStatusCode {
        /// The status code the API declared.
        expected: u16,
        /// The status code the transport returned.
        actual: u16,
        /// The full response, for inspection by the caller.
        response: Box<Response>,
    },

    /// Error raised by a response hook or handler.
    #[error(transparent)]
    Custom(BoxError),
}

impl ApiError {
    /// Wraps an arbitrary application error.
    pub fn custom(err: impl Into<BoxError>) -> Self {
        Self::Custom(err.into())
    }

    /// Returns the response carried by an [`ApiError::UnexpectedStatusCode`].
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::UnexpectedStatusCode { response, .. } => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_argument_error() {
        let err: ApiError = ArgumentError::required_missing("page").into();
        assert!(matches!(
            err,
            ApiError::Argument(ArgumentError::RequiredArgMissing { .. })
        ));
        assert_eq!(err.to_string(), "required arg missing: page");
    }

    #[test]
    fn test_from_meta_error() {
        let err: ApiError = MetaError::ApimetaNotFound.into();
        assert!(matches!(err, ApiError::Meta(MetaError::ApimetaNotFound)));
    }

    #[test]
    fn test_unexpected_status_display() {
        let err = ApiError::UnexpectedStatusCode {
            expected: 200,
            actual: 404,
            response: Box::new(Response::new(404)),
        };
        assert_eq!(err.to_string(), "status:404, expected:200");
        assert_eq!(err.response().map(Response::status_code), Some(404));
    }

    #[test]
    fn test_custom_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "hook exploded");
        let err = ApiError::custom(io);
        let ApiError::Custom(inner) = err else {
            panic!("expected custom error");
        };
        assert!(inner.downcast_ref::<std::io::Error>().is_some());
    }
}
