//! HTTP client and network errors.

use thiserror::Error;

/// Errors from the transport layer.
///
/// These errors represent network-level failures and problems turning a
/// request description into an HTTP request that the client can send.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed due to network or protocol error.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A header name or value in the `headers` group is not valid HTTP.
    #[error("invalid header {name}: {message}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Why the header was rejected.
        message: String,
    },

    /// The `auth` group requested a scheme the transport cannot perform.
    #[error("unsupported auth type: {kind}")]
    UnsupportedAuth {
        /// The requested auth type.
        kind: String,
    },

    /// A digest challenge could not be parsed or answered.
    #[error("digest authentication failed: {0}")]
    Digest(#[from] digest_auth::Error),

    /// A file named in the `files` group could not be read.
    #[error("failed to read file {path}: {source}")]
    File {
        /// The path that was requested.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A `files` or `multipart` entry has a shape the transport cannot send.
    #[error("invalid multipart field {field}: {message}")]
    InvalidPart {
        /// The form field name.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_auth_display() {
        let err = ClientError::UnsupportedAuth {
            kind: "ntlm".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported auth type: ntlm");
    }

    #[test]
    fn test_file_error_display() {
        let err = ClientError::File {
            path: "/nope.txt".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/nope.txt"));
    }

    #[test]
    fn test_decode_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ClientError = serde_err.into();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
