//! API declaration and configuration errors.

use thiserror::Error;

use crate::api_name::ApiNameError;

/// Errors in API or consumer configuration.
///
/// These errors occur while declaring APIs or assembling request URLs,
/// typically indicating programmer errors or invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A group name has no registered implementation.
    #[error("group_name:{name} unknown")]
    UnknownGroup {
        /// The unregistered group name.
        name: String,
    },

    /// No API with this name was declared on the consumer.
    #[error("unknown api: {name}")]
    UnknownApi {
        /// The requested API name.
        name: String,
    },

    /// An API with this name is already declared on the consumer.
    #[error("duplicate api: {name}")]
    DuplicateApi {
        /// The duplicate API name.
        name: String,
    },

    /// A required request description field is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// API name validation failed.
    #[error("Invalid api name: {0}")]
    InvalidApiName(#[from] ApiNameError),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request description names an HTTP method that is not supported.
    #[error("Invalid HTTP method: {method}")]
    InvalidMethod {
        /// The method string found in the description.
        method: String,
    },

    /// The URI template references a variable with no resolved value.
    #[error("Missing path parameter: {name}")]
    MissingPathParam {
        /// The template variable name.
        name: String,
    },

    /// The URI template contains invalid variable syntax.
    #[error("Invalid path template: {message}")]
    InvalidPathTemplate {
        /// Description of the path template error.
        message: String,
    },
}

impl ConfigError {
    /// Creates a missing field error.
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Creates an invalid path template error.
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPathTemplate {
            message: message.into(),
        }
    }
}
