//! Declarative metadata errors.

use thiserror::Error;

/// Errors raised while extracting or parsing a `<meta>` block.
#[derive(Debug, Error)]
pub enum MetaError {
    /// The documentation text contains no `<meta>` block.
    ///
    /// Declaration treats this as "no declarative configuration".
    #[error("api meta not found in doc")]
    ApimetaNotFound,

    /// The block names a format with no registered parser.
    #[error("unknown meta parser: {format}")]
    UnknownMetaFormat {
        /// The format tag from `<meta:format>`.
        format: String,
    },

    /// The block contains a top-level item with no handler.
    #[error("Invalid Apimeta item:{item}")]
    InvalidMetaItem {
        /// The unrecognized item name.
        item: String,
    },

    /// The block parsed, but an item has the wrong shape.
    #[error("malformed {format} meta: {message}")]
    Malformed {
        /// The format being parsed.
        format: String,
        /// Description of the problem.
        message: String,
    },

    /// YAML syntax error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetaError {
    /// Creates a malformed item error.
    pub fn malformed(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            format: format.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_item_display() {
        let err = MetaError::InvalidMetaItem {
            item: "retries".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid Apimeta item:retries");
    }

    #[test]
    fn test_unknown_format_display() {
        let err = MetaError::UnknownMetaFormat {
            format: "toml".to_string(),
        };
        assert_eq!(err.to_string(), "unknown meta parser: toml");
    }
}
