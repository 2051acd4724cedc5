//! Argument resolution and validation errors.

use serde_json::Value;
use thiserror::Error;

use super::BoxError;

/// Errors raised while building or resolving arguments.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// A required argument has no input, default or carried-over value.
    ///
    /// `name` is the resolution key (alias if set, else the argument name).
    #[error("required arg missing: {name}")]
    RequiredArgMissing {
        /// The key the caller should have supplied.
        name: String,
    },

    /// A validator was registered for an argument that does not exist.
    #[error("invalid validator for {group}.{argument}: no such argument")]
    InvalidValidator {
        /// The group the validator was registered for.
        group: String,
        /// The argument name the validator targets.
        argument: String,
    },

    /// A resolved or default value is outside its declared choice set.
    #[error("value:{value} not in choices:{choices:?}")]
    ChoiceViolation {
        /// The argument name.
        name: String,
        /// The offending value.
        value: Value,
        /// The allowed values.
        choices: Vec<Value>,
    },

    /// A raw argument declaration has an unsupported shape.
    #[error("invalid argument declaration: {message}")]
    InvalidDeclaration {
        /// Description of the problem.
        message: String,
    },

    /// Error raised by an application-supplied validator.
    #[error(transparent)]
    Custom(BoxError),
}

impl ArgumentError {
    /// Creates a missing required argument error.
    pub fn required_missing(name: impl Into<String>) -> Self {
        Self::RequiredArgMissing { name: name.into() }
    }

    /// Creates an invalid declaration error.
    pub fn invalid_declaration(message: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            message: message.into(),
        }
    }

    /// Wraps an arbitrary validator error.
    pub fn custom(err: impl Into<BoxError>) -> Self {
        Self::Custom(err.into())
    }
}
