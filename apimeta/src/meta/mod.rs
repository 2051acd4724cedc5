//! Declarative metadata blocks.
//!
//! An API's documentation may carry a block such as:
//!
//! ```text
//! List issues of a repository.
//!
//! <meta>
//! args:
//!   query: [state, {per_page: 30}]
//!   header: {accept: application/vnd.github+json}
//! expected_status_code: 200
//! </meta>
//! ```
//!
//! Parsing happens in two stages. [`extract`] finds the `<meta[:format]>`
//! block (the format defaults to `yaml`), then the [`MetaParser`] registered
//! for that format turns its body into [`MetaEvent`]s, which a
//! [`ParseObserver`] dispatches to a [`MetaBuilder`].

mod observer;
mod yaml;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::MetaError;

pub use observer::{MetaBuilder, ParseObserver};
pub use yaml::{JsonParser, YamlParser};

/// Format used when the block has no `:format` tag.
pub const DEFAULT_FORMAT: &str = "yaml";

lazy_static! {
    /// Matches `<meta>` or `<meta:format>` up to the closing `</meta>`.
    static ref META_PATTERN: Regex =
        Regex::new(r"(?s)<meta(?::(?P<format>\w+))?>(?P<meta>.+)</meta>").unwrap();
}

/// One item of a parsed metadata block.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaEvent {
    /// Declares an argument group with its raw argument declarations.
    ArgGroup {
        /// Canonical group name (short aliases already resolved).
        name: String,
        /// Raw declarations, normalized later by the group type.
        raw: Value,
    },
    /// Overrides the base URI for this API.
    BaseUri(String),
    /// Sets the transport timeout passed through the request description.
    Timeout(Value),
    /// Declares the status code every response must carry.
    ExpectedStatusCode(u16),
}

/// A located metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaBlock<'a> {
    /// Format tag, `yaml` when omitted.
    pub format: &'a str,
    /// Text between the tags.
    pub body: &'a str,
}

/// Finds the metadata block in documentation text.
///
/// ## Examples
///
/// ```rust
/// use apimeta::meta::extract;
///
/// let block = extract("Get a user.\n<meta:json>{\"timeout\": 3}</meta>").unwrap();
/// assert_eq!(block.format, "json");
/// assert_eq!(block.body, "{\"timeout\": 3}");
/// ```
///
/// ## Errors
///
/// Returns [`MetaError::ApimetaNotFound`] when there is no block.
pub fn extract(doc: &str) -> Result<MetaBlock<'_>, MetaError> {
    let captures = META_PATTERN
        .captures(doc)
        .ok_or(MetaError::ApimetaNotFound)?;
    let body = captures
        .name("meta")
        .ok_or(MetaError::ApimetaNotFound)?
        .as_str();
    let format = captures
        .name("format")
        .map_or(DEFAULT_FORMAT, |m| m.as_str());

    Ok(MetaBlock { format, body })
}

/// Turns the body of a metadata block into events.
pub trait MetaParser: fmt::Debug + Send + Sync {
    /// Parses `body` into events, in document order.
    ///
    /// ## Errors
    ///
    /// Returns a syntax error from the underlying format, or
    /// [`MetaError::InvalidMetaItem`] for unknown top-level items.
    fn parse(&self, body: &str) -> Result<Vec<MetaEvent>, MetaError>;
}

/// Format name to [`MetaParser`] lookup.
///
/// The default registry knows `yaml` and `json`.
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn MetaParser>>,
}

impl ParserRegistry {
    /// Creates a registry without any parsers.
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registers (or replaces) the parser for `format`.
    pub fn register(&mut self, format: impl Into<String>, parser: impl MetaParser + 'static) {
        self.parsers.insert(format.into(), Arc::new(parser));
    }

    /// Removes `format`; unknown formats are ignored.
    pub fn unregister(&mut self, format: &str) {
        self.parsers.remove(format);
    }

    /// Extracts and parses the metadata block of `doc`.
    ///
    /// A missing block is not an error: it means the API has no declarative
    /// configuration, and `Ok(None)` is returned.
    ///
    /// ## Errors
    ///
    /// Returns [`MetaError::UnknownMetaFormat`] if the block's format has no
    /// registered parser, and propagates parser errors.
    pub fn parse(&self, doc: &str) -> Result<Option<Vec<MetaEvent>>, MetaError> {
        let block = match extract(doc) {
            Ok(block) => block,
            Err(MetaError::ApimetaNotFound) => {
                debug!("no meta block found; skipping declarative configuration");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let parser = self
            .parsers
            .get(block.format)
            .ok_or_else(|| MetaError::UnknownMetaFormat {
                format: block.format.to_string(),
            })?;
        let events = parser.parse(block.body)?;
        debug!(format = block.format, events = events.len(), "parsed meta block");
        Ok(Some(events))
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("yaml", YamlParser);
        registry.register("json", JsonParser);
        registry
    }
}
