//! Request descriptions.
//!
//! A [`RequestDescription`] is the open key/value bag handed to the
//! transport. It holds the reserved keys `method`, `uri` and `base_uri`,
//! one nested object per argument group (`params`, `headers`, `auth`,
//! `path`, ...) and any passthrough transport options such as `timeout`.
//!
//! Every API keeps one description as a template; each call works on a
//! clone of it. `Clone` is a deep structural copy, so nothing a call does
//! can leak back into the template.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::uri;

/// Keyword arguments supplied to an API call.
pub type Kwargs = Map<String, Value>;

/// Reserved key holding the HTTP method.
pub const METHOD: &str = "method";
/// Reserved key holding the URI template.
pub const URI: &str = "uri";
/// Reserved key holding the base URI.
pub const BASE_URI: &str = "base_uri";
/// Group holding resolved path template values.
pub const PATH: &str = "path";
/// Transport option holding the request timeout, in seconds.
pub const TIMEOUT: &str = "timeout";

/// The full set of parameters for one request.
///
/// ## Examples
///
/// ```rust
/// use apimeta::RequestDescription;
/// use serde_json::json;
///
/// let mut description = RequestDescription::new();
/// description.insert("base_uri", "https://x/");
/// description.insert("uri", "/items/{id}");
/// description.insert("path", json!({"id": "7"}));
///
/// assert_eq!(description.get_url().unwrap(), "https://x/items/7");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestDescription(Map<String, Value>);

impl RequestDescription {
    /// Creates an empty description.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Sets `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// The HTTP method, if set.
    pub fn method(&self) -> Option<&str> {
        self.get_str(METHOD)
    }

    /// The URI template, if set.
    pub fn uri(&self) -> Option<&str> {
        self.get_str(URI)
    }

    /// The base URI, if set.
    pub fn base_uri(&self) -> Option<&str> {
        self.get_str(BASE_URI)
    }

    /// Returns the resolved values of an argument group.
    ///
    /// A key holding something other than an object is not a group.
    pub fn group(&self, group_name: &str) -> Option<&Map<String, Value>> {
        self.0.get(group_name).and_then(Value::as_object)
    }

    /// Shallow-merges `values` into the group's sub-mapping.
    ///
    /// The sub-mapping is created when absent. Keys not present in `values`
    /// keep whatever the description already held.
    pub fn merge_group(&mut self, group_name: &str, values: Map<String, Value>) {
        let entry = self
            .0
            .entry(group_name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(group) = entry {
            group.extend(values);
        }
    }

    /// Merges keyword arguments directly into the top level.
    pub fn merge(&mut self, kwargs: Kwargs) {
        self.0.extend(kwargs);
    }

    /// Builds the final URL from `base_uri`, `uri` and the `path` group.
    ///
    /// The template is only expanded when a non-empty `path` group is
    /// present. Otherwise `base_uri` and `uri` are concatenated verbatim,
    /// without collapsing a doubled `/`.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::MissingField`] if `base_uri` or `uri` is
    /// missing, and propagates template expansion failures.
    pub fn get_url(&self) -> Result<String, ConfigError> {
        let base_uri = self
            .base_uri()
            .ok_or_else(|| ConfigError::missing_field(BASE_URI))?;
        let uri = self.uri().ok_or_else(|| ConfigError::missing_field(URI))?;
        match self.group(PATH) {
            Some(path) if !path.is_empty() => uri::expand(&uri::join(base_uri, uri), path),
            _ => Ok(format!("{base_uri}{uri}")),
        }
    }

    /// Borrows the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the description, returning the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for RequestDescription {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
