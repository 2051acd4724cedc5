//! Normalization of raw argument declarations.
//!
//! Declarations arrive from metadata blocks in several shapes:
//!
//! - a bare string: `page` (name only, all defaults)
//! - a mapping to a scalar: `{per_page: 30}` (the scalar is the default)
//! - a mapping to a detail mapping: `{token: {alias: access_token, required: false}}`
//! - a list mixing any of the above
//!
//! All of them normalize into [`RawArgument`] records.

use serde_json::{Map, Value};

use crate::error::ArgumentError;

/// Canonical form of one argument declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArgument {
    /// Argument name, unique within its group.
    pub name: String,
    /// External key read from call kwargs instead of `name`.
    pub alias: Option<String>,
    /// Whether resolution must produce a value.
    pub required: bool,
    /// Value used when the caller supplies none.
    pub default: Option<Value>,
}

impl RawArgument {
    /// Creates a required argument with no alias and no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            required: true,
            default: None,
        }
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        let default = default.into();
        self.default = (!default.is_null()).then_some(default);
        self
    }

    /// Sets the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Marks the argument optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Normalizes any supported declaration shape.
    ///
    /// Later declarations of the same name replace earlier ones but keep the
    /// earlier position.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use apimeta::arg::RawArgument;
    /// use serde_json::json;
    ///
    /// let raw = RawArgument::normalize(&json!([
    ///     "q",
    ///     {"per_page": 30},
    ///     {"token": {"alias": "access_token", "required": false}}
    /// ]))
    /// .unwrap();
    ///
    /// assert_eq!(raw[0], RawArgument::new("q"));
    /// assert_eq!(raw[1].default, Some(json!(30)));
    /// assert_eq!(raw[2].alias.as_deref(), Some("access_token"));
    /// assert!(!raw[2].required);
    /// ```
    ///
    /// ## Errors
    ///
    /// Returns [`ArgumentError::InvalidDeclaration`] for numbers, booleans,
    /// nested lists or detail mappings with a non-string alias.
    pub fn normalize(raw: &Value) -> Result<Vec<RawArgument>, ArgumentError> {
        let mut normalized: Vec<RawArgument> = Vec::new();
        let mut push = |arg: RawArgument| {
            match normalized.iter_mut().find(|existing| existing.name == arg.name) {
                Some(existing) => *existing = arg,
                None => normalized.push(arg),
            }
        };

        match raw {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    for arg in normalize_one(item)? {
                        push(arg);
                    }
                }
            }
            other => {
                for arg in normalize_one(other)? {
                    push(arg);
                }
            }
        }

        Ok(normalized)
    }
}

fn normalize_one(raw: &Value) -> Result<Vec<RawArgument>, ArgumentError> {
    match raw {
        Value::String(name) => Ok(vec![RawArgument::new(name.as_str())]),
        Value::Object(entries) => entries
            .iter()
            .map(|(name, meta)| match meta {
                Value::Object(detail) => from_detail(name, detail),
                scalar => Ok(RawArgument::new(name.as_str()).with_default(scalar.clone())),
            })
            .collect(),
        other => Err(ArgumentError::invalid_declaration(format!(
            "expected a name, mapping or list, found {other}"
        ))),
    }
}

fn from_detail(name: &str, detail: &Map<String, Value>) -> Result<RawArgument, ArgumentError> {
    let mut arg = RawArgument::new(name);

    if let Some(required) = detail.get("required") {
        arg.required = truthy(required);
    }
    if let Some(default) = detail.get("default") {
        arg = arg.with_default(default.clone());
    }
    match detail.get("alias") {
        None | Some(Value::Null) => {}
        Some(Value::String(alias)) => arg.alias = Some(alias.clone()),
        Some(other) => {
            return Err(ArgumentError::invalid_declaration(format!(
                "alias of {name} must be a string, found {other}"
            )))
        }
    }

    Ok(arg)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_string() {
        let raw = RawArgument::normalize(&json!("page")).unwrap();
        assert_eq!(raw, vec![RawArgument::new("page")]);
    }

    #[test]
    fn test_null_is_empty() {
        assert!(RawArgument::normalize(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_default() {
        let raw = RawArgument::normalize(&json!({"per_page": 30})).unwrap();
        assert_eq!(raw[0].default, Some(json!(30)));
        assert!(raw[0].required);
    }

    #[test]
    fn test_null_default_means_no_default() {
        let raw = RawArgument::normalize(&json!({"cursor": null})).unwrap();
        assert_eq!(raw[0].default, None);
    }

    #[test]
    fn test_detail_mapping() {
        let raw = RawArgument::normalize(&json!({
            "token": {"alias": "access_token", "required": false, "default": "anon"}
        }))
        .unwrap();
        assert_eq!(
            raw[0],
            RawArgument::new("token")
                .with_alias("access_token")
                .optional()
                .with_default("anon")
        );
    }

    #[test]
    fn test_required_uses_truthiness() {
        let raw = RawArgument::normalize(&json!({"a": {"required": 0}})).unwrap();
        assert!(!raw[0].required);
        let raw = RawArgument::normalize(&json!({"a": {"required": "yes"}})).unwrap();
        assert!(raw[0].required);
    }

    #[test]
    fn test_multi_key_mapping_declares_each() {
        let raw = RawArgument::normalize(&json!({"a": 1, "b": 2})).unwrap();
        let names: Vec<_> = raw.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_list_with_duplicate_keeps_last() {
        let raw = RawArgument::normalize(&json!(["a", "b", {"a": 5}])).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].name, "a");
        assert_eq!(raw[0].default, Some(json!(5)));
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(RawArgument::normalize(&json!(3)).is_err());
        assert!(RawArgument::normalize(&json!([["nested"]])).is_err());
        assert!(RawArgument::normalize(&json!({"a": {"alias": 1}})).is_err());
    }
}
