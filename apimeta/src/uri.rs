//! URI path templates.
//!
//! Templates use `{name}` or `{name=default}` segments. A leading `+`
//! (`{+name}`) expands the value without escaping reserved characters, so a
//! value such as `a/b` keeps its slash.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Everything except RFC 3986 unreserved characters is escaped.
const SIMPLE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Reserved expansion only escapes characters that are never legal in a URI.
const RESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// A single `{...}` expression in a URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariable {
    /// Variable name.
    pub name: String,
    /// Inline default from `{name=default}`.
    pub default: Option<String>,
    /// `true` for `{+name}` reserved expansion.
    pub reserved: bool,
}

enum Segment<'a> {
    Literal(&'a str),
    Variable(TemplateVariable),
}

fn parse_expression(expr: &str) -> Result<TemplateVariable, ConfigError> {
    let (reserved, body) = match expr.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, expr),
    };

    let (name, default) = match body.split_once('=') {
        Some((name, default)) => (name, Some(default.to_string())),
        None => (body, None),
    };

    if name.is_empty() {
        return Err(ConfigError::invalid_path(format!(
            "empty variable name in {{{expr}}}"
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == '_' || *c == '.'))
    {
        return Err(ConfigError::invalid_path(format!(
            "unsupported character '{c}' in {{{expr}}}"
        )));
    }

    Ok(TemplateVariable {
        name: name.to_string(),
        default,
        reserved,
    })
}

fn segments(template: &str) -> Result<Vec<Segment<'_>>, ConfigError> {
    let mut out = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            out.push(Segment::Literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| ConfigError::invalid_path(format!("unclosed brace in {template}")))?;
        out.push(Segment::Variable(parse_expression(&after[..close])?));
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }

    Ok(out)
}

/// Extracts template variables in the order they appear.
///
/// ## Examples
///
/// ```rust
/// use apimeta::uri::variables;
///
/// let vars = variables("/repos/{owner}/{repo=apimeta}").unwrap();
/// assert_eq!(vars[0].name, "owner");
/// assert_eq!(vars[1].default.as_deref(), Some("apimeta"));
/// ```
///
/// ## Errors
///
/// Returns [`ConfigError::InvalidPathTemplate`] for unclosed braces, empty
/// names or unsupported expression syntax.
pub fn variables(template: &str) -> Result<Vec<TemplateVariable>, ConfigError> {
    Ok(segments(template)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Variable(var) => Some(var),
            Segment::Literal(_) => None,
        })
        .collect())
}

fn render(value: &Value, reserved: bool) -> String {
    let set = if reserved { RESERVED } else { SIMPLE };
    match value {
        Value::String(s) => utf8_percent_encode(s, set).to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| render(item, reserved))
            .collect::<Vec<_>>()
            .join(","),
        other => utf8_percent_encode(&other.to_string(), set).to_string(),
    }
}

/// Expands a template against resolved path values.
///
/// A variable with no value falls back to its inline default.
///
/// ## Errors
///
/// Returns [`ConfigError::MissingPathParam`] when a variable has neither a
/// value nor a default.
pub fn expand(template: &str, values: &Map<String, Value>) -> Result<String, ConfigError> {
    let mut url = String::with_capacity(template.len());

    for segment in segments(template)? {
        match segment {
            Segment::Literal(text) => url.push_str(text),
            Segment::Variable(var) => match values.get(&var.name) {
                Some(value) => url.push_str(&render(value, var.reserved)),
                None => {
                    let default = var
                        .default
                        .ok_or_else(|| ConfigError::MissingPathParam { name: var.name.clone() })?;
                    url.push_str(&render(&Value::String(default), var.reserved));
                }
            },
        }
    }

    Ok(url)
}

/// Joins a base URI and a path, collapsing a doubled `/` at the boundary.
pub fn join(base_uri: &str, uri: &str) -> String {
    match (base_uri.ends_with('/'), uri.starts_with('/')) {
        (true, true) => format!("{base_uri}{}", &uri[1..]),
        _ => format!("{base_uri}{uri}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_variables_in_order() {
        let vars = variables("/users/{user_id}/posts/{post_id}").unwrap();
        let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["user_id", "post_id"]);
    }

    #[test]
    fn test_variable_defaults() {
        let vars = variables("/items/{id=7}/{+rest}").unwrap();
        assert_eq!(vars[0].default.as_deref(), Some("7"));
        assert!(!vars[0].reserved);
        assert!(vars[1].reserved);
        assert_eq!(vars[1].default, None);
    }

    #[test]
    fn test_no_variables() {
        assert!(variables("/status").unwrap().is_empty());
    }

    #[test]
    fn test_unclosed_brace() {
        let err = variables("/users/{id").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPathTemplate { .. }));
    }

    #[test]
    fn test_unsupported_operator() {
        assert!(variables("/search{?q}").is_err());
        assert!(variables("/x/{}").is_err());
    }

    #[test]
    fn test_expand_simple() {
        let url = expand("https://x/items/{id}", &values(json!({"id": "7"}))).unwrap();
        assert_eq!(url, "https://x/items/7");
    }

    #[test]
    fn test_expand_escapes_simple_values() {
        let url = expand("/files/{name}", &values(json!({"name": "a b/c"}))).unwrap();
        assert_eq!(url, "/files/a%20b%2Fc");
    }

    #[test]
    fn test_expand_reserved_keeps_slash() {
        let url = expand("/files/{+path}", &values(json!({"path": "a/b c"}))).unwrap();
        assert_eq!(url, "/files/a/b%20c");
    }

    #[test]
    fn test_expand_numbers_and_lists() {
        let url = expand(
            "/page/{n}/{tags}",
            &values(json!({"n": 3, "tags": ["a", "b"]})),
        )
        .unwrap();
        assert_eq!(url, "/page/3/a,b");
    }

    #[test]
    fn test_expand_uses_inline_default() {
        let url = expand("/items/{id=42}", &Map::new()).unwrap();
        assert_eq!(url, "/items/42");
    }

    #[test]
    fn test_expand_missing_variable() {
        let err = expand("/items/{id}", &Map::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPathParam { name } if name == "id"));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("https://x/", "/items"), "https://x/items");
        assert_eq!(join("https://x", "/items"), "https://x/items");
        assert_eq!(join("https://x/", "items"), "https://x/items");
    }
}
