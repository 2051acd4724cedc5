//! YAML and JSON metadata parsers.
//!
//! Both formats share one item mapping:
//!
//! - `args`: a mapping of group name to raw argument declarations, one
//!   [`MetaEvent::ArgGroup`] per entry. A bare string declares a group with
//!   no arguments. Short group names are accepted: `query` (params), `form`
//!   (data), `header` (headers) and `file` (files).
//! - `base_uri`, `timeout`, `expected_status_code`: one event each.
//!
//! Any other top-level key is rejected with [`MetaError::InvalidMetaItem`].

use serde_json::Value;

use super::{MetaEvent, MetaParser};
use crate::error::MetaError;

/// Resolves short group names to their canonical form.
fn canonical_group(name: &str) -> &str {
    match name {
        "query" => "params",
        "form" => "data",
        "header" => "headers",
        "file" => "files",
        other => other,
    }
}

fn status_code(format: &str, value: &Value) -> Result<u16, MetaError> {
    let code = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    code.and_then(|c| u16::try_from(c).ok())
        .filter(|c| (100..=999).contains(c))
        .ok_or_else(|| {
            MetaError::malformed(
                format,
                format!("expected_status_code must be a status code, found {value}"),
            )
        })
}

fn events_from(format: &str, doc: Value) -> Result<Vec<MetaEvent>, MetaError> {
    let items = match doc {
        Value::Null => return Ok(Vec::new()),
        Value::Object(items) => items,
        other => {
            return Err(MetaError::malformed(
                format,
                format!("expected a mapping of meta items, found {other}"),
            ))
        }
    };

    let mut events = Vec::with_capacity(items.len());
    for (item, value) in items {
        match item.as_str() {
            "args" => match value {
                Value::Null => {}
                Value::String(group) => events.push(MetaEvent::ArgGroup {
                    name: canonical_group(&group).to_string(),
                    raw: Value::Null,
                }),
                Value::Object(groups) => {
                    events.extend(groups.into_iter().map(|(group, raw)| MetaEvent::ArgGroup {
                        name: canonical_group(&group).to_string(),
                        raw,
                    }));
                }
                other => {
                    return Err(MetaError::malformed(
                        format,
                        format!("args must be a mapping of groups, found {other}"),
                    ))
                }
            },
            "base_uri" => match value {
                Value::String(base_uri) => events.push(MetaEvent::BaseUri(base_uri)),
                other => {
                    return Err(MetaError::malformed(
                        format,
                        format!("base_uri must be a string, found {other}"),
                    ))
                }
            },
            "timeout" => match value {
                Value::Number(_) | Value::Null => events.push(MetaEvent::Timeout(value)),
                other => {
                    return Err(MetaError::malformed(
                        format,
                        format!("timeout must be a number of seconds, found {other}"),
                    ))
                }
            },
            "expected_status_code" => {
                events.push(MetaEvent::ExpectedStatusCode(status_code(format, &value)?));
            }
            _ => return Err(MetaError::InvalidMetaItem { item }),
        }
    }

    Ok(events)
}

/// Parses `<meta>` / `<meta:yaml>` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl MetaParser for YamlParser {
    fn parse(&self, body: &str) -> Result<Vec<MetaEvent>, MetaError> {
        let doc: Value = serde_yaml::from_str(body)?;
        events_from("yaml", doc)
    }
}

/// Parses `<meta:json>` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl MetaParser for JsonParser {
    fn parse(&self, body: &str) -> Result<Vec<MetaEvent>, MetaError> {
        let doc: Value = serde_json::from_str(body)?;
        events_from("json", doc)
    }
}
