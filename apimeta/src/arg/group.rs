//! Argument groups.
//!
//! An [`ArgGroup`] is a named cluster of arguments (`params`, `headers`,
//! `auth`, ...) that is resolved as a unit against call kwargs and folded
//! into the request description under its group name.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::Map;
use tracing::trace;

use super::argument::{Argument, Validator};
use super::raw::RawArgument;
use crate::error::ArgumentError;
use crate::request::{Kwargs, RequestDescription};

/// Per-argument validators for one group, keyed by argument name.
pub type GroupValidators = HashMap<String, Validator>;

/// Validators for a whole API, keyed by group name then argument name.
pub type ArgValidators = HashMap<String, GroupValidators>;

/// A group type: how raw declarations become an [`ArgGroup`].
///
/// The registry maps group names to implementations of this trait, so
/// adding a group kind means implementing `create` and registering it.
pub trait GroupType: fmt::Debug + Send + Sync {
    /// Builds a group named `group_name` from normalized declarations.
    ///
    /// ## Errors
    ///
    /// Returns an error when a validator targets an argument the group does
    /// not have, or when a declaration violates the group type's rules.
    fn create(
        &self,
        group_name: &str,
        raw_args: &[RawArgument],
        validators: Option<&GroupValidators>,
    ) -> Result<ArgGroup, ArgumentError>;
}

/// A plain group: exactly the declared arguments, nothing more.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainGroup;

impl GroupType for PlainGroup {
    fn create(
        &self,
        group_name: &str,
        raw_args: &[RawArgument],
        validators: Option<&GroupValidators>,
    ) -> Result<ArgGroup, ArgumentError> {
        let arguments = raw_args.iter().map(Argument::from_raw).collect();
        ArgGroup::new(group_name, arguments, validators)
    }
}

/// A named collection of arguments resolved together.
#[derive(Debug, Clone)]
pub struct ArgGroup {
    group_name: String,
    arguments: Vec<Argument>,
}

impl ArgGroup {
    /// Creates a group, attaching each named validator to its argument.
    ///
    /// ## Errors
    ///
    /// Returns [`ArgumentError::InvalidValidator`] if a validator names an
    /// argument that is not in `arguments`.
    pub fn new(
        group_name: impl Into<String>,
        mut arguments: Vec<Argument>,
        validators: Option<&GroupValidators>,
    ) -> Result<Self, ArgumentError> {
        let group_name = group_name.into();

        for (arg_name, validator) in validators.into_iter().flatten() {
            let arg = arguments
                .iter_mut()
                .find(|arg| arg.name() == arg_name)
                .ok_or_else(|| ArgumentError::InvalidValidator {
                    group: group_name.clone(),
                    argument: arg_name.clone(),
                })?;
            arg.add_validator(validator.clone());
        }

        Ok(Self {
            group_name,
            arguments,
        })
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Looks up an argument by name.
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|arg| arg.name() == name)
    }

    /// Resolves every argument and merges the results into `description`.
    ///
    /// Resolved values are shallow-merged into `description[group_name]`;
    /// keys this call did not resolve keep their previous values. Nothing is
    /// written when no argument produced a value.
    ///
    /// Returns the resolution keys this group consumed, so the caller can
    /// keep them out of the top-level passthrough merge.
    ///
    /// ## Errors
    ///
    /// Propagates the first argument validation failure.
    pub fn resolve_into(
        &self,
        description: &mut RequestDescription,
        input: &Kwargs,
    ) -> Result<HashSet<String>, ArgumentError> {
        let current = description.group(&self.group_name);
        let mut resolved = Map::new();
        let mut consumed = HashSet::new();

        for arg in &self.arguments {
            let resolution = arg.resolve(current, input)?;
            if let Some(value) = resolution.value {
                resolved.insert(arg.name().to_string(), value);
                consumed.insert(resolution.key);
            }
        }

        trace!(
            group = %self.group_name,
            resolved = resolved.len(),
            consumed = ?consumed,
            "resolved argument group"
        );

        if !resolved.is_empty() {
            description.merge_group(&self.group_name, resolved);
        }

        Ok(consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn kwargs(v: Value) -> Kwargs {
        v.as_object().cloned().unwrap()
    }

    fn params(raw: Value) -> ArgGroup {
        PlainGroup
            .create("params", &RawArgument::normalize(&raw).unwrap(), None)
            .unwrap()
    }

    #[test]
    fn test_resolve_into_writes_group() {
        let group = params(json!(["q", {"page": 1}]));
        let mut d = RequestDescription::new();
        let consumed = group
            .resolve_into(&mut d, &kwargs(json!({"q": "rust", "other": true})))
            .unwrap();

        assert_eq!(d.get("params"), Some(&json!({"q": "rust", "page": 1})));
        // Keys filled from a default count as consumed too, so they never
        // reach the top-level passthrough merge.
        assert_eq!(
            consumed,
            HashSet::from(["q".to_string(), "page".to_string()])
        );
    }

    #[test]
    fn test_merge_preserves_unresolved_keys() {
        let group = params(json!(["a", "b"]));
        let mut d = RequestDescription::new();
        d.insert("params", json!({"a": 1, "b": 2}));

        group.resolve_into(&mut d, &kwargs(json!({"a": 9}))).unwrap();
        assert_eq!(d.get("params"), Some(&json!({"a": 9, "b": 2})));
    }

    #[test]
    fn test_merge_keeps_keys_outside_group() {
        let group = params(json!({"a": {"required": false}}));
        let mut d = RequestDescription::new();
        d.insert("params", json!({"fixed": "x"}));

        group.resolve_into(&mut d, &kwargs(json!({"a": 1}))).unwrap();
        assert_eq!(d.get("params"), Some(&json!({"fixed": "x", "a": 1})));
    }

    #[test]
    fn test_nothing_resolved_leaves_description_untouched() {
        let group = params(json!({"a": {"required": false}}));
        let mut d = RequestDescription::new();
        let consumed = group.resolve_into(&mut d, &Kwargs::new()).unwrap();
        assert!(consumed.is_empty());
        assert!(!d.contains_key("params"));
    }

    #[test]
    fn test_template_defaults_are_idempotent() {
        let group = params(json!([{"per_page": 30}, "page"]));
        let mut template = RequestDescription::new();
        template.insert("params", json!({"page": 1}));

        let mut first = template.clone();
        group.resolve_into(&mut first, &Kwargs::new()).unwrap();
        let mut second = template.clone();
        group.resolve_into(&mut second, &Kwargs::new()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.get("params"), Some(&json!({"page": 1, "per_page": 30})));
    }

    #[test]
    fn test_consumed_key_is_alias() {
        let group = params(json!({"token": {"alias": "access_token"}}));
        let mut d = RequestDescription::new();
        let consumed = group
            .resolve_into(&mut d, &kwargs(json!({"access_token": "t"})))
            .unwrap();
        assert_eq!(consumed, HashSet::from(["access_token".to_string()]));
        assert_eq!(d.get("params"), Some(&json!({"token": "t"})));
    }

    #[test]
    fn test_required_missing_propagates() {
        let group = params(json!("q"));
        let mut d = RequestDescription::new();
        assert!(matches!(
            group.resolve_into(&mut d, &Kwargs::new()),
            Err(ArgumentError::RequiredArgMissing { .. })
        ));
    }

    #[test]
    fn test_validator_for_unknown_argument() {
        let validators = GroupValidators::from([(
            "missing".to_string(),
            Validator::new(|_, _| Ok(())),
        )]);
        let err = PlainGroup
            .create("params", &[RawArgument::new("q")], Some(&validators))
            .unwrap_err();
        assert!(matches!(err, ArgumentError::InvalidValidator { .. }));
    }

    #[test]
    fn test_named_validator_attached() {
        let validators = GroupValidators::from([(
            "page".to_string(),
            Validator::new(|_, value| match value.and_then(Value::as_i64) {
                Some(n) if n < 1 => Err(ArgumentError::custom("page starts at 1")),
                _ => Ok(()),
            }),
        )]);
        let group = PlainGroup
            .create("params", &[RawArgument::new("page")], Some(&validators))
            .unwrap();
        let mut d = RequestDescription::new();
        let err = group
            .resolve_into(&mut d, &kwargs(json!({"page": 0})))
            .unwrap_err();
        assert_eq!(err.to_string(), "page starts at 1");
    }
}
