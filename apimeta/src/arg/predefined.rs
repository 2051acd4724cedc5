//! Predefined argument groups.
//!
//! A predefined group type fixes its member arguments up front through an
//! ordered list of [`ArgumentSlot`]s. Declarations supplied by an API may
//! override a slot, but every slot is present in the built group even when
//! the API never mentions it.

use serde_json::Value;
use tracing::trace;

use super::argument::{check_choice, Argument, Validator};
use super::group::{ArgGroup, GroupType, GroupValidators};
use super::raw::RawArgument;
use crate::error::ArgumentError;

/// One statically declared member of a predefined group.
#[derive(Debug, Clone)]
pub struct ArgumentSlot {
    defaults: RawArgument,
    choices: Option<Vec<Value>>,
    validator: Option<Validator>,
    storage_key: String,
}

impl ArgumentSlot {
    /// Creates a required slot with no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            defaults: RawArgument::new(name),
            choices: None,
            validator: None,
            storage_key: String::new(),
        }
    }

    /// Sets the default value used when the API does not declare this slot.
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.defaults = self.defaults.with_default(default);
        self
    }

    /// Marks the synthesized argument optional.
    pub fn optional(mut self) -> Self {
        self.defaults = self.defaults.optional();
        self
    }

    /// Restricts resolved values to `choices`.
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Attaches a validator to every argument built from this slot.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.defaults.name
    }

    /// Owner-qualified key, `name@TypeName`, unique across group types.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn allowed(&self) -> Option<&[Value]> {
        self.choices.as_deref()
    }

    fn check_default(&self, default: Option<&Value>) -> Result<(), ArgumentError> {
        match (default, &self.choices) {
            (Some(default), Some(choices)) => check_choice(self.name(), default, choices),
            _ => Ok(()),
        }
    }

    fn build(
        &self,
        raw_args: &[RawArgument],
        extra: Option<&Validator>,
    ) -> Result<Argument, ArgumentError> {
        let mut arg = match raw_args.iter().find(|raw| raw.name == self.name()) {
            Some(raw) => Argument::from_raw(raw),
            None => Argument::from_raw(&self.defaults),
        };

        if let Some(choices) = &self.choices {
            self.check_default(arg.default_value())?;
            arg.add_validator(Validator::choices(choices.clone()));
        }
        if let Some(validator) = &self.validator {
            arg.add_validator(validator.clone());
        }
        if let Some(validator) = extra {
            arg.add_validator(validator.clone());
        }

        Ok(arg)
    }
}

/// The slot list of a predefined group type.
///
/// Built once when the group type is defined. Defaults are checked against
/// their choice sets as each slot is added, so an invalid default fails at
/// definition time rather than at the first call.
///
/// ## Examples
///
/// ```rust
/// use apimeta::arg::{ArgumentSlot, PredefinedGroup};
///
/// let pagination = PredefinedGroup::new("Pagination")
///     .slot(ArgumentSlot::new("page").default_value(1))?
///     .slot(ArgumentSlot::new("order").default_value("asc").choices(["asc", "desc"]))?;
///
/// assert_eq!(pagination.slots()[1].storage_key(), "order@Pagination");
/// # Ok::<(), apimeta::ArgumentError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PredefinedGroup {
    type_name: String,
    slots: Vec<ArgumentSlot>,
}

impl PredefinedGroup {
    /// Starts an empty group type named `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            slots: Vec::new(),
        }
    }

    /// Adds a slot.
    ///
    /// ## Errors
    ///
    /// Returns [`ArgumentError::ChoiceViolation`] if the slot's default is
    /// outside its choice set.
    pub fn slot(mut self, mut slot: ArgumentSlot) -> Result<Self, ArgumentError> {
        slot.check_default(slot.defaults.default.as_ref())?;
        slot.storage_key = format!("{}@{}", slot.name(), self.type_name);
        self.slots.push(slot);
        Ok(self)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn slots(&self) -> &[ArgumentSlot] {
        &self.slots
    }

    /// The built-in `auth` group: `type` (`basic` or `digest`, default
    /// `basic`), `username` and `password`.
    pub fn auth() -> Self {
        Self {
            type_name: "AuthGroup".to_string(),
            slots: Vec::new(),
        }
        .push_checked(
            ArgumentSlot::new("type")
                .default_value("basic")
                .choices(["basic", "digest"]),
        )
        .push_checked(ArgumentSlot::new("username"))
        .push_checked(ArgumentSlot::new("password"))
    }

    // Only for slots whose defaults are known to satisfy their choices.
    fn push_checked(mut self, mut slot: ArgumentSlot) -> Self {
        slot.storage_key = format!("{}@{}", slot.name(), self.type_name);
        self.slots.push(slot);
        self
    }
}

impl GroupType for PredefinedGroup {
    fn create(
        &self,
        group_name: &str,
        raw_args: &[RawArgument],
        validators: Option<&GroupValidators>,
    ) -> Result<ArgGroup, ArgumentError> {
        let arguments = self
            .slots
            .iter()
            .map(|slot| {
                trace!(slot = slot.storage_key(), "building predefined argument");
                slot.build(raw_args, validators.and_then(|v| v.get(slot.name())))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(unknown) = validators
            .into_iter()
            .flat_map(|v| v.keys())
            .find(|name| !self.slots.iter().any(|slot| slot.name() == name.as_str()))
        {
            return Err(ArgumentError::InvalidValidator {
                group: group_name.to_string(),
                argument: unknown.clone(),
            });
        }

        ArgGroup::new(group_name, arguments, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Kwargs, RequestDescription};
    use serde_json::json;

    fn kwargs(v: Value) -> Kwargs {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_auth_synthesizes_all_slots() {
        let group = PredefinedGroup::auth().create("auth", &[], None).unwrap();
        let names: Vec<_> = group.arguments().iter().map(Argument::name).collect();
        assert_eq!(names, vec!["type", "username", "password"]);
        assert_eq!(
            group.argument("type").unwrap().default_value(),
            Some(&json!("basic"))
        );
    }

    #[test]
    fn test_auth_resolves_with_default_type() {
        let group = PredefinedGroup::auth().create("auth", &[], None).unwrap();
        let mut d = RequestDescription::new();
        group
            .resolve_into(&mut d, &kwargs(json!({"username": "u", "password": "p"})))
            .unwrap();
        assert_eq!(
            d.get("auth"),
            Some(&json!({"type": "basic", "username": "u", "password": "p"}))
        );
    }

    #[test]
    fn test_declared_slot_overrides_defaults() {
        let raw = RawArgument::normalize(&json!({"username": {"alias": "user"}})).unwrap();
        let group = PredefinedGroup::auth().create("auth", &raw, None).unwrap();
        assert_eq!(group.argument("username").unwrap().alias(), Some("user"));
    }

    #[test]
    fn test_undeclared_raw_args_are_ignored() {
        let raw = RawArgument::normalize(&json!(["realm"])).unwrap();
        let group = PredefinedGroup::auth().create("auth", &raw, None).unwrap();
        assert!(group.argument("realm").is_none());
    }

    #[test]
    fn test_choice_violation_on_input() {
        let group = PredefinedGroup::auth().create("auth", &[], None).unwrap();
        let mut d = RequestDescription::new();
        let err = group
            .resolve_into(
                &mut d,
                &kwargs(json!({"type": "other", "username": "u", "password": "p"})),
            )
            .unwrap_err();
        assert!(matches!(err, ArgumentError::ChoiceViolation { name, .. } if name == "type"));
    }

    #[test]
    fn test_choice_violation_on_slot_definition() {
        let err = PredefinedGroup::new("Broken")
            .slot(ArgumentSlot::new("type").default_value("other").choices(["basic", "digest"]))
            .unwrap_err();
        assert!(matches!(err, ArgumentError::ChoiceViolation { .. }));
    }

    #[test]
    fn test_choice_violation_on_declared_default() {
        let raw = RawArgument::normalize(&json!({"type": "ntlm"})).unwrap();
        let err = PredefinedGroup::auth().create("auth", &raw, None).unwrap_err();
        assert!(matches!(err, ArgumentError::ChoiceViolation { .. }));
    }

    #[test]
    fn test_storage_keys_are_owner_qualified() {
        let auth = PredefinedGroup::auth();
        let keys: Vec<_> = auth.slots().iter().map(ArgumentSlot::storage_key).collect();
        assert_eq!(keys, vec!["type@AuthGroup", "username@AuthGroup", "password@AuthGroup"]);
    }

    #[test]
    fn test_slot_and_external_validators() {
        let group_type = PredefinedGroup::new("Paging")
            .slot(ArgumentSlot::new("size").default_value(10).validator(Validator::new(
                |_, value| match value.and_then(Value::as_i64) {
                    Some(n) if n > 100 => Err(ArgumentError::custom("size capped at 100")),
                    _ => Ok(()),
                },
            )))
            .unwrap();
        let external = GroupValidators::from([(
            "size".to_string(),
            Validator::new(|_, value| match value.and_then(Value::as_i64) {
                Some(n) if n % 2 == 1 => Err(ArgumentError::custom("size must be even")),
                _ => Ok(()),
            }),
        )]);
        let group = group_type.create("paging", &[], Some(&external)).unwrap();

        let mut d = RequestDescription::new();
        let err = group.resolve_into(&mut d, &kwargs(json!({"size": 101}))).unwrap_err();
        assert_eq!(err.to_string(), "size capped at 100");
        let err = group.resolve_into(&mut d, &kwargs(json!({"size": 7}))).unwrap_err();
        assert_eq!(err.to_string(), "size must be even");
    }

    #[test]
    fn test_external_validator_for_unknown_slot() {
        let external = GroupValidators::from([("token".to_string(), Validator::new(|_, _| Ok(())))]);
        let err = PredefinedGroup::auth()
            .create("auth", &[], Some(&external))
            .unwrap_err();
        assert!(matches!(err, ArgumentError::InvalidValidator { .. }));
    }
}
