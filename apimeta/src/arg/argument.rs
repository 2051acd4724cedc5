//! Single named arguments and their validators.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::raw::RawArgument;
use crate::error::ArgumentError;
use crate::request::Kwargs;

type ValidateFn = dyn Fn(&Argument, Option<&Value>) -> Result<(), ArgumentError> + Send + Sync;

/// A check run against every resolved value of an argument.
///
/// The second parameter is `None` when resolution produced no input.
/// Validators signal failure by returning an error; the first failure
/// aborts resolution for the call.
///
/// ## Examples
///
/// ```rust
/// use apimeta::arg::Validator;
/// use apimeta::ArgumentError;
///
/// let positive = Validator::new(|arg, value| match value.and_then(|v| v.as_i64()) {
///     Some(n) if n <= 0 => Err(ArgumentError::custom(format!("{} must be positive", arg.name()))),
///     _ => Ok(()),
/// });
/// # let _ = positive;
/// ```
#[derive(Clone)]
pub struct Validator(Arc<ValidateFn>);

impl Validator {
    /// Wraps a validation function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Argument, Option<&Value>) -> Result<(), ArgumentError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Fails with [`ArgumentError::RequiredArgMissing`] when a required
    /// argument resolved to nothing.
    pub fn required() -> Self {
        Self::new(|arg, value| {
            if arg.required() && value.is_none() {
                return Err(ArgumentError::required_missing(arg.resolution_key()));
            }
            Ok(())
        })
    }

    /// Fails with [`ArgumentError::ChoiceViolation`] when a value is not one
    /// of `choices`. Arguments without a value are not checked.
    pub fn choices(choices: Vec<Value>) -> Self {
        Self::new(move |arg, value| match value {
            Some(value) => check_choice(arg.name(), value, &choices),
            None => Ok(()),
        })
    }

    /// Runs the validator.
    pub fn validate(&self, arg: &Argument, value: Option<&Value>) -> Result<(), ArgumentError> {
        (self.0)(arg, value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

pub(crate) fn check_choice(
    name: &str,
    value: &Value,
    choices: &[Value],
) -> Result<(), ArgumentError> {
    if choices.contains(value) {
        return Ok(());
    }
    Err(ArgumentError::ChoiceViolation {
        name: name.to_string(),
        value: value.clone(),
        choices: choices.to_vec(),
    })
}

/// Outcome of resolving one argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The key read from call kwargs (alias if set, else name).
    pub key: String,
    /// The resolved value, or `None` for "no input".
    pub value: Option<Value>,
}

/// A named parameter with validation and resolution rules.
///
/// Arguments are created while their group is built and only read after
/// that; the validator list never grows once the group exists.
#[derive(Debug, Clone)]
pub struct Argument {
    name: String,
    alias: Option<String>,
    required: bool,
    default: Option<Value>,
    validators: Vec<Validator>,
}

impl Argument {
    /// Creates an argument with the built-in required check installed.
    pub fn new(
        name: impl Into<String>,
        alias: Option<String>,
        required: bool,
        default: Option<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            alias,
            required,
            default,
            validators: vec![Validator::required()],
        }
    }

    /// Creates an argument from a normalized declaration.
    pub fn from_raw(raw: &RawArgument) -> Self {
        Self::new(
            raw.name.clone(),
            raw.alias.clone(),
            raw.required,
            raw.default.clone(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The key read from call kwargs: the alias if set, else the name.
    pub fn resolution_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Appends a validator; validators run in registration order.
    pub fn add_validator(&mut self, validator: Validator) {
        self.validators.push(validator);
    }

    /// Resolves this argument's value for one call.
    ///
    /// Lookup order:
    /// 1. the resolution key in `input` (only the alias when one is set)
    /// 2. the configured default
    /// 3. the group's current value for `name` in the request description
    /// 4. no input
    ///
    /// ## Errors
    ///
    /// Returns the first validator failure.
    pub fn resolve(
        &self,
        current: Option<&Map<String, Value>>,
        input: &Kwargs,
    ) -> Result<Resolution, ArgumentError> {
        let key = self.resolution_key();
        let value = input
            .get(key)
            .or(self.default.as_ref())
            .or_else(|| current.and_then(|c| c.get(&self.name)).filter(|v| !v.is_null()))
            .cloned();

        for validator in &self.validators {
            validator.validate(self, value.as_ref())?;
        }

        Ok(Resolution {
            key: key.to_string(),
            value,
        })
    }
}
