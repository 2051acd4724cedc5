//! Group name to group type registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::group::{ArgGroup, GroupType, GroupValidators, PlainGroup};
use super::predefined::PredefinedGroup;
use super::raw::RawArgument;
use crate::error::{ApiError, ConfigError};

/// Plain group names registered by [`GroupRegistry::default`].
pub const PLAIN_GROUPS: [&str; 8] = [
    "params",
    "headers",
    "json",
    "data",
    "cookies",
    "files",
    "path",
    "multipart",
];

/// Maps group names to the [`GroupType`] that builds them.
///
/// Each [`Consumer`](crate::Consumer) owns its registry and hands it to the
/// API builder, so registering a group on one consumer never affects
/// another. Configure it before declaring APIs; the registry is not meant to
/// change while calls are in flight.
///
/// ## Examples
///
/// ```rust
/// use apimeta::arg::{ArgumentSlot, GroupRegistry, PredefinedGroup};
///
/// let mut registry = GroupRegistry::default();
/// registry.register(
///     "bearer",
///     PredefinedGroup::new("BearerGroup").slot(ArgumentSlot::new("token"))?,
/// );
/// assert!(registry.contains("bearer"));
///
/// registry.unregister("bearer");
/// assert!(!registry.contains("bearer"));
/// # Ok::<(), apimeta::ArgumentError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GroupRegistry {
    types: HashMap<String, Arc<dyn GroupType>>,
}

impl GroupRegistry {
    /// Creates a registry with no groups at all.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Registers (or replaces) the group type for `group_name`.
    pub fn register(&mut self, group_name: impl Into<String>, group_type: impl GroupType + 'static) {
        let group_name = group_name.into();
        debug!(group = %group_name, ?group_type, "registering argument group");
        self.types.insert(group_name, Arc::new(group_type));
    }

    /// Removes `group_name`; unknown names are ignored.
    pub fn unregister(&mut self, group_name: &str) {
        self.types.remove(group_name);
    }

    pub fn contains(&self, group_name: &str) -> bool {
        self.types.contains_key(group_name)
    }

    /// Builds a group through its registered type.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::UnknownGroup`] if `group_name` is not
    /// registered, and propagates the group type's construction errors.
    pub fn create(
        &self,
        group_name: &str,
        raw_args: &[RawArgument],
        validators: Option<&GroupValidators>,
    ) -> Result<ArgGroup, ApiError> {
        let group_type = self
            .types
            .get(group_name)
            .ok_or_else(|| ConfigError::UnknownGroup {
                name: group_name.to_string(),
            })?;
        Ok(group_type.create(group_name, raw_args, validators)?)
    }
}

impl Default for GroupRegistry {
    /// Registers the plain groups in [`PLAIN_GROUPS`] and the `auth` group.
    fn default() -> Self {
        let mut registry = Self::empty();
        for name in PLAIN_GROUPS {
            registry.register(name, PlainGroup);
        }
        registry.register("auth", PredefinedGroup::auth());
        registry
    }
}
