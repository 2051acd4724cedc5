//! Arguments and argument groups.
//!
//! - [`Argument`] - one named parameter with resolution and validation rules
//! - [`RawArgument`] - the normalized form of a declaration
//! - [`ArgGroup`] - a named cluster of arguments folded into a request
//! - [`PredefinedGroup`] - a group type with fixed, statically declared slots
//! - [`GroupRegistry`] - group name to group type lookup

mod argument;
mod group;
mod predefined;
mod raw;
mod registry;

pub use argument::{Argument, Resolution, Validator};
pub use group::{ArgGroup, ArgValidators, GroupType, GroupValidators, PlainGroup};
pub use predefined::{ArgumentSlot, PredefinedGroup};
pub use raw::RawArgument;
pub use registry::{GroupRegistry, PLAIN_GROUPS};
