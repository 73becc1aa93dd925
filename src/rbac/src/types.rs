//! Shared identifier types

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Identifier type for roles and permissions
///
/// Only equality and stable hashing are required; keys are never ordered.
/// `Display` is used to name IDs in errors and logs.
pub trait Key: Eq + Hash + Clone + Debug + Display + Send + Sync + 'static {}

impl<T> Key for T where T: Eq + Hash + Clone + Debug + Display + Send + Sync + 'static {}
