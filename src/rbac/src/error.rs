//! Error types for the RBAC engine

use thiserror::Error;

/// RBAC engine errors
///
/// Role IDs are carried in their `Display` form so the error type stays
/// independent of the graph's key type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RbacError {
    /// An operation referenced a role that is not registered
    #[error("Role does not exist: {0}")]
    RoleNotExist(String),

    /// `add` was called with an ID that is already registered
    #[error("Role already exists: {0}")]
    RoleExists(String),

    /// The inheritance edges contain a cycle
    #[error("Circular inheritance detected: {}", .path.join(" -> "))]
    CircularInheritance {
        /// Cycle members in discovery order
        path: Vec<String>,
    },

    /// A snapshot document could not be decoded
    #[error("Unmarshal error: {0}")]
    Unmarshal(String),
}

impl RbacError {
    pub(crate) fn role_not_exist(id: &impl std::fmt::Display) -> Self {
        Self::RoleNotExist(id.to_string())
    }

    pub(crate) fn circular<'a, K, I>(path: I) -> Self
    where
        K: std::fmt::Display + 'a,
        I: IntoIterator<Item = &'a K>,
    {
        Self::CircularInheritance {
            path: path.into_iter().map(ToString::to_string).collect(),
        }
    }

    /// Returns the cycle path when this is a `CircularInheritance` error
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            Self::CircularInheritance { path } => Some(path.as_slice()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RbacError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unmarshal(err.to_string())
    }
}

/// Result type for RBAC operations
pub type Result<T> = std::result::Result<T, RbacError>;
