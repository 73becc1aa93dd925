//! Permission capability and the built-in permission kinds
//!
//! Two kinds ship with the crate:
//!
//! - [`ExactPermission`]: covers a request only when the IDs are equal
//! - [`LayeredPermission`]: a delimited ID (`admin:dashboard:read`) where
//!   holding a shorter prefix covers every longer permission nested under it
//!
//! Matching is always asked of the *held* permission: "does what I hold cover
//! what is being requested?". Kinds never cover each other.

use crate::types::Key;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Default separator between layers of a [`LayeredPermission`]
pub const DEFAULT_LAYER_SEPARATOR: &str = ":";

/// Shared handle to a permission
///
/// One permission value can be assigned to any number of roles.
pub type PermissionRef<K> = Arc<dyn Permission<K>>;

/// Permission capability
///
/// Implement this for custom permission records. A custom type that wraps a
/// built-in permission should delegate `as_any` to the inner value so the
/// built-in kinds still recognise it.
pub trait Permission<K: Key>: fmt::Debug + Send + Sync + 'static {
    /// Permission identifier; roles key their permission sets by it
    fn id(&self) -> &K;

    /// Returns true if holding `self` satisfies `requested`
    fn matches(&self, requested: &dyn Permission<K>) -> bool;

    /// True for a permission that was never given an identity
    fn is_unset(&self) -> bool {
        false
    }

    /// Concrete value, used to check that two permissions are the same kind
    fn as_any(&self) -> &dyn Any;
}

/// Permission matched by ID equality
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExactPermission<K> {
    id: K,
}

impl<K: Key> ExactPermission<K> {
    /// Create a new exact permission
    pub fn new(id: impl Into<K>) -> Self {
        Self { id: id.into() }
    }

    /// Wrap into a shared handle
    pub fn shared(id: impl Into<K>) -> PermissionRef<K> {
        Arc::new(Self::new(id))
    }
}

impl<K: Key> Permission<K> for ExactPermission<K> {
    fn id(&self) -> &K {
        &self.id
    }

    fn matches(&self, requested: &dyn Permission<K>) -> bool {
        requested
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| other.id == self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<K: fmt::Display> fmt::Display for ExactPermission<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Permission with a layered ID
///
/// Lower layers carry higher privileges: holding `admin` covers
/// `admin:dashboard` and `admin:dashboard:read`, never the other way round.
///
/// # Example
///
/// ```
/// use cretoai_rbac::{LayeredPermission, Permission};
///
/// let admin = LayeredPermission::new("admin");
/// let dashboard = LayeredPermission::new("admin:dashboard");
///
/// assert!(admin.matches(&dashboard));
/// assert!(!dashboard.matches(&admin));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LayeredRepr", into = "LayeredRepr")]
pub struct LayeredPermission {
    id: String,
    separator: String,
    layers: Vec<String>,
}

impl LayeredPermission {
    /// Create a layered permission using the default `:` separator
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_separator(id, DEFAULT_LAYER_SEPARATOR)
    }

    /// Create a layered permission split on `separator`
    pub fn with_separator(id: impl Into<String>, separator: impl Into<String>) -> Self {
        let id = id.into();
        let separator = separator.into();
        let layers = if id.is_empty() {
            Vec::new()
        } else if separator.is_empty() {
            vec![id.clone()]
        } else {
            id.split(separator.as_str()).map(str::to_string).collect()
        };

        Self {
            id,
            separator,
            layers,
        }
    }

    /// Build from layer tokens, joined with `separator`
    ///
    /// The joined ID is split again, so a token containing the separator
    /// becomes several layers and the result always equals
    /// `with_separator(joined, separator)`.
    pub fn from_layers<I, S>(layers: I, separator: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let separator = separator.into();
        let tokens: Vec<String> = layers.into_iter().map(Into::into).collect();
        Self::with_separator(tokens.join(separator.as_str()), separator)
    }

    /// Wrap into a shared handle
    pub fn shared(id: impl Into<String>) -> PermissionRef<String> {
        Arc::new(Self::new(id))
    }

    /// Layer tokens, broadest first
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    /// Separator used to split the ID
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Returns true if `self` is a prefix of `other`, layer by layer
    pub fn covers(&self, other: &LayeredPermission) -> bool {
        if self.layers.is_empty() || self.layers.len() > other.layers.len() {
            return false;
        }
        self.layers
            .iter()
            .zip(&other.layers)
            .all(|(held, requested)| held == requested)
    }
}

impl Permission<String> for LayeredPermission {
    fn id(&self) -> &String {
        &self.id
    }

    fn matches(&self, requested: &dyn Permission<String>) -> bool {
        requested
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| self.covers(other))
    }

    fn is_unset(&self) -> bool {
        self.layers.is_empty()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for LayeredPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Wire form; layers are recomputed on decode
#[derive(Serialize, Deserialize)]
struct LayeredRepr {
    id: String,
    #[serde(default = "default_separator")]
    sep: String,
}

fn default_separator() -> String {
    DEFAULT_LAYER_SEPARATOR.to_string()
}

impl From<LayeredRepr> for LayeredPermission {
    fn from(repr: LayeredRepr) -> Self {
        Self::with_separator(repr.id, repr.sep)
    }
}

impl From<LayeredPermission> for LayeredRepr {
    fn from(permission: LayeredPermission) -> Self {
        Self {
            id: permission.id,
            sep: permission.separator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_by_id() {
        let read = ExactPermission::<String>::new("read");
        assert!(read.matches(&ExactPermission::<String>::new("read")));
        assert!(!read.matches(&ExactPermission::<String>::new("write")));
    }

    #[test]
    fn test_exact_integer_keys() {
        let p = ExactPermission::<u64>::new(7u64);
        assert!(p.matches(&ExactPermission::<u64>::new(7u64)));
        assert!(!p.matches(&ExactPermission::<u64>::new(8u64)));
    }

    #[test]
    fn test_layered_prefix_is_asymmetric() {
        let admin = LayeredPermission::new("admin");
        let dashboard = LayeredPermission::new("admin:dashboard");
        let profile = LayeredPermission::new("profile");

        assert!(admin.matches(&dashboard));
        assert!(admin.matches(&admin));
        assert!(!dashboard.matches(&admin));
        assert!(!admin.matches(&profile));
        assert!(!profile.matches(&admin));
    }

    #[test]
    fn test_layered_mismatch_in_middle_layer() {
        let held = LayeredPermission::new("a:b");
        assert!(!held.matches(&LayeredPermission::new("a:c:d")));
        assert!(held.matches(&LayeredPermission::new("a:b:d")));
    }

    #[test]
    fn test_layered_custom_separator() {
        let held = LayeredPermission::with_separator("admin/users", "/");
        assert_eq!(held.layers(), &["admin".to_string(), "users".to_string()]);
        assert!(held.matches(&LayeredPermission::with_separator("admin/users/delete", "/")));
        // Layers are compared, not separators
        assert!(held.matches(&LayeredPermission::new("admin:users:delete")));

        // Under "/" the token "admin:users" is a single layer
        let single = LayeredPermission::with_separator("admin:users", "/");
        assert_eq!(single.layers().len(), 1);
        assert!(!single.matches(&LayeredPermission::new("admin:users:delete")));
    }

    #[test]
    fn test_from_layers_joins_tokens() {
        let p = LayeredPermission::from_layers(["admin", "dashboard"], ":");
        assert_eq!(p.id(), "admin:dashboard");
        assert_eq!(p, LayeredPermission::new("admin:dashboard"));
    }

    #[test]
    fn test_from_layers_survives_serde_round_trip() {
        let nested = LayeredPermission::from_layers(["admin:users"], ":");
        assert_eq!(nested.layers(), &["admin".to_string(), "users".to_string()]);

        let json = serde_json::to_string(&nested).unwrap();
        let decoded: LayeredPermission = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, nested);

        let requested = LayeredPermission::new("admin:users:x");
        assert_eq!(nested.matches(&requested), decoded.matches(&requested));

        // A lone empty token is unset before and after decoding
        let empty = LayeredPermission::from_layers([""], ":");
        assert!(empty.is_unset());
        let decoded: LayeredPermission =
            serde_json::from_str(&serde_json::to_string(&empty).unwrap()).unwrap();
        assert!(decoded.is_unset());
        assert_eq!(decoded, empty);
    }

    #[test]
    fn test_kinds_never_cross_match() {
        let exact: ExactPermission<String> = ExactPermission::new("admin");
        let layered = LayeredPermission::new("admin");

        assert!(!exact.matches(&layered));
        assert!(!layered.matches(&exact));
    }

    #[test]
    fn test_empty_layered_is_unset() {
        let unset = LayeredPermission::new("");
        assert!(unset.is_unset());
        assert!(!unset.matches(&LayeredPermission::new("admin")));
        assert!(!LayeredPermission::new("admin").matches(&unset));
    }

    #[test]
    fn test_layered_serde_recomputes_layers() {
        let json = r#"{"id":"a/b","sep":"/"}"#;
        let p: LayeredPermission = serde_json::from_str(json).unwrap();
        assert_eq!(p.layers().len(), 2);

        let default_sep: LayeredPermission = serde_json::from_str(r#"{"id":"x:y"}"#).unwrap();
        assert_eq!(default_sep.layers().len(), 2);
        assert_eq!(serde_json::to_string(&p).unwrap(), json);
    }
}
