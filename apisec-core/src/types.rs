//! Domain types shared by every apisec crate.
//!
//! The only interpreted parts of an API specification are `host` and
//! `basePath`; their concatenation is the [`ApiIdentity`] that keys both the
//! desired set and the remote inventory.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::IdentityError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// `host ++ basePath`: the unique key of an API across the whole system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiIdentity(pub String);

impl ApiIdentity {
    /// Identity from already-split parts, e.g. an inventory entry.
    pub fn from_parts(host: &str, base_path: &str) -> Self {
        Self(format!("{host}{base_path}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ApiIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ApiIdentity {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The management service's own identifier for a protected API.
///
/// The service reports numeric ids; strings are accepted as well and both are
/// carried as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RemoteId(pub String);

impl<'de> Deserialize<'de> for RemoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Self(n.to_string()),
            Repr::Text(s) => Self(s),
        })
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<u64> for RemoteId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

// ---------------------------------------------------------------------------
// ApiSpec
// ---------------------------------------------------------------------------

/// An opaque Swagger / OpenAPI document.
///
/// Everything besides `host` and `basePath` is passed through to the
/// management service untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiSpec(pub Value);

impl ApiSpec {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    pub fn host(&self) -> Option<&str> {
        self.0.get("host").and_then(Value::as_str)
    }

    pub fn base_path(&self) -> Option<&str> {
        self.0.get("basePath").and_then(Value::as_str)
    }

    pub fn document(&self) -> &Value {
        &self.0
    }

    /// See [`identity`].
    pub fn identity(&self) -> Result<ApiIdentity, IdentityError> {
        identity(self)
    }
}

impl From<Value> for ApiSpec {
    fn from(document: Value) -> Self {
        Self(document)
    }
}

/// Derive the identity of `spec`.
///
/// Fails when the document is not an object or when `host` / `basePath` is
/// absent, not a string, or empty. No normalization is applied.
pub fn identity(spec: &ApiSpec) -> Result<ApiIdentity, IdentityError> {
    if !spec.0.is_object() {
        return Err(IdentityError::NotAnObject);
    }
    let host = non_empty(spec.host(), "host")?;
    let base_path = non_empty(spec.base_path(), "basePath")?;
    Ok(ApiIdentity::from_parts(host, base_path))
}

fn non_empty<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, IdentityError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(IdentityError::MissingField { field }),
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// What the management service currently protects. Rebuilt every run.
pub type ExistingInventory = BTreeMap<ApiIdentity, RemoteId>;

/// What the providers say should be protected.
pub type DesiredSet = BTreeMap<ApiIdentity, ApiSpec>;

/// Index `specs` by identity.
///
/// Specs without a usable identity are dropped with a warning naming `source`.
/// A later spec with the same identity replaces the earlier one.
pub fn collect_specs(source: &str, specs: impl IntoIterator<Item = ApiSpec>) -> DesiredSet {
    let mut set = DesiredSet::new();
    for spec in specs {
        match spec.identity() {
            Ok(id) => {
                tracing::debug!(source, identity = %id, "indexed API spec");
                set.insert(id, spec);
            }
            Err(err) => {
                tracing::warn!(source, error = %err, "dropping API spec without identity");
            }
        }
    }
    set
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(host: &str, base: &str) -> ApiSpec {
        ApiSpec::new(json!({ "swagger": "2.0", "host": host, "basePath": base }))
    }

    #[test]
    fn identity_concatenates_host_and_base_path() {
        assert_eq!(spec("a.com", "/v1").identity().unwrap(), ApiIdentity::from("a.com/v1"));
    }

    #[test]
    fn identity_ignores_other_fields() {
        let a = ApiSpec::new(json!({ "host": "a.com", "basePath": "/v1", "info": { "title": "A" } }));
        let b = ApiSpec::new(json!({ "host": "a.com", "basePath": "/v1", "paths": { "/x": {} } }));
        assert_eq!(identity(&a).unwrap(), identity(&b).unwrap());
    }

    #[test]
    fn identity_is_not_normalized() {
        assert_ne!(identity(&spec("A.com", "/v1")).unwrap(), identity(&spec("a.com", "/v1")).unwrap());
        assert_ne!(identity(&spec("a.com", "/v1/")).unwrap(), identity(&spec("a.com", "/v1")).unwrap());
    }

    #[test]
    fn identity_rejects_missing_and_empty_fields() {
        let no_host = ApiSpec::new(json!({ "basePath": "/v1" }));
        assert_eq!(identity(&no_host), Err(IdentityError::MissingField { field: "host" }));

        let empty_base = spec("a.com", "");
        assert_eq!(identity(&empty_base), Err(IdentityError::MissingField { field: "basePath" }));

        let numeric_host = ApiSpec::new(json!({ "host": 42, "basePath": "/v1" }));
        assert_eq!(identity(&numeric_host), Err(IdentityError::MissingField { field: "host" }));

        let scalar = ApiSpec::new(json!("just text"));
        assert_eq!(identity(&scalar), Err(IdentityError::NotAnObject));
    }

    #[test]
    fn collect_specs_drops_unidentifiable_and_keeps_last_duplicate() {
        let first = ApiSpec::new(json!({ "host": "x.com", "basePath": "/v1", "rev": 1 }));
        let second = ApiSpec::new(json!({ "host": "x.com", "basePath": "/v1", "rev": 2 }));
        let broken = ApiSpec::new(json!({ "host": "y.com" }));

        let set = collect_specs("test", vec![first, broken, second.clone()]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&ApiIdentity::from("x.com/v1")), Some(&second));
    }

    #[test]
    fn remote_id_accepts_numbers_and_strings() {
        let n: RemoteId = serde_json::from_value(json!(17)).unwrap();
        let s: RemoteId = serde_json::from_value(json!("17")).unwrap();
        assert_eq!(n, s);
        assert_eq!(n.to_string(), "17");
    }

    #[test]
    fn newtype_display() {
        assert_eq!(ApiIdentity::from("a.com/v1").to_string(), "a.com/v1");
        assert_eq!(RemoteId::from(5).to_string(), "5");
    }
}
