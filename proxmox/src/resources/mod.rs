//! Resource base: descriptor-driven serialization and diffing.
//!
//! Every manageable entity declares a static table of
//! [`FieldDef`] descriptors (field name, wire parameter name, accessors)
//! built once at type-definition time. The table drives three
//! operations shared by all resource types:
//!
//! - `serialize` — wire parameter map sent to pvesh,
//! - `to_map` — plain field map reported back to the caller,
//! - `diff` — the minimal set of wire keys whose values differ from the
//!   live state.
//!
//! Indexed slots (NICs, disks) do not appear in the descriptor table;
//! resource types with slots merge their encoded form in through
//! [`Resource::serialize_slots`].

pub mod cluster;
pub mod node;
pub mod pool;

pub use cluster::{AcmeAccount, AcmePlugin, ClusterOptions, HaGroup, HaResource};
pub use node::qemu::Qemu;
pub use pool::Pool;

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One declared field of a resource or slot type.
pub struct FieldDef<T> {
    pub name: &'static str,
    /// Parameter name on the management API; differs from `name` where
    /// the API uses hyphens (e.g. `eab_hmac_key` -> `eab-hmac-key`).
    pub wire: &'static str,
    pub get: fn(&T) -> Option<&String>,
    pub set: fn(&mut T, String),
}

/// Builds a `&'static [FieldDef<T>]` table. Fields keep their own name
/// on the wire unless an explicit `=> "wire-name"` mapping is given.
macro_rules! field_defs {
    ($ty:ty { $( $field:ident $( => $wire:literal )? ),+ $(,)? }) => {
        &[ $( $crate::resources::FieldDef {
            name: stringify!($field),
            wire: $crate::resources::field_defs!(@wire $field $( $wire )?),
            get: |r: &$ty| r.$field.as_ref(),
            set: |r: &mut $ty, value: String| r.$field = Some(value),
        } ),+ ]
    };
    (@wire $field:ident) => { stringify!($field) };
    (@wire $field:ident $wire:literal) => { $wire };
}
pub(crate) use field_defs;

pub trait Resource: Sized + 'static {
    fn field_defs() -> &'static [FieldDef<Self>];

    /// Wire keys never compared in `diff` (identity and internal
    /// fields, e.g. `poolid`, `vmid`).
    fn diff_skip() -> &'static [&'static str] {
        &[]
    }

    /// Appends encoded indexed slots (`net0`, `scsi1`, ...) to the
    /// serialized map. Scalar-only resources keep the empty default.
    fn serialize_slots(&self, out: &mut BTreeMap<String, String>) {
        let _ = out;
    }

    /// Wire parameter map: declared fields in table order, empty and
    /// absent values skipped, then any indexed slots.
    fn serialize(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for def in Self::field_defs() {
            if let Some(value) = (def.get)(self) {
                if !value.is_empty() {
                    out.insert(def.wire.to_string(), value.clone());
                }
            }
        }
        self.serialize_slots(&mut out);
        out
    }

    /// Plain mapping keyed by field name; slots appear under their
    /// composite wire key.
    fn to_map(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for def in Self::field_defs() {
            if let Some(value) = (def.get)(self) {
                out.insert(def.name.to_string(), value.clone());
            }
        }
        self.serialize_slots(&mut out);
        out
    }

    /// Field-level delta against the live state. A key is included iff
    /// it is non-empty on the desired side, not diff-skipped, and
    /// either absent from `current` or different under trimmed string
    /// comparison. Absent desired fields never produce an unset.
    fn diff(&self, current: Option<&Self>) -> BTreeMap<String, String> {
        let current = current.map(Self::serialize).unwrap_or_default();
        let mut out = BTreeMap::new();
        for (key, value) in self.serialize() {
            if Self::diff_skip().contains(&key.as_str()) {
                continue;
            }
            match current.get(&key) {
                Some(have) if have.trim() == value.trim() => {}
                _ => {
                    out.insert(key, value);
                }
            }
        }
        out
    }
}

/// Builds a resource from a raw API record by walking the descriptor
/// table; keys the record does not carry stay absent.
pub fn from_record<T: Resource + Default>(record: &Map<String, Value>) -> T {
    let mut resource = T::default();
    for def in T::field_defs() {
        if let Some(value) = record.get(def.wire) {
            if !value.is_null() {
                (def.set)(&mut resource, stringify(value));
            }
        }
    }
    resource
}

/// Flattens a JSON scalar the way pvesh option values are written:
/// booleans become `1`/`0`, numbers their plain decimal form.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(poolid: &str, comment: Option<&str>) -> Pool {
        Pool {
            poolid: Some(poolid.to_string()),
            comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn serialize_skips_absent_and_empty_fields() {
        let serialized = pool("k8s", None).serialize();
        assert_eq!(serialized.len(), 1);
        assert_eq!(serialized["poolid"], "k8s");

        let empty = pool("k8s", Some("")).serialize();
        assert!(!empty.contains_key("comment"));
    }

    #[test]
    fn diff_of_identical_resources_is_empty() {
        let a = pool("k8s", Some("k8s pool"));
        let b = pool("k8s", Some("k8s pool"));
        assert!(a.diff(Some(&b)).is_empty());
    }

    #[test]
    fn diff_contains_only_changed_keys() {
        let desired = pool("k8s", Some("new"));
        let current = pool("k8s", Some("old"));
        let diff = desired.diff(Some(&current));
        assert_eq!(diff.len(), 1);
        assert_eq!(diff["comment"], "new");
    }

    #[test]
    fn diff_uses_trimmed_comparison() {
        let desired = pool("k8s", Some("text"));
        let current = pool("k8s", Some("text "));
        assert!(desired.diff(Some(&current)).is_empty());
    }

    #[test]
    fn diff_never_unsets_absent_fields() {
        let desired = pool("k8s", None);
        let current = pool("k8s", Some("old"));
        assert!(desired.diff(Some(&current)).is_empty());
    }

    #[test]
    fn diff_skips_identity_key() {
        let desired = pool("k8s", Some("c"));
        let diff = desired.diff(None);
        assert!(!diff.contains_key("poolid"));
        assert_eq!(diff["comment"], "c");
    }

    #[test]
    fn from_record_maps_wire_names_and_nulls() {
        let record = serde_json::json!({
            "poolid": "k8s",
            "comment": null,
        });
        let pool: Pool = from_record(record.as_object().unwrap());
        assert_eq!(pool.poolid.as_deref(), Some("k8s"));
        assert!(pool.comment.is_none());
    }

    #[test]
    fn stringify_follows_pvesh_conventions() {
        assert_eq!(stringify(&Value::Bool(true)), "1");
        assert_eq!(stringify(&Value::Bool(false)), "0");
        assert_eq!(stringify(&serde_json::json!(4096)), "4096");
        assert_eq!(stringify(&serde_json::json!("x")), "x");
    }
}
