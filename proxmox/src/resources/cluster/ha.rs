//! HA groups and HA-managed resources (`/cluster/ha`).

use crate::resources::{field_defs, FieldDef, Resource};

/// HA group. `nodes` is the platform's `name:priority` comma list
/// (e.g. `pve1:2,pve2`), passed through verbatim.
#[derive(Debug, Clone, Default)]
pub struct HaGroup {
    pub group: Option<String>,
    pub nodes: Option<String>,
    pub comment: Option<String>,
    pub nofailback: Option<String>,
    pub restricted: Option<String>,
    /// Always `group` on current platforms; kept settable for parity
    /// with the API schema.
    pub kind: Option<String>,
}

impl Resource for HaGroup {
    fn field_defs() -> &'static [FieldDef<Self>] {
        const DEFS: &[FieldDef<HaGroup>] = field_defs!(HaGroup {
            group,
            nodes,
            comment,
            nofailback,
            restricted,
            kind => "type",
        });
        DEFS
    }

    fn diff_skip() -> &'static [&'static str] {
        &["group"]
    }
}

/// HA-managed resource, identified by its `sid` (e.g. `vm:101`).
#[derive(Debug, Clone, Default)]
pub struct HaResource {
    pub sid: Option<String>,
    pub comment: Option<String>,
    pub group: Option<String>,
    pub max_relocate: Option<String>,
    pub max_restart: Option<String>,
    /// Requested HA state (`started`, `stopped`, ...), distinct from
    /// the reconcile present/absent state.
    pub state: Option<String>,
}

impl Resource for HaResource {
    fn field_defs() -> &'static [FieldDef<Self>] {
        const DEFS: &[FieldDef<HaResource>] = field_defs!(HaResource {
            sid,
            comment,
            group,
            max_relocate,
            max_restart,
            state,
        });
        DEFS
    }

    fn diff_skip() -> &'static [&'static str] {
        &["sid"]
    }
}
