//! Datacenter-wide options (`/cluster/options`).
//!
//! This resource always exists; it only supports modify.

use crate::resources::{field_defs, FieldDef, Resource};

#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    pub bwlimit: Option<String>,
    pub console: Option<String>,
    pub crs: Option<String>,
    pub description: Option<String>,
    pub email_from: Option<String>,
    pub fencing: Option<String>,
    pub ha: Option<String>,
    pub http_proxy: Option<String>,
    pub keyboard: Option<String>,
    pub language: Option<String>,
    pub mac_prefix: Option<String>,
    pub max_workers: Option<String>,
    pub migration: Option<String>,
    pub migration_unsecure: Option<String>,
    pub next_id: Option<String>,
    pub notify: Option<String>,
    pub registered_tags: Option<String>,
    pub tag_style: Option<String>,
    pub u2f: Option<String>,
    pub user_tag_access: Option<String>,
    pub webauthn: Option<String>,
}

impl Resource for ClusterOptions {
    fn field_defs() -> &'static [FieldDef<Self>] {
        const DEFS: &[FieldDef<ClusterOptions>] = field_defs!(ClusterOptions {
            bwlimit,
            console,
            crs,
            description,
            email_from,
            fencing,
            ha,
            http_proxy,
            keyboard,
            language,
            mac_prefix,
            max_workers,
            migration,
            migration_unsecure,
            next_id => "next-id",
            notify,
            registered_tags => "registered-tags",
            tag_style => "tag-style",
            u2f,
            user_tag_access => "user-tag-access",
            webauthn,
        });
        DEFS
    }
}
