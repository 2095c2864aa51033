//! ACME accounts and challenge plugins (`/cluster/acme`).

use crate::resources::{field_defs, FieldDef, Resource};

#[derive(Debug, Clone, Default)]
pub struct AcmeAccount {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub directory: Option<String>,
    pub eab_hmac_key: Option<String>,
    pub eab_kid: Option<String>,
    pub tos_url: Option<String>,
}

impl Resource for AcmeAccount {
    fn field_defs() -> &'static [FieldDef<Self>] {
        const DEFS: &[FieldDef<AcmeAccount>] = field_defs!(AcmeAccount {
            name,
            contact,
            directory,
            eab_hmac_key => "eab-hmac-key",
            eab_kid => "eab-kid",
            tos_url,
        });
        DEFS
    }

    fn diff_skip() -> &'static [&'static str] {
        &["name"]
    }
}

#[derive(Debug, Clone, Default)]
pub struct AcmePlugin {
    pub id: Option<String>,
    /// Plugin type (`dns` or `standalone`).
    pub kind: Option<String>,
    pub api: Option<String>,
    /// Opaque plugin configuration blob, passed through verbatim.
    pub data: Option<String>,
    pub disable: Option<String>,
    pub nodes: Option<String>,
    pub validation_delay: Option<String>,
}

impl Resource for AcmePlugin {
    fn field_defs() -> &'static [FieldDef<Self>] {
        const DEFS: &[FieldDef<AcmePlugin>] = field_defs!(AcmePlugin {
            id,
            kind => "type",
            api,
            data,
            disable,
            nodes,
            validation_delay => "validation-delay",
        });
        DEFS
    }

    fn diff_skip() -> &'static [&'static str] {
        &["id"]
    }
}
