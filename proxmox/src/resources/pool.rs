//! Pool resource (`/pools`).

use super::{field_defs, FieldDef, Resource};

#[derive(Debug, Clone, Default)]
pub struct Pool {
    pub poolid: Option<String>,
    pub comment: Option<String>,
}

impl Resource for Pool {
    fn field_defs() -> &'static [FieldDef<Self>] {
        const DEFS: &[FieldDef<Pool>] = field_defs!(Pool { poolid, comment });
        DEFS
    }

    fn diff_skip() -> &'static [&'static str] {
        &["poolid"]
    }
}
