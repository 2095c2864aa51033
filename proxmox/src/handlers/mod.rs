//! Idempotent resource handlers.
//!
//! A handler binds one desired resource to a [`pvesh::Client`] and
//! exposes the four primitives [`reconcile`] drives: `lookup`,
//! `create`, `modify`, `remove`. Reconciling converges the live state
//! toward the desired one, applies nothing when they already match,
//! and in check mode reports what would change without issuing any
//! mutating call.

pub mod acme_account;
pub mod acme_plugin;
pub mod cluster_options;
pub mod ha_group;
pub mod ha_resource;
pub mod pool;
pub mod qemu;

pub use acme_account::AcmeAccountHandler;
pub use acme_plugin::AcmePluginHandler;
pub use cluster_options::ClusterOptionsHandler;
pub use ha_group::HaGroupHandler;
pub use ha_resource::HaResourceHandler;
pub use pool::PoolHandler;
pub use qemu::QemuHandler;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Error;
use crate::resources::Resource;

/// Desired end state of a managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Present,
    Absent,
}

/// What one reconcile run did (or, in check mode, would do).
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Live resource after reconciling; absent when the resource does
    /// not exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    pub updated_fields: BTreeMap<String, String>,
    pub changed: bool,
}

/// Result of a single create/modify/remove step.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub changed: bool,
    pub changes: BTreeMap<String, String>,
}

pub trait Handler {
    type Resource: Resource;

    fn lookup(&self) -> Result<Option<Self::Resource>, Error>;
    fn create(&self, check: bool) -> Result<Outcome, Error>;
    fn modify(&self, current: &Self::Resource, check: bool) -> Result<Outcome, Error>;
    fn remove(&self, check: bool) -> Result<Outcome, Error>;
}

/// Converges the resource toward `state` and reports the result.
pub fn reconcile<H: Handler>(handler: &H, state: State, check: bool) -> Result<Report, Error> {
    let current = handler.lookup()?;
    let existed = current.is_some();

    let outcome = match (state, &current) {
        (State::Present, None) => handler.create(check)?,
        (State::Present, Some(live)) => handler.modify(live, check)?,
        (State::Absent, Some(_)) => handler.remove(check)?,
        (State::Absent, None) => Outcome::default(),
    };

    tracing::info!(changed = outcome.changed, existed, "reconciled");

    // Refresh only after a real mutation; otherwise the first lookup
    // still describes the live state.
    let data = if outcome.changed && !check {
        handler.lookup()?.map(|r| r.to_map())
    } else {
        current.map(|r| r.to_map())
    };

    Ok(Report {
        data,
        updated_fields: outcome.changes,
        changed: outcome.changed,
    })
}
