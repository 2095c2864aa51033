//! QEMU virtual machine handler (`/nodes/{node}/qemu`).
//!
//! Modifying a VM is a two-stage apply: changed disk slots go through
//! the storage update policy first, which can downgrade a slot change
//! to a no-op, rewrite it as a merge, split off a resize request, or
//! reject it as a shrink. Every slot is planned before any call is
//! issued, so a rejected plan aborts with the live config untouched.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use pvesh::{Client, Options};
use regex::Regex;

use crate::error::Error;
use crate::handlers::{Handler, Outcome};
use crate::resources::node::qemu::storage::{plan_update, ResizeRequest, StoragePlan, SLOT_KEY};
use crate::resources::{Qemu, Resource};

static MISSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Configuration file '[^']*' does not exist").unwrap());

pub struct QemuHandler<'a, C: Client> {
    client: &'a C,
    desired: Qemu,
}

impl<'a, C: Client> QemuHandler<'a, C> {
    pub fn new(client: &'a C, desired: Qemu) -> Self {
        Self { client, desired }
    }

    fn node(&self) -> &str {
        self.desired.node.as_deref().unwrap_or_default()
    }

    fn vmid(&self) -> &str {
        self.desired.vmid.as_deref().unwrap_or_default()
    }

    fn base_path(&self) -> String {
        format!("nodes/{}/qemu", self.node())
    }

    fn vm_path(&self) -> String {
        format!("{}/{}", self.base_path(), self.vmid())
    }
}

impl<C: Client> Handler for QemuHandler<'_, C> {
    type Resource = Qemu;

    fn lookup(&self) -> Result<Option<Qemu>, Error> {
        let path = format!("{}/config", self.vm_path());
        match self.client.get(&path, &Options::new()) {
            Ok(value) => match value.as_object() {
                Some(record) => Ok(Some(Qemu::from_record(self.node(), record)?)),
                None => Ok(None),
            },
            Err(err) if MISSING.is_match(&err.to_string()) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn create(&self, check: bool) -> Result<Outcome, Error> {
        if !check {
            let options: Options = self.desired.serialize().into_iter().collect();
            self.client.create(&self.base_path(), &options)?;
        }
        Ok(Outcome {
            changed: true,
            changes: self.desired.diff(None),
        })
    }

    fn modify(&self, current: &Qemu, check: bool) -> Result<Outcome, Error> {
        let diff = self.desired.diff(Some(current));
        tracing::debug!(?diff, "field diff");
        let live = current.serialize();

        let mut options = Options::new();
        let mut resizes: Vec<ResizeRequest> = Vec::new();
        // Reported changes carry the desired diff values, not the
        // post-merge strings actually sent; slots the policy downgraded
        // to a no-op are not changes at all.
        let mut changes: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in &diff {
            if SLOT_KEY.is_match(key) {
                let current_value = live.get(key).map(String::as_str).unwrap_or_default();
                let (plan, resize) = plan_update(key, value, current_value)?;
                let grows = resize.is_some();
                if let Some(resize) = resize {
                    resizes.push(resize);
                }
                match plan {
                    StoragePlan::Noop => {
                        if grows {
                            changes.insert(key.clone(), value.clone());
                        }
                    }
                    StoragePlan::Replace(merged) | StoragePlan::Merge(merged) => {
                        options.push(key, merged);
                        changes.insert(key.clone(), value.clone());
                    }
                }
            } else {
                options.push(key, value);
                changes.insert(key.clone(), value.clone());
            }
        }

        if changes.is_empty() {
            return Ok(Outcome::default());
        }
        if check {
            return Ok(Outcome {
                changed: true,
                changes,
            });
        }

        if !options.is_empty() {
            let path = format!("{}/config", self.vm_path());
            self.client.set(&path, &options)?;
        }
        for resize in resizes {
            let path = format!("{}/resize", self.vm_path());
            let options = Options::new()
                .add("disk", resize.disk)
                .add("size", resize.size);
            self.client.set(&path, &options)?;
        }

        Ok(Outcome {
            changed: true,
            changes,
        })
    }

    fn remove(&self, check: bool) -> Result<Outcome, Error> {
        if !check {
            let mut options = Options::new();
            let flags = [
                (
                    "destroy-unreferenced-disks",
                    &self.desired.destroy_unreferenced_disks,
                ),
                ("purge", &self.desired.purge),
                ("skiplock", &self.desired.skiplock),
            ];
            for (name, value) in flags {
                if let Some(value) = value {
                    if !value.is_empty() {
                        options.push(name, value.clone());
                    }
                }
            }
            self.client.delete(&self.vm_path(), &options)?;
        }
        Ok(Outcome {
            changed: true,
            changes: Default::default(),
        })
    }
}
