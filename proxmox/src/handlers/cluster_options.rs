//! Datacenter options handler (`/cluster/options`).
//!
//! The options record always exists, so this handler only ever
//! modifies; there is no create or remove and no absent state.

use pvesh::{Client, Options};

use crate::error::Error;
use crate::handlers::Report;
use crate::resources::{from_record, ClusterOptions, Resource};

const PATH: &str = "cluster/options";

pub struct ClusterOptionsHandler<'a, C: Client> {
    client: &'a C,
    desired: ClusterOptions,
}

impl<'a, C: Client> ClusterOptionsHandler<'a, C> {
    pub fn new(client: &'a C, desired: ClusterOptions) -> Self {
        Self { client, desired }
    }

    fn lookup(&self) -> Result<ClusterOptions, Error> {
        let value = self.client.get(PATH, &Options::new())?;
        Ok(value
            .as_object()
            .map(from_record)
            .unwrap_or_default())
    }

    pub fn reconcile(&self, check: bool) -> Result<Report, Error> {
        let current = self.lookup()?;
        let changes = self.desired.diff(Some(&current));
        tracing::debug!(?changes, "field diff");
        if changes.is_empty() {
            return Ok(Report {
                data: Some(current.to_map()),
                updated_fields: changes,
                changed: false,
            });
        }
        if check {
            return Ok(Report {
                data: Some(current.to_map()),
                updated_fields: changes,
                changed: true,
            });
        }
        let options: Options = changes.clone().into_iter().collect();
        self.client.set(PATH, &options)?;
        let refreshed = self.lookup()?;
        Ok(Report {
            data: Some(refreshed.to_map()),
            updated_fields: changes,
            changed: true,
        })
    }
}
