//! HA managed resource handler (`/cluster/ha/resources`).

use std::sync::LazyLock;

use pvesh::{Client, Options};
use regex::Regex;

use crate::error::Error;
use crate::handlers::{Handler, Outcome};
use crate::resources::{from_record, HaResource, Resource};

static MISSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"no such resource '[^']*'").unwrap());

const PATH: &str = "cluster/ha/resources";

pub struct HaResourceHandler<'a, C: Client> {
    client: &'a C,
    desired: HaResource,
}

impl<'a, C: Client> HaResourceHandler<'a, C> {
    pub fn new(client: &'a C, desired: HaResource) -> Self {
        Self { client, desired }
    }

    fn item_path(&self) -> String {
        format!("{PATH}/{}", self.desired.sid.as_deref().unwrap_or_default())
    }
}

impl<C: Client> Handler for HaResourceHandler<'_, C> {
    type Resource = HaResource;

    fn lookup(&self) -> Result<Option<HaResource>, Error> {
        match self.client.get(&self.item_path(), &Options::new()) {
            Ok(value) => Ok(value.as_object().map(from_record)),
            Err(err) if MISSING.is_match(&err.to_string()) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn create(&self, check: bool) -> Result<Outcome, Error> {
        if !check {
            let options: Options = self.desired.serialize().into_iter().collect();
            self.client.create(PATH, &options)?;
        }
        Ok(Outcome {
            changed: true,
            changes: self.desired.diff(None),
        })
    }

    fn modify(&self, current: &HaResource, check: bool) -> Result<Outcome, Error> {
        let changes = self.desired.diff(Some(current));
        tracing::debug!(?changes, "field diff");
        if changes.is_empty() {
            return Ok(Outcome::default());
        }
        if !check {
            let options: Options = changes.clone().into_iter().collect();
            self.client.set(&self.item_path(), &options)?;
        }
        Ok(Outcome {
            changed: true,
            changes,
        })
    }

    fn remove(&self, check: bool) -> Result<Outcome, Error> {
        if !check {
            self.client.delete(&self.item_path(), &Options::new())?;
        }
        Ok(Outcome {
            changed: true,
            changes: Default::default(),
        })
    }
}
