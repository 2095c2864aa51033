//! ACME challenge plugin handler (`/cluster/acme/plugins`).

use std::sync::LazyLock;

use pvesh::{Client, Options};
use regex::Regex;

use crate::error::Error;
use crate::handlers::{Handler, Outcome};
use crate::resources::{from_record, AcmePlugin, Resource};

static MISSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ACME plugin '[^']*' not defined").unwrap());

const PATH: &str = "cluster/acme/plugins";

pub struct AcmePluginHandler<'a, C: Client> {
    client: &'a C,
    desired: AcmePlugin,
}

impl<'a, C: Client> AcmePluginHandler<'a, C> {
    pub fn new(client: &'a C, desired: AcmePlugin) -> Self {
        Self { client, desired }
    }

    fn item_path(&self) -> String {
        format!("{PATH}/{}", self.desired.id.as_deref().unwrap_or_default())
    }
}

impl<C: Client> Handler for AcmePluginHandler<'_, C> {
    type Resource = AcmePlugin;

    fn lookup(&self) -> Result<Option<AcmePlugin>, Error> {
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

    fn modify(&self, current: &AcmePlugin, check: bool) -> Result<Outcome, Error> {
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
