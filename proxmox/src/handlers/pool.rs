//! Resource pool handler (`/pools`).

use std::sync::LazyLock;

use pvesh::{Client, Options};
use regex::Regex;
use serde_json::Value;

use crate::error::Error;
use crate::handlers::{Handler, Outcome};
use crate::resources::{from_record, Pool, Resource};

static MISSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pool '[^']*' does not exist").unwrap());

const PATH: &str = "pools";

pub struct PoolHandler<'a, C: Client> {
    client: &'a C,
    desired: Pool,
}

impl<'a, C: Client> PoolHandler<'a, C> {
    pub fn new(client: &'a C, desired: Pool) -> Self {
        Self { client, desired }
    }

    fn poolid(&self) -> &str {
        self.desired.poolid.as_deref().unwrap_or_default()
    }
}

impl<C: Client> Handler for PoolHandler<'_, C> {
    type Resource = Pool;

    fn lookup(&self) -> Result<Option<Pool>, Error> {
        let options = Options::new().add("poolid", self.poolid());
        match self.client.get(PATH, &options) {
            Ok(value) => {
                // Listing endpoint: the answer is an array even when
                // filtered down to one pool.
                let records = match value {
                    Value::Array(items) => items,
                    other => vec![other],
                };
                for record in records {
                    if let Some(map) = record.as_object() {
                        if map.get("poolid").and_then(Value::as_str) == Some(self.poolid()) {
                            return Ok(Some(from_record(map)));
                        }
                    }
                }
                Ok(None)
            }
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

    fn modify(&self, current: &Pool, check: bool) -> Result<Outcome, Error> {
        let changes = self.desired.diff(Some(current));
        tracing::debug!(?changes, "field diff");
        if changes.is_empty() {
            return Ok(Outcome::default());
        }
        if !check {
            let mut options = Options::new().add("poolid", self.poolid());
            options.extend(changes.clone());
            self.client.set(PATH, &options)?;
        }
        Ok(Outcome {
            changed: true,
            changes,
        })
    }

    fn remove(&self, check: bool) -> Result<Outcome, Error> {
        if !check {
            let options = Options::new().add("poolid", self.poolid());
            self.client.delete(PATH, &options)?;
        }
        Ok(Outcome {
            changed: true,
            changes: Default::default(),
        })
    }
}
