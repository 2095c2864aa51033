//! Disk slot codec and the storage update policy.
//!
//! A disk slot (`ide0`, `scsi3`, ...) is a comma list of `key=value`
//! pairs plus, in the platform's own output, a bare `storage:path`
//! volume reference. The server owns the volume path, so modifying a
//! slot takes more care than a plain field diff: cosmetic path churn
//! must be ignored, the server's `file=` must survive a merge, and a
//! grown `size=` is not a config change at all but a separate resize
//! call.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::resources::{field_defs, FieldDef};

/// Matches a disk slot parameter key, capturing bus and index.
pub static SLOT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ide|sata|scsi|virtio)(\d+)$").unwrap());

/// Disk bus. One codec serves all four; bus-specific sub-fields are
/// simply absent on the buses that do not support them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageKind {
    #[default]
    Ide,
    Sata,
    Scsi,
    Virtio,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Ide => "ide",
            StorageKind::Sata => "sata",
            StorageKind::Scsi => "scsi",
            StorageKind::Virtio => "virtio",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ide" => Some(StorageKind::Ide),
            "sata" => Some(StorageKind::Sata),
            "scsi" => Some(StorageKind::Scsi),
            "virtio" => Some(StorageKind::Virtio),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageField {
    pub kind: StorageKind,
    pub idx: u32,
    /// Storage pool name; only used to infer `file` for new volumes,
    /// never serialized on its own.
    pub storage: Option<String>,
    pub file: Option<String>,
    pub aio: Option<String>,
    pub backup: Option<String>,
    pub bps: Option<String>,
    pub bps_rd: Option<String>,
    pub bps_wr: Option<String>,
    pub cache: Option<String>,
    pub cyls: Option<String>,
    pub detect_zeroes: Option<String>,
    pub discard: Option<String>,
    pub format: Option<String>,
    pub heads: Option<String>,
    pub import_from: Option<String>,
    pub iops: Option<String>,
    pub iops_rd: Option<String>,
    pub iops_wr: Option<String>,
    pub iothread: Option<String>,
    pub mbps: Option<String>,
    pub mbps_rd: Option<String>,
    pub mbps_wr: Option<String>,
    pub media: Option<String>,
    pub model: Option<String>,
    pub product: Option<String>,
    pub queues: Option<String>,
    pub replicate: Option<String>,
    pub rerror: Option<String>,
    pub ro: Option<String>,
    pub scsiblock: Option<String>,
    pub secs: Option<String>,
    pub serial: Option<String>,
    pub shared: Option<String>,
    pub size: Option<String>,
    pub snapshot: Option<String>,
    pub ssd: Option<String>,
    pub trans: Option<String>,
    pub vendor: Option<String>,
    pub werror: Option<String>,
    pub wwn: Option<String>,
}

const SUBFIELDS: &[FieldDef<StorageField>] = field_defs!(StorageField {
    file,
    aio,
    backup,
    bps,
    bps_rd,
    bps_wr,
    cache,
    cyls,
    detect_zeroes,
    discard,
    format,
    heads,
    import_from => "import-from",
    iops,
    iops_rd,
    iops_wr,
    iothread,
    mbps,
    mbps_rd,
    mbps_wr,
    media,
    model,
    product,
    queues,
    replicate,
    rerror,
    ro,
    scsiblock,
    secs,
    serial,
    shared,
    size,
    snapshot,
    ssd,
    trans,
    vendor,
    werror,
    wwn,
});

impl StorageField {
    /// Decodes the raw wire value of `{kind}{idx}`. A bare
    /// `storage:path` token sets both `storage` and `file`.
    pub fn decode(kind: StorageKind, idx: u32, raw: &str) -> Result<Self, Error> {
        let mut field = StorageField {
            kind,
            idx,
            ..Default::default()
        };
        for token in raw.split(',') {
            if let Some((key, value)) = token.split_once('=') {
                if let Some(def) = SUBFIELDS.iter().find(|d| d.wire == key) {
                    (def.set)(&mut field, value.to_string());
                }
                if key == "file" {
                    if let Some((storage, _)) = value.split_once(':') {
                        field.storage = Some(storage.to_string());
                    }
                }
            } else if let Some((storage, _)) = token.split_once(':') {
                field.storage = Some(storage.to_string());
                field.file = Some(token.to_string());
            } else {
                return Err(Error::BadToken {
                    kind: kind.as_str(),
                    token: token.to_string(),
                });
            }
        }
        Ok(field)
    }

    /// The effective volume reference: explicit `file`, or
    /// `storage:size` allocation syntax when the caller asked for a
    /// fresh volume and no import is pending.
    fn file_value(&self) -> Option<String> {
        if let Some(file) = &self.file {
            return Some(file.clone());
        }
        if self.import_from.is_some() {
            return None;
        }
        match (&self.storage, &self.size) {
            (Some(storage), Some(size)) => Some(format!("{storage}:{}", strip_size_unit(size))),
            _ => None,
        }
    }

    /// Encodes into `("{kind}{idx}", "file=...,key=value,...")`.
    pub fn encode(&self) -> (String, String) {
        let mut parts = Vec::new();
        for def in SUBFIELDS {
            let value = if def.name == "file" {
                self.file_value()
            } else {
                (def.get)(self).cloned()
            };
            if let Some(value) = value {
                if !value.is_empty() {
                    parts.push(format!("{}={}", def.wire, value));
                }
            }
        }
        (
            format!("{}{}", self.kind.as_str(), self.idx),
            parts.join(","),
        )
    }

    /// Parses a user-supplied spec like
    /// `idx=0,storage=local-lvm,size=32,cache=writeback`.
    pub fn from_spec(kind: StorageKind, spec: &str) -> Result<Self, Error> {
        let mut field = StorageField {
            kind,
            ..Default::default()
        };
        let mut idx = None;
        for token in spec.split(',') {
            let Some((key, value)) = token.split_once('=') else {
                return Err(Error::InvalidSpec {
                    kind: kind.as_str(),
                    spec: spec.to_string(),
                    reason: format!("token '{token}' is not key=value"),
                });
            };
            match key {
                "idx" => {
                    idx = Some(value.parse().map_err(|_| Error::InvalidSpec {
                        kind: kind.as_str(),
                        spec: spec.to_string(),
                        reason: format!("bad index '{value}'"),
                    })?);
                }
                "storage" => field.storage = Some(value.to_string()),
                _ => {
                    let def = SUBFIELDS
                        .iter()
                        .find(|d| d.name == key || d.wire == key)
                        .ok_or_else(|| Error::InvalidSpec {
                            kind: kind.as_str(),
                            spec: spec.to_string(),
                            reason: format!("unknown option '{key}'"),
                        })?;
                    (def.set)(&mut field, value.to_string());
                }
            }
        }
        field.idx = idx.ok_or_else(|| Error::InvalidSpec {
            kind: kind.as_str(),
            spec: spec.to_string(),
            reason: "missing idx".to_string(),
        })?;
        Ok(field)
    }
}

/// Outcome of planning one slot of a modify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoragePlan {
    /// Only volume-path/import churn; send nothing.
    Noop,
    /// Send the desired value untouched (new slot, or import request).
    Replace(String),
    /// Send the desired value with the server-owned sub-fields folded
    /// back in.
    Merge(String),
}

/// Out-of-band grow request, issued after the primary config update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    pub disk: String,
    pub size: String,
}

/// Decides how to apply one changed disk slot.
///
/// `desired` and `current` are the serialized wire values; `current` is
/// empty when the slot does not exist yet. See the module docs for the
/// rules; shrinking an existing volume is rejected outright.
pub fn plan_update(
    slot: &str,
    desired: &str,
    current: &str,
) -> Result<(StoragePlan, Option<ResizeRequest>), Error> {
    if comparable_tokens(desired) == comparable_tokens(current) {
        return Ok((StoragePlan::Noop, None));
    }

    let resize = resize_request(slot, desired, current)?;

    if desired.contains("import-from") || current.is_empty() {
        return Ok((StoragePlan::Replace(desired.to_string()), resize));
    }

    let current_tokens: Vec<&str> = current.split(',').collect();
    let current_file = current_tokens.iter().copied().find(|t| is_file_token(t));
    let current_import = current_tokens
        .iter()
        .copied()
        .find(|t| t.contains("import-from="));

    let mut parts = Vec::new();
    for token in desired.split(',') {
        if is_file_token(token) {
            match current_file {
                // Never overwrite the server-assigned volume path.
                Some(file) => parts.push(normalize_file_token(file)),
                None => parts.push(token.to_string()),
            }
        } else {
            parts.push(token.to_string());
        }
    }
    if let Some(import) = current_import {
        parts.push(import.to_string());
    }

    Ok((StoragePlan::Merge(parts.join(",")), resize))
}

/// Tokens relevant for change detection: volume path and import
/// metadata dropped, sizes normalized, order ignored.
fn comparable_tokens(value: &str) -> Vec<String> {
    let mut tokens: Vec<String> = value
        .split(',')
        .filter(|t| !t.is_empty() && !is_file_token(t) && !t.contains("import-from="))
        .map(|t| match t.strip_prefix("size=") {
            Some(size) => format!("size={}", strip_size_unit(size)),
            None => t.to_string(),
        })
        .collect();
    tokens.sort();
    tokens
}

/// A volume reference: explicit `file=` or the platform's bare
/// `storage:path` shorthand.
fn is_file_token(token: &str) -> bool {
    token.starts_with("file=") || (!token.contains('=') && token.contains(':'))
}

fn normalize_file_token(token: &str) -> String {
    match token.strip_prefix("file=") {
        Some(_) => token.to_string(),
        None => format!("file={token}"),
    }
}

/// Drops the trailing capacity-unit letter (`32G` -> `32`).
fn strip_size_unit(size: &str) -> &str {
    size.trim_end_matches(|c: char| c.is_ascii_alphabetic())
}

fn size_of(value: &str) -> Option<u64> {
    value
        .split(',')
        .find_map(|t| t.strip_prefix("size="))
        .and_then(|s| strip_size_unit(s).parse().ok())
}

fn resize_request(
    slot: &str,
    desired: &str,
    current: &str,
) -> Result<Option<ResizeRequest>, Error> {
    let Some(current_size) = size_of(current) else {
        return Ok(None);
    };
    let Some(desired_size) = size_of(desired) else {
        return Ok(None);
    };
    if desired_size < current_size {
        return Err(Error::ShrinkNotAllowed {
            disk: slot.to_string(),
            current: current_size,
            requested: desired_size,
        });
    }
    if desired_size == current_size {
        return Ok(None);
    }
    Ok(Some(ResizeRequest {
        disk: slot.to_string(),
        size: format!("{desired_size}G"),
    }))
}
