//! Network interface slot codec.
//!
//! One `netN` parameter packs a NIC into `key=value` pairs, with one
//! quirk: when a MAC address is present the platform writes
//! `virtio=AA:BB:CC:DD:EE:FF,...`, conflating the NIC model with the
//! key position. Decoding folds that back into `model` + `macaddr`.

use crate::error::Error;
use crate::resources::{field_defs, FieldDef};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetField {
    pub idx: u32,
    pub model: Option<String>,
    pub bridge: Option<String>,
    pub firewall: Option<String>,
    pub link_down: Option<String>,
    pub macaddr: Option<String>,
    pub mtu: Option<String>,
    pub queues: Option<String>,
    pub rate: Option<String>,
    pub tag: Option<String>,
    pub trunks: Option<String>,
}

const SUBFIELDS: &[FieldDef<NetField>] = field_defs!(NetField {
    model,
    bridge,
    firewall,
    link_down,
    macaddr,
    mtu,
    queues,
    rate,
    tag,
    trunks,
});

impl NetField {
    /// Decodes the raw wire value of `net{idx}`.
    pub fn decode(idx: u32, raw: &str) -> Result<Self, Error> {
        let mut field = NetField {
            idx,
            ..Default::default()
        };
        for token in raw.split(',') {
            let Some((key, value)) = token.split_once('=') else {
                return Err(Error::BadToken {
                    kind: "net",
                    token: token.to_string(),
                });
            };
            // `<model>=<mac>` form: the key carries the NIC model.
            if value.matches(':').count() == 5 {
                field.model = Some(key.to_string());
                field.macaddr = Some(value.to_string());
                continue;
            }
            if let Some(def) = SUBFIELDS.iter().find(|d| d.wire == key) {
                (def.set)(&mut field, value.to_string());
            }
        }
        Ok(field)
    }

    /// Encodes into `("net{idx}", "key=value,...")`; the index never
    /// appears inside the value.
    pub fn encode(&self) -> (String, String) {
        let mut parts = Vec::new();
        for def in SUBFIELDS {
            if let Some(value) = (def.get)(self) {
                if !value.is_empty() {
                    parts.push(format!("{}={}", def.wire, value));
                }
            }
        }
        (format!("net{}", self.idx), parts.join(","))
    }

    /// Parses a user-supplied spec like `idx=0,model=virtio,bridge=vmbr0`.
    pub fn from_spec(spec: &str) -> Result<Self, Error> {
        let mut field = NetField::default();
        let mut idx = None;
        for token in spec.split(',') {
            let Some((key, value)) = token.split_once('=') else {
                return Err(Error::InvalidSpec {
                    kind: "net",
                    spec: spec.to_string(),
                    reason: format!("token '{token}' is not key=value"),
                });
            };
            if key == "idx" {
                idx = Some(value.parse().map_err(|_| Error::InvalidSpec {
                    kind: "net",
                    spec: spec.to_string(),
                    reason: format!("bad index '{value}'"),
                })?);
                continue;
            }
            let def = SUBFIELDS
                .iter()
                .find(|d| d.name == key || d.wire == key)
                .ok_or_else(|| Error::InvalidSpec {
                    kind: "net",
                    spec: spec.to_string(),
                    reason: format!("unknown option '{key}'"),
                })?;
            (def.set)(&mut field, value.to_string());
        }
        field.idx = idx.ok_or_else(|| Error::InvalidSpec {
            kind: "net",
            spec: spec.to_string(),
            reason: "missing idx".to_string(),
        })?;
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_plain_pairs() {
        let net = NetField::decode(0, "model=virtio,bridge=vmbr0,tag=101").unwrap();
        assert_eq!(net.model.as_deref(), Some("virtio"));
        assert_eq!(net.bridge.as_deref(), Some("vmbr0"));
        assert_eq!(net.tag.as_deref(), Some("101"));
        assert!(net.macaddr.is_none());
    }

    #[test]
    fn decode_folds_mac_into_model_and_macaddr() {
        let net = NetField::decode(2, "virtio=BC:24:11:4B:9D:2F,bridge=vmbr0,firewall=1").unwrap();
        assert_eq!(net.idx, 2);
        assert_eq!(net.model.as_deref(), Some("virtio"));
        assert_eq!(net.macaddr.as_deref(), Some("BC:24:11:4B:9D:2F"));
        assert_eq!(net.firewall.as_deref(), Some("1"));
    }

    #[test]
    fn decode_rejects_bare_tokens() {
        let err = NetField::decode(0, "virtio,bridge=vmbr0").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("net"), "{text}");
        assert!(text.contains("virtio"), "{text}");
    }

    #[test]
    fn encode_emits_declared_order_and_composite_key() {
        let net = NetField {
            idx: 1,
            model: Some("virtio".to_string()),
            bridge: Some("vmbr0".to_string()),
            tag: Some("101".to_string()),
            ..Default::default()
        };
        let (key, value) = net.encode();
        assert_eq!(key, "net1");
        assert_eq!(value, "model=virtio,bridge=vmbr0,tag=101");
    }

    #[test]
    fn round_trip_preserves_fields() {
        let original = NetField {
            idx: 3,
            model: Some("e1000".to_string()),
            bridge: Some("vmbr1".to_string()),
            firewall: Some("1".to_string()),
            mtu: Some("9000".to_string()),
            ..Default::default()
        };
        let (_, value) = original.encode();
        let decoded = NetField::decode(3, &value).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn spec_requires_idx_and_known_keys() {
        let net = NetField::from_spec("idx=0,model=virtio,bridge=vmbr0,tag=101").unwrap();
        assert_eq!(net.idx, 0);
        assert_eq!(net.model.as_deref(), Some("virtio"));

        assert!(NetField::from_spec("model=virtio").is_err());
        assert!(NetField::from_spec("idx=0,bogus=1").is_err());
    }
}
