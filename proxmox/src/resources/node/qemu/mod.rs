//! QEMU virtual machine resource (`/nodes/{node}/qemu`).
//!
//! The VM config endpoint returns a flat record where some keys encode
//! an indexed slot (`net0`, `scsi3`). [`Qemu::from_record`] normalizes
//! those into decoded slot collections before the record ever reaches
//! the diff engine; the engine only sees already-grouped slots plus
//! plain scalars.

pub mod net;
pub mod storage;

pub use net::NetField;
pub use storage::{StorageField, StorageKind};

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::resources::{field_defs, stringify, FieldDef, Resource};
use storage::SLOT_KEY;

static NET_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^net(\d+)$").unwrap());

#[derive(Debug, Clone, Default)]
pub struct Qemu {
    /// Node hosting the VM; part of the request path, never a wire
    /// parameter.
    pub node: Option<String>,
    pub vmid: Option<String>,

    pub acpi: Option<String>,
    pub affinity: Option<String>,
    pub agent: Option<String>,
    pub amd_sev: Option<String>,
    pub arch: Option<String>,
    pub archive: Option<String>,
    pub args: Option<String>,
    pub audio0: Option<String>,
    pub autostart: Option<String>,
    pub balloon: Option<String>,
    pub bios: Option<String>,
    pub boot: Option<String>,
    pub bwlimit: Option<String>,
    pub cdrom: Option<String>,
    pub cicustom: Option<String>,
    pub cipassword: Option<String>,
    pub citype: Option<String>,
    pub ciupgrade: Option<String>,
    pub ciuser: Option<String>,
    pub cores: Option<String>,
    pub cpu: Option<String>,
    pub cpulimit: Option<String>,
    pub cpuunits: Option<String>,
    pub description: Option<String>,
    pub efidisk0: Option<String>,
    pub force: Option<String>,
    pub freeze: Option<String>,
    pub hookscript: Option<String>,
    pub hostpci: Option<String>,
    pub hugepages: Option<String>,
    pub import_working_storage: Option<String>,
    pub ipconfig: Option<String>,
    pub ivshmem: Option<String>,
    pub keep_hugepages: Option<String>,
    pub keyboard: Option<String>,
    pub kvm: Option<String>,
    pub live_restore: Option<String>,
    pub localtime: Option<String>,
    pub lock: Option<String>,
    pub machine: Option<String>,
    pub memory: Option<String>,
    pub migrate_downtime: Option<String>,
    pub migrate_speed: Option<String>,
    pub name: Option<String>,
    pub nameserver: Option<String>,
    pub numa: Option<String>,
    pub onboot: Option<String>,
    pub ostype: Option<String>,
    pub parallel: Option<String>,
    pub pool: Option<String>,
    pub protection: Option<String>,
    pub reboot: Option<String>,
    pub rng0: Option<String>,
    pub scsihw: Option<String>,
    pub searchdomain: Option<String>,
    pub serial: Option<String>,
    pub shares: Option<String>,
    pub smbios1: Option<String>,
    pub sockets: Option<String>,
    pub spice_enhancements: Option<String>,
    pub sshkeys: Option<String>,
    pub start: Option<String>,
    pub startdate: Option<String>,
    pub startup: Option<String>,
    pub storage: Option<String>,
    pub tablet: Option<String>,
    pub tags: Option<String>,
    pub tdf: Option<String>,
    pub template: Option<String>,
    pub tpmstate0: Option<String>,
    pub unique: Option<String>,
    pub unused: Option<String>,
    pub usb: Option<String>,
    pub vcpus: Option<String>,
    pub vga: Option<String>,
    pub vmgenid: Option<String>,
    pub vmstatestorage: Option<String>,
    pub watchdog: Option<String>,

    pub net: Vec<NetField>,
    pub ide: Vec<StorageField>,
    pub sata: Vec<StorageField>,
    pub scsi: Vec<StorageField>,
    pub virtio: Vec<StorageField>,

    // Delete-time flags, never serialized into the config.
    pub destroy_unreferenced_disks: Option<String>,
    pub purge: Option<String>,
    pub skiplock: Option<String>,
}

impl Resource for Qemu {
    fn field_defs() -> &'static [FieldDef<Self>] {
        const DEFS: &[FieldDef<Qemu>] = field_defs!(Qemu {
            vmid,
            acpi,
            affinity,
            agent,
            amd_sev => "amd-sev",
            arch,
            archive,
            args,
            audio0,
            autostart,
            balloon,
            bios,
            boot,
            bwlimit,
            cdrom,
            cicustom,
            cipassword,
            citype,
            ciupgrade,
            ciuser,
            cores,
            cpu,
            cpulimit,
            cpuunits,
            description,
            efidisk0,
            force,
            freeze,
            hookscript,
            hostpci,
            hugepages,
            import_working_storage => "import-working-storage",
            ipconfig,
            ivshmem,
            keep_hugepages => "keep-hugepages",
            keyboard,
            kvm,
            live_restore => "live-restore",
            localtime,
            lock,
            machine,
            memory,
            migrate_downtime,
            migrate_speed,
            name,
            nameserver,
            numa,
            onboot,
            ostype,
            parallel,
            pool,
            protection,
            reboot,
            rng0,
            scsihw,
            searchdomain,
            serial,
            shares,
            smbios1,
            sockets,
            spice_enhancements,
            sshkeys,
            start,
            startdate,
            startup,
            storage,
            tablet,
            tags,
            tdf,
            template,
            tpmstate0,
            unique,
            unused,
            usb,
            vcpus,
            vga,
            vmgenid,
            vmstatestorage,
            watchdog,
        });
        DEFS
    }

    fn diff_skip() -> &'static [&'static str] {
        // vmid is the identity; pool membership cannot be changed
        // through the config endpoint.
        &["vmid", "pool"]
    }

    fn serialize_slots(&self, out: &mut BTreeMap<String, String>) {
        for net in &self.net {
            let (key, value) = net.encode();
            out.insert(key, value);
        }
        for disk in self
            .ide
            .iter()
            .chain(&self.sata)
            .chain(&self.scsi)
            .chain(&self.virtio)
        {
            let (key, value) = disk.encode();
            out.insert(key, value);
        }
    }

    fn to_map(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        if let Some(node) = &self.node {
            out.insert("node".to_string(), node.clone());
        }
        for def in Self::field_defs() {
            if let Some(value) = (def.get)(self) {
                out.insert(def.name.to_string(), value.clone());
            }
        }
        self.serialize_slots(&mut out);
        out
    }
}

impl Qemu {
    /// Builds a VM resource from a raw config record, grouping indexed
    /// slot keys into decoded collections first.
    pub fn from_record(node: &str, record: &Map<String, Value>) -> Result<Self, Error> {
        let mut qemu = Self::default();
        let mut scalars = Map::new();

        for (key, value) in record {
            if value.is_null() {
                continue;
            }
            let text = stringify(value);
            if let Some(caps) = SLOT_KEY.captures(key) {
                if let (Some(kind), Ok(idx)) =
                    (StorageKind::parse(&caps[1]), caps[2].parse::<u32>())
                {
                    let disk = StorageField::decode(kind, idx, &text)?;
                    match kind {
                        StorageKind::Ide => qemu.ide.push(disk),
                        StorageKind::Sata => qemu.sata.push(disk),
                        StorageKind::Scsi => qemu.scsi.push(disk),
                        StorageKind::Virtio => qemu.virtio.push(disk),
                    }
                    continue;
                }
            }
            if let Some(caps) = NET_KEY.captures(key) {
                if let Ok(idx) = caps[1].parse::<u32>() {
                    qemu.net.push(NetField::decode(idx, &text)?);
                    continue;
                }
            }
            scalars.insert(key.clone(), Value::String(text));
        }

        for def in Self::field_defs() {
            if let Some(Value::String(value)) = scalars.get(def.wire) {
                (def.set)(&mut qemu, value.clone());
            }
        }

        // Map iteration is lexicographic, which misorders double-digit
        // slots (net10 before net2).
        qemu.net.sort_unstable_by_key(|f| f.idx);
        qemu.ide.sort_unstable_by_key(|f| f.idx);
        qemu.sata.sort_unstable_by_key(|f| f.idx);
        qemu.scsi.sort_unstable_by_key(|f| f.idx);
        qemu.virtio.sort_unstable_by_key(|f| f.idx);

        qemu.node = Some(node.to_string());
        Ok(qemu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: Value) -> Map<String, Value> {
        json.as_object().cloned().unwrap()
    }

    #[test]
    fn from_record_groups_indexed_slots() {
        let qemu = Qemu::from_record(
            "pve1",
            &record(serde_json::json!({
                "name": "testvm",
                "cores": 4,
                "memory": "4096",
                "net0": "virtio=BC:24:11:4B:9D:2F,bridge=vmbr0,tag=101",
                "net1": "model=virtio,bridge=vmbr0,tag=102",
                "scsi0": "local-lvm:vm-101-disk-0,cache=writeback,size=32G",
                "ide2": "file=local:iso/debian.iso,media=cdrom",
                "scsihw": "virtio-scsi-single",
            })),
        )
        .unwrap();

        assert_eq!(qemu.node.as_deref(), Some("pve1"));
        assert_eq!(qemu.cores.as_deref(), Some("4"));
        assert_eq!(qemu.net.len(), 2);
        assert_eq!(qemu.net[0].idx, 0);
        assert_eq!(qemu.net[0].model.as_deref(), Some("virtio"));
        assert_eq!(qemu.net[0].macaddr.as_deref(), Some("BC:24:11:4B:9D:2F"));
        assert_eq!(qemu.scsi.len(), 1);
        assert_eq!(qemu.scsi[0].file.as_deref(), Some("local-lvm:vm-101-disk-0"));
        assert_eq!(qemu.ide.len(), 1);
        assert_eq!(qemu.ide[0].idx, 2);
        // scsihw must not be mistaken for a scsi slot
        assert_eq!(qemu.scsihw.as_deref(), Some("virtio-scsi-single"));
        assert!(qemu.sata.is_empty());
    }

    #[test]
    fn from_record_orders_double_digit_slots_numerically() {
        let qemu = Qemu::from_record(
            "pve1",
            &record(serde_json::json!({
                "net10": "model=virtio,bridge=vmbr10",
                "net2": "model=virtio,bridge=vmbr2",
            })),
        )
        .unwrap();
        assert_eq!(qemu.net[0].idx, 2);
        assert_eq!(qemu.net[1].idx, 10);
    }

    #[test]
    fn serialize_excludes_node_and_delete_flags() {
        let qemu = Qemu {
            node: Some("pve1".to_string()),
            vmid: Some("101".to_string()),
            name: Some("testvm".to_string()),
            purge: Some("1".to_string()),
            destroy_unreferenced_disks: Some("1".to_string()),
            ..Default::default()
        };
        let serialized = qemu.serialize();
        assert_eq!(serialized["vmid"], "101");
        assert_eq!(serialized["name"], "testvm");
        assert!(!serialized.contains_key("node"));
        assert!(!serialized.contains_key("purge"));
        assert!(!serialized.contains_key("destroy_unreferenced_disks"));
    }

    #[test]
    fn serialize_merges_encoded_slots() {
        let qemu = Qemu {
            vmid: Some("101".to_string()),
            net: vec![NetField {
                idx: 0,
                model: Some("virtio".to_string()),
                bridge: Some("vmbr0".to_string()),
                ..Default::default()
            }],
            scsi: vec![StorageField {
                kind: StorageKind::Scsi,
                idx: 0,
                storage: Some("local-lvm".to_string()),
                size: Some("32".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let serialized = qemu.serialize();
        assert_eq!(serialized["net0"], "model=virtio,bridge=vmbr0");
        assert_eq!(serialized["scsi0"], "file=local-lvm:32,size=32");
    }

    #[test]
    fn identical_desired_and_live_state_diff_empty() {
        let desired = Qemu {
            node: Some("pve1".to_string()),
            vmid: Some("101".to_string()),
            name: Some("testvm".to_string()),
            cores: Some("4".to_string()),
            net: vec![NetField {
                idx: 0,
                model: Some("virtio".to_string()),
                bridge: Some("vmbr0".to_string()),
                tag: Some("101".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let live = Qemu::from_record(
            "pve1",
            &record(serde_json::json!({
                "name": "testvm",
                "cores": 4,
                "net0": "model=virtio,bridge=vmbr0,tag=101",
            })),
        )
        .unwrap();
        assert!(desired.diff(Some(&live)).is_empty());
    }

    #[test]
    fn wire_names_use_platform_hyphens() {
        let qemu = Qemu {
            amd_sev: Some("sev-es".to_string()),
            live_restore: Some("1".to_string()),
            ..Default::default()
        };
        let serialized = qemu.serialize();
        assert_eq!(serialized["amd-sev"], "sev-es");
        assert_eq!(serialized["live-restore"], "1");
        assert!(!serialized.contains_key("amd_sev"));
    }
}
