//! Command-line surface of the `pvemgr` binary.
//!
//! One subcommand per resource kind; every subcommand takes the
//! resource's fields as flags plus `--state present|absent`. Global
//! flags pick the pvesh binary and switch on check mode. Option values
//! are passed through to the management API verbatim, so flag names
//! mirror the API parameter names.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::Error;
use crate::handlers::State;
use crate::resources::node::qemu::{NetField, StorageField, StorageKind};
use crate::resources::{
    AcmeAccount, AcmePlugin, ClusterOptions, HaGroup, HaResource, Pool, Qemu,
};

#[derive(Parser)]
#[command(name = "pvemgr")]
#[command(version)]
#[command(about = "Idempotent resource management for a Proxmox VE cluster", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the pvesh binary
    #[arg(long, default_value = pvesh::DEFAULT_COMMAND, global = true)]
    pub pvesh_command: String,

    /// Report what would change without applying anything
    #[arg(long, global = true)]
    pub check: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage a resource pool
    Pool(PoolArgs),

    /// Manage datacenter-wide options
    ClusterOptions(ClusterOptionsArgs),

    /// Manage an HA group
    HaGroup(HaGroupArgs),

    /// Manage an HA-managed resource
    HaResource(HaResourceArgs),

    /// Manage an ACME account
    AcmeAccount(AcmeAccountArgs),

    /// Manage an ACME challenge plugin
    AcmePlugin(AcmePluginArgs),

    /// Manage a QEMU virtual machine
    Qemu(Box<QemuArgs>),
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum StateArg {
    #[default]
    Present,
    Absent,
}

impl From<StateArg> for State {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Present => State::Present,
            StateArg::Absent => State::Absent,
        }
    }
}

/// `--flag true/false` becomes the API's `1`/`0`; unset stays unset.
fn bool_opt(value: Option<bool>) -> Option<String> {
    value.map(|v| if v { "1" } else { "0" }.to_string())
}

fn int_opt(value: Option<i64>) -> Option<String> {
    value.map(|v| v.to_string())
}

#[derive(Args)]
pub struct PoolArgs {
    #[arg(long)]
    pub poolid: String,
    #[arg(long)]
    pub comment: Option<String>,
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,
}

impl PoolArgs {
    pub fn resource(&self) -> Pool {
        Pool {
            poolid: Some(self.poolid.clone()),
            comment: self.comment.clone(),
        }
    }
}

#[derive(Args)]
pub struct ClusterOptionsArgs {
    #[arg(long)]
    pub bwlimit: Option<String>,
    #[arg(long)]
    pub console: Option<String>,
    #[arg(long)]
    pub crs: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub email_from: Option<String>,
    #[arg(long)]
    pub fencing: Option<String>,
    #[arg(long)]
    pub ha: Option<String>,
    #[arg(long)]
    pub http_proxy: Option<String>,
    #[arg(long)]
    pub keyboard: Option<String>,
    #[arg(long)]
    pub language: Option<String>,
    #[arg(long)]
    pub mac_prefix: Option<String>,
    #[arg(long)]
    pub max_workers: Option<i64>,
    #[arg(long)]
    pub migration: Option<String>,
    #[arg(long)]
    pub migration_unsecure: Option<bool>,
    #[arg(long)]
    pub next_id: Option<String>,
    #[arg(long)]
    pub notify: Option<String>,
    #[arg(long)]
    pub registered_tags: Option<String>,
    #[arg(long)]
    pub tag_style: Option<String>,
    #[arg(long)]
    pub u2f: Option<String>,
    #[arg(long)]
    pub user_tag_access: Option<String>,
    #[arg(long)]
    pub webauthn: Option<String>,
}

impl ClusterOptionsArgs {
    pub fn resource(&self) -> ClusterOptions {
        ClusterOptions {
            bwlimit: self.bwlimit.clone(),
            console: self.console.clone(),
            crs: self.crs.clone(),
            description: self.description.clone(),
            email_from: self.email_from.clone(),
            fencing: self.fencing.clone(),
            ha: self.ha.clone(),
            http_proxy: self.http_proxy.clone(),
            keyboard: self.keyboard.clone(),
            language: self.language.clone(),
            mac_prefix: self.mac_prefix.clone(),
            max_workers: int_opt(self.max_workers),
            migration: self.migration.clone(),
            migration_unsecure: bool_opt(self.migration_unsecure),
            next_id: self.next_id.clone(),
            notify: self.notify.clone(),
            registered_tags: self.registered_tags.clone(),
            tag_style: self.tag_style.clone(),
            u2f: self.u2f.clone(),
            user_tag_access: self.user_tag_access.clone(),
            webauthn: self.webauthn.clone(),
        }
    }
}

#[derive(Args)]
pub struct HaGroupArgs {
    #[arg(long)]
    pub group: String,
    /// Cluster nodes, `node[:priority]` comma-separated
    #[arg(long)]
    pub nodes: Option<String>,
    #[arg(long)]
    pub comment: Option<String>,
    #[arg(long)]
    pub nofailback: Option<bool>,
    #[arg(long)]
    pub restricted: Option<bool>,
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,
}

impl HaGroupArgs {
    pub fn resource(&self) -> HaGroup {
        HaGroup {
            group: Some(self.group.clone()),
            nodes: self.nodes.clone(),
            comment: self.comment.clone(),
            nofailback: bool_opt(self.nofailback),
            restricted: bool_opt(self.restricted),
            kind: self.kind.clone(),
        }
    }
}

#[derive(Args)]
pub struct HaResourceArgs {
    /// HA resource identifier, e.g. `vm:101`
    #[arg(long)]
    pub sid: String,
    #[arg(long)]
    pub comment: Option<String>,
    #[arg(long)]
    pub group: Option<String>,
    #[arg(long)]
    pub max_relocate: Option<i64>,
    #[arg(long)]
    pub max_restart: Option<i64>,
    /// Requested service state (started, stopped, disabled, ignored)
    #[arg(long)]
    pub ha_state: Option<String>,
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,
}

impl HaResourceArgs {
    pub fn resource(&self) -> HaResource {
        HaResource {
            sid: Some(self.sid.clone()),
            comment: self.comment.clone(),
            group: self.group.clone(),
            max_relocate: int_opt(self.max_relocate),
            max_restart: int_opt(self.max_restart),
            state: self.ha_state.clone(),
        }
    }
}

#[derive(Args)]
pub struct AcmeAccountArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long)]
    pub directory: Option<String>,
    #[arg(long)]
    pub eab_hmac_key: Option<String>,
    #[arg(long)]
    pub eab_kid: Option<String>,
    #[arg(long)]
    pub tos_url: Option<String>,
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,
}

impl AcmeAccountArgs {
    pub fn resource(&self) -> AcmeAccount {
        AcmeAccount {
            name: Some(self.name.clone()),
            contact: self.contact.clone(),
            directory: self.directory.clone(),
            eab_hmac_key: self.eab_hmac_key.clone(),
            eab_kid: self.eab_kid.clone(),
            tos_url: self.tos_url.clone(),
        }
    }
}

#[derive(Args)]
pub struct AcmePluginArgs {
    #[arg(long)]
    pub id: String,
    /// Plugin type (dns or standalone)
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(long)]
    pub api: Option<String>,
    /// DNS plugin configuration, base64-encoded
    #[arg(long)]
    pub data: Option<String>,
    #[arg(long)]
    pub disable: Option<bool>,
    #[arg(long)]
    pub nodes: Option<String>,
    #[arg(long)]
    pub validation_delay: Option<i64>,
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,
}

impl AcmePluginArgs {
    pub fn resource(&self) -> AcmePlugin {
        AcmePlugin {
            id: Some(self.id.clone()),
            kind: self.kind.clone(),
            api: self.api.clone(),
            data: self.data.clone(),
            disable: bool_opt(self.disable),
            nodes: self.nodes.clone(),
            validation_delay: int_opt(self.validation_delay),
        }
    }
}

#[derive(Args)]
pub struct QemuArgs {
    /// Node hosting the VM
    #[arg(long)]
    pub node: String,
    #[arg(long)]
    pub vmid: u32,

    /// NIC spec, repeatable: `idx=0,model=virtio,bridge=vmbr0[,...]`
    #[arg(long)]
    pub net: Vec<String>,
    /// IDE disk spec, repeatable: `idx=0,storage=local-lvm,size=32[,...]`
    #[arg(long)]
    pub ide: Vec<String>,
    /// SATA disk spec, repeatable
    #[arg(long)]
    pub sata: Vec<String>,
    /// SCSI disk spec, repeatable
    #[arg(long)]
    pub scsi: Vec<String>,
    /// VirtIO disk spec, repeatable
    #[arg(long)]
    pub virtio: Vec<String>,

    #[arg(long)]
    pub acpi: Option<bool>,
    #[arg(long)]
    pub affinity: Option<String>,
    #[arg(long)]
    pub agent: Option<String>,
    #[arg(long)]
    pub amd_sev: Option<String>,
    #[arg(long)]
    pub arch: Option<String>,
    #[arg(long)]
    pub archive: Option<String>,
    #[arg(long)]
    pub args: Option<String>,
    #[arg(long)]
    pub audio0: Option<String>,
    #[arg(long)]
    pub autostart: Option<bool>,
    #[arg(long)]
    pub balloon: Option<i64>,
    #[arg(long)]
    pub bios: Option<String>,
    #[arg(long)]
    pub boot: Option<String>,
    #[arg(long)]
    pub bwlimit: Option<i64>,
    #[arg(long)]
    pub cdrom: Option<String>,
    #[arg(long)]
    pub cicustom: Option<String>,
    #[arg(long)]
    pub cipassword: Option<String>,
    #[arg(long)]
    pub citype: Option<String>,
    #[arg(long)]
    pub ciupgrade: Option<bool>,
    #[arg(long)]
    pub ciuser: Option<String>,
    #[arg(long)]
    pub cores: Option<i64>,
    #[arg(long)]
    pub cpu: Option<String>,
    #[arg(long)]
    pub cpulimit: Option<String>,
    #[arg(long)]
    pub cpuunits: Option<i64>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub efidisk0: Option<String>,
    #[arg(long)]
    pub force: Option<bool>,
    #[arg(long)]
    pub freeze: Option<bool>,
    #[arg(long)]
    pub hookscript: Option<String>,
    #[arg(long)]
    pub hostpci: Option<String>,
    #[arg(long)]
    pub hugepages: Option<String>,
    #[arg(long)]
    pub import_working_storage: Option<String>,
    #[arg(long)]
    pub ipconfig: Option<String>,
    #[arg(long)]
    pub ivshmem: Option<String>,
    #[arg(long)]
    pub keep_hugepages: Option<bool>,
    #[arg(long)]
    pub keyboard: Option<String>,
    #[arg(long)]
    pub kvm: Option<bool>,
    #[arg(long)]
    pub live_restore: Option<bool>,
    #[arg(long)]
    pub localtime: Option<bool>,
    #[arg(long)]
    pub lock: Option<String>,
    #[arg(long)]
    pub machine: Option<String>,
    #[arg(long)]
    pub memory: Option<String>,
    #[arg(long)]
    pub migrate_downtime: Option<String>,
    #[arg(long)]
    pub migrate_speed: Option<i64>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub nameserver: Option<String>,
    #[arg(long)]
    pub numa: Option<String>,
    #[arg(long)]
    pub onboot: Option<bool>,
    #[arg(long)]
    pub ostype: Option<String>,
    #[arg(long)]
    pub parallel: Option<String>,
    #[arg(long)]
    pub pool: Option<String>,
    #[arg(long)]
    pub protection: Option<bool>,
    #[arg(long)]
    pub reboot: Option<bool>,
    #[arg(long)]
    pub rng0: Option<String>,
    #[arg(long)]
    pub scsihw: Option<String>,
    #[arg(long)]
    pub searchdomain: Option<String>,
    #[arg(long)]
    pub serial: Option<String>,
    #[arg(long)]
    pub shares: Option<i64>,
    #[arg(long)]
    pub smbios1: Option<String>,
    #[arg(long)]
    pub sockets: Option<i64>,
    #[arg(long)]
    pub spice_enhancements: Option<String>,
    #[arg(long)]
    pub sshkeys: Option<String>,
    #[arg(long)]
    pub start: Option<bool>,
    #[arg(long)]
    pub startdate: Option<String>,
    #[arg(long)]
    pub startup: Option<String>,
    #[arg(long)]
    pub storage: Option<String>,
    #[arg(long)]
    pub tablet: Option<bool>,
    #[arg(long)]
    pub tags: Option<String>,
    #[arg(long)]
    pub tdf: Option<bool>,
    #[arg(long)]
    pub template: Option<bool>,
    #[arg(long)]
    pub tpmstate0: Option<String>,
    #[arg(long)]
    pub unique: Option<bool>,
    #[arg(long)]
    pub unused: Option<String>,
    #[arg(long)]
    pub usb: Option<String>,
    #[arg(long)]
    pub vcpus: Option<i64>,
    #[arg(long)]
    pub vga: Option<String>,
    #[arg(long)]
    pub vmgenid: Option<String>,
    #[arg(long)]
    pub vmstatestorage: Option<String>,
    #[arg(long)]
    pub watchdog: Option<String>,

    /// On removal, also destroy disks not referenced in the config
    #[arg(long)]
    pub destroy_unreferenced_disks: bool,
    /// On removal, also remove the VM from backup and HA configuration
    #[arg(long)]
    pub purge: bool,
    #[arg(long)]
    pub skiplock: bool,

    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,
}

impl QemuArgs {
    pub fn resource(&self) -> Result<Qemu, Error> {
        let mut qemu = Qemu {
            node: Some(self.node.clone()),
            vmid: Some(self.vmid.to_string()),
            acpi: bool_opt(self.acpi),
            affinity: self.affinity.clone(),
            agent: self.agent.clone(),
            amd_sev: self.amd_sev.clone(),
            arch: self.arch.clone(),
            archive: self.archive.clone(),
            args: self.args.clone(),
            audio0: self.audio0.clone(),
            autostart: bool_opt(self.autostart),
            balloon: int_opt(self.balloon),
            bios: self.bios.clone(),
            boot: self.boot.clone(),
            bwlimit: int_opt(self.bwlimit),
            cdrom: self.cdrom.clone(),
            cicustom: self.cicustom.clone(),
            cipassword: self.cipassword.clone(),
            citype: self.citype.clone(),
            ciupgrade: bool_opt(self.ciupgrade),
            ciuser: self.ciuser.clone(),
            cores: int_opt(self.cores),
            cpu: self.cpu.clone(),
            cpulimit: self.cpulimit.clone(),
            cpuunits: int_opt(self.cpuunits),
            description: self.description.clone(),
            efidisk0: self.efidisk0.clone(),
            force: bool_opt(self.force),
            freeze: bool_opt(self.freeze),
            hookscript: self.hookscript.clone(),
            hostpci: self.hostpci.clone(),
            hugepages: self.hugepages.clone(),
            import_working_storage: self.import_working_storage.clone(),
            ipconfig: self.ipconfig.clone(),
            ivshmem: self.ivshmem.clone(),
            keep_hugepages: bool_opt(self.keep_hugepages),
            keyboard: self.keyboard.clone(),
            kvm: bool_opt(self.kvm),
            live_restore: bool_opt(self.live_restore),
            localtime: bool_opt(self.localtime),
            lock: self.lock.clone(),
            machine: self.machine.clone(),
            memory: self.memory.clone(),
            migrate_downtime: self.migrate_downtime.clone(),
            migrate_speed: int_opt(self.migrate_speed),
            name: self.name.clone(),
            nameserver: self.nameserver.clone(),
            numa: self.numa.clone(),
            onboot: bool_opt(self.onboot),
            ostype: self.ostype.clone(),
            parallel: self.parallel.clone(),
            pool: self.pool.clone(),
            protection: bool_opt(self.protection),
            reboot: bool_opt(self.reboot),
            rng0: self.rng0.clone(),
            scsihw: self.scsihw.clone(),
            searchdomain: self.searchdomain.clone(),
            serial: self.serial.clone(),
            shares: int_opt(self.shares),
            smbios1: self.smbios1.clone(),
            sockets: int_opt(self.sockets),
            spice_enhancements: self.spice_enhancements.clone(),
            sshkeys: self.sshkeys.clone(),
            start: bool_opt(self.start),
            startdate: self.startdate.clone(),
            startup: self.startup.clone(),
            storage: self.storage.clone(),
            tablet: bool_opt(self.tablet),
            tags: self.tags.clone(),
            tdf: bool_opt(self.tdf),
            template: bool_opt(self.template),
            tpmstate0: self.tpmstate0.clone(),
            unique: bool_opt(self.unique),
            unused: self.unused.clone(),
            usb: self.usb.clone(),
            vcpus: int_opt(self.vcpus),
            vga: self.vga.clone(),
            vmgenid: self.vmgenid.clone(),
            vmstatestorage: self.vmstatestorage.clone(),
            watchdog: self.watchdog.clone(),
            destroy_unreferenced_disks: self
                .destroy_unreferenced_disks
                .then(|| "1".to_string()),
            purge: self.purge.then(|| "1".to_string()),
            skiplock: self.skiplock.then(|| "1".to_string()),
            ..Default::default()
        };
        for spec in &self.net {
            qemu.net.push(NetField::from_spec(spec)?);
        }
        for spec in &self.ide {
            qemu.ide.push(StorageField::from_spec(StorageKind::Ide, spec)?);
        }
        for spec in &self.sata {
            qemu.sata.push(StorageField::from_spec(StorageKind::Sata, spec)?);
        }
        for spec in &self.scsi {
            qemu.scsi.push(StorageField::from_spec(StorageKind::Scsi, spec)?);
        }
        for spec in &self.virtio {
            qemu.virtio
                .push(StorageField::from_spec(StorageKind::Virtio, spec)?);
        }
        Ok(qemu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn qemu_args_parse_slot_specs() {
        let cli = Cli::parse_from([
            "pvemgr",
            "qemu",
            "--node",
            "pve1",
            "--vmid",
            "101",
            "--memory",
            "4096",
            "--net",
            "idx=0,model=virtio,bridge=vmbr0",
            "--scsi",
            "idx=0,storage=local-lvm,size=32",
        ]);
        let Command::Qemu(args) = cli.command else {
            panic!("expected qemu subcommand");
        };
        let qemu = args.resource().unwrap();
        assert_eq!(qemu.vmid.as_deref(), Some("101"));
        assert_eq!(qemu.net.len(), 1);
        assert_eq!(qemu.scsi[0].storage.as_deref(), Some("local-lvm"));
    }

    #[test]
    fn bool_flags_become_wire_digits() {
        let cli = Cli::parse_from([
            "pvemgr",
            "ha-group",
            "--group",
            "web",
            "--nodes",
            "pve1:2,pve2",
            "--restricted",
            "true",
        ]);
        let Command::HaGroup(args) = cli.command else {
            panic!("expected ha-group subcommand");
        };
        let group = args.resource();
        assert_eq!(group.restricted.as_deref(), Some("1"));
        assert!(group.nofailback.is_none());
    }
}
