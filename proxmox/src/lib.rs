//! Idempotent resource managers for a Proxmox VE cluster.
//!
//! Each manager reconciles one kind of cluster resource (pools, HA
//! groups and resources, ACME accounts and plugins, datacenter
//! options, QEMU virtual machines) toward a desired state by driving
//! the node-local `pvesh` CLI through the [`pvesh`] crate.

pub mod cli;
pub mod error;
pub mod handlers;
pub mod resources;

pub use error::Error;
