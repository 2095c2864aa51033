//! Cluster-level resources.

pub mod acme;
pub mod ha;
pub mod options;

pub use acme::{AcmeAccount, AcmePlugin};
pub use ha::{HaGroup, HaResource};
pub use options::ClusterOptions;
