//! Node-scoped resources.

pub mod qemu;
