//! Error types for resource management operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] pvesh::Error),

    /// A composite wire value carried a token that fits no known shape.
    #[error("invalid {kind} token '{token}'")]
    BadToken { kind: &'static str, token: String },

    /// A user-supplied slot spec failed to parse.
    #[error("invalid {kind} spec '{spec}': {reason}")]
    InvalidSpec {
        kind: &'static str,
        spec: String,
        reason: String,
    },

    /// The desired disk size is below the live size; the platform only
    /// grows disks.
    #[error("disk {disk}: refusing to shrink from {current}G to {requested}G")]
    ShrinkNotAllowed {
        disk: String,
        current: u64,
        requested: u64,
    },
}
