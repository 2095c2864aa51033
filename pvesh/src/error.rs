use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The pvesh binary could not be spawned at all.
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// pvesh exited non-zero. The message carries the full command line
    /// and captured stderr; handlers match their not-found patterns
    /// against this text.
    #[error("pvesh command {command} failed with error: {stderr}")]
    Command { command: String, stderr: String },

    /// pvesh exited zero but stdout was not valid JSON.
    #[error("pvesh command {command} returned invalid json: {source}; output: {stdout}")]
    Decode {
        command: String,
        stdout: String,
        #[source]
        source: serde_json::Error,
    },
}
