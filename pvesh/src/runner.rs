//! Subprocess seam for the pvesh wrapper.
//!
//! The wrapper never talks to the Proxmox API directly; everything goes
//! through a [`Runner`] so tests can script command/response pairs
//! without spawning processes.

use std::io;
use std::process::Command;

/// Captured result of one subprocess invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Executes one argv, blocking until the process exits.
pub trait Runner {
    fn run(&self, argv: &[String]) -> io::Result<CommandOutput>;
}

/// Real runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&self, argv: &[String]) -> io::Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;

        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
