//! CLI command handlers.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use scout_mcp::{ConnectionDescriptor, Session};

pub mod call;
pub mod describe;
pub mod list;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Path to the connection descriptor JSON.
    pub config: Option<PathBuf>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Load the connection descriptor named by `--config`.
    ///
    /// Unreadable files and invalid descriptors are user-input errors, so
    /// they are reported as plain messages rather than client errors.
    pub fn descriptor(&self) -> Result<ConnectionDescriptor> {
        let path = self
            .config
            .as_ref()
            .ok_or_else(|| anyhow!("no connection descriptor; pass --config <descriptor.json>"))?;

        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("cannot read descriptor {}: {}", path.display(), e))?;

        ConnectionDescriptor::from_json(&text)
            .map_err(|e| anyhow!("invalid descriptor {}: {}", path.display(), e))
    }

    /// Connect a session with this context's timeout.
    pub fn connect(&self) -> Result<Session> {
        let descriptor = self.descriptor()?;
        Ok(Session::connect_with_timeout(&descriptor, self.timeout)?)
    }
}
