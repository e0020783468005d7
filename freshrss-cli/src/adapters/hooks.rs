//! Status and port handling through the framework's hook tools.

use std::io::ErrorKind;

use freshrss_reactor::{CollaboratorError, Firewall, Status, StatusReporter};

use super::run_command;

/// Reports workload status with `status-set <level> <message>`.
pub struct HookStatus {
    program: String,
}

impl HookStatus {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for HookStatus {
    fn default() -> Self {
        Self::new("status-set")
    }
}

fn level(status: &Status) -> &'static str {
    match status {
        Status::Waiting(_) => "waiting",
        Status::Active(_) => "active",
    }
}

impl StatusReporter for HookStatus {
    fn report(&mut self, status: Status) {
        tracing::info!(%status, "workload status");
        match run_command(&self.program, &[level(&status), status.message()]) {
            Ok(()) => {}
            Err(CollaboratorError::Spawn { source, .. }) if source.kind() == ErrorKind::NotFound => {
                tracing::debug!(program = %self.program, "status tool not available");
            }
            Err(e) => tracing::warn!(error = %e, "status update failed"),
        }
    }
}

/// Opens TCP ports with `open-port <port>/tcp`.
pub struct HookFirewall {
    program: String,
}

impl HookFirewall {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for HookFirewall {
    fn default() -> Self {
        Self::new("open-port")
    }
}

impl Firewall for HookFirewall {
    fn open_port(&mut self, port: u16) -> Result<(), CollaboratorError> {
        run_command(&self.program, &[format!("{port}/tcp")])?;
        tracing::info!(port, "port opened");
        Ok(())
    }
}
