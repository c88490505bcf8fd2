//! Cleanup steps owned by the host
//!
//! The process-wide registry lives here, next to the built-in steps a
//! privileged tool typically has to undo before it dies. Each step prints one
//! line to stdout so the order is visible from outside the process.

use anyhow::{Context, Result};
use fatal_report::{Callback, CallbackRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// The one registry this process uses
pub static CLEANUP: CallbackRegistry = CallbackRegistry::new();

/// Built-in cleanup actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupStep {
    RestoreTerminal,
    RemoveTimestamp,
    CloseSession,
    UnlinkTempFiles,
}

impl CleanupStep {
    pub fn name(self) -> &'static str {
        match self {
            CleanupStep::RestoreTerminal => "restore-terminal",
            CleanupStep::RemoveTimestamp => "remove-timestamp",
            CleanupStep::CloseSession => "close-session",
            CleanupStep::UnlinkTempFiles => "unlink-temp-files",
        }
    }

    /// The function registered for this step
    pub fn callback(self) -> Callback {
        match self {
            CleanupStep::RestoreTerminal => restore_terminal,
            CleanupStep::RemoveTimestamp => remove_timestamp,
            CleanupStep::CloseSession => close_session,
            CleanupStep::UnlinkTempFiles => unlink_temp_files,
        }
    }
}

fn announce(step: CleanupStep) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "cleanup: {}", step.name());
    let _ = stdout.flush();
}

fn restore_terminal() {
    announce(CleanupStep::RestoreTerminal);
}

fn remove_timestamp() {
    announce(CleanupStep::RemoveTimestamp);
}

fn close_session() {
    announce(CleanupStep::CloseSession);
}

fn unlink_temp_files() {
    announce(CleanupStep::UnlinkTempFiles);
}

/// Register `steps` in order; the last one given runs first
///
/// Listing a step twice is harmless and only logged.
pub fn register_steps<'a>(
    registry: &CallbackRegistry,
    steps: impl IntoIterator<Item = &'a CleanupStep>,
) -> Result<()> {
    for &step in steps {
        match registry.register(step.callback()) {
            Ok(()) => log::debug!("Registered cleanup step {}", step.name()),
            Err(RegistryError::Duplicate) => {
                log::info!("Cleanup step {} already registered", step.name())
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to register {}", step.name()))
            }
        }
    }
    Ok(())
}

/// Deregister `steps`, e.g. because the resource was already released
pub fn release_steps<'a>(
    registry: &CallbackRegistry,
    steps: impl IntoIterator<Item = &'a CleanupStep>,
) {
    for &step in steps {
        match registry.deregister(step.callback()) {
            Ok(()) => log::debug!("Released cleanup step {}", step.name()),
            Err(e) => log::info!("Cannot release {}: {}", step.name(), e),
        }
    }
}
