//! Reporter configuration types
//!
//! This module defines the small amount of configuration a host can give the
//! reporter. Everything has a default, so an empty table is a valid config.

use crate::conversation::{LogConversation, StderrConversation, StdoutConversation};
use crate::conversation::{Conversation, MessageKind};
use serde::{Deserialize, Serialize};

/// Configuration for a [`Reporter`](crate::Reporter)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Name printed at the start of every line (default: `argv[0]`)
    #[serde(default)]
    pub program_name: Option<String>,

    /// Where report lines are delivered
    #[serde(default)]
    pub output: OutputTarget,
}

/// Built-in output channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    /// Everything to standard error
    #[default]
    Stderr,
    /// Errors to standard error, informational messages to standard output
    Stdout,
    /// Through the `log` facade
    Log,
}

impl OutputTarget {
    /// Build the conversation for this target
    pub fn conversation(self) -> TargetConversation {
        TargetConversation(self)
    }
}

/// Conversation selected at runtime from an [`OutputTarget`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetConversation(OutputTarget);

impl Conversation for TargetConversation {
    fn deliver(&self, kind: MessageKind, message: &str) {
        match self.0 {
            OutputTarget::Stderr => StderrConversation.deliver(kind, message),
            OutputTarget::Stdout => StdoutConversation.deliver(kind, message),
            OutputTarget::Log => LogConversation.deliver(kind, message),
        }
    }
}

impl ReporterConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: override the program name
    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = Some(name.into());
        self
    }

    /// Builder method: choose the output channel
    pub fn with_output(mut self, output: OutputTarget) -> Self {
        self.output = output;
        self
    }

    /// Program name to print, falling back to the running executable's name
    pub fn resolved_program_name(&self) -> String {
        match &self.program_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => crate::os::program_name(),
        }
    }
}
