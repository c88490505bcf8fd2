//! Output channel for reports
//!
//! The reporter does not write to a terminal itself. It hands each finished
//! line to a [`Conversation`], which decides where the line goes: stderr, a
//! logger, a host-provided function, or an in-memory buffer.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Mutex;

/// Severity tag attached to every delivered message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Error message (warnings and fatal reports)
    Error,
    /// Informational message
    Info,
}

/// Receives fully formatted report lines
///
/// `message` already carries its trailing newline. Delivery is best effort:
/// implementations swallow their own I/O failures because the reporter has
/// nowhere left to report them.
pub trait Conversation {
    fn deliver(&self, kind: MessageKind, message: &str);
}

impl<F> Conversation for F
where
    F: Fn(MessageKind, &str),
{
    fn deliver(&self, kind: MessageKind, message: &str) {
        self(kind, message)
    }
}

/// Writes every message to standard error
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrConversation;

impl Conversation for StderrConversation {
    fn deliver(&self, _kind: MessageKind, message: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(message.as_bytes());
        let _ = stderr.flush();
    }
}

/// Writes errors to standard error and informational messages to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutConversation;

impl Conversation for StdoutConversation {
    fn deliver(&self, kind: MessageKind, message: &str) {
        match kind {
            MessageKind::Error => StderrConversation.deliver(kind, message),
            MessageKind::Info => {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(message.as_bytes());
                let _ = stdout.flush();
            }
        }
    }
}

/// Routes messages through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConversation;

impl Conversation for LogConversation {
    fn deliver(&self, kind: MessageKind, message: &str) {
        let line = message.trim_end_matches('\n');
        match kind {
            MessageKind::Error => log::error!("{}", line),
            MessageKind::Info => log::info!("{}", line),
        }
    }
}

/// Keeps every delivered message in memory
#[derive(Debug, Default)]
pub struct CapturedConversation {
    messages: Mutex<Vec<(MessageKind, String)>>,
}

impl CapturedConversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages delivered so far, oldest first
    pub fn messages(&self) -> Vec<(MessageKind, String)> {
        self.lock().clone()
    }

    /// Only the text of the delivered messages
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(|(_, line)| line.clone()).collect()
    }

    /// Remove and return everything captured so far
    pub fn take(&self) -> Vec<(MessageKind, String)> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(MessageKind, String)>> {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Conversation for CapturedConversation {
    fn deliver(&self, kind: MessageKind, message: &str) {
        self.lock().push((kind, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_captured_conversation_records_in_order() {
        let conv = CapturedConversation::new();
        conv.deliver(MessageKind::Error, "first\n");
        conv.deliver(MessageKind::Info, "second\n");

        assert_eq!(
            conv.messages(),
            vec![
                (MessageKind::Error, "first\n".to_string()),
                (MessageKind::Info, "second\n".to_string()),
            ]
        );
        assert_eq!(conv.take().len(), 2);
        assert!(conv.lines().is_empty());
    }

    #[test]
    fn test_closure_conversation() {
        let seen = RefCell::new(Vec::new());
        let conv = |kind: MessageKind, message: &str| {
            seen.borrow_mut().push(format!("{:?}:{}", kind, message));
        };

        conv.deliver(MessageKind::Error, "boom\n");
        assert_eq!(*seen.borrow(), vec!["Error:boom\n".to_string()]);
    }

    #[test]
    fn test_message_kind_serde_names() {
        let json = serde_json::to_string(&MessageKind::Error).unwrap();
        assert_eq!(json, "\"error\"");
    }
}
