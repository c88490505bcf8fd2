//! Fatal Report Library
//!
//! Warning and fatal-error reporting for privileged command-line tools, with a
//! registry of cleanup callbacks that run before a fatal error ends the process.
//!
//! # Architecture
//!
//! - [`CallbackRegistry`] holds zero-argument cleanup functions and runs them
//!   exactly once, most recently registered first
//! - [`Reporter`] prints `prog: message[: os error]` lines to a
//!   [`Conversation`] and, for fatal reports, drains the registry and exits
//! - `warn!`, `warnx!`, `fatal!` and `fatalx!` are the `format!`-style front
//!   ends; the "x" forms never append the OS error
//!
//! `warn!` shares its name with `log::warn!`, so glob-importing both crates
//! is ambiguous; import one of them by path (`fatal_report::warn!`).
//!
//! The library does NOT:
//! - Translate messages
//! - Synchronize concurrent fatal reports from several threads
//!
//! # Example Usage
//!
//! ```no_run
//! use fatal_report::{fatalx, CallbackRegistry, Reporter};
//!
//! static CLEANUP: CallbackRegistry = CallbackRegistry::new();
//!
//! fn restore_tty() {
//!     // put the terminal back into cooked mode
//! }
//!
//! CLEANUP.register(restore_tty).unwrap();
//!
//! let reporter = Reporter::new(&CLEANUP).with_program_name("sudo");
//! fatalx!(reporter, "no valid sudoers sources found, quitting");
//! ```

// Public modules
pub mod config;
pub mod conversation;
pub mod os;
pub mod registry;
pub mod reporter;
pub mod types;

// Re-export main types for convenience
pub use config::{OutputTarget, ReporterConfig, TargetConversation};
pub use conversation::{
    CapturedConversation, Conversation, LogConversation, MessageKind, StderrConversation,
    StdoutConversation,
};
pub use registry::CallbackRegistry;
pub use reporter::{Reporter, Termination, NULL_MESSAGE};
pub use types::{Callback, RegistryError, Result, EXIT_FAILURE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
