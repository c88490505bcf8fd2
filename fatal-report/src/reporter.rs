//! Warn/fatal dispatcher
//!
//! A [`Reporter`] turns a message into one line on its conversation:
//!
//! | error code | message   | line                          |
//! |------------|-----------|-------------------------------|
//! | non-zero   | present   | `prog: message: os error text` |
//! | non-zero   | absent    | `prog: os error text`          |
//! | zero       | present   | `prog: message`                |
//! | zero       | absent    | `prog: (null)`                 |
//!
//! The message is absent when no template was given or when formatting it
//! failed. Warn-family calls return after emitting the line. Fatal-family
//! calls then drain the cleanup registry and end the process.
//!
//! # Example Usage
//!
//! ```no_run
//! use fatal_report::{fatal, warnx, CallbackRegistry, Reporter};
//!
//! static CLEANUP: CallbackRegistry = CallbackRegistry::new();
//!
//! fn remove_lock_file() {}
//!
//! CLEANUP.register(remove_lock_file).unwrap();
//! let reporter = Reporter::new(&CLEANUP);
//!
//! warnx!(reporter, "ignoring unknown option {}", "-Z");
//! fatal!(reporter, "unable to open {}", "/etc/sudoers");
//! ```

use crate::config::{ReporterConfig, TargetConversation};
use crate::conversation::{Conversation, MessageKind, StderrConversation};
use crate::os;
use crate::registry::CallbackRegistry;
use crate::types::EXIT_FAILURE;
use std::fmt::{self, Write};

/// Placeholder printed when there is neither a message nor an error code
pub const NULL_MESSAGE: &str = "(null)";

/// Formats reports and, on the fatal path, runs cleanup and terminates
///
/// The reporter borrows the host's [`CallbackRegistry`]; it never owns it.
pub struct Reporter<'r, C = StderrConversation> {
    registry: &'r CallbackRegistry,
    conversation: C,
    program_name: String,
}

impl<'r> Reporter<'r, StderrConversation> {
    /// Reporter writing to standard error under the running program's name
    pub fn new(registry: &'r CallbackRegistry) -> Self {
        Self::with_conversation(registry, StderrConversation)
    }
}

impl<'r> Reporter<'r, TargetConversation> {
    /// Reporter built from a [`ReporterConfig`]
    pub fn from_config(registry: &'r CallbackRegistry, config: &ReporterConfig) -> Self {
        Self::with_conversation(registry, config.output.conversation())
            .with_program_name(config.resolved_program_name())
    }
}

impl<'r, C: Conversation> Reporter<'r, C> {
    /// Reporter delivering to a custom conversation
    pub fn with_conversation(registry: &'r CallbackRegistry, conversation: C) -> Self {
        Self {
            registry,
            conversation,
            program_name: os::program_name(),
        }
    }

    /// Builder method: override the program name
    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = name.into();
        self
    }

    /// Name printed at the start of every line
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// The channel report lines are delivered to
    pub fn conversation(&self) -> &C {
        &self.conversation
    }

    /// The cleanup registry drained on the fatal path
    pub fn registry(&self) -> &'r CallbackRegistry {
        self.registry
    }

    /// Emit one report line for `errnum` (0 = no OS error) and `args`
    ///
    /// This never fails; a message that cannot be formatted is treated as
    /// absent.
    pub fn emit(&self, errnum: i32, args: Option<fmt::Arguments<'_>>) {
        let message = args.and_then(format_message);
        let line = format_line(&self.program_name, errnum, message.as_deref());
        self.conversation.deliver(MessageKind::Error, &line);
    }

    /// Warn with the current OS error appended
    pub fn vwarn(&self, args: Option<fmt::Arguments<'_>>) {
        let errnum = os::last_errno();
        self.emit(errnum, args);
    }

    /// Warn without consulting the OS error
    pub fn vwarnx(&self, args: Option<fmt::Arguments<'_>>) {
        self.emit(0, args);
    }

    /// Emit the report and run every registered cleanup callback
    ///
    /// The returned [`Termination`] is the signal that the process must now
    /// end. Hosts that unwind to `main` before exiting can carry it there;
    /// everyone else calls [`Termination::exit`] right away.
    pub fn raise(&self, errnum: i32, args: Option<fmt::Arguments<'_>>) -> Termination {
        self.emit(errnum, args);

        log::debug!("Fatal report raised, running cleanup");
        let callbacks_run = self.registry.drain_and_invoke();

        Termination {
            status: EXIT_FAILURE,
            callbacks_run,
        }
    }

    /// Report with the current OS error appended, clean up, and exit
    pub fn vfatal(&self, args: Option<fmt::Arguments<'_>>) -> ! {
        let errnum = os::last_errno();
        self.raise(errnum, args).exit()
    }

    /// Report without consulting the OS error, clean up, and exit
    pub fn vfatalx(&self, args: Option<fmt::Arguments<'_>>) -> ! {
        self.raise(0, args).exit()
    }
}

/// Outcome of the fatal path once cleanup has run
#[must_use = "a fatal report must end the process; call `exit()`"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    status: i32,
    callbacks_run: usize,
}

impl Termination {
    /// Exit status the process will terminate with
    pub fn status(&self) -> i32 {
        self.status
    }

    /// How many cleanup callbacks ran before termination
    pub fn callbacks_run(&self) -> usize {
        self.callbacks_run
    }

    /// Terminate the process with the failure status
    pub fn exit(self) -> ! {
        std::process::exit(self.status)
    }
}

impl From<Termination> for std::process::ExitCode {
    fn from(termination: Termination) -> Self {
        std::process::ExitCode::from(termination.status as u8)
    }
}

/// Format `args`, or `None` if a formatting implementation reported an error
fn format_message(args: fmt::Arguments<'_>) -> Option<String> {
    let mut message = String::new();
    match message.write_fmt(args) {
        Ok(()) => Some(message),
        Err(_) => {
            log::trace!("Report message could not be formatted");
            None
        }
    }
}

/// Build the final report line, including the trailing newline
pub fn format_line(program_name: &str, errnum: i32, message: Option<&str>) -> String {
    if errnum != 0 {
        let error_text = os::os_error_string(errnum);
        match message {
            Some(message) => format!("{}: {}: {}\n", program_name, message, error_text),
            None => format!("{}: {}\n", program_name, error_text),
        }
    } else {
        format!("{}: {}\n", program_name, message.unwrap_or(NULL_MESSAGE))
    }
}

/// Print a warning with the current OS error appended
///
/// `warn!(reporter)` passes no template; otherwise the arguments follow
/// `format!` syntax.
#[macro_export]
macro_rules! warn {
    ($reporter:expr $(,)?) => {
        $reporter.vwarn(::core::option::Option::None)
    };
    ($reporter:expr, $($arg:tt)+) => {
        $reporter.vwarn(::core::option::Option::Some(::core::format_args!($($arg)+)))
    };
}

/// Print a warning without the OS error
#[macro_export]
macro_rules! warnx {
    ($reporter:expr $(,)?) => {
        $reporter.vwarnx(::core::option::Option::None)
    };
    ($reporter:expr, $($arg:tt)+) => {
        $reporter.vwarnx(::core::option::Option::Some(::core::format_args!($($arg)+)))
    };
}

/// Print an error with the current OS error appended, run cleanup, and exit
#[macro_export]
macro_rules! fatal {
    ($reporter:expr $(,)?) => {
        $reporter.vfatal(::core::option::Option::None)
    };
    ($reporter:expr, $($arg:tt)+) => {
        $reporter.vfatal(::core::option::Option::Some(::core::format_args!($($arg)+)))
    };
}

/// Print an error without the OS error, run cleanup, and exit
#[macro_export]
macro_rules! fatalx {
    ($reporter:expr $(,)?) => {
        $reporter.vfatalx(::core::option::Option::None)
    };
    ($reporter:expr, $($arg:tt)+) => {
        $reporter.vfatalx(::core::option::Option::Some(::core::format_args!($($arg)+)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::CapturedConversation;
    use std::cell::RefCell;

    thread_local! {
        static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn record(event: impl Into<String>) {
        EVENTS.with(|events| events.borrow_mut().push(event.into()));
    }

    fn take_events() -> Vec<String> {
        EVENTS.with(|events| std::mem::take(&mut *events.borrow_mut()))
    }

    fn close_session() {
        record("close_session");
    }

    fn restore_terminal() {
        record("restore_terminal");
    }

    fn unlink_timestamp() {
        record("unlink_timestamp");
    }

    struct Unformattable;

    impl fmt::Display for Unformattable {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    fn captured(registry: &CallbackRegistry) -> Reporter<'_, CapturedConversation> {
        Reporter::with_conversation(registry, CapturedConversation::new()).with_program_name("sudo")
    }

    #[test]
    fn test_warnx_without_template() {
        take_events();
        let registry = CallbackRegistry::new();
        registry.register(close_session).unwrap();

        let reporter = captured(&registry);
        crate::warnx!(reporter);

        assert_eq!(
            reporter.conversation().messages(),
            vec![(MessageKind::Error, "sudo: (null)\n".to_string())]
        );
        assert_eq!(registry.len(), 1);
        assert!(take_events().is_empty());
    }

    #[test]
    fn test_warnx_with_arguments() {
        let registry = CallbackRegistry::new();
        let reporter = captured(&registry);

        crate::warnx!(reporter, "unknown user {} (uid {})", "nobody", 65534);
        assert_eq!(
            reporter.conversation().lines(),
            vec!["sudo: unknown user nobody (uid 65534)\n".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_message_with_os_error() {
        let registry = CallbackRegistry::new();
        let reporter = captured(&registry);

        reporter.emit(libc::ENOENT, Some(format_args!("cannot open {}", "file")));
        assert_eq!(
            reporter.conversation().lines(),
            vec!["sudo: cannot open file: No such file or directory\n".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_os_error_without_template() {
        let registry = CallbackRegistry::new();
        let reporter = captured(&registry);

        reporter.emit(libc::EACCES, None);
        assert_eq!(
            reporter.conversation().lines(),
            vec!["sudo: Permission denied\n".to_string()]
        );
    }

    #[test]
    fn test_formatting_failure_falls_back_to_null() {
        let registry = CallbackRegistry::new();
        let reporter = captured(&registry);

        reporter.vwarnx(Some(format_args!("value: {}", Unformattable)));
        assert_eq!(reporter.conversation().lines(), vec!["sudo: (null)\n".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_formatting_failure_with_os_error() {
        let registry = CallbackRegistry::new();
        let reporter = captured(&registry);

        reporter.emit(libc::ENOENT, Some(format_args!("{}", Unformattable)));
        assert_eq!(
            reporter.conversation().lines(),
            vec!["sudo: No such file or directory\n".to_string()]
        );
    }

    #[test]
    fn test_warn_emits_exactly_one_line() {
        let registry = CallbackRegistry::new();
        registry.register(close_session).unwrap();
        let reporter = captured(&registry);

        crate::warn!(reporter, "lost connection");
        crate::warn!(reporter);

        let lines = reporter.conversation().lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("sudo: lost connection"));
        assert!(lines.iter().all(|line| line.ends_with('\n')));
        assert_eq!(registry.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_warn_reads_current_os_error() {
        let registry = CallbackRegistry::new();
        let reporter = captured(&registry);

        let err = std::fs::File::open("/nonexistent/fatal-report/file").unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
        crate::warn!(reporter, "cannot open {}", "file");

        assert_eq!(
            reporter.conversation().lines(),
            vec!["sudo: cannot open file: No such file or directory\n".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_vwarn_without_template_reads_current_os_error() {
        let registry = CallbackRegistry::new();
        let reporter = captured(&registry);

        let _ = std::fs::File::open("/nonexistent/fatal-report/file");
        reporter.vwarn(None);

        assert_eq!(
            reporter.conversation().lines(),
            vec!["sudo: No such file or directory\n".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_warnx_ignores_current_os_error() {
        let registry = CallbackRegistry::new();
        let reporter = captured(&registry);

        let _ = std::fs::File::open("/nonexistent/fatal-report/file");
        crate::warnx!(reporter, "cannot open {}", "file");

        assert_eq!(
            reporter.conversation().lines(),
            vec!["sudo: cannot open file\n".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_raise_reports_then_runs_cleanup_in_reverse_order() {
        take_events();
        let registry = CallbackRegistry::new();
        registry.register(unlink_timestamp).unwrap();
        registry.register(restore_terminal).unwrap();
        registry.register(close_session).unwrap();

        let conversation = |_kind: MessageKind, message: &str| record(message);
        let reporter =
            Reporter::with_conversation(&registry, conversation).with_program_name("sudo");

        let termination = reporter.raise(libc::ENOENT, Some(format_args!("cannot open {}", "file")));

        assert_eq!(termination.status(), EXIT_FAILURE);
        assert_eq!(termination.callbacks_run(), 3);
        assert!(registry.is_empty());
        assert_eq!(
            take_events(),
            vec![
                "sudo: cannot open file: No such file or directory\n",
                "close_session",
                "restore_terminal",
                "unlink_timestamp",
            ]
        );
    }

    #[test]
    fn test_raise_without_callbacks() {
        let registry = CallbackRegistry::new();
        let reporter = captured(&registry);

        let termination = reporter.raise(0, None);
        assert_eq!(termination.callbacks_run(), 0);
        assert_eq!(reporter.conversation().lines(), vec!["sudo: (null)\n".to_string()]);
    }

    #[test]
    fn test_from_config_uses_program_name() {
        let registry = CallbackRegistry::new();
        let config = ReporterConfig::new().with_program_name("sudoedit");
        let reporter = Reporter::from_config(&registry, &config);
        assert_eq!(reporter.program_name(), "sudoedit");
    }

    #[test]
    fn test_format_line_shapes() {
        assert_eq!(format_line("su", 0, Some("done")), "su: done\n");
        assert_eq!(format_line("su", 0, None), "su: (null)\n");
    }
}
