//! Fatal Report CLI Application
//!
//! A small host program for the fatal-report library. It owns the
//! process-wide cleanup registry, registers cleanup steps from its config and
//! command line, and raises one warn or fatal report:
//! - `warn` / `warnx` print the report and exit successfully
//! - `fatal` / `fatalx` print the report, run cleanup (last registered
//!   first), and exit with status 1

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use fatal_report::{Reporter, TargetConversation};
use std::path::PathBuf;

mod cleanup;
mod config;

use cleanup::{CleanupStep, CLEANUP};

/// Fatal Report - raise warnings and fatal errors with cleanup
#[derive(Parser, Debug)]
#[command(name = "fatal-report-cli")]
#[command(about = "Raise warn/fatal reports and run registered cleanup", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Program name printed at the start of the report
    #[arg(long, value_name = "NAME")]
    program_name: Option<String>,

    /// Cleanup step to register (can be repeated; the last one runs first)
    #[arg(long, value_name = "STEP")]
    cleanup: Vec<CleanupStep>,

    /// Cleanup step to deregister again before reporting (can be repeated)
    #[arg(long, value_name = "STEP")]
    release: Vec<CleanupStep>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a warning with the --errno error text appended
    Warn(ReportArgs),
    /// Print a warning
    Warnx(ReportArgs),
    /// Print an error with the --errno error text appended, run cleanup, exit 1
    Fatal(ReportArgs),
    /// Print an error, run cleanup, exit 1
    Fatalx(ReportArgs),
}

#[derive(ClapArgs, Debug)]
struct ReportArgs {
    /// OS error code to report (default: none; ignored by the x forms)
    #[arg(long, value_name = "CODE")]
    errno: Option<i32>,

    /// Message text (omit to report without a message)
    message: Option<String>,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Fatal Report CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using fatal-report library v{}", fatal_report::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };

    let mut reporter_config = app_config.reporter.clone();
    if let Some(name) = &args.program_name {
        reporter_config = reporter_config.with_program_name(name.clone());
    }

    cleanup::register_steps(&CLEANUP, app_config.cleanup.steps.iter().chain(&args.cleanup))?;
    cleanup::release_steps(&CLEANUP, &args.release);
    log::debug!("{} cleanup steps pending", CLEANUP.len());

    let reporter = Reporter::from_config(&CLEANUP, &reporter_config);
    run_command(&reporter, &args.command);

    Ok(())
}

/// Raise the requested report; fatal commands do not return
fn run_command(reporter: &Reporter<'_, TargetConversation>, command: &Command) {
    let (report, attach_errno, is_fatal) = match command {
        Command::Warn(report) => (report, true, false),
        Command::Warnx(report) => (report, false, false),
        Command::Fatal(report) => (report, true, true),
        Command::Fatalx(report) => (report, false, true),
    };

    // Startup leaves errno set by argument parsing and logging, so only an
    // explicit code is attached.
    let errnum = match (attach_errno, report.errno) {
        (true, Some(errnum)) => errnum,
        _ => 0,
    };

    match (is_fatal, report.message.as_deref()) {
        (false, Some(message)) => reporter.emit(errnum, Some(format_args!("{}", message))),
        (false, None) => reporter.emit(errnum, None),
        (true, Some(message)) => reporter
            .raise(errnum, Some(format_args!("{}", message)))
            .exit(),
        (true, None) => reporter.raise(errnum, None).exit(),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    // Reports own stderr; keep the logger quiet unless asked.
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
