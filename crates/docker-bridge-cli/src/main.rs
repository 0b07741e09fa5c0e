// crates/docker-bridge-cli/src/main.rs
// ============================================================================
// Module: Docker Bridge CLI Entry Point
// Description: Process entry for one container engine operation per invocation.
// Purpose: Parse arguments, configure logging, run the operation, and map the exit code.
// Dependencies: clap, docker-bridge-core, thiserror, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! `docker-bridge <OPERATION> <connect-ms> <read-ms> <url> <cert-dir> ...`
//! runs one operation and exits `0` on success, `2` on a connection timeout
//! and `1` for every other failure. Diagnostics go to the tracing log (stderr
//! by default, or `--log-file`); console lines go to stdout and stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error as StdError;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use clap::error::ErrorKind;
use docker_bridge_core::BridgeError;
use docker_bridge_core::Console;
use docker_bridge_core::ExecutionController;
use docker_bridge_core::TracingLog;
use docker_bridge_core::output::format_message;
use docker_bridge_core::run_invocation;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable overriding `--log-level`.
const LOG_LEVEL_ENV: &str = "DOCKER_BRIDGE_LOG_LEVEL";

/// Environment variable overriding `--log-file`.
const LOG_FILE_ENV: &str = "DOCKER_BRIDGE_LOG_FILE";

/// Hint printed after connectivity failures.
const CONNECTIVITY_HINT: &str = "Please check the input parameters. For more details refer the logs";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "docker-bridge",
    version,
    about = "Run one container engine operation with positional arguments"
)]
struct Cli {
    /// Tracing filter directive (for example `info` or `docker_bridge=debug`).
    #[arg(long, env = LOG_LEVEL_ENV, default_value = "warn", value_name = "FILTER")]
    log_level: String,
    /// Append diagnostics to this file instead of stderr.
    #[arg(long, env = LOG_FILE_ENV, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Operation name followed by its positional arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI setup failures raised before an operation runs.
#[derive(Debug, Error)]
enum CliError {
    /// The tracing filter directive is malformed.
    #[error("Invalid log level [{directive}]: {reason}")]
    LogLevel {
        /// Directive as supplied.
        directive: String,
        /// Parser message.
        reason: String,
    },
    /// The log file could not be opened.
    #[error("Unable to open log file [{path}]: {reason}")]
    LogFile {
        /// Path as supplied.
        path: String,
        /// Open failure message.
        reason: String,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return emit_parse_error(&err),
    };
    if let Err(err) = init_logging(&cli.log_level, cli.log_file.as_deref()) {
        return emit_error(&format_message("ERROR", &err.to_string()));
    }

    let mut controller = ExecutionController::new(Box::new(TracingLog), Console::stdio());
    match run_invocation(&mut controller, cli.args) {
        Ok(operation) => {
            tracing::info!(target: "docker_bridge", operation = %operation, "Operation completed");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log_failure(&err);
            for line in error_lines(&err) {
                let _ = write_stderr_line(&line);
            }
            ExitCode::from(err.exit_code())
        }
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Installs the global tracing subscriber.
fn init_logging(directive: &str, log_file: Option<&Path>) -> Result<(), CliError> {
    let filter = EnvFilter::try_new(directive).map_err(|err| CliError::LogLevel {
        directive: directive.to_string(),
        reason: err.to_string(),
    })?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
    Ok(())
}

/// Opens the log file for appending, creating it when absent.
fn open_log_file(path: &Path) -> Result<File, CliError> {
    OpenOptions::new().create(true).append(true).open(path).map_err(|err| CliError::LogFile {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Records a failure and its cause chain.
fn log_failure(err: &BridgeError) {
    tracing::error!(target: "docker_bridge", exit_code = err.exit_code(), "{err}");
    let mut source = err.source();
    while let Some(cause) = source {
        tracing::error!(target: "docker_bridge", "caused by: {cause}");
        source = cause.source();
    }
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Console lines describing a failed invocation.
fn error_lines(err: &BridgeError) -> Vec<String> {
    let mut lines = vec![format_message("ERROR", &err.to_string())];
    if err.is_connectivity() {
        lines.push(format_message("ERROR", CONNECTIVITY_HINT));
    }
    lines
}

/// Reports a clap parse outcome; help and version requests succeed.
fn emit_parse_error(err: &clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let mut stdout = std::io::stdout();
            let _ = write!(&mut stdout, "{err}");
            ExitCode::SUCCESS
        }
        _ => {
            let mut stderr = std::io::stderr();
            let _ = write!(&mut stderr, "{err}");
            ExitCode::FAILURE
        }
    }
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error line and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
