// Output format auto-detection for the CLI.
//
// TTY → human-readable text. Piped/redirected → structured JSON.
// `--json` flag forces JSON output regardless of terminal.

use docpush_bridge::config::ConfigError;
use docpush_bridge::error::BridgeError;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per response).
    Json,
}

impl OutputFormat {
    /// Auto-detect format: JSON if `--json` was passed or stdout is not a TTY.
    pub fn detect(json_flag: bool) -> Self {
        if json_flag {
            return Self::Json;
        }
        Self::detect_from_terminal(io::stdout().is_terminal())
    }

    /// Testable variant that takes an explicit `is_tty` flag.
    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty {
            Self::Human
        } else {
            Self::Json
        }
    }
}

/// Write a value to stdout in the selected format.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    write_output(&mut io::stdout().lock(), format, value, human_fn)
}

/// Write a value to a provided writer (useful for testing).
pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    human_fn: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Human => {
            writeln!(writer, "{}", human_fn(value))
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, value).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

/// Write an error to stderr in the selected format.
pub fn print_error(format: OutputFormat, code: &str, message: &str) {
    let mut err = io::stderr().lock();
    let _ = write_error(&mut err, format, code, message, io::stderr().is_terminal());
}

fn write_error<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    code: &str,
    message: &str,
    is_tty: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Human => {
            writeln!(writer, "{}", render_human_stderr_line("error", message, is_tty, ANSI_RED))
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            });
            serde_json::to_writer(&mut *writer, &obj).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

/// Print a mapped, actionable error for a command failure.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let (code, message) = actionable_error(error);
    print_error(format, code, &message);
}

fn actionable_error(error: &anyhow::Error) -> (&'static str, String) {
    let message = format!("{error:#}");

    for cause in error.chain() {
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return config_hint(config_err, message);
        }
        if let Some(bridge_err) = cause.downcast_ref::<BridgeError>() {
            return match bridge_err {
                BridgeError::Config(config_err) => config_hint(config_err, message),
                BridgeError::Credentials(_) => (
                    "CREDENTIALS",
                    format!(
                        "{message}. Check DOCPUSH_SERVICE_ACCOUNT_KEY and that the service \
                         account can read the document"
                    ),
                ),
                BridgeError::Api { operation, status, .. } => {
                    ("DRIVE_API", format!("Drive {operation} returned {status}: {message}"))
                }
                BridgeError::Transport(_) => ("NETWORK", message),
                BridgeError::SshMaterial(_) => (
                    "SSH_MATERIAL",
                    format!(
                        "{message}. Check DOCPUSH_SSH_PRIVATE_KEY and DOCPUSH_SSH_KNOWN_HOSTS"
                    ),
                ),
                BridgeError::Git(_) => ("GIT_FAILED", message),
                BridgeError::Io { .. } | BridgeError::Task(_) => ("ERROR", message),
            };
        }
    }

    ("ERROR", message)
}

fn config_hint(error: &ConfigError, message: String) -> (&'static str, String) {
    match error {
        ConfigError::Missing(vars) => {
            ("CONFIG_MISSING", format!("{message}. Set: {}", vars.join(" ")))
        }
        ConfigError::Invalid { .. } => ("CONFIG_INVALID", message),
    }
}

fn render_human_stderr_line(label: &str, message: &str, is_tty: bool, color: &str) -> String {
    if is_tty {
        format!("{color}{label}:{ANSI_RESET} {message}")
    } else {
        format!("{label}: {message}")
    }
}
