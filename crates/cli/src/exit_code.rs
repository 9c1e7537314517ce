// Consistent exit codes for the docpush CLI.
//
//   0 = success
//   1 = general error
//   2 = usage/argument error
//   3 = configuration error
//   4 = Google authorization or API error
//   5 = git or SSH material error

use std::process;

use docpush_bridge::config::ConfigError;
use docpush_bridge::error::BridgeError;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    Config = 3,
    Remote = 4,
    Git = 5,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::Config;
            }
            if let Some(bridge_err) = cause.downcast_ref::<BridgeError>() {
                return Self::from_bridge_error(bridge_err);
            }
        }
        Self::Error
    }

    pub fn from_bridge_error(err: &BridgeError) -> Self {
        match err {
            BridgeError::Config(_) => Self::Config,
            BridgeError::Credentials(_) | BridgeError::Api { .. } | BridgeError::Transport(_) => {
                Self::Remote
            }
            BridgeError::SshMaterial(_) | BridgeError::Git(_) => Self::Git,
            BridgeError::Io { .. } | BridgeError::Task(_) => Self::Error,
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}
