//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use headcount_config::ConfigError;
use headcount_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFIG: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach camera '{device}'")]
    #[diagnostic(
        code(headcount::connection_failed),
        help(
            "Check that the camera is powered and reachable.\n\
             Reason: {reason}\n\
             Override the address with: headcount config set-override {device} host <ip>"
        )
    )]
    ConnectionFailed { device: String, reason: String },

    #[error("{message}")]
    #[diagnostic(
        code(headcount::timeout),
        help("Raise request_timeout_secs in the config file or check the network path.")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Camera rejected the credentials")]
    #[diagnostic(
        code(headcount::auth_failed),
        help(
            "Verify the camera username and password.\n\
             Detail: {message}\n\
             Run: headcount config set-password <camera>"
        )
    )]
    AuthFailed { message: String },

    #[error("No password configured for camera '{camera}'")]
    #[diagnostic(
        code(headcount::no_credentials),
        help(
            "Set the variable named by password_env, store one with\n\
             `headcount config set-password {camera}`, or add `password` to the config file."
        )
    )]
    NoCredentials { camera: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Camera '{name}' is not configured")]
    #[diagnostic(
        code(headcount::unknown_camera),
        help("Configured cameras: {available}")
    )]
    UnknownCamera { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(headcount::config),
        help("Inspect the effective configuration with: headcount config show")
    )]
    Config { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(headcount::validation))]
    Validation { field: String, reason: String },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("Occupancy engine stopped")]
    #[diagnostic(code(headcount::engine_stopped))]
    EngineStopped,

    #[error("Could not open the event sink: {0}")]
    #[diagnostic(code(headcount::sink))]
    Sink(#[from] headcount_core::SinkError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(headcount::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::UnknownCamera { .. } | Self::Config { .. } => exit_code::CONFIG,
            Self::Validation { .. } => exit_code::USAGE,
            Self::EngineStopped | Self::Sink(_) | Self::Io(_) | Self::Render(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { device, reason } => {
                CliError::ConnectionFailed { device, reason }
            }
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            err @ (CoreError::RequestTimeout { .. } | CoreError::StreamIdle { .. }) => {
                CliError::Timeout {
                    message: err.to_string(),
                }
            }
            CoreError::EngineStopped => CliError::EngineStopped,
            CoreError::Sink(e) => CliError::Sink(e),
            CoreError::Config { message } => CliError::Config { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { camera } => CliError::NoCredentials { camera },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
