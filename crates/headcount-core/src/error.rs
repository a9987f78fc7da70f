// ── Core error types ──
//
// Errors surfaced by headcount-core. Consumers never match on HTTP
// details directly: the `From<headcount_api::Error>` impl folds camera
// transport failures into connection, auth and timeout variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach camera {device}: {reason}")]
    ConnectionFailed { device: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Camera {device} did not answer in time")]
    RequestTimeout { device: String },

    #[error("Attach stream idle for {timeout_secs}s")]
    StreamIdle { timeout_secs: u64 },

    // ── Engine errors ────────────────────────────────────────────────
    #[error("Reconciliation engine is not running")]
    EngineStopped,

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Failure writing a record to an [`EventSink`](crate::sink::EventSink).
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<headcount_api::Error> for CoreError {
    fn from(err: headcount_api::Error) -> Self {
        use headcount_api::Error as Api;

        match err {
            Api::Authentication { message } => CoreError::AuthenticationFailed { message },
            Api::DigestChallenge(reason) => CoreError::AuthenticationFailed {
                message: format!("Cannot answer digest challenge: {reason}"),
            },
            Api::Transport(e) => {
                let device = e
                    .url()
                    .and_then(|u| u.host_str().map(str::to_owned))
                    .unwrap_or_else(|| "<unknown>".into());
                if e.is_timeout() {
                    CoreError::RequestTimeout { device }
                } else {
                    CoreError::ConnectionFailed {
                        device,
                        reason: e.to_string(),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid camera URL: {e}"),
            },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                device: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            Api::IdleTimeout { secs } => CoreError::StreamIdle { timeout_secs: secs },
            err @ (Api::Status { .. }
            | Api::MissingBoundary { .. }
            | Api::BlockTooLarge { .. }
            | Api::StreamEnded) => {
                CoreError::ConnectionFailed {
                    device: String::new(),
                    reason: err.to_string(),
                }
            }
        }
    }
}
