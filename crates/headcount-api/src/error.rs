use thiserror::Error;

/// Top-level error type for the `headcount-api` crate.
///
/// Covers every failure mode at the camera boundary: authentication,
/// transport, HTTP status, and stream lifecycle. `headcount-core` maps
/// these into its own diagnostics and decides which ones trigger a
/// reconnect.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The camera rejected our credentials (second 401, or 401 without
    /// a usable digest challenge).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The `WWW-Authenticate` challenge could not be parsed or answered.
    #[error("Invalid digest challenge: {0}")]
    DigestChallenge(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, reset, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status returned by the camera.
    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    // ── Attach stream ───────────────────────────────────────────────
    /// The attach response did not declare a multipart boundary.
    #[error("Attach response has no multipart boundary (Content-Type: {content_type})")]
    MissingBoundary { content_type: String },

    /// A multipart block grew past the buffer cap without a boundary.
    #[error("Attach block exceeds {limit} bytes without a boundary")]
    BlockTooLarge { limit: usize },

    /// The camera closed the attach stream.
    #[error("Attach stream ended")]
    StreamEnded,

    /// No bytes (not even a heartbeat) arrived within the idle window.
    #[error("Attach stream idle for {secs}s")]
    IdleTimeout { secs: u64 },
}

impl Error {
    /// Returns `true` if the camera refused our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::DigestChallenge(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_flagged() {
        let err = Error::Authentication {
            message: "rejected".into(),
        };
        assert!(err.is_auth_failure());
        assert!(Error::DigestChallenge("no nonce".into()).is_auth_failure());
        assert!(!Error::StreamEnded.is_auth_failure());
    }
}
