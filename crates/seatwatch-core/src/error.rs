//! Error types for the seatwatch libraries.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, enrollment, and input validation
//! errors. Nothing in this taxonomy is fatal to the acquisition loop: the
//! scheduler interprets each class to decide between "retry now",
//! "re-authenticate", and "notify and keep watching".

use thiserror::Error;

/// The unified error type for seatwatch operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (expired session, unbound client).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Protocol errors (expected page or response structure absent).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Enrollment errors (a phase of the add request was rejected).
    #[error("enrollment error: {0}")]
    Enroll(#[from] EnrollError),

    /// Input validation errors (invalid course code or base URL).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// True when the underlying condition is an expired or stale session.
    ///
    /// The scheduler uses this to route a failed cycle into the
    /// re-authentication path instead of the plain sleep-and-retry path.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Auth(AuthError::SessionExpired))
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Authentication-related errors.
///
/// A *rejected login* (bad credentials, wrong challenge answer) is not in
/// this enum: `login()` reports it as `Ok(false)`, since it is an expected
/// outcome the caller retries, not an exceptional condition.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The session's ticket is no longer honored; the caller must
    /// re-login, re-bind the service, and re-resolve the context.
    #[error("session expired")]
    SessionExpired,

    /// An operation that requires a bound session was called before
    /// `login()` succeeded.
    #[error("not authenticated")]
    NotAuthenticated,
}

/// The expected page or response structure was absent.
///
/// Signals upstream format drift. Surfaced to the operator via the log;
/// the loop continues.
#[derive(Debug, Error)]
#[error("{what}: {detail}")]
pub struct ProtocolError {
    /// What was being parsed.
    pub what: &'static str,
    /// What was wrong with it.
    pub detail: String,
}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(what: &'static str, detail: impl Into<String>) -> Self {
        Self {
            what,
            detail: detail.into(),
        }
    }
}

/// A phase of the two-phase add request was rejected outright.
///
/// Distinct from a *refusal*: a refusal means both phases completed and
/// the backend said no (seat lost to contention), which is reported as a
/// value, not an error.
#[derive(Debug, Error)]
pub enum EnrollError {
    /// The add-request phase answered with a non-success status;
    /// the request was never registered.
    #[error("add request rejected (HTTP {status})")]
    RequestRejected { status: u16 },

    /// The confirmation phase answered with a non-success status;
    /// the request was registered but its outcome is unknown.
    #[error("confirmation rejected (HTTP {status})")]
    ConfirmationRejected { status: u16 },

    /// No selection round is currently open.
    #[error("no open selection round")]
    NoOpenTurn,
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid course code.
    #[error("invalid course code '{value}': {reason}")]
    Code { value: String, reason: String },

    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expired_is_recognized() {
        let err = Error::from(AuthError::SessionExpired);
        assert!(err.is_session_expired());

        let err = Error::from(AuthError::NotAuthenticated);
        assert!(!err.is_session_expired());

        let err = Error::from(EnrollError::RequestRejected { status: 500 });
        assert!(!err.is_session_expired());
    }

    #[test]
    fn enroll_errors_name_the_failed_phase() {
        let err = EnrollError::RequestRejected { status: 503 };
        assert!(err.to_string().contains("add request"));
        assert!(err.to_string().contains("503"));

        let err = EnrollError::ConfirmationRejected { status: 500 };
        assert!(err.to_string().contains("confirmation"));
    }
}
