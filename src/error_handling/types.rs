//! Error type definitions.
//!
//! This module defines all error types surfaced by the engine: transport
//! failures, orchestration failures, and initialization failures.

use std::time::Duration;

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Category of a failure reported by the reqwest-backed transport.
///
/// reqwest does not expose numeric error codes, so the category derived from
/// its predicates stands in for the native error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryErrorKind {
    Builder,
    Connect,
    Timeout,
    Redirect,
    Request,
    Body,
    Decode,
    Other,
}

impl LibraryErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryErrorKind::Builder => "builder",
            LibraryErrorKind::Connect => "connect",
            LibraryErrorKind::Timeout => "timeout",
            LibraryErrorKind::Redirect => "redirect",
            LibraryErrorKind::Request => "request",
            LibraryErrorKind::Body => "body",
            LibraryErrorKind::Decode => "decode",
            LibraryErrorKind::Other => "other",
        }
    }
}

impl std::fmt::Display for LibraryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while moving bytes over the wire.
///
/// Protocol errors (bad framing, unparseable status line) are reported here
/// too: they indicate wire-level corruption rather than a caller mistake.
#[derive(Error, Debug)]
pub enum TransportError {
    /// TCP connection setup failed (refused, unreachable, DNS failure).
    #[error("Failed to connect to {host}:{port}: {message}")]
    Connect {
        host: String,
        port: u16,
        message: String,
    },

    /// The attempt did not complete within the configured timeout.
    #[error("Request to {url} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { url: String, timeout: Duration },

    /// The reqwest-backed transport failed.
    #[error("Library transport error ({kind}): {message}")]
    Library {
        kind: LibraryErrorKind,
        message: String,
    },

    /// TLS handshake failed or the peer certificate does not match the host.
    #[error("TLS error for {host}: {message}")]
    Tls { host: String, message: String },

    /// The response could not be decoded at the wire level.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Read/write failure on an established stream or the download sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        TransportError::Protocol(message.into())
    }
}

/// Errors returned by the request pipeline.
#[derive(Error, Debug)]
pub enum RequestError {
    /// A transport failure, surfaced unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The redirect limit was reached while the server kept redirecting.
    #[error("Too many redirects (limit {limit}): {url} answered {status}")]
    TooManyRedirects { limit: u32, url: String, status: u16 },

    /// An input violated its documented shape. Raised before any I/O.
    #[error("Invalid argument `{argument}`: {message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },

    /// A response status was rejected by `Response::error_for_status`.
    #[error("HTTP status {code} for {url}")]
    Status { code: u16, url: String },

    /// No transport passed its availability probe.
    #[error("No working transports found")]
    NoTransport,

    /// A hook callback aborted the request.
    #[error("Hook callback failed: {0}")]
    Hook(String),

    /// A URL (request URL or redirect target) could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl RequestError {
    pub(crate) fn invalid(argument: &'static str, message: impl Into<String>) -> Self {
        RequestError::InvalidArgument {
            argument,
            message: message.into(),
        }
    }

    /// Builds the error a hook callback returns to abort dispatch.
    pub fn hook(message: impl Into<String>) -> Self {
        RequestError::Hook(message.into())
    }

    /// Whether a retry of the same request might succeed.
    ///
    /// See [`is_transient`](crate::is_transient).
    pub fn is_transient(&self) -> bool {
        super::categorization::is_transient(self)
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::TooManyRedirects { status, .. } => Some(*status),
            RequestError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}
