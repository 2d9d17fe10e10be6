//! Error categorization.
//!
//! Maps reqwest failures onto `LibraryErrorKind` and classifies pipeline
//! errors as transient or permanent for callers that implement their own
//! retry policy. The engine itself never retries.

use super::types::{LibraryErrorKind, RequestError, TransportError};

/// Categorizes a `reqwest::Error` into a `LibraryErrorKind`.
///
/// The order of the checks matters: a timed-out connect reports both
/// `is_timeout()` and `is_connect()`, and is categorized as a timeout.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> LibraryErrorKind {
    if error.is_builder() {
        LibraryErrorKind::Builder
    } else if error.is_timeout() {
        LibraryErrorKind::Timeout
    } else if error.is_redirect() {
        LibraryErrorKind::Redirect
    } else if error.is_connect() {
        LibraryErrorKind::Connect
    } else if error.is_decode() {
        LibraryErrorKind::Decode
    } else if error.is_body() {
        LibraryErrorKind::Body
    } else if error.is_request() {
        LibraryErrorKind::Request
    } else {
        LibraryErrorKind::Other
    }
}

/// Converts a reqwest failure into the transport error surfaced to callers.
pub(crate) fn transport_error_from_reqwest(
    error: reqwest::Error,
    url: &str,
    timeout: std::time::Duration,
) -> TransportError {
    let kind = categorize_reqwest_error(&error);
    if kind == LibraryErrorKind::Timeout {
        return TransportError::Timeout {
            url: url.to_string(),
            timeout,
        };
    }
    TransportError::Library {
        kind,
        message: error.to_string(),
    }
}

/// Determines if an error is transient (a retry might succeed).
///
/// # Transient
///
/// - Timeouts and connection failures
/// - Library request/body failures
/// - Server errors (5xx) and 429 Too Many Requests
///
/// # Permanent
///
/// - Invalid arguments and URL errors
/// - Protocol errors (the server produced corrupt framing)
/// - TLS failures, including certificate/host mismatches
/// - Client errors (4xx except 429) and redirect loops
pub fn is_transient(error: &RequestError) -> bool {
    match error {
        RequestError::Transport(transport) => match transport {
            TransportError::Connect { .. } | TransportError::Timeout { .. } => true,
            TransportError::Library { kind, .. } => matches!(
                kind,
                LibraryErrorKind::Connect
                    | LibraryErrorKind::Timeout
                    | LibraryErrorKind::Request
                    | LibraryErrorKind::Body
            ),
            TransportError::Io(_) => true,
            TransportError::Tls { .. } | TransportError::Protocol(_) => false,
        },
        RequestError::Status { code, .. } => {
            *code == crate::config::HTTP_STATUS_TOO_MANY_REQUESTS || (500..600).contains(code)
        }
        RequestError::TooManyRedirects { .. }
        | RequestError::InvalidArgument { .. }
        | RequestError::NoTransport
        | RequestError::Hook(_)
        | RequestError::Url(_) => false,
    }
}
