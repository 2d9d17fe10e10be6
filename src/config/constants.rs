//! Configuration constants.
//!
//! This module defines the defaults and wire-level constants used throughout
//! the engine: timeouts, redirect limits, ports and buffer sizes.

use std::time::Duration;

// Timeouts
/// Default per-attempt timeout (whole exchange, including body read)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default TCP connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// TLS handshake timeout for the socket transport
pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

// Redirects
/// Maximum number of redirect hops followed by default
pub const DEFAULT_REDIRECTS: u32 = 10;

// Ports
pub const HTTP_DEFAULT_PORT: u16 = 80;
pub const HTTPS_DEFAULT_PORT: u16 = 443;

/// Read buffer size for the socket transport (bytes per read call)
pub const READ_BUFFER_SIZE: usize = 1160;

/// Default User-Agent string sent by both transports.
pub const DEFAULT_USER_AGENT: &str = concat!("request_engine/", env!("CARGO_PKG_VERSION"));

/// Encodings the socket transport can decode, in preference order.
pub const ACCEPT_ENCODING: &str = "deflate;q=1.0, gzip;q=0.5";

/// Content-Type applied to POST/PUT/PATCH bodies when the caller sets none.
pub const DEFAULT_FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

// HTTP status codes
/// HTTP status code for Too Many Requests
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
/// HTTP status code for See Other (switches the next hop to GET)
pub const HTTP_STATUS_SEE_OTHER: u16 = 303;
