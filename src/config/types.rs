//! Configuration types.
//!
//! This module defines the option bag consumed by the request pipeline and
//! the logging enums used by `initialization::init_logger_with`.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use strum_macros::{Display, EnumString};

use crate::auth::Auth;
use crate::config::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_REDIRECTS, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
};
use crate::cookie::CookieJar;
use crate::error_handling::RequestError;
use crate::hooks::Hooks;
use crate::proxy::Proxy;
use crate::transport::Transport;

/// Logging level for the engine.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Explicit transport selection.
///
/// When `Options::transport` is `None` the pipeline probes the library
/// transport first, then the socket transport.
#[derive(Clone)]
pub enum TransportChoice {
    /// reqwest-backed transport
    Library,
    /// Hand-built HTTP/1.0 over TCP (optionally TLS)
    Socket,
    /// Caller-supplied implementation
    Custom(Arc<dyn Transport>),
}

impl fmt::Debug for TransportChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportChoice::Library => f.write_str("Library"),
            TransportChoice::Socket => f.write_str("Socket"),
            TransportChoice::Custom(transport) => {
                f.debug_tuple("Custom").field(&transport.kind()).finish()
            }
        }
    }
}

/// Option bag for one logical request.
///
/// Hooks may read and mutate the options while the request is in flight;
/// the pipeline re-reads `timeout`, `blocking`, `filename`,
/// `follow_redirects` and `redirects` at every hop.
///
/// # Examples
///
/// ```no_run
/// use request_engine::Options;
/// use std::time::Duration;
///
/// let options = Options {
///     timeout: Duration::from_secs(5),
///     redirects: 3,
///     ..Default::default()
/// };
/// ```
#[derive(Clone)]
pub struct Options {
    /// Per-attempt timeout covering the whole exchange
    pub timeout: Duration,
    /// TCP connection timeout
    pub connect_timeout: Duration,
    /// User-Agent sent when the caller's headers carry none
    pub useragent: String,
    /// Proxy to route every hop through
    pub proxy: Option<Proxy>,
    /// Authentication provider, registered on the hook bus before the first hop
    pub auth: Option<Arc<dyn Auth>>,
    /// Jar seeding the request; a fresh empty jar when absent
    pub cookies: Option<CookieJar>,
    /// Whether redirect responses are followed
    pub follow_redirects: bool,
    /// Maximum number of redirect hops
    pub redirects: u32,
    /// When false, the request is fired and no response is read
    pub blocking: bool,
    /// Download sink; the response body is written here instead of memory
    pub filename: Option<PathBuf>,
    /// Transport selection; auto-detected when absent
    pub transport: Option<TransportChoice>,
    /// Hook bus; a fresh bus when absent
    pub hooks: Option<Hooks>,
    /// Check the peer certificate against the host name. The socket transport
    /// checks the leaf after the handshake; the library transport passes the
    /// flag to reqwest. Chain validation stays on either way.
    pub verify_hostname: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            useragent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            auth: None,
            cookies: None,
            follow_redirects: true,
            redirects: DEFAULT_REDIRECTS,
            blocking: true,
            filename: None,
            transport: None,
            hooks: None,
            verify_hostname: true,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("useragent", &self.useragent)
            .field("proxy", &self.proxy)
            .field("auth", &self.auth)
            .field("cookies", &self.cookies)
            .field("follow_redirects", &self.follow_redirects)
            .field("redirects", &self.redirects)
            .field("blocking", &self.blocking)
            .field("filename", &self.filename)
            .field("transport", &self.transport)
            .field("hooks", &self.hooks)
            .field("verify_hostname", &self.verify_hostname)
            .finish()
    }
}

impl Options {
    /// Validates the option bag.
    ///
    /// Called by the pipeline before any I/O is attempted.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::InvalidArgument` when a timeout is zero or the
    /// download sink's parent directory does not exist.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.timeout.is_zero() {
            return Err(RequestError::invalid("timeout", "must be greater than zero"));
        }
        if self.connect_timeout.is_zero() {
            return Err(RequestError::invalid(
                "connect_timeout",
                "must be greater than zero",
            ));
        }
        if let Some(filename) = &self.filename {
            let parent = filename
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            if !parent.is_dir() {
                return Err(RequestError::invalid(
                    "filename",
                    format!("directory {} does not exist", parent.display()),
                ));
            }
        }
        Ok(())
    }
}
