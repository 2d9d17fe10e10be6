//! Error handling.
//!
//! This module provides:
//! - Error type definitions (transport, pipeline, initialization)
//! - Categorization of reqwest failures
//! - Transient/permanent classification for caller-side retry policies
//!
//! Errors are categorized into:
//! - **Transport errors**: connection, timeout, TLS, protocol and library failures
//! - **Request errors**: redirect limit, invalid arguments, status rejections

mod categorization;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, is_transient};
pub(crate) use categorization::transport_error_from_reqwest;
pub use types::{InitializationError, LibraryErrorKind, RequestError, TransportError};
