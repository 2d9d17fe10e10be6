//! Engine initialization.
//!
//! This module provides:
//! - Logger setup for binaries and tests embedding the engine
//! - reqwest client construction for the library transport
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

// Re-export public API
pub(crate) use client::build_client;
pub use logger::init_logger_with;
