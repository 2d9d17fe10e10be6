//! Engine configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, redirect limits, ports)
//! - The `Options` bag consumed by the request pipeline
//! - Logging enums

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{LogFormat, LogLevel, Options, TransportChoice};
