//! request_engine: an HTTP/1.x client engine
//!
//! This library sends HTTP requests through interchangeable transports and
//! orchestrates everything around the wire exchange: redirect following,
//! RFC 6265 cookie handling, authentication and proxy providers, and a
//! priority-ordered hook bus that lets callers observe or rewrite every hop.
//!
//! Two transports ship with the engine: a reqwest-backed one and a raw
//! socket one speaking HTTP/1.0 over tokio (rustls for `https`, with RFC 2818
//! host-name checks). Custom transports implement [`transport::Transport`].
//!
//! # Example
//!
//! ```no_run
//! use request_engine::{request, Headers, Options};
//! use reqwest::Method;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = Options {
//!     redirects: 3,
//!     ..Default::default()
//! };
//!
//! let response = request("http://example.com/", Headers::new(), "", Method::GET, options).await?;
//! println!("{} after {} redirect(s)", response.status_code, response.redirects);
//! for cookie in response.cookies.cookies() {
//!     println!("cookie {}={}", cookie.name, cookie.value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod auth;
pub mod config;
pub mod cookie;
mod error_handling;
mod fetch;
pub mod hooks;
pub mod initialization;
mod models;
pub mod proxy;
pub mod ssl;
pub mod transport;

// Re-export public API
pub use config::{LogFormat, LogLevel, Options, TransportChoice};
pub use error_handling::{
    categorize_reqwest_error, is_transient, InitializationError, LibraryErrorKind, RequestError,
    TransportError,
};
pub use fetch::{execute, request, request_multiple};
pub use models::{Body, Headers, PreparedRequest, RequestDescriptor, RequestFile, Response};
