//! Transports.
//!
//! A transport moves one prepared hop over the network and hands back the
//! raw response bytes: status line, headers, blank line, body. Redirects,
//! cookies and hooks are handled by the orchestration loop, never here.
//!
//! Two implementations ship with the engine:
//! - `LibraryTransport`: reqwest with redirects disabled
//! - `SocketTransport`: hand-built HTTP/1.0 over a tokio TCP stream,
//!   optionally wrapped in rustls

mod library;
mod socket;
mod tls;
pub(crate) mod wire;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use url::Url;

use crate::config::{Options, TransportChoice};
use crate::error_handling::{RequestError, TransportError};
use crate::models::PreparedRequest;

pub use library::LibraryTransport;
pub use socket::SocketTransport;

/// Which implementation produced a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Library,
    Socket,
    Custom,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Library => "library",
            TransportKind::Socket => "socket",
            TransportKind::Custom => "custom",
        })
    }
}

/// A feature a transport can be probed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// TLS (`https` URLs)
    Ssl,
}

/// The transport contract.
///
/// Implementations must honor `Options::timeout`, `Options::blocking` and
/// `Options::filename`, and must not follow redirects.
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Executes one hop.
    ///
    /// Returns the raw response. In non-blocking mode the request is fired
    /// and an empty buffer is returned without waiting for the server. With
    /// a download sink the body is written to the file and the returned
    /// buffer carries only the response head.
    fn request<'a>(
        &'a self,
        request: &'a PreparedRequest,
        options: &'a Options,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>>;

    /// Executes independent hops concurrently, one result per id.
    fn request_multiple<'a>(
        &'a self,
        requests: &'a [(String, PreparedRequest)],
        options: &'a Options,
    ) -> BoxFuture<'a, HashMap<String, Result<Vec<u8>, TransportError>>> {
        async move {
            join_all(requests.iter().map(|(id, request)| async move {
                (id.clone(), self.request(request, options).await)
            }))
            .await
            .into_iter()
            .collect()
        }
        .boxed()
    }

    /// Whether the transport is usable and supports every capability listed.
    fn test(&self, capabilities: &[Capability]) -> bool;
}

/// Picks the transport for a hop to `url`.
///
/// An explicit choice is used as-is. Otherwise the library transport is
/// probed first, then the socket transport; `https` URLs require
/// `Capability::Ssl`.
///
/// # Errors
///
/// Returns `RequestError::NoTransport` if no candidate passes its probe.
pub fn select_transport(
    choice: Option<&TransportChoice>,
    url: &Url,
) -> Result<Arc<dyn Transport>, RequestError> {
    match choice {
        Some(TransportChoice::Library) => return Ok(Arc::new(LibraryTransport::new())),
        Some(TransportChoice::Socket) => return Ok(Arc::new(SocketTransport::new())),
        Some(TransportChoice::Custom(transport)) => return Ok(Arc::clone(transport)),
        None => {}
    }

    let capabilities: &[Capability] = if url.scheme() == "https" {
        &[Capability::Ssl]
    } else {
        &[]
    };
    let candidates: [Arc<dyn Transport>; 2] = [
        Arc::new(LibraryTransport::new()),
        Arc::new(SocketTransport::new()),
    ];
    candidates
        .into_iter()
        .find(|transport| {
            let usable = transport.test(capabilities);
            log::trace!("Transport probe {}: {}", transport.kind(), usable);
            usable
        })
        .ok_or(RequestError::NoTransport)
}
