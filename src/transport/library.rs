//! reqwest-backed transport.

use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use tokio::io::AsyncWriteExt;

use super::{Capability, Transport, TransportKind};
use crate::config::Options;
use crate::error_handling::{transport_error_from_reqwest, LibraryErrorKind, TransportError};
use crate::initialization::build_client;
use crate::models::{apply_body_defaults, PreparedRequest};

/// Transport delegating the exchange to reqwest.
///
/// reqwest decodes transfer and content codings itself; the raw bytes handed
/// back are rebuilt from the decoded response, without `Transfer-Encoding`.
#[derive(Debug, Default, Clone)]
pub struct LibraryTransport;

impl LibraryTransport {
    pub fn new() -> Self {
        Self
    }

    async fn send(
        &self,
        request: &PreparedRequest,
        options: &Options,
    ) -> Result<Vec<u8>, TransportError> {
        match self.attempt(request, options, true).await {
            Err(TransportError::Library {
                kind: LibraryErrorKind::Decode,
                message,
            }) => {
                // Some servers mislabel their content coding
                warn!(
                    "Decoding {} failed ({}); retrying without content negotiation",
                    request.url, message
                );
                self.attempt(request, options, false).await
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        request: &PreparedRequest,
        options: &Options,
        decode_content: bool,
    ) -> Result<Vec<u8>, TransportError> {
        let url = request.url.as_str();
        let library_error = |e: reqwest::Error| transport_error_from_reqwest(e, url, options.timeout);

        let client = build_client(options, request.proxy.as_ref(), decode_content).map_err(library_error)?;
        let encoded = request.body.encode().await?;

        let mut headers = request.headers.clone();
        apply_body_defaults(&request.method, &mut headers, &encoded, false);
        if !decode_content && !headers.contains("Accept-Encoding") {
            headers.append("Accept-Encoding", "identity");
        }

        let mut builder = client.request(request.method.clone(), request.url.clone());
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        if !encoded.bytes.is_empty() {
            builder = builder.body(encoded.bytes);
        }

        if !options.blocking {
            let pending = builder.send();
            let target = request.url.to_string();
            tokio::spawn(async move {
                if let Err(e) = pending.await {
                    debug!("Non-blocking request to {} failed: {}", target, e);
                }
            });
            return Ok(Vec::new());
        }

        debug!("Sending {} {} via reqwest", request.method, request.url);
        let mut response = builder.send().await.map_err(library_error)?;
        let mut raw = response_head(&response);

        match &options.filename {
            Some(path) => {
                let mut file = tokio::fs::File::create(path).await?;
                let mut written = 0usize;
                while let Some(chunk) = response.chunk().await.map_err(library_error)? {
                    file.write_all(&chunk).await?;
                    written += chunk.len();
                }
                file.flush().await?;
                debug!("Wrote {} body bytes to {}", written, path.display());
            }
            None => {
                let body = response.bytes().await.map_err(library_error)?;
                raw.extend_from_slice(&body);
            }
        }
        Ok(raw)
    }
}

/// Rebuilds the status line and headers of a reqwest response.
fn response_head(response: &reqwest::Response) -> Vec<u8> {
    let version = match response.version() {
        reqwest::Version::HTTP_10 => "1.0",
        _ => "1.1",
    };
    let status = response.status();
    let mut head = format!(
        "HTTP/{} {} {}\r\n",
        version,
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    );
    for (name, value) in response.headers() {
        if name == reqwest::header::TRANSFER_ENCODING {
            continue;
        }
        head.push_str(name.as_str());
        head.push_str(": ");
        head.push_str(&String::from_utf8_lossy(value.as_bytes()));
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    head.into_bytes()
}

impl Transport for LibraryTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Library
    }

    fn request<'a>(
        &'a self,
        request: &'a PreparedRequest,
        options: &'a Options,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        self.send(request, options).boxed()
    }

    fn test(&self, capabilities: &[Capability]) -> bool {
        // reqwest is built with rustls, so TLS is always available
        capabilities.iter().all(|capability| match capability {
            Capability::Ssl => true,
        }) && reqwest::Client::builder().build().is_ok()
    }
}
