//! Raw socket transport.
//!
//! Writes an HTTP/1.0 request with `Connection: close` over a tokio TCP
//! stream (rustls-wrapped for `https`) and reads until the server closes.

use std::path::Path;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use log::{debug, info};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::{tls, wire, Capability, Transport, TransportKind};
use crate::config::{Options, HTTPS_DEFAULT_PORT, HTTP_DEFAULT_PORT, READ_BUFFER_SIZE};
use crate::error_handling::TransportError;
use crate::models::PreparedRequest;
use crate::proxy::Proxy;

/// Upper bound on a proxy's `CONNECT` response head.
const MAX_TUNNEL_HEAD: usize = 8 * 1024;

/// Transport speaking HTTP/1.0 directly over TCP.
#[derive(Debug, Default, Clone)]
pub struct SocketTransport;

impl SocketTransport {
    pub fn new() -> Self {
        Self
    }

    async fn send(
        &self,
        request: &PreparedRequest,
        options: &Options,
    ) -> Result<Vec<u8>, TransportError> {
        let url = &request.url;
        let secure = url.scheme() == "https";
        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
            .ok_or_else(|| TransportError::protocol(format!("URL {} has no host", url)))?;
        let port = url
            .port_or_known_default()
            .unwrap_or(if secure { HTTPS_DEFAULT_PORT } else { HTTP_DEFAULT_PORT });

        let stream = match &request.proxy {
            Some(proxy) => {
                let mut stream = open(&proxy.host, proxy.port, options.connect_timeout).await?;
                if secure {
                    tunnel(&mut stream, proxy, &wire::authority(url, port)).await?;
                }
                stream
            }
            None => open(host, port, options.connect_timeout).await?,
        };

        let encoded = request.body.encode().await?;
        let absolute_target = request.proxy.is_some() && !secure;
        let message = wire::build_request(request, &encoded, &options.useragent, absolute_target);

        if secure {
            let stream = tls::connect(stream, host, options.verify_hostname).await?;
            exchange(stream, &message, options).await
        } else {
            exchange(stream, &message, options).await
        }
    }
}

/// Opens a TCP connection within `timeout`.
async fn open(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, TransportError> {
    debug!("Connecting to {host}:{port}");
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(TransportError::Connect {
            host: host.to_string(),
            port,
            message: e.to_string(),
        }),
        Err(_) => Err(TransportError::Timeout {
            url: format!("{}:{}", host, port),
            timeout,
        }),
    }
}

/// Asks the proxy for a tunnel to `authority`.
async fn tunnel(stream: &mut TcpStream, proxy: &Proxy, authority: &str) -> Result<(), TransportError> {
    let mut message = format!("CONNECT {authority} HTTP/1.0\r\nHost: {authority}\r\n");
    if let Some(authorization) = proxy.authorization() {
        message.push_str(&format!("Proxy-Authorization: {}\r\n", authorization));
    }
    message.push_str("\r\n");
    stream.write_all(message.as_bytes()).await?;

    // Byte-wise so no TLS bytes are consumed past the head
    let mut head = Vec::new();
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_TUNNEL_HEAD {
            return Err(TransportError::protocol("Proxy CONNECT response head too large"));
        }
        let mut byte = [0u8; 1];
        if stream.read(&mut byte).await? == 0 {
            return Err(TransportError::protocol("Proxy closed the connection during CONNECT"));
        }
        head.push(byte[0]);
    }

    let status = wire::parse_head(&head[..head.len() - 4])?.status;
    if !(200..300).contains(&status) {
        return Err(TransportError::Connect {
            host: proxy.host.clone(),
            port: proxy.port,
            message: format!("CONNECT {} answered {}", authority, status),
        });
    }
    debug!("Tunnel to {authority} established through {}:{}", proxy.host, proxy.port);
    Ok(())
}

/// Writes the request and reads the whole response.
async fn exchange<S>(mut stream: S, message: &[u8], options: &Options) -> Result<Vec<u8>, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(message).await?;
    stream.flush().await?;

    if !options.blocking {
        let _ = stream.shutdown().await;
        return Ok(Vec::new());
    }

    let raw = read_to_close(&mut stream).await?;
    match &options.filename {
        Some(path) => write_download(raw, path).await,
        None => Ok(raw),
    }
}

async fn read_to_close<S>(stream: &mut S) -> Result<Vec<u8>, TransportError>
where
    S: AsyncRead + Unpin,
{
    let mut raw = Vec::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
            // Servers often skip close_notify after a complete response
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof && !raw.is_empty() => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(raw)
}

/// Decodes the body of `raw` into `path` and returns the head alone.
async fn write_download(raw: Vec<u8>, path: &Path) -> Result<Vec<u8>, TransportError> {
    let (head, body) = wire::split_message(&raw)?;
    let mut headers = wire::parse_head(head)?.headers;
    let body = wire::decode_body(&mut headers, body.to_vec())?;
    tokio::fs::write(path, &body).await?;
    info!("Wrote {} body bytes to {}", body.len(), path.display());

    let mut out = head.to_vec();
    out.extend_from_slice(b"\r\n\r\n");
    Ok(out)
}

impl Transport for SocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Socket
    }

    fn request<'a>(
        &'a self,
        request: &'a PreparedRequest,
        options: &'a Options,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        async move {
            match tokio::time::timeout(options.timeout, self.send(request, options)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout {
                    url: request.url.to_string(),
                    timeout: options.timeout,
                }),
            }
        }
        .boxed()
    }

    fn test(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().all(|capability| match capability {
            Capability::Ssl => tls::available(),
        })
    }
}
