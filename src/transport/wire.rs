//! HTTP/1.x wire codec.
//!
//! Request serialization for the socket transport, and the response-side
//! framing shared by both transports: head/body split, status line and
//! header parsing, chunked decoding, and content decompression.

use std::io::Read;
use std::sync::LazyLock;

use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use regex::Regex;
use url::Url;

use crate::config::ACCEPT_ENCODING;
use crate::error_handling::TransportError;
use crate::models::{apply_body_defaults, EncodedBody, Headers, PreparedRequest};

static STATUS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^HTTP/(1\.\d)[ \t]+(\d+)").expect("Failed to compile status line regex")
});

static FOLDED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]+").expect("Failed to compile header fold regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

const HEAD_SEPARATOR: &[u8] = b"\r\n\r\n";

/// Status line and headers of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponseHead {
    pub version: String,
    pub status: u16,
    pub headers: Headers,
}

/// Serializes one hop as an HTTP/1.0 request.
///
/// `Host`, `User-Agent`, `Accept-Encoding` and `Connection: close` are added
/// unless the caller set them. `absolute_target` selects the absolute-form
/// request target used when talking to a proxy.
pub(crate) fn build_request(
    request: &PreparedRequest,
    body: &EncodedBody,
    useragent: &str,
    absolute_target: bool,
) -> Vec<u8> {
    let target = if absolute_target {
        let mut url = request.url.clone();
        url.set_fragment(None);
        url.to_string()
    } else {
        request.target()
    };

    let mut headers = Headers::new();
    if !request.headers.contains("Host") {
        headers.append("Host", host_header(&request.url));
    }
    if !request.headers.contains("User-Agent") {
        headers.append("User-Agent", useragent);
    }
    if !request.headers.contains("Accept-Encoding") {
        headers.append("Accept-Encoding", ACCEPT_ENCODING);
    }
    for (name, value) in request.headers.iter() {
        headers.append(name, value);
    }
    if absolute_target && !headers.contains("Proxy-Authorization") {
        if let Some(authorization) = request.proxy.as_ref().and_then(|p| p.authorization()) {
            headers.append("Proxy-Authorization", authorization);
        }
    }
    apply_body_defaults(&request.method, &mut headers, body, true);
    if !headers.contains("Connection") {
        headers.append("Connection", "close");
    }

    let mut out = format!("{} {} HTTP/1.0\r\n{}\r\n", request.method, target, headers).into_bytes();
    out.extend_from_slice(&body.bytes);
    out
}

/// `Host` header value: the host, plus the port when it is not the
/// scheme's default.
pub(crate) fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// `host:port` with the port always present, as used by `CONNECT`.
pub(crate) fn authority(url: &Url, port: u16) -> String {
    format!("{}:{}", url.host_str().unwrap_or_default(), port)
}

/// Splits a raw response at the first blank line.
///
/// # Errors
///
/// Returns `TransportError::Protocol` when there is no blank line.
pub(crate) fn split_message(raw: &[u8]) -> Result<(&[u8], &[u8]), TransportError> {
    find(raw, HEAD_SEPARATOR)
        .map(|at| (&raw[..at], &raw[at + HEAD_SEPARATOR.len()..]))
        .ok_or_else(|| TransportError::protocol("Missing header/body separator"))
}

/// Parses the status line and headers.
///
/// Bare LF line endings are accepted, folded continuation lines are joined
/// with a space, and whitespace runs inside values collapse to one space.
/// Lines without a colon are ignored.
pub(crate) fn parse_head(head: &[u8]) -> Result<ResponseHead, TransportError> {
    let text = String::from_utf8_lossy(head).replace("\r\n", "\n");
    let text = FOLDED_LINE.replace_all(&text, " ");
    let mut lines = text.split('\n');

    let status_line = lines.next().unwrap_or_default().trim();
    let captures = STATUS_LINE.captures(status_line).ok_or_else(|| {
        TransportError::protocol(format!("Response could not be parsed: {:?}", status_line))
    })?;
    let status = captures[2]
        .parse::<u16>()
        .map_err(|_| TransportError::protocol(format!("Invalid status code in {:?}", status_line)))?;

    let mut headers = Headers::new();
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = WHITESPACE_RUN.replace_all(value.trim(), " ");
        headers.append(name.trim(), value);
    }

    Ok(ResponseHead {
        version: captures[1].to_string(),
        status,
        headers,
    })
}

/// Undoes the transfer and content codings announced in `headers`.
///
/// A chunked `Transfer-Encoding` header is removed once decoded; the
/// `Content-Encoding` header is kept for the caller to inspect.
pub(crate) fn decode_body(headers: &mut Headers, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
    let mut body = body;
    let chunked = headers
        .get("Transfer-Encoding")
        .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"));
    if chunked {
        body = decode_chunked(&body)?;
        headers.remove("Transfer-Encoding");
    }

    if body.is_empty() {
        return Ok(body);
    }
    if let Some(encoding) = headers.get("Content-Encoding") {
        // Codings are listed in the order they were applied
        for coding in encoding.rsplit(',') {
            body = decompress(body, coding);
        }
    }
    Ok(body)
}

/// Reassembles a `Transfer-Encoding: chunked` body.
///
/// Each chunk is a hex size line (extensions after `;` ignored), exactly
/// that many bytes, and a line break that is skipped without inspection.
/// A zero-size chunk ends the body; trailers are dropped.
///
/// # Errors
///
/// Returns `TransportError::Protocol` for an unparseable size line or a
/// chunk shorter than announced.
pub(crate) fn decode_chunked(data: &[u8]) -> Result<Vec<u8>, TransportError> {
    let mut decoded = Vec::with_capacity(data.len());
    let mut rest = data;

    loop {
        if rest.trim_ascii().is_empty() || rest.trim_ascii() == b"0" {
            return Ok(decoded);
        }

        let line_end = find(rest, b"\r\n")
            .ok_or_else(|| TransportError::protocol("Chunk size line is not terminated"))?;
        let line = String::from_utf8_lossy(&rest[..line_end]);
        let size_field = line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_field, 16).map_err(|_| {
            TransportError::protocol(format!("Invalid chunk size {:?}", size_field))
        })?;
        rest = &rest[line_end + 2..];

        if size == 0 {
            return Ok(decoded);
        }
        if rest.len() < size {
            return Err(TransportError::protocol(format!(
                "Chunk of {} bytes truncated to {}",
                size,
                rest.len()
            )));
        }
        decoded.extend_from_slice(&rest[..size]);
        rest = &rest[(size + 2).min(rest.len())..];
    }
}

/// Decompresses a body for one content coding.
///
/// Unknown codings, `compress` included, and bodies that fail to decode are
/// returned unchanged.
pub(crate) fn decompress(body: Vec<u8>, coding: &str) -> Vec<u8> {
    let coding = coding.trim().to_ascii_lowercase();
    let decoded = match coding.as_str() {
        "gzip" | "x-gzip" => read_all(MultiGzDecoder::new(body.as_slice())),
        // Servers disagree on whether deflate means zlib-wrapped or raw
        "deflate" => read_all(ZlibDecoder::new(body.as_slice()))
            .or_else(|_| read_all(DeflateDecoder::new(body.as_slice()))),
        "" | "identity" => return body,
        other => {
            log::debug!("No decoder for content coding {:?}; body left encoded", other);
            return body;
        }
    };

    match decoded {
        Ok(decoded) => decoded,
        Err(e) => {
            log::warn!("Failed to decode {} body ({} bytes): {}", coding, body.len(), e);
            body
        }
    }
}

fn read_all(mut reader: impl Read) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
