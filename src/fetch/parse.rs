//! Raw response parsing.

use url::Url;

use crate::cookie::CookieJar;
use crate::error_handling::TransportError;
use crate::models::Response;
use crate::transport::wire::{self, ResponseHead};

/// Turns the raw bytes of one hop into a `Response`.
///
/// Chunked framing and content codings are undone here, so both transports
/// may hand back bytes exactly as they came off the wire.
///
/// # Errors
///
/// Returns `TransportError::Protocol` if the head/body separator is missing,
/// the status line cannot be parsed, or chunked framing is malformed.
pub(crate) fn parse_response(raw: Vec<u8>, url: Url, redirects: u32) -> Result<Response, TransportError> {
    let (head, body) = {
        let (head, body) = wire::split_message(&raw)?;
        (wire::parse_head(head)?, body.to_vec())
    };
    let ResponseHead {
        version,
        status,
        mut headers,
    } = head;
    let body = wire::decode_body(&mut headers, body)?;

    Ok(Response {
        status_code: status,
        protocol_version: Some(version),
        headers,
        body,
        raw,
        success: (200..300).contains(&status),
        redirects,
        url,
        previous: None,
        cookies: CookieJar::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://example.com/page").unwrap()
    }

    #[test]
    fn test_parse_response_basic() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello".to_vec();
        let response = parse_response(raw.clone(), url(), 2).unwrap();
        assert_eq!(response.status_code, 200);
        assert!(response.success);
        assert_eq!(response.protocol_version.as_deref(), Some("1.1"));
        assert_eq!(response.headers.get("content-type").as_deref(), Some("text/plain"));
        assert_eq!(response.text(), "hello");
        assert_eq!(response.raw, raw);
        assert_eq!(response.redirects, 2);
        assert_eq!(response.url, url());
    }

    #[test]
    fn test_parse_response_chunked() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n".to_vec();
        let response = parse_response(raw, url(), 0).unwrap();
        assert_eq!(response.body, b"Wikipedia");
        assert!(!response.headers.contains("transfer-encoding"));
    }

    #[test]
    fn test_parse_response_non_success() {
        let response = parse_response(b"HTTP/1.0 404 Not Found\r\n\r\n".to_vec(), url(), 0).unwrap();
        assert_eq!(response.status_code, 404);
        assert!(!response.success);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_parse_response_protocol_errors() {
        let missing_separator = parse_response(b"HTTP/1.1 200 OK\r\nA: b\r\n".to_vec(), url(), 0);
        assert!(matches!(missing_separator, Err(TransportError::Protocol(_))));

        let bad_status = parse_response(b"garbage\r\n\r\nbody".to_vec(), url(), 0);
        assert!(matches!(bad_status, Err(TransportError::Protocol(_))));
    }
}
