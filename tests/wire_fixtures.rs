//! Wire-level behavior of the socket transport against canned responses.

mod helpers;

use std::io::Write;

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use reqwest::Method;

use helpers::RawServer;
use request_engine::{request, Headers, Options, RequestError, TransportChoice, TransportError};

fn socket_options() -> Options {
    Options {
        transport: Some(TransportChoice::Socket),
        ..Default::default()
    }
}

async fn get(url: &str) -> Result<request_engine::Response, RequestError> {
    request(url, Headers::new(), "", Method::GET, socket_options()).await
}

fn with_body(head: &str, body: &[u8]) -> Vec<u8> {
    let mut raw = head.as_bytes().to_vec();
    raw.extend_from_slice(body);
    raw
}

#[tokio::test]
async fn test_chunked_body_is_reassembled() {
    let server = RawServer::start(vec![
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n".to_vec(),
    ])
    .await;

    let response = get(&server.url("/wiki")).await.unwrap();
    assert_eq!(response.text(), "Wikipedia");
    assert!(!response.headers.contains("Transfer-Encoding"));
}

#[tokio::test]
async fn test_gzip_body_is_decompressed() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"compressed hello").unwrap();
    let server = RawServer::start(vec![with_body(
        "HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\n\r\n",
        &encoder.finish().unwrap(),
    )])
    .await;

    let response = get(&server.url("/gz")).await.unwrap();
    assert_eq!(response.text(), "compressed hello");
}

#[tokio::test]
async fn test_chunked_deflate_body() {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"deflated and chunked").unwrap();
    let compressed = encoder.finish().unwrap();
    let (first, second) = compressed.split_at(compressed.len() / 2);

    let mut framed = format!("{:x}\r\n", first.len()).into_bytes();
    framed.extend_from_slice(first);
    framed.extend_from_slice(format!("\r\n{:x}\r\n", second.len()).as_bytes());
    framed.extend_from_slice(second);
    framed.extend_from_slice(b"\r\n0\r\n\r\n");

    let server = RawServer::start(vec![with_body(
        "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nContent-Encoding: deflate\r\n\r\n",
        &framed,
    )])
    .await;

    let response = get(&server.url("/both")).await.unwrap();
    assert_eq!(response.text(), "deflated and chunked");
}

#[tokio::test]
async fn test_unknown_encoding_is_exposed_raw() {
    let server = RawServer::start(vec![
        b"HTTP/1.1 200 OK\r\nContent-Encoding: compress\r\n\r\n\x1f\x9dLZW".to_vec(),
    ])
    .await;

    let response = get(&server.url("/lzw")).await.unwrap();
    assert_eq!(response.body, b"\x1f\x9dLZW");
}

#[tokio::test]
async fn test_folded_and_padded_headers() {
    let server = RawServer::start(vec![
        b"HTTP/1.0 200 OK\r\nX-Folded: one\r\n two\r\nX-Spaced:   a    b  \r\n\r\nok".to_vec(),
    ])
    .await;

    let response = get(&server.url("/headers")).await.unwrap();
    assert_eq!(response.protocol_version.as_deref(), Some("1.0"));
    assert_eq!(response.headers.get("x-folded").as_deref(), Some("one two"));
    assert_eq!(response.headers.get("x-spaced").as_deref(), Some("a b"));
}

#[tokio::test]
async fn test_malformed_status_line_is_protocol_error() {
    let server = RawServer::start(vec![b"ICY 200 OK\r\n\r\nstream".to_vec()]).await;

    let err = get(&server.url("/radio")).await.unwrap_err();
    assert!(matches!(err, RequestError::Transport(TransportError::Protocol(_))));
}

#[tokio::test]
async fn test_missing_separator_is_protocol_error() {
    let server = RawServer::start(vec![b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n".to_vec()]).await;

    let err = get(&server.url("/cut")).await.unwrap_err();
    match err {
        RequestError::Transport(TransportError::Protocol(message)) => {
            assert!(message.contains("separator"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_truncated_chunk_is_protocol_error() {
    let server = RawServer::start(vec![
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n20\r\nonly a few bytes".to_vec(),
    ])
    .await;

    let err = get(&server.url("/truncated")).await.unwrap_err();
    assert!(matches!(err, RequestError::Transport(TransportError::Protocol(_))));
}

#[tokio::test]
async fn test_request_wire_format() {
    let server = RawServer::start(vec![b"HTTP/1.1 200 OK\r\n\r\n".to_vec()]).await;
    let mut headers = Headers::new();
    headers.append("X-First", "1");
    headers.append("x-second", "2");

    request(
        &server.url("/submit?a=b"),
        headers,
        "raw payload",
        Method::PUT,
        socket_options(),
    )
    .await
    .unwrap();

    let sent = &server.requests()[0];
    assert!(sent.starts_with("PUT /submit?a=b HTTP/1.0\r\n"));
    let first = sent.find("X-First: 1\r\n").unwrap();
    let second = sent.find("x-second: 2\r\n").unwrap();
    assert!(first < second);
    assert!(sent.contains("Content-Length: 11\r\n"));
    assert!(sent.contains("Connection: close\r\n"));
    assert!(sent.ends_with("\r\n\r\nraw payload"));
}

#[tokio::test]
async fn test_redirect_chain_over_raw_socket() {
    let server = RawServer::start(vec![
        b"HTTP/1.1 301 Moved Permanently\r\nLocation: /b\r\nSet-Cookie: step=1\r\n\r\n".to_vec(),
        b"HTTP/1.1 307 Temporary Redirect\r\nLocation: /c\r\nSet-Cookie: step=2\r\n\r\n".to_vec(),
        b"HTTP/1.1 200 OK\r\n\r\ndone".to_vec(),
    ])
    .await;

    let response = get(&server.url("/a")).await.unwrap();
    assert_eq!(response.text(), "done");
    let codes: Vec<u16> = response.history().iter().map(|r| r.status_code).collect();
    assert_eq!(codes, vec![301, 307]);

    let requests = server.requests();
    assert!(!requests[0].to_lowercase().contains("cookie:"));
    assert!(requests[1].contains("Cookie: step=1\r\n"));
    assert!(requests[2].contains("Cookie: step=2\r\n"));
}
