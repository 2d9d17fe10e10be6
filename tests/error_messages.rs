//! Error surface: which variant each failure produces, its message, and
//! whether it is reported as transient.

use std::time::Duration;

use reqwest::Method;
use tokio::net::TcpListener;

use request_engine::auth::BasicAuth;
use request_engine::proxy::Proxy;
use request_engine::{
    is_transient, request, Headers, LibraryErrorKind, Options, RequestError, TransportChoice,
    TransportError,
};

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_connection_refused_socket() {
    let port = closed_port().await;
    let options = Options {
        transport: Some(TransportChoice::Socket),
        ..Default::default()
    };
    let err = request(&format!("http://127.0.0.1:{}/", port), Headers::new(), "", Method::GET, options)
        .await
        .unwrap_err();

    match &err {
        RequestError::Transport(TransportError::Connect { host, port: p, .. }) => {
            assert_eq!(host, "127.0.0.1");
            assert_eq!(*p, port);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with(&format!("Failed to connect to 127.0.0.1:{}", port)));
    assert!(is_transient(&err));
}

#[tokio::test]
async fn test_connection_refused_library() {
    let port = closed_port().await;
    let options = Options {
        transport: Some(TransportChoice::Library),
        ..Default::default()
    };
    let err = request(&format!("http://127.0.0.1:{}/", port), Headers::new(), "", Method::GET, options)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RequestError::Transport(TransportError::Library {
            kind: LibraryErrorKind::Connect,
            ..
        })
    ));
    assert!(err.to_string().starts_with("Library transport error (connect)"));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    for transport in [TransportChoice::Library, TransportChoice::Socket] {
        let options = Options {
            timeout: Duration::from_millis(300),
            transport: Some(transport.clone()),
            ..Default::default()
        };
        let err = request(&format!("http://{}/slow", addr), Headers::new(), "", Method::GET, options)
            .await
            .unwrap_err();

        assert!(
            matches!(err, RequestError::Transport(TransportError::Timeout { .. })),
            "{:?}: {:?}",
            transport,
            err
        );
        assert!(err.to_string().contains("timed out after 0.3s"));
        assert!(is_transient(&err));
    }
}

#[tokio::test]
async fn test_invalid_url_is_rejected_before_io() {
    let err = request("not a url", Headers::new(), "", Method::GET, Options::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::Url(_)));
    assert!(err.to_string().starts_with("Invalid URL"));
    assert!(!is_transient(&err));

    let err = request("gopher://example.com/", Headers::new(), "", Method::GET, Options::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid argument `url`: only http and https are supported, got gopher"
    );
}

#[tokio::test]
async fn test_zero_timeout_is_rejected() {
    let options = Options {
        timeout: Duration::ZERO,
        ..Default::default()
    };
    let err = request("http://127.0.0.1:9/", Headers::new(), "", Method::GET, options)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid argument `timeout`: must be greater than zero");
}

#[test]
fn test_provider_arity_errors() {
    let err = Proxy::from_parts(&["proxy.local:3128", "user"]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid argument `proxy`: expected 1 or 3 elements, got 2");

    let err = Proxy::parse("proxy.local").unwrap_err();
    assert!(matches!(err, RequestError::InvalidArgument { argument: "proxy", .. }));

    let err = BasicAuth::from_parts(&["only-user"]).unwrap_err();
    assert!(matches!(err, RequestError::InvalidArgument { argument: "auth", .. }));
    assert!(!is_transient(&err));
}

#[test]
fn test_status_and_redirect_messages() {
    let err = RequestError::Status {
        code: 503,
        url: "http://example.com/".to_string(),
    };
    assert_eq!(err.to_string(), "HTTP status 503 for http://example.com/");
    assert_eq!(err.status(), Some(503));
    assert!(is_transient(&err));

    let err = RequestError::TooManyRedirects {
        limit: 10,
        url: "http://example.com/loop".to_string(),
        status: 302,
    };
    assert_eq!(
        err.to_string(),
        "Too many redirects (limit 10): http://example.com/loop answered 302"
    );
    assert!(!is_transient(&err));

    assert_eq!(RequestError::NoTransport.to_string(), "No working transports found");
    assert_eq!(RequestError::hook("stop").to_string(), "Hook callback failed: stop");
}
