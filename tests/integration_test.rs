//! End-to-end tests driving the public API against httptest servers.
//!
//! Every scenario runs over both built-in transports: the outcome must not
//! depend on which one carried the bytes.

use std::sync::{Arc, Mutex};

use httptest::matchers::*;
use httptest::responders::*;
use httptest::{all_of, Expectation, Server};
use reqwest::Method;

use request_engine::auth::BasicAuth;
use request_engine::cookie::CookieJar;
use request_engine::hooks::{Hook, Hooks};
use request_engine::{
    execute, request, request_multiple, Body, Headers, Options, RequestDescriptor, RequestError,
    TransportChoice,
};

fn transports() -> [TransportChoice; 2] {
    [TransportChoice::Library, TransportChoice::Socket]
}

fn options_for(transport: TransportChoice) -> Options {
    Options {
        transport: Some(transport),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_redirect_with_cookie_end_to_end() {
    for transport in transports() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/login")).respond_with(
                status_code(302)
                    .insert_header("Location", "/home")
                    .insert_header("Set-Cookie", "sid=abc; Path=/"),
            ),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/home"),
                request::headers(contains(("cookie", "sid=abc"))),
            ])
            .respond_with(status_code(200).body("welcome")),
        );

        let response = request(
            &server.url("/login").to_string(),
            Headers::new(),
            "",
            Method::GET,
            options_for(transport.clone()),
        )
        .await
        .unwrap_or_else(|e| panic!("{:?} transport failed: {}", transport, e));

        assert_eq!(response.status_code, 200, "{:?}", transport);
        assert_eq!(response.text(), "welcome");
        let history = response.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status_code, 302);
        assert_eq!(response.cookies.get("sid").unwrap().value, "abc");
    }
}

#[tokio::test]
async fn test_redirect_limit_end_to_end() {
    for transport in transports() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/loop"))
                .times(2)
                .respond_with(status_code(302).insert_header("Location", "/loop")),
        );

        let options = Options {
            redirects: 1,
            ..options_for(transport)
        };
        let err = request(&server.url("/loop").to_string(), Headers::new(), "", Method::GET, options)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::TooManyRedirects { limit: 1, status: 302, .. }));
        // Dropping the server verifies exactly two hops were made
    }
}

#[tokio::test]
async fn test_post_form_and_see_other() {
    for transport in transports() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/submit"),
                request::headers(contains(("content-type", "application/x-www-form-urlencoded; charset=UTF-8"))),
                request::body("name=Ada+Lovelace&lang=en"),
            ])
            .respond_with(status_code(303).insert_header("Location", "/thanks")),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/thanks"))
                .respond_with(status_code(200).body("thanks")),
        );

        let body = Body::Form(vec![
            ("name".to_string(), "Ada Lovelace".to_string()),
            ("lang".to_string(), "en".to_string()),
        ]);
        let response = request(
            &server.url("/submit").to_string(),
            Headers::new(),
            body,
            Method::POST,
            options_for(transport),
        )
        .await
        .unwrap();
        assert_eq!(response.text(), "thanks");
        assert_eq!(response.redirects, 1);
    }
}

#[tokio::test]
async fn test_get_form_moves_to_query() {
    for transport in transports() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/search"),
                request::query(url_decoded(contains(("q", "rust lang")))),
                request::query(url_decoded(contains(("page", "2")))),
            ])
            .respond_with(status_code(200)),
        );

        let body = Body::Form(vec![("q".to_string(), "rust lang".to_string())]);
        let response = request(
            &server.url("/search?page=2").to_string(),
            Headers::new(),
            body,
            Method::GET,
            options_for(transport),
        )
        .await
        .unwrap();
        assert!(response.success);
    }
}

#[tokio::test]
async fn test_basic_auth_and_custom_headers() {
    for transport in transports() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/private"),
                request::headers(contains(("authorization", "Basic dXNlcjpwYXNz"))),
                request::headers(contains(("x-request-id", "42"))),
                request::headers(contains(("user-agent", "engine-test/1.0"))),
            ])
            .respond_with(status_code(204)),
        );

        let options = Options {
            auth: Some(Arc::new(BasicAuth::new("user", "pass"))),
            useragent: "engine-test/1.0".to_string(),
            ..options_for(transport)
        };
        let headers: Headers = [("X-Request-Id", "42")].into_iter().collect();
        let response = request(&server.url("/private").to_string(), headers, "", Method::GET, options)
            .await
            .unwrap();
        assert_eq!(response.status_code, 204);
    }
}

#[tokio::test]
async fn test_download_to_file() {
    for transport in transports() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/report.csv"))
                .respond_with(status_code(200).body("a,b\n1,2\n")),
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let options = Options {
            filename: Some(path.clone()),
            ..options_for(transport)
        };
        let response = request(&server.url("/report.csv").to_string(), Headers::new(), "", Method::GET, options)
            .await
            .unwrap();
        assert!(response.success);
        assert!(response.body.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n1,2\n");
    }
}

#[tokio::test]
async fn test_error_for_status() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/missing")).respond_with(status_code(404)),
    );

    let response = request(
        &server.url("/missing").to_string(),
        Headers::new(),
        "",
        Method::GET,
        Options::default(),
    )
    .await
    .unwrap();
    let err = response.error_for_status(false).unwrap_err();
    assert!(matches!(err, RequestError::Status { code: 404, .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_session_jar_across_calls() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/set"))
            .respond_with(status_code(200).insert_header("Set-Cookie", "theme=dark; Max-Age=3600")),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/get"),
            request::headers(contains(("cookie", "lang=en; theme=dark"))),
        ])
        .respond_with(status_code(200)),
    );

    let mut jar = CookieJar::from_raw([("lang", "en")]);
    execute(&RequestDescriptor::get(server.url("/set").to_string()), Options::default(), &mut jar)
        .await
        .unwrap();
    let response = execute(&RequestDescriptor::get(server.url("/get").to_string()), Options::default(), &mut jar)
        .await
        .unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(jar.len(), 2);
}

#[tokio::test]
async fn test_shared_hooks_across_request_multiple() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method("GET"))
            .times(3)
            .respond_with(status_code(200)),
    );

    let sent = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = Hooks::new();
    let recorder = sent.clone();
    hooks.register(
        Hook::BeforeSend,
        move |ctx| {
            recorder.lock().unwrap().push(ctx.request.url.path().to_string());
            Ok(())
        },
        0,
    );

    let requests = ["/one", "/two", "/three"]
        .iter()
        .map(|path| (path.to_string(), RequestDescriptor::get(server.url(path).to_string())))
        .collect();
    let options = Options {
        hooks: Some(hooks),
        ..Default::default()
    };

    let results = request_multiple(requests, options).await;
    assert_eq!(results.len(), 3);
    for (id, result) in &results {
        assert_eq!(result.as_ref().unwrap().url.path(), id);
    }
    let mut paths = sent.lock().unwrap().clone();
    paths.sort();
    assert_eq!(paths, vec!["/one", "/three", "/two"]);
}
