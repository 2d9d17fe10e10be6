//! Request descriptors.

use reqwest::Method;
use url::Url;

use crate::models::{Body, Headers};
use crate::proxy::Proxy;

/// A logical request as submitted by the caller.
///
/// The descriptor is never mutated by the pipeline: every hop (the initial
/// attempt and each redirect) starts from a fresh `PreparedRequest` built
/// from it.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: String,
    pub headers: Headers,
    pub body: Body,
    pub method: Method,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Headers::new(),
            body: Body::Empty,
            method,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }
}

/// One hop as handed to a transport.
///
/// Hooks may mutate every field up to and including `BeforeSend`.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Body,
    /// Route installed by a proxy hook
    pub proxy: Option<Proxy>,
}

impl PreparedRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: Body::Empty,
            proxy: None,
        }
    }

    /// Builds a hop for `url` from the caller's headers and body.
    ///
    /// For GET, HEAD and DELETE the body is moved into the query string.
    pub(crate) fn for_hop(method: Method, mut url: Url, headers: &Headers, body: &Body) -> Self {
        let mut body = body.clone();
        if crate::models::body::sends_data_in_query(&method) {
            if let Some(data) = body.query_string().filter(|d| !d.is_empty()) {
                let query = match url.query() {
                    Some(existing) if !existing.is_empty() => format!("{}&{}", existing, data),
                    _ => data,
                };
                url.set_query(Some(&query));
            }
            if !matches!(body, Body::File(_)) {
                body = Body::Empty;
            }
        }

        Self {
            method,
            url,
            headers: headers.clone(),
            body,
            proxy: None,
        }
    }

    /// Request target in origin form: path plus query.
    pub fn target(&self) -> String {
        let path = match self.url.path() {
            "" => "/",
            path => path,
        };
        match self.url.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        }
    }
}
