//! Cookie jar.

use chrono::Utc;

use crate::cookie::Cookie;
use crate::hooks::{Hook, Hooks};
use crate::models::{PreparedRequest, Response};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Parsed(Cookie),
    /// Seeded as a plain value; parsed on first use
    Raw(String),
}

impl Entry {
    fn cookie(&self, name: &str) -> Cookie {
        match self {
            Entry::Parsed(cookie) => cookie.clone(),
            Entry::Raw(value) => Cookie::parse(value, Some(name), None),
        }
    }
}

/// Session cookie store.
///
/// Names are unique. Insertion order only affects the order of pairs in the
/// outgoing `Cookie` header. The jar is not synchronized: concurrent
/// requests get their own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: Vec<(String, Entry)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a jar from plain `name -> value` pairs.
    ///
    /// Values are kept as-is and parsed lazily into host-unrestricted cookies.
    pub fn from_raw<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut jar = Self::new();
        for (name, value) in pairs {
            jar.set(name.into(), Entry::Raw(value.into()));
        }
        jar
    }

    /// Stores `cookie` under its name, replacing any cookie with that name.
    pub fn insert(&mut self, cookie: Cookie) {
        self.set(cookie.name.clone(), Entry::Parsed(cookie));
    }

    /// The cookie stored under `name`.
    pub fn get(&self, name: &str) -> Option<Cookie> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(n, entry)| entry.cookie(n))
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        before != self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every stored cookie, in insertion order.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.entries.iter().map(|(n, entry)| entry.cookie(n)).collect()
    }

    /// Unexpired cookies whose domain matches `host`.
    pub fn matching(&self, host: &str) -> Vec<Cookie> {
        let now = Utc::now();
        self.cookies()
            .into_iter()
            .filter(|cookie| !cookie.is_expired_at(now) && cookie.domain_matches(host))
            .collect()
    }

    /// Merges freshly parsed cookies; a cookie replaces the stored one with
    /// the same name in place.
    pub fn merge(&mut self, cookies: Vec<Cookie>) {
        for cookie in cookies {
            self.insert(cookie);
        }
    }

    /// `Cookie` header value for `host`, or `None` when nothing matches.
    pub fn format_header(&self, host: &str) -> Option<String> {
        let pairs: Vec<String> = self
            .matching(host)
            .iter()
            .map(Cookie::format_for_header)
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// Wires the jar into the hook bus.
    ///
    /// `BeforeRequest` attaches the `Cookie` header; `BeforeRedirectCheck`
    /// captures `Set-Cookie` headers. Both act on the jar carried by the
    /// hook context.
    pub fn register(hooks: &mut Hooks) {
        hooks.register(
            Hook::BeforeRequest,
            |ctx| {
                ctx.cookies.before_request(ctx.request);
                Ok(())
            },
            0,
        );
        hooks.register(
            Hook::BeforeRedirectCheck,
            |ctx| {
                if let Some(response) = ctx.response.as_deref_mut() {
                    ctx.cookies.before_redirect_check(response);
                }
                Ok(())
            },
            0,
        );
    }

    /// Sets the `Cookie` header of `request` from the matching cookies.
    pub fn before_request(&self, request: &mut PreparedRequest) {
        let host = request.url.host_str().unwrap_or_default();
        if let Some(header) = self.format_header(host) {
            request.headers.insert("Cookie", header);
        }
    }

    /// Captures the response's cookies and attaches the jar to it.
    pub fn before_redirect_check(&mut self, response: &mut Response) {
        let cookies = Cookie::parse_from_headers(&response.headers, &response.url, None);
        if !cookies.is_empty() {
            log::debug!("Captured {} cookie(s) from {}", cookies.len(), response.url);
            self.merge(cookies);
        }
        response.cookies = self.clone();
    }

    fn set(&mut self, name: String, entry: Entry) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = entry,
            None => self.entries.push((name, entry)),
        }
    }
}
