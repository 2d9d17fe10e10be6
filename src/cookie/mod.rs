//! Cookies (RFC 6265).
//!
//! This module provides:
//! - `Cookie`: parsing of `Set-Cookie` values, expiry, domain/path matching
//! - `CookieJar`: the per-session store wired into the hook bus
//!
//! Attribute values are normalized once, when the cookie is built: expiry
//! dates become timestamps, `Max-Age` becomes an absolute expiry relative to
//! the cookie's reference time, and a leading dot is stripped from `Domain`.

mod jar;

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use regex::Regex;
use url::Url;

use crate::models::Headers;

pub use jar::CookieJar;

static MAX_AGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("Failed to compile max-age regex"));

/// Host names ending in a dotted quad, e.g. `a.192.168.0.1`.
static IPV4_SUFFIX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+\.)\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("Failed to compile IPv4 regex")
});

/// Expiry derived from a `Max-Age` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Non-positive `Max-Age`: expired regardless of the clock
    Immediately,
    At(DateTime<Utc>),
}

/// Normalized cookie attributes.
///
/// Invalid values are dropped at parse time, so a field is `None` both when
/// the server omitted the attribute and when it sent garbage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieAttributes {
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub max_age: Option<Expiry>,
    pub secure: bool,
    pub http_only: bool,
    /// Unrecognized attributes in arrival order; `None` for bare flags
    pub extensions: Vec<(String, Option<String>)>,
}

/// Bookkeeping flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieFlags {
    pub creation: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub persistent: bool,
    /// Domain was inferred from the request origin; only exact host matches
    pub host_only: bool,
}

impl CookieFlags {
    fn at(time: DateTime<Utc>) -> Self {
        Self {
            creation: time,
            last_access: time,
            persistent: false,
            host_only: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub attributes: CookieAttributes,
    pub flags: CookieFlags,
    /// Time all relative computations (`Max-Age`, `is_expired`) use
    pub reference_time: DateTime<Utc>,
}

impl Cookie {
    /// Creates a cookie with no attributes, referenced to the current time.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            value: value.into(),
            attributes: CookieAttributes::default(),
            flags: CookieFlags::at(now),
            reference_time: now,
        }
    }

    /// Parses a `Set-Cookie` header value.
    ///
    /// The first `;`-separated segment is the `name=value` pair. A segment
    /// without `=` is taken as the value of a cookie with an empty name, the
    /// way browsers treat servers that send bare values. When `name_hint` is
    /// given, the whole first segment is the value and the hint is the name.
    ///
    /// Remaining segments are attributes; names are case-insensitive and a
    /// segment without `=` is a flag.
    ///
    /// # Arguments
    ///
    /// * `header` - The header value
    /// * `name_hint` - Name to use instead of parsing one
    /// * `reference_time` - Time `Max-Age` is relative to; now when absent
    pub fn parse(header: &str, name_hint: Option<&str>, reference_time: Option<DateTime<Utc>>) -> Self {
        let reference_time = reference_time.unwrap_or_else(Utc::now);
        let mut parts = header.split(';');
        let pair = parts.next().unwrap_or_default();

        let (name, value) = match name_hint.filter(|n| !n.is_empty()) {
            Some(hint) => (hint, pair),
            None => match pair.split_once('=') {
                Some((name, value)) => (name, value),
                None => ("", pair),
            },
        };

        let mut attributes = CookieAttributes::default();
        for part in parts {
            let (key, value) = match part.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (part.trim(), None),
            };
            apply_attribute(&mut attributes, key, value, reference_time);
        }

        Self {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
            attributes,
            flags: CookieFlags::at(reference_time),
            reference_time,
        }
    }

    /// Parses every `Set-Cookie` header of a response.
    ///
    /// Missing `Domain` defaults to the origin host and marks the cookie
    /// host-only; a missing or relative `Path` defaults to the origin's
    /// default-path (RFC 6265 section 5.1.4). Cookies whose domain does not
    /// match the origin host are dropped. Later cookies replace earlier ones
    /// with the same name.
    pub fn parse_from_headers(
        headers: &Headers,
        origin: &Url,
        reference_time: Option<DateTime<Utc>>,
    ) -> Vec<Cookie> {
        let host = origin.host_str().unwrap_or_default();
        let mut cookies: Vec<Cookie> = Vec::new();

        for header in headers.get_all("Set-Cookie") {
            let mut cookie = Cookie::parse(header, None, reference_time);

            if cookie.attributes.domain.is_none() {
                cookie.attributes.domain = Some(host.to_string());
                cookie.flags.host_only = true;
            } else {
                cookie.flags.host_only = false;
            }

            let path_is_valid = cookie
                .attributes
                .path
                .as_deref()
                .is_some_and(|p| p.starts_with('/'));
            if !path_is_valid {
                cookie.attributes.path = Some(default_path(origin.path()));
            }

            if !cookie.domain_matches(host) {
                log::debug!(
                    "Rejecting cookie {:?} for domain {:?} from {}",
                    cookie.name,
                    cookie.attributes.domain,
                    host
                );
                continue;
            }

            match cookies.iter_mut().find(|c| c.name == cookie.name) {
                Some(existing) => *existing = cookie,
                None => cookies.push(cookie),
            }
        }

        cookies
    }

    /// Whether the cookie is expired at its reference time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(self.reference_time)
    }

    /// Whether the cookie is expired at `time`.
    ///
    /// `Max-Age` takes precedence over `Expires` (RFC 6265 section 4.1.2.2).
    /// A cookie with neither never expires.
    pub fn is_expired_at(&self, time: DateTime<Utc>) -> bool {
        match (self.attributes.max_age, self.attributes.expires) {
            (Some(Expiry::Immediately), _) => true,
            (Some(Expiry::At(expiry)), _) => expiry < time,
            (None, Some(expires)) => expires < time,
            (None, None) => false,
        }
    }

    /// Domain-match (RFC 6265 section 5.1.3).
    pub fn domain_matches(&self, domain: &str) -> bool {
        let Some(cookie_domain) = self.attributes.domain.as_deref() else {
            // Built by hand; cookies parsed from a response always carry a domain
            return true;
        };

        if cookie_domain == domain {
            return true;
        }
        if self.flags.host_only {
            return false;
        }
        if domain.len() <= cookie_domain.len() || !domain.ends_with(cookie_domain) {
            return false;
        }

        let prefix = &domain[..domain.len() - cookie_domain.len()];
        if !prefix.ends_with('.') {
            return false;
        }

        // Host names only, never IP addresses
        !IPV4_SUFFIX_PATTERN.is_match(domain) && domain.parse::<Ipv4Addr>().is_err()
    }

    /// Path-match (RFC 6265 section 5.1.4).
    pub fn path_matches(&self, request_path: &str) -> bool {
        let request_path = if request_path.is_empty() { "/" } else { request_path };
        let Some(cookie_path) = self.attributes.path.as_deref() else {
            return true;
        };

        if cookie_path == request_path {
            return true;
        }

        if request_path.len() > cookie_path.len() && request_path.starts_with(cookie_path) {
            return cookie_path.ends_with('/')
                || request_path.as_bytes()[cookie_path.len()] == b'/';
        }

        false
    }

    /// Domain, path and `Secure` checks combined.
    pub fn uri_matches(&self, url: &Url) -> bool {
        self.domain_matches(url.host_str().unwrap_or_default())
            && self.path_matches(url.path())
            && (!self.attributes.secure || url.scheme() == "https")
    }

    /// `name=value` as sent in a `Cookie` request header.
    pub fn format_for_header(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// The cookie rendered back to `Set-Cookie` syntax.
    pub fn format_for_set_cookie(&self) -> String {
        let mut parts = vec![self.format_for_header()];
        let attrs = &self.attributes;

        if let Some(path) = &attrs.path {
            parts.push(format!("path={}", path));
        }
        if let Some(domain) = &attrs.domain {
            parts.push(format!("domain={}", domain));
        }
        if let Some(expires) = attrs.expires {
            parts.push(format!("expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT")));
        }
        match attrs.max_age {
            Some(Expiry::Immediately) => parts.push("max-age=0".to_string()),
            Some(Expiry::At(expiry)) => parts.push(format!(
                "max-age={}",
                (expiry - self.reference_time).num_seconds().max(0)
            )),
            None => {}
        }
        if attrs.secure {
            parts.push("secure".to_string());
        }
        if attrs.http_only {
            parts.push("httponly".to_string());
        }
        for (key, value) in &attrs.extensions {
            match value {
                Some(value) => parts.push(format!("{}={}", key, value)),
                None => parts.push(key.clone()),
            }
        }

        parts.join("; ")
    }
}

fn apply_attribute(
    attributes: &mut CookieAttributes,
    key: &str,
    value: Option<&str>,
    reference_time: DateTime<Utc>,
) {
    match key.to_ascii_lowercase().as_str() {
        "expires" => attributes.expires = value.and_then(parse_cookie_date),
        "max-age" => attributes.max_age = value.and_then(|v| parse_max_age(v, reference_time)),
        "domain" => {
            attributes.domain = value
                .map(|v| v.strip_prefix('.').unwrap_or(v))
                .filter(|v| !v.is_empty())
                .map(str::to_string);
        }
        "path" => attributes.path = value.map(str::to_string),
        "secure" => attributes.secure = true,
        "httponly" => attributes.http_only = true,
        _ => {
            match attributes
                .extensions
                .iter_mut()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
            {
                Some(existing) => existing.1 = value.map(str::to_string),
                None => attributes
                    .extensions
                    .push((key.to_string(), value.map(str::to_string))),
            }
        }
    }
}

fn parse_max_age(value: &str, reference_time: DateTime<Utc>) -> Option<Expiry> {
    if !MAX_AGE_PATTERN.is_match(value) {
        return None;
    }
    if value.starts_with('-') || value.trim_start_matches('0').is_empty() {
        return Some(Expiry::Immediately);
    }

    // Digits only at this point; overflow means "practically forever"
    let expiry = value
        .parse::<i64>()
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| reference_time.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    Some(Expiry::At(expiry))
}

/// Parses cookie dates in the RFC 1123, RFC 850 and asctime forms.
pub(crate) fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    // Two-digit years first: a four-digit pattern would read "94" as year 94
    const FORMATS: [&str; 4] = [
        "%A, %d-%b-%y %H:%M:%S GMT",
        "%a, %d-%b-%Y %H:%M:%S GMT",
        "%a, %d %b %Y %H:%M:%S GMT",
        "%a %b %e %H:%M:%S %Y",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Default-path of a request path (RFC 6265 section 5.1.4).
fn default_path(uri_path: &str) -> String {
    if !uri_path.starts_with('/') || uri_path.matches('/').count() == 1 {
        return "/".to_string();
    }
    match uri_path.rfind('/') {
        Some(index) => uri_path[..index].to_string(),
        None => "/".to_string(),
    }
}
