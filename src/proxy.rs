//! HTTP proxy provider.
//!
//! A `Proxy` registers a `BeforeSend` callback that routes every hop through
//! the proxy. The library transport hands the route to reqwest; the socket
//! transport connects to the proxy itself, using an absolute-form request
//! target for `http` and a `CONNECT` tunnel for `https`.

use base64::prelude::{Engine as _, BASE64_STANDARD};

use crate::error_handling::RequestError;
use crate::hooks::{Hook, Hooks};

/// An HTTP proxy, optionally with Basic credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    credentials: Option<(String, String)>,
}

impl Proxy {
    /// Parses a `host:port` descriptor.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::InvalidArgument` if the port is missing or
    /// invalid.
    pub fn parse(descriptor: &str) -> Result<Self, RequestError> {
        let descriptor = descriptor.trim();
        let (host, port) = descriptor
            .rsplit_once(':')
            .filter(|(host, _)| !host.is_empty())
            .ok_or_else(|| {
                RequestError::invalid("proxy", format!("expected host:port, got {:?}", descriptor))
            })?;
        let port = port.parse::<u16>().map_err(|_| {
            RequestError::invalid("proxy", format!("invalid port in {:?}", descriptor))
        })?;

        Ok(Self {
            host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
            port,
            credentials: None,
        })
    }

    /// Builds a proxy from `[host:port]` or `[host:port, user, pass]`.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::InvalidArgument` for any other number of parts.
    pub fn from_parts(parts: &[&str]) -> Result<Self, RequestError> {
        match parts {
            [descriptor] => Self::parse(descriptor),
            [descriptor, user, pass] => {
                let mut proxy = Self::parse(descriptor)?;
                proxy.credentials = Some((user.to_string(), pass.to_string()));
                Ok(proxy)
            }
            _ => Err(RequestError::invalid(
                "proxy",
                format!("expected 1 or 3 elements, got {}", parts.len()),
            )),
        }
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(user, pass)| (user.as_str(), pass.as_str()))
    }

    /// `http://host:port`, the form reqwest expects.
    pub fn url(&self) -> String {
        if self.host.contains(':') {
            format!("http://[{}]:{}", self.host, self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }

    /// `Proxy-Authorization` value when credentials are set.
    pub fn authorization(&self) -> Option<String> {
        self.credentials.as_ref().map(|(user, pass)| {
            format!("Basic {}", BASE64_STANDARD.encode(format!("{}:{}", user, pass)))
        })
    }

    /// Routes every hop through this proxy.
    pub fn register(&self, hooks: &mut Hooks) {
        let route = self.clone();
        hooks.register(
            Hook::BeforeSend,
            move |ctx| {
                ctx.request.proxy = Some(route.clone());
                Ok(())
            },
            0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let proxy = Proxy::parse("proxy.local:3128").unwrap();
        assert_eq!(proxy.host, "proxy.local");
        assert_eq!(proxy.port, 3128);
        assert!(proxy.credentials().is_none());
        assert_eq!(proxy.url(), "http://proxy.local:3128");
    }

    #[test]
    fn test_parse_ipv6() {
        let proxy = Proxy::parse("[::1]:8080").unwrap();
        assert_eq!(proxy.host, "::1");
        assert_eq!(proxy.url(), "http://[::1]:8080");
    }

    #[test]
    fn test_parse_rejects_missing_port() {
        assert!(Proxy::parse("proxy.local").is_err());
        assert!(Proxy::parse("proxy.local:http").is_err());
        assert!(Proxy::parse(":8080").is_err());
    }

    #[test]
    fn test_from_parts() {
        let proxy = Proxy::from_parts(&["127.0.0.1:8080"]).unwrap();
        assert!(proxy.authorization().is_none());

        let proxy = Proxy::from_parts(&["127.0.0.1:8080", "user", "pass"]).unwrap();
        assert_eq!(proxy.credentials(), Some(("user", "pass")));
        assert_eq!(proxy.authorization().as_deref(), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn test_from_parts_bad_arity() {
        for parts in [&[][..], &["a:1", "user"][..], &["a:1", "u", "p", "x"][..]] {
            let err = Proxy::from_parts(parts).unwrap_err();
            assert!(matches!(err, RequestError::InvalidArgument { argument: "proxy", .. }));
        }
    }
}
