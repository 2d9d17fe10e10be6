//! Redirect policy.
//!
//! Decides whether a parsed response leads to another hop and where that hop
//! goes. Redirects are always followed here, never inside a transport.

use reqwest::Method;
use url::Url;

use crate::config::{Options, HTTP_STATUS_SEE_OTHER};
use crate::error_handling::RequestError;
use crate::models::{is_redirect_status, Response};

/// The next hop of a redirect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Redirect {
    pub location: Url,
    pub method: Method,
    /// Whether the caller's body is dropped for the next hop
    pub drop_body: bool,
}

/// Parses a request or redirect URL, accepting only `http` and `https`.
pub(crate) fn parse_target(target: &str, base: Option<&Url>) -> Result<Url, RequestError> {
    let url = match base {
        Some(base) => base.join(target)?,
        None => Url::parse(target)?,
    };
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(RequestError::invalid(
            "url",
            format!("only http and https are supported, got {}", scheme),
        )),
    }
}

/// Decides whether `response` is followed.
///
/// A followable status with redirects enabled is followed while `redirected`
/// is below the limit, provided a `Location` header is present. 303 turns
/// the next hop into a body-less GET (HEAD stays HEAD).
///
/// # Errors
///
/// Returns `RequestError::TooManyRedirects` when the server redirects again
/// after the limit was reached, and a URL error for an unusable `Location`.
pub(crate) fn next_hop(
    response: &Response,
    options: &Options,
    redirected: u32,
    method: &Method,
) -> Result<Option<Redirect>, RequestError> {
    if !options.follow_redirects || !is_redirect_status(response.status_code) {
        return Ok(None);
    }

    if redirected >= options.redirects {
        return Err(RequestError::TooManyRedirects {
            limit: options.redirects,
            url: response.url.to_string(),
            status: response.status_code,
        });
    }

    let Some(location) = response.headers.get_all("Location").first().copied() else {
        log::warn!(
            "Redirect status {} for {} but no Location header",
            response.status_code,
            response.url
        );
        return Ok(None);
    };

    let location = parse_target(location, Some(&response.url))?;
    let see_other = response.status_code == HTTP_STATUS_SEE_OTHER && *method != Method::HEAD;
    Ok(Some(Redirect {
        location,
        method: if see_other { Method::GET } else { method.clone() },
        drop_body: see_other,
    }))
}
