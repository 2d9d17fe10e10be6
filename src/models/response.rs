//! Normalized responses.

use url::Url;

use crate::cookie::CookieJar;
use crate::error_handling::RequestError;
use crate::models::Headers;

/// Response of one hop.
///
/// Redirect hops form an immutable chain: each response owns the response
/// that redirected to it through `previous`.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code; 0 when nothing was read (non-blocking mode)
    pub status_code: u16,
    /// HTTP version from the status line, e.g. `1.1`
    pub protocol_version: Option<String>,
    pub headers: Headers,
    /// Decoded body (empty when streamed to a download sink)
    pub body: Vec<u8>,
    /// Raw wire bytes as returned by the transport
    pub raw: Vec<u8>,
    /// Whether the status is 2xx
    pub success: bool,
    /// Number of redirects followed before this response
    pub redirects: u32,
    /// URL this response was fetched from
    pub url: Url,
    /// Response that redirected to this one
    pub previous: Option<Box<Response>>,
    /// Jar in effect when the response was produced
    pub cookies: CookieJar,
}

impl Response {
    /// An empty response for `url`, as produced by a non-blocking request.
    pub fn empty(url: Url) -> Self {
        Self {
            status_code: 0,
            protocol_version: None,
            headers: Headers::new(),
            body: Vec::new(),
            raw: Vec::new(),
            success: false,
            redirects: 0,
            url,
            previous: None,
            cookies: CookieJar::new(),
        }
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Followed redirect responses, oldest first.
    ///
    /// Empty for a response that was not reached through a redirect.
    pub fn history(&self) -> Vec<&Response> {
        let mut chain = Vec::new();
        let mut current = self.previous.as_deref();
        while let Some(response) = current {
            chain.push(response);
            current = response.previous.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Whether the status is one the pipeline follows.
    ///
    /// 304, 305 and 306 are redirect-class codes that are never followed.
    pub fn is_redirect(&self) -> bool {
        is_redirect_status(self.status_code)
    }

    /// Rejects non-success responses.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Status` when the response is a redirect and
    /// `allow_redirects` is false, or when the status is not 2xx.
    pub fn error_for_status(&self, allow_redirects: bool) -> Result<&Self, RequestError> {
        if self.is_redirect() {
            if !allow_redirects {
                return Err(self.status_error());
            }
        } else if !self.success {
            return Err(self.status_error());
        }
        Ok(self)
    }

    fn status_error(&self) -> RequestError {
        RequestError::Status {
            code: self.status_code,
            url: self.url.to_string(),
        }
    }
}

/// Redirect statuses the pipeline follows: 300-303, 307 and 308-399.
pub(crate) fn is_redirect_status(code: u16) -> bool {
    matches!(code, 300..=303 | 307) || (code > 307 && code < 400)
}
