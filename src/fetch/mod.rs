//! Request orchestration.
//!
//! Drives one logical request through its hops:
//!
//! ```text
//! PREPARE -> DISPATCH -> PARSE -> REDIRECT_CHECK -> (DISPATCH | DONE)
//! ```
//!
//! Every hop starts from a fresh `PreparedRequest` built from the caller's
//! descriptor, runs `BeforeRequest`, picks a transport, runs `BeforeSend`,
//! calls the transport, runs `AfterSend`, parses the raw bytes and runs
//! `BeforeRedirectCheck`. A followed redirect runs `BeforeRedirect` and
//! loops; the final response runs `AfterRequest`.

mod parse;
mod redirects;

use std::collections::HashMap;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info};
use reqwest::Method;

use crate::config::Options;
use crate::cookie::CookieJar;
use crate::error_handling::RequestError;
use crate::hooks::{Hook, HookContext, Hooks};
use crate::models::{Body, Headers, PreparedRequest, RequestDescriptor, Response};
use crate::transport::select_transport;

/// Sends a single request.
///
/// The jar seeded through `Options::cookies` (or a fresh one) is returned on
/// `Response::cookies` so it can seed the next call.
///
/// # Errors
///
/// Returns `RequestError` for invalid options or URLs, transport failures,
/// protocol errors, hook failures, and exceeded redirect limits.
///
/// # Examples
///
/// ```no_run
/// use request_engine::{request, Headers, Options};
/// use reqwest::Method;
///
/// # async fn run() -> Result<(), request_engine::RequestError> {
/// let response = request(
///     "http://example.com/",
///     Headers::new(),
///     "",
///     Method::GET,
///     Options::default(),
/// )
/// .await?;
/// println!("{} {}", response.status_code, response.text());
/// # Ok(())
/// # }
/// ```
pub async fn request(
    url: &str,
    headers: Headers,
    body: impl Into<Body>,
    method: Method,
    mut options: Options,
) -> Result<Response, RequestError> {
    let descriptor = RequestDescriptor {
        url: url.to_string(),
        headers,
        body: body.into(),
        method,
    };
    let mut jar = options.cookies.take().unwrap_or_default();
    execute(&descriptor, options, &mut jar).await
}

/// Runs the hop loop for `descriptor` against a caller-owned jar.
///
/// Cookies in `Options::cookies` are merged into `jar` first. The jar is
/// updated as responses arrive, so it reflects every hop even when the
/// call fails part-way through a redirect chain.
///
/// # Errors
///
/// See [`request`].
pub async fn execute(
    descriptor: &RequestDescriptor,
    mut options: Options,
    jar: &mut CookieJar,
) -> Result<Response, RequestError> {
    options.validate()?;
    let mut url = redirects::parse_target(&descriptor.url, None)?;

    if let Some(seed) = options.cookies.take() {
        jar.merge(seed.cookies());
    }

    let mut hooks = options.hooks.take().unwrap_or_default();
    register_providers(&mut hooks, &options);

    let mut method = descriptor.method.clone();
    let mut body = descriptor.body.clone();
    let mut previous: Option<Box<Response>> = None;
    let mut redirected = 0u32;

    loop {
        // PREPARE
        let mut request = PreparedRequest::for_hop(method.clone(), url, &descriptor.headers, &body);
        hooks.dispatch(
            Hook::BeforeRequest,
            &mut HookContext::new(&mut request, &mut options, jar),
        )?;

        // DISPATCH
        let transport = select_transport(options.transport.as_ref(), &request.url)?;
        let kind = transport.kind();
        {
            let mut ctx = HookContext::new(&mut request, &mut options, jar);
            ctx.transport = Some(kind);
            hooks.dispatch(Hook::BeforeSend, &mut ctx)?;
        }

        debug!(
            "{} {} via {} transport (redirects so far: {})",
            request.method, request.url, kind, redirected
        );
        let mut raw = transport.request(&request, &options).await?;
        {
            let mut ctx = HookContext::new(&mut request, &mut options, jar);
            ctx.transport = Some(kind);
            ctx.raw = Some(&mut raw);
            hooks.dispatch(Hook::AfterSend, &mut ctx)?;
        }

        if !options.blocking {
            debug!("Non-blocking request to {} dispatched", request.url);
            let mut response = Response::empty(request.url.clone());
            response.redirects = redirected;
            response.previous = previous;
            response.cookies = jar.clone();
            return Ok(response);
        }

        // PARSE
        let mut response = parse::parse_response(raw, request.url.clone(), redirected)?;
        response.previous = previous.take();

        // REDIRECT_CHECK
        {
            let mut ctx = HookContext::new(&mut request, &mut options, jar);
            ctx.transport = Some(kind);
            ctx.response = Some(&mut response);
            hooks.dispatch(Hook::BeforeRedirectCheck, &mut ctx)?;
        }

        match redirects::next_hop(&response, &options, redirected, &method)? {
            Some(mut hop) => {
                {
                    let mut ctx = HookContext::new(&mut request, &mut options, jar);
                    ctx.transport = Some(kind);
                    ctx.response = Some(&mut response);
                    ctx.location = Some(&mut hop.location);
                    hooks.dispatch(Hook::BeforeRedirect, &mut ctx)?;
                }
                info!(
                    "Following {} redirect {} -> {}",
                    response.status_code, response.url, hop.location
                );
                if hop.drop_body {
                    body = Body::Empty;
                }
                method = hop.method;
                url = hop.location;
                redirected += 1;
                previous = Some(Box::new(response));
            }
            None => {
                response.cookies = jar.clone();
                let mut ctx = HookContext::new(&mut request, &mut options, jar);
                ctx.transport = Some(kind);
                ctx.response = Some(&mut response);
                hooks.dispatch(Hook::AfterRequest, &mut ctx)?;
                return Ok(response);
            }
        }
    }
}

/// Sends independent requests concurrently.
///
/// Every request runs the full hop loop with its own copy of the option
/// bag; callbacks on `Options::hooks` are shared and may run interleaved.
/// Each request starts from a snapshot of `Options::cookies`, and cookies
/// captured by one request are not seen by the others.
///
/// Returns one result per id; completion order is not preserved.
pub async fn request_multiple(
    requests: Vec<(String, RequestDescriptor)>,
    options: Options,
) -> HashMap<String, Result<Response, RequestError>> {
    let seed = options.cookies.clone().unwrap_or_default();

    let mut pending: FuturesUnordered<_> = requests
        .into_iter()
        .map(|(id, descriptor)| {
            let mut options = options.clone();
            options.cookies = None;
            let mut jar = seed.clone();
            async move {
                let result = execute(&descriptor, options, &mut jar).await;
                (id, result)
            }
        })
        .collect();

    let mut results = HashMap::new();
    while let Some((id, result)) = pending.next().await {
        if let Err(e) = &result {
            debug!("Request {} failed: {}", id, e);
        }
        results.insert(id, result);
    }
    results
}

/// Registers the jar and the option bag's providers on the bus.
fn register_providers(hooks: &mut Hooks, options: &Options) {
    CookieJar::register(hooks);
    if let Some(auth) = &options.auth {
        auth.register(hooks);
    }
    if let Some(proxy) = &options.proxy {
        proxy.register(hooks);
    }
}
