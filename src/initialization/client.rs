//! HTTP client initialization.
//!
//! This module builds the `reqwest::Client` used by the library transport.

use reqwest::ClientBuilder;

use crate::config::Options;
use crate::proxy::Proxy;

/// Builds the reqwest client for one library-transport exchange.
///
/// Creates a `reqwest::Client` configured with:
/// - Redirects disabled (the pipeline follows redirects itself so cookie and
///   hook semantics stay in one place)
/// - HTTP/1 only
/// - Timeouts and User-Agent from the option bag
/// - Certificate host-name checks following `Options::verify_hostname`
/// - The hop's proxy route, if a proxy hook installed one
/// - Transparent gzip/deflate decoding unless `decode_content` is false
///
/// # Arguments
///
/// * `options` - Option bag for the current hop
/// * `proxy` - Proxy route of the prepared request
/// * `decode_content` - Whether reqwest negotiates and decodes compressed bodies
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails (for example when the
/// proxy URL is rejected).
pub(crate) fn build_client(
    options: &Options,
    proxy: Option<&Proxy>,
    decode_content: bool,
) -> Result<reqwest::Client, reqwest::Error> {
    client_builder(options, proxy, decode_content)?.build()
}

fn client_builder(
    options: &Options,
    proxy: Option<&Proxy>,
    decode_content: bool,
) -> Result<ClientBuilder, reqwest::Error> {
    let mut builder = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .http1_only()
        .timeout(options.timeout)
        .connect_timeout(options.connect_timeout)
        .user_agent(options.useragent.clone())
        .danger_accept_invalid_hostnames(!options.verify_hostname);

    if !decode_content {
        builder = builder.no_gzip().no_deflate();
    }

    builder = match proxy {
        Some(proxy) => {
            let mut route = reqwest::Proxy::all(proxy.url())?;
            if let Some((user, pass)) = proxy.credentials() {
                route = route.basic_auth(user, pass);
            }
            builder.proxy(route)
        }
        // Environment proxies would bypass the hook-installed route
        None => builder.no_proxy(),
    };

    Ok(builder)
}
