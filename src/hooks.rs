//! Hook bus.
//!
//! An ordered, priority-bucketed callback registry. Cross-cutting features
//! (cookies, authentication, proxying) register against the pipeline's
//! events instead of being hard-wired into the request loop.
//!
//! Callbacks run in ascending priority order; callbacks sharing a priority
//! run in registration order. A callback error aborts the dispatch and is
//! returned to the caller unchanged.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use strum_macros::EnumIter;

use crate::config::Options;
use crate::cookie::CookieJar;
use crate::error_handling::RequestError;
use crate::models::{PreparedRequest, Response};
use crate::transport::TransportKind;

/// Pipeline events a callback can be registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum Hook {
    /// Before each hop is handed to transport selection (PREPARE).
    BeforeRequest,
    /// Immediately before the transport call.
    BeforeSend,
    /// Immediately after the transport returned raw bytes.
    AfterSend,
    /// After the final response is assembled.
    AfterRequest,
    /// After a response is parsed, before the redirect decision.
    BeforeRedirectCheck,
    /// After a redirect was decided, before the next hop is prepared.
    BeforeRedirect,
}

impl Hook {
    /// Conventional event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::BeforeRequest => "before_request",
            Hook::BeforeSend => "before_send",
            Hook::AfterSend => "after_send",
            Hook::AfterRequest => "after_request",
            Hook::BeforeRedirectCheck => "before_redirect_check",
            Hook::BeforeRedirect => "before_redirect",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable state handed to every callback.
///
/// Which optional fields are populated depends on the event:
///
/// | event                   | `transport` | `raw` | `response` | `location` |
/// |-------------------------|-------------|-------|------------|------------|
/// | `BeforeRequest`         |             |       |            |            |
/// | `BeforeSend`            | yes         |       |            |            |
/// | `AfterSend`             | yes         | yes   |            |            |
/// | `BeforeRedirectCheck`   | yes         |       | yes        |            |
/// | `BeforeRedirect`        | yes         |       | yes        | yes        |
/// | `AfterRequest`          | yes         |       | yes        |            |
pub struct HookContext<'a> {
    /// The hop being executed; mutations before `AfterSend` reach the wire.
    pub request: &'a mut PreparedRequest,
    /// The option bag of the logical request.
    pub options: &'a mut Options,
    /// The jar in effect for the logical request.
    pub cookies: &'a mut CookieJar,
    /// Transport chosen for the hop.
    pub transport: Option<TransportKind>,
    /// Raw wire bytes returned by the transport.
    pub raw: Option<&'a mut Vec<u8>>,
    /// Parsed response of the hop.
    pub response: Option<&'a mut Response>,
    /// Resolved redirect target; callbacks may rewrite it.
    pub location: Option<&'a mut url::Url>,
}

impl<'a> HookContext<'a> {
    /// Creates a context carrying only the always-present state.
    pub fn new(
        request: &'a mut PreparedRequest,
        options: &'a mut Options,
        cookies: &'a mut CookieJar,
    ) -> Self {
        Self {
            request,
            options,
            cookies,
            transport: None,
            raw: None,
            response: None,
            location: None,
        }
    }
}

/// A registered callback.
pub type HookCallback =
    Arc<dyn Fn(&mut HookContext<'_>) -> Result<(), RequestError> + Send + Sync>;

/// Priority-ordered callback registry.
///
/// Cloning is cheap and shares the callbacks, which lets one set of
/// definitions serve several concurrent requests.
#[derive(Clone, Default)]
pub struct Hooks {
    callbacks: HashMap<Hook, BTreeMap<i32, Vec<HookCallback>>>,
}

impl Hooks {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `hook` at `priority` (lower runs first).
    pub fn register<F>(&mut self, hook: Hook, callback: F, priority: i32)
    where
        F: Fn(&mut HookContext<'_>) -> Result<(), RequestError> + Send + Sync + 'static,
    {
        self.callbacks
            .entry(hook)
            .or_default()
            .entry(priority)
            .or_default()
            .push(Arc::new(callback));
    }

    /// Runs every callback registered for `hook`.
    ///
    /// # Returns
    ///
    /// `Ok(false)` when nothing is registered for `hook`, `Ok(true)` after all
    /// callbacks ran.
    ///
    /// # Errors
    ///
    /// The first callback error stops the dispatch and is returned as-is.
    pub fn dispatch(&self, hook: Hook, context: &mut HookContext<'_>) -> Result<bool, RequestError> {
        let Some(buckets) = self.callbacks.get(&hook) else {
            return Ok(false);
        };
        if buckets.is_empty() {
            return Ok(false);
        }

        log::trace!("Dispatching {} to {} callback(s)", hook, self.count(hook));
        for callback in buckets.values().flatten() {
            callback(context)?;
        }
        Ok(true)
    }

    /// Number of callbacks registered for `hook`.
    pub fn count(&self, hook: Hook) -> usize {
        self.callbacks
            .get(&hook)
            .map(|buckets| buckets.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(Hook, usize)> = self
            .callbacks
            .keys()
            .map(|hook| (*hook, self.count(*hook)))
            .collect();
        counts.sort();
        f.debug_struct("Hooks").field("callbacks", &counts).finish()
    }
}
