//! Authentication providers.
//!
//! Providers are registered on the hook bus before the first hop and add
//! their credentials at `BeforeSend`, after every other request mutation.

use std::fmt;

use base64::prelude::{Engine as _, BASE64_STANDARD};

use crate::error_handling::RequestError;
use crate::hooks::{Hook, Hooks};

/// A provider that injects credentials through the hook bus.
pub trait Auth: Send + Sync + fmt::Debug {
    /// Registers the provider's callbacks.
    fn register(&self, hooks: &mut Hooks);
}

/// HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    user: String,
    pass: String,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
        }
    }

    /// Builds the provider from `[user, pass]`.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::InvalidArgument` unless exactly two parts are given.
    pub fn from_parts(parts: &[&str]) -> Result<Self, RequestError> {
        match parts {
            [user, pass] => Ok(Self::new(*user, *pass)),
            _ => Err(RequestError::invalid(
                "auth",
                format!("expected 2 elements, got {}", parts.len()),
            )),
        }
    }

    /// `Authorization` header value.
    pub fn header_value(&self) -> String {
        format!(
            "Basic {}",
            BASE64_STANDARD.encode(format!("{}:{}", self.user, self.pass))
        )
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("pass", &"***")
            .finish()
    }
}

impl Auth for BasicAuth {
    fn register(&self, hooks: &mut Hooks) {
        let value = self.header_value();
        hooks.register(
            Hook::BeforeSend,
            move |ctx| {
                ctx.request.headers.insert("Authorization", value.clone());
                Ok(())
            },
            0,
        );
    }
}
