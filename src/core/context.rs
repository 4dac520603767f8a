//! Per-invocation call context.
//!
//! A [`CallContext`] is built by a transport adapter when a tool call arrives
//! and handed by value through dispatch into the tool handler. It is never
//! stored on the server or the adapter, so concurrent calls cannot observe
//! each other's credentials.

#[cfg(feature = "http")]
use std::sync::Arc;

/// Immutable context for a single tool invocation.
#[derive(Clone, Default)]
pub struct CallContext {
    credential: Option<String>,
    session_id: Option<String>,
    #[cfg(feature = "http")]
    request: Option<Arc<http::request::Parts>>,
}

impl CallContext {
    /// Create a context carrying the given credential.
    ///
    /// Blank credentials are treated as absent.
    pub fn new(credential: Option<String>) -> Self {
        Self {
            credential: credential.filter(|c| !c.trim().is_empty()),
            ..Default::default()
        }
    }

    /// Attach the transport session this call belongs to.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach the head of the HTTP request carrying this call.
    #[cfg(feature = "http")]
    pub fn with_request(mut self, request: Arc<http::request::Parts>) -> Self {
        self.request = Some(request);
        self
    }

    /// The upstream API credential, if the transport supplied one.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The HTTP request head of the in-flight exchange.
    #[cfg(feature = "http")]
    pub fn request(&self) -> Option<&http::request::Parts> {
        self.request.as_deref()
    }
}

/// Custom Debug implementation to redact the credential from logs.
impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("CallContext");
        s.field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("session_id", &self.session_id);
        #[cfg(feature = "http")]
        s.field("request", &self.request.as_ref().map(|r| r.uri.path().to_string()));
        s.finish()
    }
}
