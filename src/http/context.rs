//! Per-request context handed to guards.
//!
//! # Responsibilities
//! - Carry the request line (method + absolute URL)
//! - Carry the resolved current user, if the authentication layer produced one
//! - Carry a request ID for log correlation
//!
//! # Design Decisions
//! - Built by the host before the pipeline runs, read-only afterwards
//! - The URL is always absolute so guards can rewrite it (HTTPS redirect)

use axum::http::Method;
use url::Url;
use uuid::Uuid;

use crate::security::identity::Identity;

/// Method and absolute URL of the incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub method: Method,
    pub url: Url,
}

impl IncomingRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url }
    }

    /// True when the URL scheme is `https`.
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }
}

/// Everything a guard may inspect about a request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub request: IncomingRequest,
    pub current_user: Option<Identity>,
}

impl RequestContext {
    /// Context for an anonymous request with a fresh request ID.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            request: IncomingRequest::new(method, url),
            current_user: None,
        }
    }

    /// Attach the resolved current user.
    pub fn with_user(mut self, user: Identity) -> Self {
        self.current_user = Some(user);
        self
    }

    /// Override the request ID (e.g. with one propagated from `X-Request-ID`).
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.current_user.as_ref()
    }
}
