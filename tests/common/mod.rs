//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum::http::Method;
use route_guard::security::{Claims, Identity};
use route_guard::RequestContext;
use url::Url;

/// `http://localhost/` or `https://localhost/`.
pub fn url(https: bool) -> Url {
    let scheme = if https { "https" } else { "http" };
    Url::parse(&format!("{scheme}://localhost/")).unwrap()
}

/// A user with the given name and, optionally, a claims collection.
pub fn user(name: &str, claims: Option<&[&str]>) -> Identity {
    Identity {
        user_name: Some(name.to_string()),
        claims: claims.map_or(Claims::Absent, |c| Claims::present(c.iter().copied())),
    }
}

/// Secure GET context carrying `user`.
pub fn context_with_user(user: Identity) -> RequestContext {
    RequestContext::new(Method::GET, url(true)).with_user(user)
}

/// Secure GET context without a current user.
pub fn anonymous_context() -> RequestContext {
    RequestContext::new(Method::GET, url(true))
}
