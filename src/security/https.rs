//! Transport security decision.
//!
//! # Responsibilities
//! - Pass requests that already arrived over HTTPS
//! - Upgrade plaintext GETs with a redirect (when allowed)
//! - Refuse every other plaintext request
//!
//! # Design Decisions
//! - Only GET is redirected: a mutating request must not be replayed over an
//!   insecure hop, so it fails hard instead
//! - The redirect target is the original URL with only the scheme (and
//!   optionally the port) changed
//! - If the URL cannot be rewritten (non-special scheme) the request is refused

use axum::http::Method;
use url::Url;

use crate::http::context::{IncomingRequest, RequestContext};
use crate::http::response::GuardResponse;
use crate::security::guard::{Guard, GuardResult};
use crate::security::policy::names;

/// Guard enforcing HTTPS.
#[derive(Debug, Clone, Copy)]
pub struct HttpsGuard {
    redirect: bool,
    https_port: Option<u16>,
}

impl HttpsGuard {
    pub fn new(redirect: bool) -> Self {
        Self {
            redirect,
            https_port: None,
        }
    }

    /// Redirects also move the request to `port`.
    pub fn with_port(redirect: bool, port: u16) -> Self {
        Self {
            redirect,
            https_port: Some(port),
        }
    }

    /// Pure decision for a single request.
    pub fn decide(&self, request: &IncomingRequest) -> Option<GuardResponse> {
        if request.is_secure() {
            return None;
        }

        if !self.redirect || request.method != Method::GET {
            return Some(GuardResponse::forbidden());
        }

        match secure_url(&request.url, self.https_port) {
            Some(location) => Some(GuardResponse::redirect(location.as_str())),
            None => {
                tracing::warn!(url = %request.url, "Cannot rewrite URL to https; refusing request");
                Some(GuardResponse::forbidden())
            }
        }
    }
}

impl Guard for HttpsGuard {
    fn check(&self, context: &RequestContext) -> GuardResult {
        Ok(self.decide(&context.request))
    }

    fn name(&self) -> std::borrow::Cow<'static, str> {
        names::REQUIRES_HTTPS.into()
    }
}

/// `url` with its scheme switched to `https`, and optionally a new port.
pub fn secure_url(url: &Url, port: Option<u16>) -> Option<Url> {
    let mut secure = url.clone();
    secure.set_scheme("https").ok()?;
    if let Some(port) = port {
        secure.set_port(Some(port)).ok()?;
    }
    Some(secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn request(method: Method, url: &str) -> IncomingRequest {
        IncomingRequest::new(method, url.parse().unwrap())
    }

    #[test]
    fn test_secure_requests_pass() {
        let guard = HttpsGuard::new(true);
        for method in [Method::GET, Method::POST, Method::DELETE] {
            assert!(guard.decide(&request(method, "https://localhost/")).is_none());
        }
        let strict = HttpsGuard::new(false);
        assert!(strict.decide(&request(Method::GET, "https://localhost/")).is_none());
    }

    #[test]
    fn test_get_is_redirected_with_other_parts_unchanged() {
        let guard = HttpsGuard::new(true);
        let resp = guard
            .decide(&request(Method::GET, "http://example.com:8080/a/b?x=1&y=2#frag"))
            .unwrap();

        assert_eq!(resp.status, StatusCode::SEE_OTHER);
        assert_eq!(
            resp.header("Location"),
            Some("https://example.com:8080/a/b?x=1&y=2#frag")
        );
    }

    #[test]
    fn test_non_get_is_forbidden() {
        let guard = HttpsGuard::new(true);
        for method in [Method::POST, Method::DELETE, Method::PUT, Method::HEAD] {
            let resp = guard.decide(&request(method, "http://localhost/")).unwrap();
            assert_eq!(resp.status, StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn test_redirect_disabled_never_redirects() {
        let guard = HttpsGuard::new(false);
        for method in [Method::GET, Method::POST] {
            let resp = guard.decide(&request(method, "http://localhost/")).unwrap();
            assert_eq!(resp.status, StatusCode::FORBIDDEN);
            assert!(resp.header("Location").is_none());
        }
    }

    #[test]
    fn test_redirect_to_explicit_port() {
        let guard = HttpsGuard::with_port(true, 8443);
        let resp = guard
            .decide(&request(Method::GET, "http://localhost:8080/path?q"))
            .unwrap();
        assert_eq!(resp.header("Location"), Some("https://localhost:8443/path?q"));

        let default_port = HttpsGuard::with_port(true, 443);
        let resp = default_port
            .decide(&request(Method::GET, "http://localhost:8080/"))
            .unwrap();
        assert_eq!(resp.header("Location"), Some("https://localhost/"));
    }

    #[test]
    fn test_unrewritable_scheme_is_forbidden() {
        let guard = HttpsGuard::new(true);
        let resp = guard
            .decide(&request(Method::GET, "custom://localhost/"))
            .unwrap();
        assert_eq!(resp.status, StatusCode::FORBIDDEN);
    }
}
