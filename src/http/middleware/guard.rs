//! Guard middleware.
//! Runs a module's frozen pipeline before its handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::{uri::Authority, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::schema::ForwardingConfig;
use crate::http::context::RequestContext;
use crate::security::identity::Identity;
use crate::security::pipeline::FrozenPipeline;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_REQUEST_ID: &str = "x-request-id";

/// State required by [`guard_middleware`].
#[derive(Clone)]
pub struct GuardState {
    pub module: Arc<str>,
    pub pipeline: FrozenPipeline,
    pub forwarding: ForwardingConfig,
}

/// Reasons a request context cannot be built.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("request has no host")]
    MissingHost,

    #[error("request host is not a valid authority: {0}")]
    InvalidHost(String),

    #[error("request URL is invalid: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl IntoResponse for ContextError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

pub async fn guard_middleware(
    State(state): State<GuardState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let context = match build_context(&req, &state.forwarding) {
        Ok(context) => context,
        Err(e) => {
            tracing::warn!(module = %state.module, error = %e, "Cannot build request context");
            return e.into_response();
        }
    };

    match state.pipeline.invoke(&context) {
        Ok(None) => next.run(req).await,
        Ok(Some(denied)) => {
            tracing::info!(
                request_id = %context.request_id,
                module = %state.module,
                method = %context.request.method,
                status = %denied.status,
                "Request rejected by guard"
            );
            denied.into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Build the guard context for an axum request.
///
/// Uses the URI the client sent (before any nesting stripped the prefix), the
/// `Identity` placed in extensions by the authentication layer, and the
/// propagated `X-Request-ID` when it is a UUID.
pub fn build_context(
    req: &Request<Body>,
    forwarding: &ForwardingConfig,
) -> Result<RequestContext, ContextError> {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map_or(req.uri(), |original| &original.0);

    let forwarded_proto = forwarding
        .trust_forwarded_proto
        .then(|| req.headers().get(X_FORWARDED_PROTO))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    let scheme = forwarded_proto
        .or_else(|| uri.scheme_str().map(str::to_ascii_lowercase))
        .unwrap_or_else(|| "http".to_string());

    let host = uri
        .authority()
        .map(|a| a.as_str())
        .or_else(|| {
            req.headers()
                .get(axum::http::header::HOST)
                .and_then(|v| v.to_str().ok())
        })
        .filter(|h| !h.is_empty())
        .ok_or(ContextError::MissingHost)?;
    let host = parse_host(host)?;

    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = Url::parse(&format!("{scheme}://{host}{path_and_query}"))?;

    let mut context = RequestContext::new(req.method().clone(), url);
    if let Some(id) = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
    {
        context = context.with_request_id(id);
    }
    if let Some(identity) = req.extensions().get::<Identity>() {
        context = context.with_user(identity.clone());
    }

    Ok(context)
}

/// A host must be a bare authority; userinfo, path, query or fragment would
/// change the URL guards see.
fn parse_host(host: &str) -> Result<Authority, ContextError> {
    match Authority::from_str(host) {
        Ok(authority) if !authority.as_str().contains('@') => Ok(authority),
        _ => Err(ContextError::InvalidHost(host.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn forwarding(trust: bool) -> ForwardingConfig {
        ForwardingConfig {
            trust_forwarded_proto: trust,
        }
    }

    #[test]
    fn test_context_from_origin_form_request() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/orders?id=7")
            .header("host", "shop.example:8080")
            .body(Body::empty())
            .unwrap();

        let ctx = build_context(&req, &forwarding(false)).unwrap();
        assert_eq!(ctx.request.method, Method::POST);
        assert_eq!(ctx.request.url.as_str(), "http://shop.example:8080/orders?id=7");
        assert!(ctx.current_user.is_none());
    }

    #[test]
    fn test_forwarded_proto_only_when_trusted() {
        let build = |trust| {
            let req = Request::builder()
                .uri("/")
                .header("host", "localhost")
                .header("x-forwarded-proto", "HTTPS, http")
                .body(Body::empty())
                .unwrap();
            build_context(&req, &forwarding(trust)).unwrap()
        };

        assert!(build(true).request.is_secure());
        assert!(!build(false).request.is_secure());
    }

    #[test]
    fn test_missing_host_is_an_error() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(matches!(
            build_context(&req, &forwarding(false)),
            Err(ContextError::MissingHost)
        ));
    }

    #[test]
    fn test_host_must_be_a_bare_authority() {
        for host in ["localhost/evil?", "good.example#", "good.example?x=1", "user@good.example"] {
            let req = Request::builder()
                .uri("/billing/pay")
                .header("host", host)
                .body(Body::empty())
                .unwrap();
            assert!(
                matches!(
                    build_context(&req, &forwarding(false)),
                    Err(ContextError::InvalidHost(_))
                ),
                "host {host:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_identity_and_request_id_are_picked_up() {
        let id = Uuid::new_v4();
        let mut req = Request::builder()
            .uri("https://localhost/a")
            .header("x-request-id", id.to_string())
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(Identity::new("Bob"));

        let ctx = build_context(&req, &forwarding(false)).unwrap();
        assert_eq!(ctx.request_id, id);
        assert_eq!(ctx.current_user, Some(Identity::new("Bob")));
        assert!(ctx.request.is_secure());
    }
}
