//! Gateway identity middleware.
//!
//! Resolves the current user from headers set by an authenticating gateway
//! and attaches it to the request as an [`Identity`] extension.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::config::schema::IdentityConfig;
use crate::security::identity::{Claims, Identity};

pub async fn header_identity_middleware(
    State(config): State<Arc<IdentityConfig>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Never trust an identity that did not come from the headers below.
    req.extensions_mut().remove::<Identity>();

    if let Some(identity) = identity_from_headers(req.headers(), &config) {
        req.extensions_mut().insert(identity);
    }
    next.run(req).await
}

/// Read the identity headers.
///
/// No user header means no identity. A user header without a claims header
/// yields [`Claims::Absent`]; an empty claims header yields an empty set.
pub fn identity_from_headers(headers: &HeaderMap, config: &IdentityConfig) -> Option<Identity> {
    let user_name = header_str(headers, &config.user_header)?;

    let claims = match header_str(headers, &config.claims_header) {
        Some(raw) => Claims::present(
            raw.split(config.claims_separator)
                .map(str::trim)
                .filter(|claim| !claim.is_empty()),
        ),
        None => Claims::Absent,
    };

    Some(Identity {
        user_name: Some(user_name.to_string()),
        claims,
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(header = %name, "Ignoring identity header that is not valid UTF-8");
            None
        }
    }
}
