//! Terminal responses produced by guards.
//!
//! # Responsibilities
//! - Describe a short-circuit as status + headers
//! - Convert into an axum response at the host boundary
//!
//! # Design Decisions
//! - Headers kept as plain strings; validated only when encoded
//! - Redirects use 303 See Other so the follow-up request is a GET
//! - Body is a small JSON error document, never guard-specific data

use std::collections::BTreeMap;

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::security::guard::GuardError;

/// A guard's decision to stop the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardResponse {
    pub status: StatusCode,
    pub headers: BTreeMap<String, String>,
}

impl GuardResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
        }
    }

    /// 401: no authenticated user.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
    }

    /// 403: authenticated but not allowed, or insecure transport.
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN)
    }

    /// 303 with a `Location` header.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(StatusCode::SEE_OTHER).with_header("Location", location)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Look up a header by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }
}

impl IntoResponse for GuardResponse {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "status": self.status.as_u16(),
            "error": self.status.canonical_reason().unwrap_or("Request rejected"),
        }));
        let mut response = (self.status, body).into_response();

        for (name, value) in self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => {
                    tracing::warn!(header = %name, "Dropping guard header that is not valid HTTP");
                }
            }
        }

        response
    }
}

/// Guard faults reach the client as a generic 500; details stay in the logs.
impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        tracing::error!(guard = %self.guard(), error = %self, "Guard fault while handling request");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "status": 500,
                "error": "Internal Server Error",
            })),
        )
            .into_response()
    }
}
