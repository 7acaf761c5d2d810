//! Per-request security guards for HTTP modules.
//!
//! Modules declare prerequisites (authentication, claims, validated claims,
//! HTTPS) that become guards in a before-request pipeline. The pipeline runs
//! before the handler and short-circuits with 401, 403 or a redirect.
//!
//! ```
//! use axum::http::{Method, StatusCode};
//! use route_guard::http::RequestContext;
//! use route_guard::security::{Identity, Module, ModuleSecurity};
//!
//! let mut module = Module::new("admin");
//! module.requires_https(true).requires_claims(["admin"]);
//! let pipeline = module.freeze();
//!
//! let context = RequestContext::new(Method::GET, "https://localhost/".parse().unwrap())
//!     .with_user(Identity::new("Bob").with_claims(["viewer"]));
//! let denied = pipeline.invoke(&context).unwrap().unwrap();
//! assert_eq!(denied.status, StatusCode::FORBIDDEN);
//! ```

pub mod config;
pub mod http;
pub mod observability;
pub mod security;

pub use config::schema::GuardConfig;
pub use http::{GuardResponse, GuardServer, RequestContext};
pub use security::{BeforePipeline, FrozenPipeline, Identity, Module, ModuleSecurity};
