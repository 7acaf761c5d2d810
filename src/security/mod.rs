//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     Module (module.rs)
//!     → policy.rs (requires_authentication, requires_claims, ...)
//!     → pipeline.rs (BeforePipeline, insert at start / end)
//!     → freeze → FrozenPipeline
//!
//! Per request:
//!     RequestContext (identity.rs + http::context)
//!     → pipeline.rs invoke
//!     → guard.rs / https.rs decisions
//!     → None (run handler) | GuardResponse (401 / 403 / 303)
//! ```
//!
//! # Design Decisions
//! - Fail closed: missing identity is 401, missing claims are 403
//! - Guards are pure over the context; no I/O on the request path
//! - Predicate faults are errors, not denials

pub mod guard;
pub mod https;
pub mod identity;
pub mod module;
pub mod pipeline;
pub mod policy;

pub use guard::{guard_fn, BoxError, Guard, GuardError, GuardResult};
pub use https::HttpsGuard;
pub use identity::{ClaimSet, Claims, Identity};
pub use module::{HookedModule, Module};
pub use pipeline::{BeforePipeline, FrozenPipeline, PipelineItem};
pub use policy::{
    AnyClaimGuard, AuthenticationGuard, ClaimsGuard, ModuleSecurity, ValidatedClaimsGuard,
};
