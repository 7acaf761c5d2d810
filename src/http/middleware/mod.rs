//! Request middleware.
//!
//! # Data Flow
//! ```text
//! Request
//!     → identity.rs (gateway headers → Identity extension)
//!     → guard.rs (RequestContext → module pipeline)
//!     → handler, or the guard's 401 / 403 / 303
//! ```

pub mod guard;
pub mod identity;

pub use guard::{build_context, guard_middleware, ContextError, GuardState};
pub use identity::{header_identity_middleware, identity_from_headers};
