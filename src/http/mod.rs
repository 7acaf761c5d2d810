//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → middleware/identity.rs (current user from gateway headers)
//!     → middleware/guard.rs (context.rs → module pipeline)
//!     → response.rs (guard short-circuit → HTTP response)
//!     → or the module handler
//! ```

pub mod context;
pub mod middleware;
pub mod response;
pub mod server;

pub use context::{IncomingRequest, RequestContext};
pub use response::GuardResponse;
pub use server::GuardServer;
