//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline decisions:
//!     → logging.rs (structured log events, request ID attached)
//!     → metrics.rs (denial / fault counters)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Prometheus scrape endpoint (binary only)
//! ```

pub mod logging;
pub mod metrics;
