//! Guard abstraction.
//!
//! A guard looks at a [`RequestContext`] and either raises no objection
//! (`Ok(None)`) or stops the request with a terminal [`GuardResponse`].

use std::borrow::Cow;

use thiserror::Error;

use crate::http::context::RequestContext;
use crate::http::response::GuardResponse;

/// Boxed error raised by user-supplied guard logic.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single guard check.
pub type GuardResult = Result<Option<GuardResponse>, GuardError>;

/// Faults raised while evaluating guards.
///
/// These are not access decisions. They propagate out of the pipeline so the
/// host can treat them as server errors.
#[derive(Debug, Error)]
pub enum GuardError {
    /// A validated-claims predicate failed to evaluate.
    #[error("claims predicate in guard '{guard}' failed: {source}")]
    Predicate {
        guard: Cow<'static, str>,
        #[source]
        source: BoxError,
    },

    /// Any other guard fault.
    #[error("guard '{guard}' failed: {source}")]
    Guard {
        guard: Cow<'static, str>,
        #[source]
        source: BoxError,
    },
}

impl GuardError {
    /// Name of the guard that raised the fault.
    pub fn guard(&self) -> &str {
        match self {
            GuardError::Predicate { guard, .. } | GuardError::Guard { guard, .. } => &**guard,
        }
    }
}

/// A single pre-handler decision.
pub trait Guard: Send + Sync {
    /// Decide whether the request may continue.
    fn check(&self, context: &RequestContext) -> GuardResult;

    /// Name used for logging and metrics when none is given explicitly.
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

impl<F> Guard for F
where
    F: Fn(&RequestContext) -> GuardResult + Send + Sync,
{
    fn check(&self, context: &RequestContext) -> GuardResult {
        self(context)
    }
}

/// Wrap a closure as a guard, pinning down its signature for inference.
pub fn guard_fn<F>(f: F) -> F
where
    F: Fn(&RequestContext) -> GuardResult + Send + Sync,
{
    f
}
