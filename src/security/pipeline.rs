//! Before-request guard pipeline.
//!
//! # Data Flow
//! ```text
//! Registration (single-threaded):
//!     policy declarations
//!     → BeforePipeline::insert_at_start / insert_at_end
//!     → BeforePipeline::freeze()
//!     → FrozenPipeline (Arc<[PipelineItem]>, shared by all requests)
//!
//! Per request:
//!     RequestContext
//!     → invoke(): guards in order
//!     → first Some(response) wins, else None (run the handler)
//! ```
//!
//! # Design Decisions
//! - Mutation only through `&mut BeforePipeline`; invocation takes `&self`,
//!   so a guard can never reorder the sequence it is running in
//! - Frozen pipelines are immutable and lock-free on the hot path
//! - Guard faults stop the pipeline and propagate to the host

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::http::context::RequestContext;
use crate::observability::metrics;
use crate::security::guard::{Guard, GuardResult};

/// A named entry in a pipeline.
#[derive(Clone)]
pub struct PipelineItem {
    name: Cow<'static, str>,
    guard: Arc<dyn Guard>,
}

impl PipelineItem {
    /// Item named after the guard's own [`Guard::name`].
    pub fn new<G: Guard + 'static>(guard: G) -> Self {
        let name = guard.name();
        Self {
            name,
            guard: Arc::new(guard),
        }
    }

    pub fn named<G: Guard + 'static>(name: impl Into<Cow<'static, str>>, guard: G) -> Self {
        Self {
            name: name.into(),
            guard: Arc::new(guard),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, context: &RequestContext) -> GuardResult {
        self.guard.check(context)
    }
}

impl fmt::Debug for PipelineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineItem").field("name", &self.name).finish()
    }
}

impl<G: Guard + 'static> From<G> for PipelineItem {
    fn from(guard: G) -> Self {
        PipelineItem::new(guard)
    }
}

/// Ordered, mutable guard sequence owned by a module during registration.
#[derive(Debug, Clone, Default)]
pub struct BeforePipeline {
    items: Vec<PipelineItem>,
}

impl BeforePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append; existing order is untouched.
    pub fn insert_at_end(&mut self, item: impl Into<PipelineItem>) {
        self.items.push(item.into());
    }

    /// Prepend; the last item inserted at the start runs first.
    pub fn insert_at_start(&mut self, item: impl Into<PipelineItem>) {
        self.items.insert(0, item.into());
    }

    /// Insert before the first item called `name`, or at the start if there is none.
    pub fn insert_before(&mut self, name: &str, item: impl Into<PipelineItem>) {
        let index = self.position(name).unwrap_or(0);
        self.items.insert(index, item.into());
    }

    /// Insert after the first item called `name`, or at the end if there is none.
    pub fn insert_after(&mut self, name: &str, item: impl Into<PipelineItem>) {
        let index = self
            .position(name)
            .map_or(self.items.len(), |index| index + 1);
        self.items.insert(index, item.into());
    }

    /// Replace the first item with the same name, keeping its position.
    /// Appends when no item has that name.
    pub fn replace_in_place(&mut self, item: impl Into<PipelineItem>) {
        let item = item.into();
        match self.position(item.name()) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }

    /// Remove every item called `name`. Returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.name() != name);
        before - self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(PipelineItem::name).collect()
    }

    /// Run the guards in order against `context`.
    pub fn invoke(&self, context: &RequestContext) -> GuardResult {
        run(&self.items, context)
    }

    /// Freeze into the shared, immutable form used while serving requests.
    pub fn freeze(&self) -> FrozenPipeline {
        FrozenPipeline {
            items: self.items.clone().into(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|item| item.name() == name)
    }
}

/// Immutable pipeline shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct FrozenPipeline {
    items: Arc<[PipelineItem]>,
}

impl FrozenPipeline {
    pub fn invoke(&self, context: &RequestContext) -> GuardResult {
        run(&self.items, context)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(PipelineItem::name).collect()
    }
}

fn run(items: &[PipelineItem], context: &RequestContext) -> GuardResult {
    for item in items {
        match item.check(context) {
            Ok(None) => continue,
            Ok(Some(response)) => {
                tracing::debug!(
                    request_id = %context.request_id,
                    guard = %item.name(),
                    status = %response.status,
                    "Guard short-circuited request"
                );
                metrics::record_denial(item.name(), response.status.as_u16());
                return Ok(Some(response));
            }
            Err(e) => {
                tracing::error!(
                    request_id = %context.request_id,
                    guard = %item.name(),
                    error = %e,
                    "Guard fault"
                );
                metrics::record_fault(item.name());
                return Err(e);
            }
        }
    }
    Ok(None)
}
