//! Ordered, short-circuitable interceptor chain.
//!
//! A [`Pipeline`] holds interceptors sorted by priority weight (descending),
//! then explicit order (descending), then registration index (ascending).
//! [`Pipeline::execute`] walks the chain with a fresh [`PipelineContext`]:
//!
//! - [`proceed`](PipelineContext::proceed) runs the rest of the chain with the
//!   current subject and returns once it has finished, so an interceptor can
//!   post-process after it returns.
//! - [`proceed_with`](PipelineContext::proceed_with) replaces the subject first.
//! - [`finish`](PipelineContext::finish) stops the chain; the current subject
//!   becomes the result.
//!
//! An interceptor that returns without calling any of these halts the chain
//! as if it had called `finish`.
//!
//! # Example
//!
//! ```
//! use markflow_pipeline::{Pipeline, Priority};
//!
//! let mut pipeline: Pipeline<String> = Pipeline::new("greeting");
//! pipeline.intercept(Priority::Normal, 0, |ctx| {
//!     ctx.subject_mut().push_str(", world");
//!     ctx.proceed()
//! });
//! pipeline.intercept(Priority::High, 0, |ctx| {
//!     ctx.subject_mut().push_str("Hello");
//!     ctx.proceed()
//! });
//!
//! assert_eq!(pipeline.execute(String::new()).unwrap(), "Hello, world");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::PipelineError;

/// Priority band of an interceptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Runs before `Normal` and `Low`.
    High,
    /// Default band.
    #[default]
    Normal,
    /// Runs after `High` and `Normal`.
    Low,
}

impl Priority {
    /// Sort weight: `High` = 2, `Normal` = 1, `Low` = 0.
    #[must_use]
    pub const fn weight(self) -> u8 {
        match self {
            Self::High => 2,
            Self::Normal => 1,
            Self::Low => 0,
        }
    }
}

/// Interceptor function over subject `S`.
pub type Interceptor<S> =
    Arc<dyn Fn(&mut PipelineContext<S>) -> Result<(), PipelineError> + Send + Sync>;

/// A registered interceptor with its ordering data.
pub struct PipelineEntry<S> {
    priority: Priority,
    order: i32,
    index: usize,
    interceptor: Interceptor<S>,
}

impl<S> PipelineEntry<S> {
    /// Priority band.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Explicit order within the priority band (higher runs first).
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Registration index within the owning pipeline.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    fn execution_order(&self, other: &Self) -> Ordering {
        other
            .priority
            .weight()
            .cmp(&self.priority.weight())
            .then_with(|| other.order.cmp(&self.order))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl<S> Clone for PipelineEntry<S> {
    fn clone(&self) -> Self {
        Self {
            priority: self.priority,
            order: self.order,
            index: self.index,
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

impl<S> fmt::Debug for PipelineEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineEntry")
            .field("priority", &self.priority)
            .field("order", &self.order)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Ordered interceptor chain over subjects of type `S`.
pub struct Pipeline<S> {
    name: &'static str,
    entries: Vec<PipelineEntry<S>>,
    /// Interceptors in execution order, shared with running executions.
    sorted: Arc<[Interceptor<S>]>,
}

impl<S> Pipeline<S> {
    /// Create an empty pipeline. The name is used in log output.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
            sorted: Arc::from(Vec::new()),
        }
    }

    /// Pipeline name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register an interceptor.
    ///
    /// Within a priority band, higher `order` runs first; equal priority and
    /// order run in registration order.
    pub fn intercept<F>(&mut self, priority: Priority, order: i32, interceptor: F) -> &mut Self
    where
        F: Fn(&mut PipelineContext<S>) -> Result<(), PipelineError> + Send + Sync + 'static,
    {
        let index = self.entries.len();
        self.entries.push(PipelineEntry {
            priority,
            order,
            index,
            interceptor: Arc::new(interceptor),
        });
        self.entries.sort_by(PipelineEntry::execution_order);
        self.sorted = self
            .entries
            .iter()
            .map(|entry| Arc::clone(&entry.interceptor))
            .collect();

        tracing::trace!(
            pipeline = self.name,
            ?priority,
            order,
            index,
            "Registered interceptor"
        );
        self
    }

    /// Registered entries in execution order.
    #[must_use]
    pub fn entries(&self) -> &[PipelineEntry<S>] {
        &self.entries
    }

    /// Number of registered interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no interceptor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the chain on `subject` and return the final subject.
    ///
    /// Each call gets its own cursor, so interceptors may execute this or any
    /// other pipeline recursively. Errors from interceptors are returned as-is.
    pub fn execute(&self, subject: S) -> Result<S, PipelineError> {
        let mut ctx = PipelineContext {
            interceptors: Arc::clone(&self.sorted),
            cursor: 0,
            subject,
            finished: false,
        };
        ctx.proceed()?;
        tracing::trace!(pipeline = self.name, executed = ctx.cursor, "Pipeline finished");
        Ok(ctx.subject)
    }
}

impl<S> Clone for Pipeline<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            entries: self.entries.clone(),
            sorted: Arc::clone(&self.sorted),
        }
    }
}

impl<S> fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Execution state of one [`Pipeline::execute`] call.
pub struct PipelineContext<S> {
    interceptors: Arc<[Interceptor<S>]>,
    cursor: usize,
    subject: S,
    finished: bool,
}

impl<S> PipelineContext<S> {
    /// Current subject.
    #[must_use]
    pub fn subject(&self) -> &S {
        &self.subject
    }

    /// Mutable access to the current subject.
    pub fn subject_mut(&mut self) -> &mut S {
        &mut self.subject
    }

    /// Replace the subject without advancing.
    ///
    /// Typically followed by [`finish`](Self::finish).
    pub fn set_subject(&mut self, subject: S) {
        self.subject = subject;
    }

    /// Run the remaining interceptors with the current subject.
    ///
    /// Returns after the rest of the chain has completed (or halted). Calling
    /// it on a finished chain does nothing.
    pub fn proceed(&mut self) -> Result<(), PipelineError> {
        if self.finished {
            return Ok(());
        }
        let Some(interceptor) = self.interceptors.get(self.cursor).map(Arc::clone) else {
            self.finished = true;
            return Ok(());
        };
        self.cursor += 1;
        interceptor(self)?;
        // The interceptor either ran the rest of the chain or short-circuited it.
        self.finished = true;
        Ok(())
    }

    /// Replace the subject, then run the remaining interceptors.
    pub fn proceed_with(&mut self, subject: S) -> Result<(), PipelineError> {
        self.subject = subject;
        self.proceed()
    }

    /// Stop the chain; the current subject becomes the result.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Check whether the chain has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
