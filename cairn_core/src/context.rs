// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared allocation context for stacks.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

use crate::entry::Entry;
use crate::pool::{Pool, PoolConfig, PoolStats};
use crate::stack::Stack;
use crate::trace::{TraceSink, Tracer};

/// State reachable from every entry of a context.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) pool: Rc<Pool>,
    pub(crate) tracer: Tracer,
}

/// Owner of the pools, identity root and trace sink shared by a family of
/// stacks.
///
/// An application typically creates one context and derives every
/// [`Stack`] from it. Cloning a context is cheap and yields a handle to the
/// same shared state.
///
/// ```
/// use cairn_core::Context;
///
/// let ctx = Context::new();
/// let mut stack = ctx.new_stack();
/// stack.push();
/// stack.translate(10.0, 20.0, 0.0);
/// stack.pop();
/// assert!(stack.entry().is_identity());
/// ```
#[derive(Clone)]
pub struct Context {
    shared: Rc<Shared>,
    identity: Entry,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a context with the default [`PoolConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Creates a context with the given pool configuration.
    #[must_use]
    pub fn with_config(config: PoolConfig) -> Self {
        let shared = Rc::new(Shared {
            pool: Rc::new(Pool::new(config)),
            tracer: Tracer::new(),
        });
        let identity = Entry::root(&shared);
        Self { shared, identity }
    }

    /// Returns the identity root every new stack starts from.
    #[must_use]
    pub fn identity(&self) -> Entry {
        self.identity.clone()
    }

    /// Creates a stack positioned at the identity root.
    #[must_use]
    pub fn new_stack(&self) -> Stack {
        Stack::new(self)
    }

    /// Returns the pool configuration.
    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.shared.pool.config()
    }

    /// Returns a snapshot of the allocation counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.shared.pool.stats()
    }

    /// Whether `entry` was allocated from this context.
    #[must_use]
    pub fn owns(&self, entry: &Entry) -> bool {
        Rc::ptr_eq(&self.shared, entry.shared())
    }

    /// Installs a trace sink, returning the previous one.
    ///
    /// Without the `trace` feature the sink is dropped and `None` is returned.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink>) -> Option<Box<dyn TraceSink>> {
        self.shared.tracer.install(sink)
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&self) -> Option<Box<dyn TraceSink>> {
        self.shared.tracer.take()
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Rc<Shared> {
        &self.shared
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
