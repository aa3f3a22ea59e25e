// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for stack and resolver activity.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! stack and resolver call as they work. All method bodies default to no-ops,
//! so implementing only the events you care about is fine.
//!
//! A sink is installed on a [`Context`](crate::Context) with
//! [`set_trace_sink`](crate::Context::set_trace_sink) and is shared by every
//! stack created from it. When the `trace` feature is **off**, every dispatch
//! compiles to nothing and installed sinks are dropped immediately. When
//! **on**, each dispatch performs a single `Option` branch.
//!
//! # Crate features
//!
//! - `trace`: enables dispatch to the installed sink.

use alloc::boxed::Box;
#[cfg(feature = "trace")]
use core::cell::RefCell;

use crate::entry::OpKind;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted each time an entry's chain is composed into a matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComposeEvent {
    /// Number of operations applied on top of the base matrix.
    pub depth: usize,
    /// Kind of the node the walk stopped at.
    pub base: OpKind,
    /// Whether the result borrowed storage owned by the entry.
    pub borrowed: bool,
    /// Number of checkpoint caches populated by this composition.
    pub caches_filled: usize,
}

/// Emitted when a replacement operation prunes the chain back to the nearest
/// checkpoint before appending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PruneEvent {
    /// Number of entries the stack stopped referencing.
    pub discarded: usize,
    /// `false` if the walk ended at the root instead of a checkpoint.
    pub reached_checkpoint: bool,
}

/// Emitted when a stack pops back to a checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopEvent {
    /// Number of operations above the checkpoint that were unwound.
    pub unwound: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from stacks and the resolver.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after an entry has been composed.
    fn on_compose(&mut self, e: &ComposeEvent) {
        _ = e;
    }

    /// Called when a replacement operation prunes the chain.
    fn on_prune(&mut self, e: &PruneEvent) {
        _ = e;
    }

    /// Called when a stack pops to a checkpoint.
    fn on_pop(&mut self, e: &PopEvent) {
        _ = e;
    }

    /// Called when an inverse was requested for a singular transform.
    fn on_singular_inverse(&mut self) {}
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer
// ---------------------------------------------------------------------------

/// Holder for the optional sink installed on a context.
pub(crate) struct Tracer {
    #[cfg(feature = "trace")]
    sink: RefCell<Option<Box<dyn TraceSink>>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(feature = "trace")]
            sink: RefCell::new(None),
        }
    }

    /// Installs `sink`, returning the previously installed one.
    pub(crate) fn install(&self, sink: Box<dyn TraceSink>) -> Option<Box<dyn TraceSink>> {
        #[cfg(feature = "trace")]
        {
            self.sink.replace(Some(sink))
        }
        #[cfg(not(feature = "trace"))]
        {
            drop(sink);
            None
        }
    }

    pub(crate) fn take(&self) -> Option<Box<dyn TraceSink>> {
        #[cfg(feature = "trace")]
        {
            self.sink.take()
        }
        #[cfg(not(feature = "trace"))]
        {
            None
        }
    }

    /// Runs `f` against the installed sink, if any.
    ///
    /// Events raised while the sink is already running are dropped.
    #[cfg(feature = "trace")]
    #[inline]
    fn dispatch(&self, f: impl FnOnce(&mut dyn TraceSink)) {
        if let Ok(mut slot) = self.sink.try_borrow_mut() {
            if let Some(sink) = slot.as_deref_mut() {
                f(sink);
            }
        }
    }

    #[inline]
    pub(crate) fn compose(&self, e: &ComposeEvent) {
        #[cfg(feature = "trace")]
        self.dispatch(|s| s.on_compose(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    #[inline]
    pub(crate) fn prune(&self, e: &PruneEvent) {
        #[cfg(feature = "trace")]
        self.dispatch(|s| s.on_prune(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    #[inline]
    pub(crate) fn pop(&self, e: &PopEvent) {
        #[cfg(feature = "trace")]
        self.dispatch(|s| s.on_pop(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    #[inline]
    pub(crate) fn singular_inverse(&self) {
        #[cfg(feature = "trace")]
        self.dispatch(|s| s.on_singular_inverse());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
