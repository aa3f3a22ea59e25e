// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use cairn_core::trace::{ComposeEvent, PopEvent, PruneEvent, TraceSink};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_compose(&mut self, e: &ComposeEvent) {
        let source = if e.borrowed { "borrowed" } else { "owned" };
        let _ = writeln!(
            self.writer,
            "[compose] depth={} base={} {source} filled={}",
            e.depth,
            e.base.name(),
            e.caches_filled,
        );
    }

    fn on_prune(&mut self, e: &PruneEvent) {
        let to = if e.reached_checkpoint {
            "checkpoint"
        } else {
            "root"
        };
        let _ = writeln!(
            self.writer,
            "[prune] discarded={} to={to}",
            e.discarded
        );
    }

    fn on_pop(&mut self, e: &PopEvent) {
        let _ = writeln!(self.writer, "[pop] unwound={}", e.unwound);
    }

    fn on_singular_inverse(&mut self) {
        let _ = writeln!(self.writer, "[inverse] singular");
    }
}
