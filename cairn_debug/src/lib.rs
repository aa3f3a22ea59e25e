// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and chain dumps for cairn diagnostics.
//!
//! - [`pretty::PrettyPrintSink`]: a [`TraceSink`](cairn_core::trace::TraceSink)
//!   writing one human-readable line per event.
//! - [`dump::format_chain`] and [`dump::chain_to_json`]: render an entry and
//!   its ancestors, root first, as text or JSON.

pub mod dump;
pub mod pretty;
