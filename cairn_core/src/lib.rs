// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persistent transform stacks for scene-graph traversal.
//!
//! `cairn_core` records transform operations (translate, rotate, scale,
//! multiply, load) as an immutable graph of reference-counted entries instead
//! of a mutable array of matrices. Pushing a checkpoint, appending a few
//! operations and popping back shares every ancestor, and any entry handed
//! out keeps meaning the same transform forever. Dense 4×4 matrices are only
//! composed when asked for, and checkpoints remember what they composed so
//! repeated queries stay cheap. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   Context ──► Stack::push / translate / ... ──► Entry graph
//!      │                                             │
//!      │  matrix pool, identity root, trace sink     ├──► Entry::get()      (compose)
//!      └─────────────────────────────────────────────┤
//!                                                    └──► Entry::equal()    (compare)
//! ```
//!
//! **[`context`]**: The [`Context`] owns the matrix pool, the shared
//! identity root and the trace sink; every [`Stack`] is created from one.
//!
//! **[`stack`]**: The traversal cursor. Accumulating operations append on
//! top; replacement operations prune back to the nearest checkpoint first.
//!
//! **[`entry`]**: Graph nodes and their [`Op`] payloads. Composition and
//! comparison are methods on [`Entry`].
//!
//! **[`cache`]**: [`EntryCache`], a renderer-side memo that decides whether
//! a transform needs re-uploading.
//!
//! **[`pool`]**: Matrix recycling and allocation counters.
//!
//! **[`transform`]**: Matrix type aliases, projection builders and
//! conversions to and from `kurbo::Affine`.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! composition and pruning instrumentation.
//!
//! # Conventions
//!
//! Matrices are `euclid` transforms, composed in column-vector terms as
//! `M' = M · Op` (see [`transform::compose_onto`]). Each appended operation
//! applies to points before everything recorded beneath it, so
//! `translate` then `scale` scales first. Angles are in degrees.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod cache;
mod compare;
pub mod context;
pub mod entry;
pub mod error;
pub mod pool;
mod resolve;
pub mod stack;
pub mod trace;
pub mod transform;

pub use cache::EntryCache;
pub use context::Context;
pub use entry::{Ancestors, Entry, Op, OpKind, SaveCache};
pub use error::SingularMatrix;
pub use pool::{PoolConfig, PoolStats, PooledMatrix};
pub use stack::Stack;
pub use transform::{Euler, Matrix, Quaternion, Vector};
