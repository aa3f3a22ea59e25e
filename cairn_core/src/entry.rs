// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Operation graph nodes.
//!
//! An [`Entry`] is an immutable node holding one [`Op`] and a strong
//! reference to its parent. Chains of entries share their common prefix, so a
//! stack that descends into a subtree, records a few operations and pops back
//! out never copies ancestor state.
//!
//! Cloning an [`Entry`] takes a new strong reference; dropping one releases
//! it. When the last reference to a node goes away the node releases its
//! payload and then its parent reference, walking up the chain iteratively so
//! that arbitrarily long chains can be released without deep recursion.
//!
//! The only state that changes after construction is a checkpoint's
//! [`SaveCache`], which is filled at most once by the resolver and is never
//! invalidated: everything above a checkpoint is immutable, so the composed
//! value cannot go stale.

use alloc::rc::Rc;
use core::cell::OnceCell;
use core::fmt;

use crate::context::Shared;
use crate::pool::PooledMatrix;
use crate::transform::{Euler, Matrix, Quaternion};

/// The operation recorded by an entry.
#[derive(Debug)]
pub enum Op {
    /// Replace the accumulated transform with the identity.
    LoadIdentity,
    /// Translate by `(x, y, z)`.
    Translate {
        /// X displacement.
        x: f64,
        /// Y displacement.
        y: f64,
        /// Z displacement.
        z: f64,
    },
    /// Rotate by `angle` degrees about the axis `(x, y, z)`.
    Rotate {
        /// Angle in degrees.
        angle: f64,
        /// Axis X component.
        x: f64,
        /// Axis Y component.
        y: f64,
        /// Axis Z component.
        z: f64,
    },
    /// Rotate by a quaternion.
    RotateQuaternion(Quaternion),
    /// Rotate by Euler angles.
    RotateEuler(Euler),
    /// Scale by `(x, y, z)`.
    Scale {
        /// X factor.
        x: f64,
        /// Y factor.
        y: f64,
        /// Z factor.
        z: f64,
    },
    /// Multiply by an arbitrary matrix.
    Multiply(PooledMatrix),
    /// Replace the accumulated transform with a matrix.
    Load(PooledMatrix),
    /// Checkpoint created by [`Stack::push`](crate::Stack::push).
    Save(SaveCache),
}

impl Op {
    /// Returns the payload-free kind of this operation.
    #[must_use]
    pub fn kind(&self) -> OpKind {
        match self {
            Self::LoadIdentity => OpKind::LoadIdentity,
            Self::Translate { .. } => OpKind::Translate,
            Self::Rotate { .. } => OpKind::Rotate,
            Self::RotateQuaternion(_) => OpKind::RotateQuaternion,
            Self::RotateEuler(_) => OpKind::RotateEuler,
            Self::Scale { .. } => OpKind::Scale,
            Self::Multiply(_) => OpKind::Multiply,
            Self::Load(_) => OpKind::Load,
            Self::Save(_) => OpKind::Save,
        }
    }
}

/// Operation kinds, without payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// [`Op::LoadIdentity`].
    LoadIdentity,
    /// [`Op::Translate`].
    Translate,
    /// [`Op::Rotate`].
    Rotate,
    /// [`Op::RotateQuaternion`].
    RotateQuaternion,
    /// [`Op::RotateEuler`].
    RotateEuler,
    /// [`Op::Scale`].
    Scale,
    /// [`Op::Multiply`].
    Multiply,
    /// [`Op::Load`].
    Load,
    /// [`Op::Save`].
    Save,
}

impl OpKind {
    /// Returns a short lowercase name, e.g. `"translate"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LoadIdentity => "load_identity",
            Self::Translate => "translate",
            Self::Rotate => "rotate",
            Self::RotateQuaternion => "rotate_quaternion",
            Self::RotateEuler => "rotate_euler",
            Self::Scale => "scale",
            Self::Multiply => "multiply",
            Self::Load => "load",
            Self::Save => "save",
        }
    }

    /// Whether this operation discards everything accumulated before it.
    #[must_use]
    pub const fn is_replacement(self) -> bool {
        matches!(self, Self::LoadIdentity | Self::Load)
    }
}

/// A checkpoint's lazily composed matrix.
#[derive(Default)]
pub struct SaveCache(OnceCell<PooledMatrix>);

impl SaveCache {
    pub(crate) fn new() -> Self {
        Self(OnceCell::new())
    }

    /// Returns the cached matrix, if the checkpoint has been composed.
    #[must_use]
    pub fn get(&self) -> Option<&Matrix> {
        self.0.get().map(|m| &**m)
    }

    /// Whether the cache has been populated.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.get().is_some()
    }

    /// Populates the cache, keeping the existing value if there is one.
    pub(crate) fn fill(&self, matrix: PooledMatrix) -> &Matrix {
        self.0.get_or_init(|| matrix)
    }
}

impl fmt::Debug for SaveCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(m) => f.debug_tuple("SaveCache").field(m).finish(),
            None => f.write_str("SaveCache(<empty>)"),
        }
    }
}

pub(crate) struct Node {
    pub(crate) op: Op,
    /// `None` only for a context's identity root.
    pub(crate) parent: Option<Entry>,
    pub(crate) shared: Rc<Shared>,
}

impl Drop for Node {
    fn drop(&mut self) {
        self.shared.pool.entry_released();
        // Release ancestors one at a time. A parent whose last reference we
        // hold is unwrapped here, so its own drop sees no parent and returns.
        let mut next = self.parent.take();
        while let Some(Entry(rc)) = next {
            next = match Rc::try_unwrap(rc) {
                Ok(mut node) => node.parent.take(),
                Err(_) => None,
            };
        }
    }
}

/// A strong reference to a node in the operation graph.
///
/// `clone` takes a reference and `drop` releases it. Two handles are the
/// same node when [`Entry::ptr_eq`] holds; structural comparison is
/// [`Entry::equal`].
#[derive(Clone)]
pub struct Entry(pub(crate) Rc<Node>);

impl Entry {
    /// Creates a parentless identity node for a fresh context.
    pub(crate) fn root(shared: &Rc<Shared>) -> Self {
        shared.pool.entry_created();
        Self(Rc::new(Node {
            op: Op::LoadIdentity,
            parent: None,
            shared: Rc::clone(shared),
        }))
    }

    /// Creates a node for `op` on top of `parent`, taking over its reference.
    pub(crate) fn with_parent(op: Op, parent: Self) -> Self {
        let shared = Rc::clone(&parent.0.shared);
        shared.pool.entry_created();
        Self(Rc::new(Node {
            op,
            parent: Some(parent),
            shared,
        }))
    }

    pub(crate) fn shared(&self) -> &Rc<Shared> {
        &self.0.shared
    }

    /// Returns the operation recorded by this entry.
    #[inline]
    #[must_use]
    pub fn op(&self) -> &Op {
        &self.0.op
    }

    /// Returns the kind of operation recorded by this entry.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> OpKind {
        self.0.op.kind()
    }

    /// Returns the parent entry, or `None` for the identity root.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.0.parent.as_ref()
    }

    /// Number of ancestors between this entry and the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }

    /// Iterates from this entry to the root, inclusive.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Number of strong references to this node.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Whether two handles refer to the same node.
    #[inline]
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Walks past checkpoints to the nearest non-checkpoint ancestor.
    pub(crate) fn skip_saves(&self) -> &Self {
        let mut entry = self;
        while let (Op::Save(_), Some(parent)) = (entry.op(), entry.parent()) {
            entry = parent;
        }
        entry
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("op", self.op())
            .field("ref_count", &self.ref_count())
            .finish_non_exhaustive()
    }
}

/// Iterator over an entry and its ancestors, leaf first.
///
/// Created by [`Entry::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    next: Option<&'a Entry>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<&'a Entry> {
        let entry = self.next?;
        self.next = entry.parent();
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::Context;

    fn translate(parent: Entry, x: f64) -> Entry {
        Entry::with_parent(Op::Translate { x, y: 0.0, z: 0.0 }, parent)
    }

    #[test]
    fn root_is_parentless_identity() {
        let ctx = Context::new();
        let root = ctx.identity();
        assert_eq!(root.kind(), OpKind::LoadIdentity);
        assert!(root.parent().is_none());
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn child_takes_parent_reference() {
        let ctx = Context::new();
        let root = ctx.identity();
        let before = root.ref_count();
        let child = translate(root.clone(), 1.0);
        assert_eq!(root.ref_count(), before + 1);
        assert!(Entry::ptr_eq(child.parent().expect("has parent"), &root));
        drop(child);
        assert_eq!(root.ref_count(), before);
    }

    #[test]
    fn clone_and_drop_adjust_count() {
        let ctx = Context::new();
        let e = translate(ctx.identity(), 1.0);
        assert_eq!(e.ref_count(), 1);
        let e2 = e.clone();
        assert_eq!(e.ref_count(), 2);
        drop(e2);
        assert_eq!(e.ref_count(), 1);
    }

    #[test]
    fn release_propagates_up_the_chain() {
        let ctx = Context::new();
        let a = translate(ctx.identity(), 1.0);
        let b = translate(a.clone(), 2.0);
        let c = translate(b, 3.0);
        assert_eq!(ctx.stats().live_entries, 4);
        drop(c);
        // `b` was only held by `c`; `a` is still held here.
        assert_eq!(ctx.stats().live_entries, 2);
        assert_eq!(a.ref_count(), 1);
        drop(a);
        assert_eq!(ctx.stats().live_entries, 1);
    }

    #[test]
    fn long_chain_releases_without_overflow() {
        let ctx = Context::new();
        let mut e = ctx.identity();
        for i in 0..200_000 {
            e = translate(e, f64::from(i % 7));
        }
        assert_eq!(ctx.stats().live_entries, 200_001);
        drop(e);
        assert_eq!(ctx.stats().live_entries, 1);
    }

    #[test]
    fn shared_prefix_survives_one_branch() {
        let ctx = Context::new();
        let base = translate(ctx.identity(), 1.0);
        let left = translate(base.clone(), 2.0);
        let right = translate(base, 3.0);
        drop(left);
        let kinds: Vec<_> = right.ancestors().map(Entry::kind).collect();
        assert_eq!(
            kinds,
            [OpKind::Translate, OpKind::Translate, OpKind::LoadIdentity]
        );
        assert_eq!(ctx.stats().live_entries, 3);
    }

    #[test]
    fn skip_saves_walks_adjacent_checkpoints() {
        let ctx = Context::new();
        let t = translate(ctx.identity(), 1.0);
        let s1 = Entry::with_parent(Op::Save(SaveCache::new()), t.clone());
        let s2 = Entry::with_parent(Op::Save(SaveCache::new()), s1);
        assert!(Entry::ptr_eq(s2.skip_saves(), &t));
        assert!(Entry::ptr_eq(t.skip_saves(), &t));
    }

    #[test]
    fn payload_matrix_returns_to_pool() {
        let ctx = Context::new();
        let m = ctx.shared().pool.alloc_matrix(Matrix::scale(2.0, 2.0, 2.0));
        let e = Entry::with_parent(Op::Multiply(m), ctx.identity());
        assert_eq!(ctx.stats().live_matrices, 1);
        drop(e);
        assert_eq!(ctx.stats().live_matrices, 0);
    }

    #[test]
    fn kind_names() {
        assert_eq!(OpKind::RotateQuaternion.name(), "rotate_quaternion");
        assert!(OpKind::Load.is_replacement());
        assert!(!OpKind::Save.is_replacement());
    }
}
