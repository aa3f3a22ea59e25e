// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition of entry chains into dense matrices.
//!
//! Composing an entry walks toward the root until it reaches a *base* node:
//!
//! - [`Op::LoadIdentity`]: the base is the identity;
//! - [`Op::Load`]: the base is the stored matrix;
//! - [`Op::Save`] with a populated cache: the base is the cached matrix.
//!
//! The nodes passed on the way are then applied root-first onto a copy of the
//! base. Checkpoints passed with an empty cache receive the matrix composed
//! up to that point, so later queries through them stop there. Cost is
//! proportional to the distance to the nearest base, not to chain length.
//!
//! When the queried entry is itself a `Load` or an already cached checkpoint,
//! its storage is borrowed instead of copied.

use alloc::borrow::Cow;

use smallvec::SmallVec;

use crate::entry::{Entry, Node, Op, OpKind};
use crate::error::SingularMatrix;
use crate::trace::ComposeEvent;
use crate::transform::{self, Matrix};

/// Nodes recorded on the way to a base before spilling to the heap.
const INLINE_WALK: usize = 16;

impl Entry {
    /// Returns the transform this entry represents.
    ///
    /// The result borrows from the entry when no arithmetic is needed, and
    /// is composed into an owned matrix otherwise.
    ///
    /// # Panics
    ///
    /// Panics if the chain ends without an identity root, which cannot
    /// happen for entries built through a [`Stack`](crate::Stack).
    #[must_use]
    pub fn get(&self) -> Cow<'_, Matrix> {
        let tracer = &self.shared().tracer;

        match self.op() {
            Op::Load(m) => {
                tracer.compose(&ComposeEvent {
                    depth: 0,
                    base: OpKind::Load,
                    borrowed: true,
                    caches_filled: 0,
                });
                return Cow::Borrowed(&**m);
            }
            Op::Save(cache) => {
                if let Some(m) = cache.get() {
                    tracer.compose(&ComposeEvent {
                        depth: 0,
                        base: OpKind::Save,
                        borrowed: true,
                        caches_filled: 0,
                    });
                    return Cow::Borrowed(m);
                }
            }
            _ => {}
        }

        let mut walked: SmallVec<[&Node; INLINE_WALK]> = SmallVec::new();
        let mut node: &Node = &self.0;
        let (mut accum, base) = loop {
            match &node.op {
                Op::LoadIdentity => break (Matrix::identity(), OpKind::LoadIdentity),
                Op::Load(m) => break (**m, OpKind::Load),
                Op::Save(cache) => {
                    if let Some(m) = cache.get() {
                        break (*m, OpKind::Save);
                    }
                }
                _ => {}
            }
            walked.push(node);
            node = match &node.parent {
                Some(parent) => &parent.0,
                None => panic!("entry chain ended without an identity root"),
            };
        };

        let mut caches_filled = 0;
        for node in walked.iter().rev() {
            match &node.op {
                Op::Save(cache) => {
                    cache.fill(node.shared.pool.alloc_matrix(accum));
                    caches_filled += 1;
                }
                op => accum = transform::compose_onto(&accum, &local_matrix(op)),
            }
        }

        // A checkpoint queried directly now owns the result; hand that out.
        let borrowed = match self.op() {
            Op::Save(cache) => cache.get(),
            _ => None,
        };
        tracer.compose(&ComposeEvent {
            depth: walked.len(),
            base,
            borrowed: borrowed.is_some(),
            caches_filled,
        });
        match borrowed {
            Some(m) => Cow::Borrowed(m),
            None => Cow::Owned(accum),
        }
    }

    /// Returns the inverse of the transform this entry represents.
    ///
    /// # Errors
    ///
    /// Returns [`SingularMatrix`] if the transform is not invertible or the
    /// inverse is not finite.
    pub fn inverse(&self) -> Result<Matrix, SingularMatrix> {
        self.get()
            .inverse()
            .filter(transform::is_finite)
            .ok_or_else(|| {
                self.shared().tracer.singular_inverse();
                SingularMatrix
            })
    }
}

/// The matrix of a single non-base operation.
fn local_matrix(op: &Op) -> Matrix {
    match op {
        Op::Translate { x, y, z } => Matrix::translation(*x, *y, *z),
        Op::Rotate { angle, x, y, z } => transform::axis_angle(*angle, *x, *y, *z),
        Op::RotateQuaternion(q) => transform::quaternion_matrix(q),
        Op::RotateEuler(e) => e.to_matrix(),
        Op::Scale { x, y, z } => Matrix::scale(*x, *y, *z),
        Op::Multiply(m) => **m,
        Op::LoadIdentity | Op::Load(_) | Op::Save(_) => {
            unreachable!("{} ends a composition walk", op.kind().name())
        }
    }
}
