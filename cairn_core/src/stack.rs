// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traversal cursor over the operation graph.
//!
//! A [`Stack`] tracks the entry representing the fully composed transform at
//! the current point of a traversal. The intended pattern is depth-first:
//!
//! ```text
//!   descend ─► push ─► translate/rotate/... ─► recurse ─► pop ─► ascend
//! ```
//!
//! Every operation appends a new immutable entry whose parent is the previous
//! top; nothing is ever modified in place, so an [`Entry`] obtained from
//! [`Stack::entry`] keeps describing the same transform no matter what the
//! stack does afterwards.
//!
//! # Replacement pruning
//!
//! Operations that discard everything accumulated before them
//! ([`load_identity`](Stack::load_identity), [`set`](Stack::set) and the
//! projection setups) first move the stack back to the nearest checkpoint, or
//! the root if there is none, before appending. Entries skipped this way are
//! released unless something else still references them. This keeps chain
//! length bounded by traversal depth when a stack is reset and rebuilt every
//! frame.

use alloc::borrow::Cow;

use crate::context::Context;
use crate::entry::{Entry, Op, SaveCache};
use crate::error::SingularMatrix;
use crate::trace::{PopEvent, PruneEvent};
use crate::transform::{self, Euler, Matrix, Quaternion};

/// A mutable cursor over an immutable, structurally shared transform graph.
#[derive(Clone)]
pub struct Stack {
    top: Entry,
}

impl Stack {
    /// Creates a stack positioned at the context's identity root.
    #[must_use]
    pub fn new(ctx: &Context) -> Self {
        Self {
            top: ctx.identity(),
        }
    }

    /// Creates a stack positioned at an existing entry.
    ///
    /// Useful for resuming a traversal from a recorded transform. Popping
    /// past checkpoints that were pushed before `entry` is allowed.
    #[must_use]
    pub fn from_entry(entry: Entry) -> Self {
        Self { top: entry }
    }

    // -- Checkpoints --

    /// Records a checkpoint that a later [`pop`](Self::pop) returns to.
    ///
    /// The composed transform does not change.
    pub fn push(&mut self) {
        self.append(Op::Save(SaveCache::new()));
    }

    /// Restores the transform that was current before the matching
    /// [`push`](Self::push).
    ///
    /// # Panics
    ///
    /// Panics if there is no checkpoint between the top and the root, i.e.
    /// `pop` was called more often than `push`.
    pub fn pop(&mut self) {
        let mut unwound = 0;
        let mut entry = &self.top;
        let restored = loop {
            if let Op::Save(_) = entry.op() {
                match entry.parent() {
                    Some(parent) => break parent.clone(),
                    None => unreachable!("checkpoints always have a parent"),
                }
            }
            entry = match entry.parent() {
                Some(parent) => parent,
                None => panic!("pop without a matching push"),
            };
            unwound += 1;
        };
        self.top = restored;
        self.top.shared().tracer.pop(&PopEvent { unwound });
    }

    // -- Accumulating operations --

    /// Translates by `(x, y, z)`.
    pub fn translate(&mut self, x: f64, y: f64, z: f64) {
        self.append(Op::Translate { x, y, z });
    }

    /// Rotates by `angle` degrees about the axis `(x, y, z)`.
    pub fn rotate(&mut self, angle: f64, x: f64, y: f64, z: f64) {
        self.append(Op::Rotate { angle, x, y, z });
    }

    /// Rotates by a quaternion.
    pub fn rotate_quaternion(&mut self, q: &Quaternion) {
        self.append(Op::RotateQuaternion(*q));
    }

    /// Rotates by Euler angles.
    pub fn rotate_euler(&mut self, e: &Euler) {
        self.append(Op::RotateEuler(*e));
    }

    /// Scales by `(x, y, z)`.
    pub fn scale(&mut self, x: f64, y: f64, z: f64) {
        self.append(Op::Scale { x, y, z });
    }

    /// Multiplies by an arbitrary matrix.
    pub fn multiply(&mut self, matrix: &Matrix) {
        let m = self.top.shared().pool.alloc_matrix(*matrix);
        self.append(Op::Multiply(m));
    }

    /// Multiplies by a 2D affine transform acting in the XY plane.
    pub fn transform_2d(&mut self, affine: kurbo::Affine) {
        self.multiply(&transform::from_affine(affine));
    }

    // -- Replacement operations --

    /// Resets the transform to the identity.
    pub fn load_identity(&mut self) {
        self.append_replacement(Op::LoadIdentity);
    }

    /// Replaces the transform with `matrix`.
    pub fn set(&mut self, matrix: &Matrix) {
        let m = self.top.shared().pool.alloc_matrix(*matrix);
        self.append_replacement(Op::Load(m));
    }

    /// Replaces the transform with a perspective frustum.
    ///
    /// See [`transform::frustum`].
    pub fn frustum(
        &mut self,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        z_near: f64,
        z_far: f64,
    ) {
        self.set(&transform::frustum(left, right, bottom, top, z_near, z_far));
    }

    /// Replaces the transform with a symmetric perspective projection.
    ///
    /// See [`transform::perspective`].
    pub fn perspective(&mut self, fov_y: f64, aspect: f64, z_near: f64, z_far: f64) {
        self.set(&transform::perspective(fov_y, aspect, z_near, z_far));
    }

    /// Replaces the transform with an orthographic projection.
    ///
    /// See [`transform::orthographic`].
    pub fn orthographic(&mut self, x_1: f64, y_1: f64, x_2: f64, y_2: f64, near: f64, far: f64) {
        self.set(&transform::orthographic(x_1, y_1, x_2, y_2, near, far));
    }

    // -- Queries --

    /// Returns the current composed transform.
    ///
    /// Borrows from the top entry when possible; see [`Entry::get`].
    #[must_use]
    pub fn get(&self) -> Cow<'_, Matrix> {
        self.top.get()
    }

    /// Returns the inverse of the current composed transform.
    ///
    /// # Errors
    ///
    /// Returns [`SingularMatrix`] if the transform is degenerate.
    pub fn get_inverse(&self) -> Result<Matrix, SingularMatrix> {
        self.top.inverse()
    }

    /// Returns the inverse of the current transform, or the identity if the
    /// transform is degenerate.
    #[must_use]
    pub fn get_inverse_or_identity(&self) -> Matrix {
        self.get_inverse().unwrap_or_else(|_| Matrix::identity())
    }

    /// Returns a new reference to the top entry.
    #[must_use]
    pub fn entry(&self) -> Entry {
        self.top.clone()
    }

    /// Borrows the top entry.
    #[must_use]
    pub fn entry_ref(&self) -> &Entry {
        &self.top
    }

    // -- Internal helpers --

    /// Appends `op` on top of the current entry.
    fn append(&mut self, op: Op) {
        let parent = self.top.clone();
        self.top = Entry::with_parent(op, parent);
    }

    /// Prunes back to the nearest checkpoint (or the root), then appends `op`.
    fn append_replacement(&mut self, op: Op) {
        let mut discarded = 0;
        let mut entry = &self.top;
        while !matches!(entry.op(), Op::Save(_)) {
            match entry.parent() {
                Some(parent) => entry = parent,
                None => break,
            }
            discarded += 1;
        }
        let reached_checkpoint = matches!(entry.op(), Op::Save(_));
        if discarded > 0 {
            self.top = entry.clone();
        }
        self.top.shared().tracer.prune(&PruneEvent {
            discarded,
            reached_checkpoint,
        });
        self.append(op);
    }
}

impl core::fmt::Debug for Stack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Stack")
            .field("top", &self.top.kind())
            .field("depth", &self.top.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::OpKind;
    use crate::pool::PoolConfig;

    #[test]
    fn new_stack_starts_at_identity() {
        let ctx = Context::new();
        let stack = Stack::new(&ctx);
        assert!(stack.entry().is_identity());
        assert!(Entry::ptr_eq(stack.entry_ref(), &ctx.identity()));
        assert_eq!(*stack.get(), Matrix::identity());
    }

    #[test]
    fn push_pop_restores_entry() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.translate(1.0, 2.0, 3.0);
        let before = stack.entry();
        stack.push();
        stack.rotate(90.0, 0.0, 1.0, 0.0);
        stack.scale(2.0, 2.0, 2.0);
        stack.pop();
        assert!(Entry::ptr_eq(&stack.entry(), &before));
        assert_eq!(*stack.get(), Matrix::translation(1.0, 2.0, 3.0));
    }

    #[test]
    fn nested_push_pop() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.push();
        stack.translate(1.0, 0.0, 0.0);
        let outer = stack.entry();
        stack.push();
        stack.translate(0.0, 1.0, 0.0);
        stack.pop();
        assert!(Entry::ptr_eq(&stack.entry(), &outer));
        stack.pop();
        assert!(stack.entry().is_identity());
    }

    #[test]
    fn pop_with_adjacent_checkpoints() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.push();
        stack.push();
        stack.translate(1.0, 0.0, 0.0);
        stack.pop();
        assert_eq!(stack.entry().kind(), OpKind::Save);
        stack.pop();
        assert!(stack.entry().is_identity());
    }

    #[test]
    #[should_panic(expected = "pop without a matching push")]
    fn unbalanced_pop_panics() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.translate(1.0, 0.0, 0.0);
        stack.pop();
    }

    #[test]
    fn append_links_to_previous_top() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.translate(1.0, 0.0, 0.0);
        let first = stack.entry();
        stack.scale(2.0, 2.0, 2.0);
        let top = stack.entry();
        assert!(Entry::ptr_eq(top.parent().expect("has parent"), &first));
        // Held by `first` and by the new top.
        assert_eq!(first.ref_count(), 2);
    }

    #[test]
    fn replacement_prunes_to_checkpoint() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.translate(1.0, 0.0, 0.0);
        stack.push();
        let checkpoint = stack.entry();
        stack.translate(2.0, 0.0, 0.0);
        stack.translate(3.0, 0.0, 0.0);
        stack.load_identity();

        let top = stack.entry();
        assert!(top.is_identity());
        assert!(Entry::ptr_eq(top.parent().expect("has parent"), &checkpoint));
        // root, translate(1), checkpoint, load_identity
        assert_eq!(ctx.stats().live_entries, 4);
    }

    #[test]
    fn replacement_without_checkpoint_prunes_to_root() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.translate(1.0, 0.0, 0.0);
        stack.scale(2.0, 2.0, 2.0);
        stack.set(&Matrix::translation(7.0, 0.0, 0.0));
        let top = stack.entry();
        assert_eq!(top.kind(), OpKind::Load);
        assert!(Entry::ptr_eq(top.parent().expect("has parent"), &ctx.identity()));
        assert_eq!(*stack.get(), Matrix::translation(7.0, 0.0, 0.0));
    }

    #[test]
    fn replacement_keeps_externally_held_entries() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.translate(1.0, 0.0, 0.0);
        let held = stack.entry();
        stack.load_identity();
        assert_eq!(*held.get(), Matrix::translation(1.0, 0.0, 0.0));
        assert_eq!(held.ref_count(), 1);
    }

    #[test]
    fn push_load_identity_pop_round_trip() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.translate(4.0, 5.0, 6.0);
        stack.rotate(10.0, 1.0, 1.0, 0.0);
        let before = stack.entry();
        let before_matrix = before.get().into_owned();

        stack.push();
        stack.load_identity();
        stack.pop();

        assert!(stack.entry().equal(&before));
        assert_eq!(*stack.get(), before_matrix);
    }

    #[test]
    fn rebuild_every_frame_stays_bounded() {
        let ctx = Context::with_config(PoolConfig::unpooled());
        let mut stack = ctx.new_stack();
        stack.push();
        for frame in 0..1_000 {
            stack.load_identity();
            stack.translate(f64::from(frame), 0.0, 0.0);
            stack.scale(2.0, 2.0, 2.0);
        }
        // root, checkpoint, identity, translate, scale
        assert_eq!(ctx.stats().live_entries, 5);
        assert_eq!(stack.entry().depth(), 4);
    }

    #[test]
    fn projections_are_loads() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.translate(1.0, 0.0, 0.0);
        stack.perspective(60.0, 1.5, 0.1, 100.0);
        assert_eq!(stack.entry().kind(), OpKind::Load);
        assert_eq!(*stack.get(), transform::perspective(60.0, 1.5, 0.1, 100.0));

        stack.frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        assert_eq!(
            *stack.get(),
            transform::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0)
        );

        stack.orthographic(0.0, 0.0, 640.0, 480.0, -1.0, 1.0);
        assert_eq!(
            *stack.get(),
            transform::orthographic(0.0, 0.0, 640.0, 480.0, -1.0, 1.0)
        );
        assert_eq!(stack.entry().depth(), 1, "each projection replaces the last");
    }

    #[test]
    fn transform_2d_multiplies_affine() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.transform_2d(kurbo::Affine::translate((3.0, 4.0)));
        assert_eq!(stack.entry().kind(), OpKind::Multiply);
        assert_eq!(*stack.get(), Matrix::translation(3.0, 4.0, 0.0));
        assert_eq!(
            transform::to_affine(&stack.get()),
            Some(kurbo::Affine::translate((3.0, 4.0)))
        );
    }

    #[test]
    fn from_entry_resumes_traversal() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.push();
        stack.translate(1.0, 0.0, 0.0);
        let mut resumed = Stack::from_entry(stack.entry());
        resumed.translate(1.0, 0.0, 0.0);
        assert_eq!(*resumed.get(), Matrix::translation(2.0, 0.0, 0.0));
        resumed.pop();
        assert!(resumed.entry().is_identity());
        assert_eq!(*stack.get(), Matrix::translation(1.0, 0.0, 0.0));
    }

    #[test]
    fn dropping_stacks_releases_everything() {
        let ctx = Context::with_config(PoolConfig::unpooled());
        {
            let mut a = ctx.new_stack();
            let mut b = ctx.new_stack();
            a.push();
            a.multiply(&Matrix::scale(2.0, 2.0, 2.0));
            b.set(&Matrix::translation(1.0, 1.0, 1.0));
            let _ = a.get();
            let _ = b.get();
            assert!(ctx.stats().live_matrices > 0);
        }
        let stats = ctx.stats();
        assert_eq!(stats.live_entries, 1, "only the identity root remains");
        assert_eq!(stats.live_matrices, 0);
    }

    #[test]
    fn inverse_or_identity_falls_back() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.translate(1.0, 2.0, 3.0);
        assert_eq!(
            stack.get_inverse_or_identity(),
            Matrix::translation(-1.0, -2.0, -3.0)
        );
        stack.multiply(&Matrix::scale(0.0, 0.0, 0.0));
        assert_eq!(stack.get_inverse_or_identity(), Matrix::identity());
    }
}
