// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cheap comparisons between entries.
//!
//! These never compose a matrix. Consumers use them to skip work, such as
//! re-uploading a transform that has not changed or re-rendering a subtree
//! that only moved.
//!
//! Checkpoints are transparent to every comparison here: a `push` changes
//! nothing about the transform it wraps.

use smallvec::SmallVec;

use crate::entry::{Entry, Op};
use crate::transform::Vector;

impl Entry {
    /// Whether this entry's own operation is [`Op::LoadIdentity`].
    ///
    /// This never reports a false positive but may report false negatives:
    /// an entry that is numerically the identity through some other
    /// construction, or a checkpoint directly over the identity, returns
    /// `false`.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        matches!(self.op(), Op::LoadIdentity)
    }

    /// Whether two entries represent the same transform, using exact float
    /// comparison of operation payloads.
    ///
    /// Both chains are walked in lock step toward the root. The walk returns
    /// `true` as soon as both sides reach the same node, and stops at the
    /// first replacement operation, whose payload decides the result.
    /// Entries built differently that happen to compose to the same matrix
    /// compare unequal.
    #[must_use]
    pub fn equal(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }

        let mut a = self.skip_saves();
        let mut b = other.skip_saves();
        loop {
            if Self::ptr_eq(a, b) {
                return true;
            }
            match (a.op(), b.op()) {
                (Op::LoadIdentity, Op::LoadIdentity) => return true,
                (Op::Load(m0), Op::Load(m1)) => return **m0 == **m1,
                (
                    Op::Translate {
                        x: x0,
                        y: y0,
                        z: z0,
                    },
                    Op::Translate {
                        x: x1,
                        y: y1,
                        z: z1,
                    },
                )
                | (
                    Op::Scale {
                        x: x0,
                        y: y0,
                        z: z0,
                    },
                    Op::Scale {
                        x: x1,
                        y: y1,
                        z: z1,
                    },
                ) => {
                    if (x0, y0, z0) != (x1, y1, z1) {
                        return false;
                    }
                }
                (
                    Op::Rotate {
                        angle: a0,
                        x: x0,
                        y: y0,
                        z: z0,
                    },
                    Op::Rotate {
                        angle: a1,
                        x: x1,
                        y: y1,
                        z: z1,
                    },
                ) => {
                    if (a0, x0, y0, z0) != (a1, x1, y1, z1) {
                        return false;
                    }
                }
                (Op::RotateQuaternion(q0), Op::RotateQuaternion(q1)) => {
                    if (q0.i, q0.j, q0.k, q0.r) != (q1.i, q1.j, q1.k, q1.r) {
                        return false;
                    }
                }
                (Op::RotateEuler(e0), Op::RotateEuler(e1)) => {
                    if e0 != e1 {
                        return false;
                    }
                }
                (Op::Multiply(m0), Op::Multiply(m1)) => {
                    if **m0 != **m1 {
                        return false;
                    }
                }
                _ => return false,
            }
            match (a.parent(), b.parent()) {
                (Some(pa), Some(pb)) => {
                    a = pa.skip_saves();
                    b = pb.skip_saves();
                }
                _ => return false,
            }
        }
    }

    /// Returns the translation that takes this entry's transform to
    /// `other`'s, if the two differ by translations only.
    ///
    /// The nearest common ancestor must be reachable from both entries
    /// through translations alone. The result is the negated sum of this
    /// entry's translations down to that ancestor plus the sum of `other`'s.
    /// Returns `None` if any rotation, scale, multiplication or load lies on
    /// either path.
    #[must_use]
    pub fn calculate_translation(&self, other: &Self) -> Option<Vector> {
        let path0 = translation_path(self);
        let path1 = translation_path(other);

        let (i0, i1) = path0.iter().enumerate().find_map(|(i0, n0)| {
            path1
                .iter()
                .position(|n1| Self::ptr_eq(n0, n1))
                .map(|i1| (i0, i1))
        })?;

        let mut delta = Vector::zero();
        for entry in &path0[..i0] {
            delta -= translation_of(entry);
        }
        for entry in &path1[..i1] {
            delta += translation_of(entry);
        }
        Some(delta)
    }
}

/// Non-checkpoint entries from `entry` toward the root, ending at the first
/// one that is not a translation.
///
/// Everything in the path except possibly its last element is a translation.
fn translation_path(entry: &Entry) -> SmallVec<[&Entry; 8]> {
    let mut path = SmallVec::new();
    let mut next = Some(entry);
    while let Some(entry) = next {
        match entry.op() {
            Op::Save(_) => {}
            Op::Translate { .. } => path.push(entry),
            _ => {
                path.push(entry);
                break;
            }
        }
        next = entry.parent();
    }
    path
}

fn translation_of(entry: &Entry) -> Vector {
    match entry.op() {
        Op::Translate { x, y, z } => Vector::new(*x, *y, *z),
        _ => unreachable!("translation paths only pass through translations"),
    }
}
