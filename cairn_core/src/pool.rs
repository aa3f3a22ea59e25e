// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Size-class pooling for entry payloads.
//!
//! Traversals build and discard entries at a high rate, most of them small
//! (a translate is four floats and a parent link). Dense matrices are kept
//! out of line so those small entries stay small, and the boxes that hold
//! them are recycled through a free list instead of going back to the global
//! allocator. Entries themselves are `Rc` allocations; the pool only counts
//! them, which is what makes leaks and double releases observable through
//! [`PoolStats`].

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::ops::Deref;

use crate::transform::Matrix;

/// Configuration for a [`Context`](crate::Context)'s pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Matrix boxes allocated up front when the context is created.
    pub matrix_prealloc: usize,
    /// Upper bound on boxes kept in the free list. Boxes released beyond this
    /// are returned to the global allocator.
    pub max_free_matrices: usize,
}

impl PoolConfig {
    /// Default configuration: a small warm pool with generous retention.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            matrix_prealloc: 20,
            max_free_matrices: 256,
        }
    }

    /// A pool that never retains released boxes.
    #[must_use]
    pub const fn unpooled() -> Self {
        Self {
            matrix_prealloc: 0,
            max_free_matrices: 0,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocation counters for a context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Entries currently alive, including the identity root.
    pub live_entries: usize,
    /// Highest value `live_entries` has reached.
    pub peak_entries: usize,
    /// Entries created over the lifetime of the context.
    pub entries_created: u64,
    /// Matrices currently held by entries.
    pub live_matrices: usize,
    /// Matrix boxes obtained from the global allocator.
    pub matrices_created: u64,
    /// Matrix requests served from the free list.
    pub matrices_reused: u64,
    /// Boxes currently waiting in the free list.
    pub free_matrices: usize,
}

/// Free list and counters shared by every entry of a context.
pub(crate) struct Pool {
    config: PoolConfig,
    free: RefCell<Vec<Box<Matrix>>>,
    stats: Cell<PoolStats>,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.config)
            .field("stats", &self.stats.get())
            .finish_non_exhaustive()
    }
}

impl Pool {
    pub(crate) fn new(config: PoolConfig) -> Self {
        let prealloc = config.matrix_prealloc.min(config.max_free_matrices);
        let free: Vec<_> = (0..prealloc)
            .map(|_| Box::new(Matrix::identity()))
            .collect();
        let stats = PoolStats {
            matrices_created: prealloc as u64,
            free_matrices: prealloc,
            ..PoolStats::default()
        };
        Self {
            config,
            free: RefCell::new(free),
            stats: Cell::new(stats),
        }
    }

    pub(crate) fn config(&self) -> PoolConfig {
        self.config
    }

    pub(crate) fn stats(&self) -> PoolStats {
        self.stats.get()
    }

    fn update(&self, f: impl FnOnce(&mut PoolStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    /// Stores `matrix` in a pooled box.
    pub(crate) fn alloc_matrix(self: &Rc<Self>, matrix: Matrix) -> PooledMatrix {
        let recycled = self.free.borrow_mut().pop();
        let boxed = match recycled {
            Some(mut boxed) => {
                *boxed = matrix;
                self.update(|s| {
                    s.matrices_reused += 1;
                    s.free_matrices -= 1;
                    s.live_matrices += 1;
                });
                boxed
            }
            None => {
                self.update(|s| {
                    s.matrices_created += 1;
                    s.live_matrices += 1;
                });
                Box::new(matrix)
            }
        };
        PooledMatrix {
            matrix: Some(boxed),
            pool: Rc::clone(self),
        }
    }

    fn release_matrix(&self, boxed: Box<Matrix>) {
        let mut free = self.free.borrow_mut();
        let keep = free.len() < self.config.max_free_matrices;
        if keep {
            free.push(boxed);
        }
        drop(free);
        self.update(|s| {
            s.live_matrices -= 1;
            if keep {
                s.free_matrices += 1;
            }
        });
    }

    pub(crate) fn entry_created(&self) {
        self.update(|s| {
            s.live_entries += 1;
            s.entries_created += 1;
            s.peak_entries = s.peak_entries.max(s.live_entries);
        });
    }

    pub(crate) fn entry_released(&self) {
        self.update(|s| {
            assert!(s.live_entries > 0, "entry released more often than created");
            s.live_entries -= 1;
        });
    }
}

/// A matrix stored in a pooled box, owned by exactly one entry.
///
/// Dereferences to [`Matrix`]. Dropping it returns the box to the pool it
/// came from.
pub struct PooledMatrix {
    // Only `None` while being dropped.
    matrix: Option<Box<Matrix>>,
    pool: Rc<Pool>,
}

impl Deref for PooledMatrix {
    type Target = Matrix;

    #[inline]
    fn deref(&self) -> &Matrix {
        match &self.matrix {
            Some(m) => &**m,
            None => unreachable!("pooled matrix accessed during drop"),
        }
    }
}

impl Drop for PooledMatrix {
    fn drop(&mut self) {
        if let Some(boxed) = self.matrix.take() {
            self.pool.release_matrix(boxed);
        }
    }
}

impl fmt::Debug for PooledMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
