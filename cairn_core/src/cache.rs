// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flush memo for renderers.
//!
//! A renderer that uploads the current transform to the GPU keeps one
//! [`EntryCache`] per uniform slot and asks it whether the entry about to be
//! drawn differs from the one last uploaded.

use crate::entry::Entry;

/// Remembers the last entry flushed to a consumer.
///
/// Holding the entry keeps it alive, so pointer identity stays meaningful
/// across frames.
#[derive(Debug, Default)]
pub struct EntryCache {
    entry: Option<Entry>,
    flushed_identity: bool,
    flipped: bool,
}

impl EntryCache {
    /// Creates an empty cache.
    ///
    /// An empty cache starts out as if a non-identity, unflipped transform
    /// had been flushed, so the first identity update reports a change.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `entry` as flushed with the given `flip` flag and returns
    /// whether the consumer must re-upload.
    ///
    /// A re-upload is needed when `flip` changed, when the entry's identity
    /// status changed, or when `entry` is a different node that is not the
    /// identity. Two distinct identity entries do not count as a change.
    pub fn update(&mut self, entry: &Entry, flip: bool) -> bool {
        let mut updated = false;

        if self.flipped != flip {
            self.flipped = flip;
            updated = true;
        }

        let is_identity = entry.is_identity();
        if self.flushed_identity != is_identity {
            self.flushed_identity = is_identity;
            updated = true;
        }

        let same = self
            .entry
            .as_ref()
            .is_some_and(|cached| Entry::ptr_eq(cached, entry));
        if !same {
            self.entry = Some(entry.clone());
            updated |= !is_identity;
        }

        updated
    }

    /// Returns the last flushed entry.
    #[must_use]
    pub fn entry(&self) -> Option<&Entry> {
        self.entry.as_ref()
    }

    /// Forgets the flushed entry, releasing its reference.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
