// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use thiserror::Error;

/// The composed transform has no inverse.
///
/// Returned when inverting a degenerate transform, e.g. one containing a zero
/// scale. Callers usually substitute the identity, which is what
/// [`Stack::get_inverse_or_identity`](crate::stack::Stack::get_inverse_or_identity)
/// does.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
#[error("transform is singular and has no inverse")]
pub struct SingularMatrix;

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn message() {
        assert_eq!(
            SingularMatrix.to_string(),
            "transform is singular and has no inverse"
        );
    }
}
