//! This module defines the custom error types for the library.
//!
//! The only component that validates its configuration is the low-mode
//! projector; everything else in this crate is a trusted-caller boundary and
//! reports nothing (see the crate-level documentation). All projector
//! configuration problems are centralized in [`LowModeError`].
//!
//! Using the [`thiserror`] crate allows us to create idiomatic error types
//! with minimal boilerplate. The public type wraps a private kind enum so the
//! set of variants can evolve without breaking the public API.
use thiserror::Error;

/// Represents all possible configuration errors raised by the low-mode core.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct LowModeError(#[from] pub(crate) LowModeErrorKind);

/// Private enum containing the distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum LowModeErrorKind {
    /// The requested eigenvector sub-range does not fit inside the eigenpack.
    #[error(
        "Requested eigenvector range [{eig_start}, {eig_start}+{n_eigs}) out of bounds for an eigenpack of {pack_size} vectors."
    )]
    EigRangeOutOfBounds {
        eig_start: usize,
        n_eigs: usize,
        pack_size: usize,
    },

    /// A projector over zero eigenvectors is a configuration mistake, not a
    /// degenerate no-op; it is rejected at setup.
    #[error("Empty eigenvector range: n_eigs must be at least 1.")]
    EmptyEigRange,

    /// The subtracted form `source - PROJECT(source)` is only meaningful when
    /// PROJECT is a true orthogonal projector.
    #[error("Subtracted form requires projector mode (projector = true).")]
    SubtractWithoutProjector,
}

// Manually implement PartialEq for the public error type by comparing the
// inner kind, mirroring the derive on `LowModeErrorKind`.
impl PartialEq for LowModeError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
