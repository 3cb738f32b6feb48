//! This module defines the operator abstractions the low-mode core consumes.
//!
//! The lattice operator `M = 2m·1 + D` of a staggered fermion couples sites
//! only across parity classes: `D` is block off-diagonal in the checkerboard
//! decomposition and anti-Hermitian, so its spectrum is purely imaginary and
//! comes in conjugate pairs. The algorithms in this crate never need the
//! matrix elements themselves, only three actions:
//!
//! 1. the cross-parity ("off-diagonal") block applied to a half field,
//! 2. the adjoint of that block,
//! 3. the full operator applied to a whole-lattice field.
//!
//! [`ParityOperator`] formalizes this contract. In the production runtime all
//! three are synchronous collective operations over the distributed field
//! container; a hang in the operator blocks every participant, and this crate
//! adds no timeout of its own.
//!
//! [`ExtendedOperator`] adds the two hooks needed by the extended-lattice
//! pair construction: exporting an extended-lattice solution down to the
//! physical lattice, and the adjoint surface term applied to source-like
//! vectors before export.
//!
//! [`DenseStaggeredOperator`] is the concrete reference implementation over a
//! dense [`faer`] block, used by the tests and the experiment runner.

use faer::{c64, prelude::*};

use crate::field::{FullVector, HalfVector, Parity};

/// A parity-blocked lattice operator `M = 2m·1 + D`, `D` cross-parity.
pub trait ParityOperator {
    /// Number of complex components on each parity class; both off-diagonal
    /// blocks are square of this dimension.
    fn half_dim(&self) -> usize;

    /// Number of complex components on the full lattice.
    fn full_dim(&self) -> usize {
        2 * self.half_dim()
    }

    /// Applies the cross-parity block: `out <- D_{p̄p} · input`, where `p` is
    /// the parity of `input`. The output carries the complementary parity
    /// tag.
    fn apply_off_diag(&self, out: &mut HalfVector, input: &HalfVector);

    /// Applies the adjoint of the cross-parity block. For an anti-Hermitian
    /// `D` this is the negated forward application, but implementors expose
    /// it separately so the algorithms never assume that identity.
    fn apply_off_diag_adj(&self, out: &mut HalfVector, input: &HalfVector);

    /// Applies the full operator `M` to a whole-lattice field.
    fn apply_full(&self, out: &mut FullVector, input: &FullVector);
}

/// Extension hooks for operators with an extended ("fifth") direction.
///
/// The low-mode pair construction on such operators is structurally identical
/// to the four-dimensional one; it only adds an export step mapping the
/// extended-lattice pair down to the physical lattice.
pub trait ExtendedOperator: ParityOperator {
    /// Number of complex components of the physical (exported) lattice.
    fn physical_dim(&self) -> usize;

    /// Exports an extended-lattice solution vector to the physical lattice.
    fn export_physical(&self, out: &mut FullVector, extended: &FullVector);

    /// Applies the adjoint surface term to an extended-lattice source-like
    /// vector, in place on the extended lattice. Source-like vectors pass
    /// through this before [`ExtendedOperator::export_physical`].
    fn apply_surface_adj(&self, out: &mut FullVector, extended: &FullVector);
}

/// Dense reference implementation of a staggered-like operator.
///
/// Holds the even-from-odd hopping block `H`; the odd-from-even block is
/// `-H^†`, which makes `D` anti-Hermitian as the pair construction requires.
/// The massless squared operator restricted to the even checkerboard is then
/// `H H^†`, whose eigenvalues are the `λ²` magnitudes an eigenpack stores.
#[derive(Debug, Clone)]
pub struct DenseStaggeredOperator {
    mass: f64,
    hop: Mat<c64>,
    hop_adj: Mat<c64>,
}

impl DenseStaggeredOperator {
    /// Creates the operator from a mass and the even-from-odd hopping block.
    ///
    /// # Panics
    /// Panics if `hop` is not square.
    pub fn new(mass: f64, hop: Mat<c64>) -> Self {
        assert_eq!(
            hop.nrows(),
            hop.ncols(),
            "the two checkerboards have equal site counts, so the hopping block is square"
        );
        let hop_adj = Mat::from_fn(hop.nrows(), hop.ncols(), |i, j| hop[(j, i)].conj());
        Self { mass, hop, hop_adj }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Assembles the dense full-lattice matrix `M = 2m·1 + D`.
    ///
    /// Intended for reference solves and cross-checks; the algorithms in this
    /// crate never materialize it.
    pub fn assemble_full(&self) -> Mat<c64> {
        let h = self.half_dim();
        let two_m = c64::new(2.0 * self.mass, 0.0);
        let mut full = Mat::<c64>::zeros(2 * h, 2 * h);
        for i in 0..h {
            full[(i, i)] = two_m;
            full[(h + i, h + i)] = two_m;
            for j in 0..h {
                // Even block leads, odd block trails, matching FullVector.
                full[(i, h + j)] = self.hop[(i, j)];
                full[(h + i, j)] = -self.hop[(j, i)].conj();
            }
        }
        full
    }
}

impl ParityOperator for DenseStaggeredOperator {
    fn half_dim(&self) -> usize {
        self.hop.nrows()
    }

    fn apply_off_diag(&self, out: &mut HalfVector, input: &HalfVector) {
        let result = match input.parity() {
            // D_eo = H
            Parity::Odd => &self.hop * input.as_mat(),
            // D_oe = -H^†
            Parity::Even => &(&self.hop_adj * input.as_mat()) * Scale(c64::new(-1.0, 0.0)),
        };
        out.copy_from_mat(result.as_ref());
        out.retag(input.parity().flip());
    }

    fn apply_off_diag_adj(&self, out: &mut HalfVector, input: &HalfVector) {
        let result = match input.parity() {
            // (D_eo)^† = H^†
            Parity::Even => &self.hop_adj * input.as_mat(),
            // (D_oe)^† = -H
            Parity::Odd => &(&self.hop * input.as_mat()) * Scale(c64::new(-1.0, 0.0)),
        };
        out.copy_from_mat(result.as_ref());
        out.retag(input.parity().flip());
    }

    fn apply_full(&self, out: &mut FullVector, input: &FullVector) {
        let two_m = c64::new(2.0 * self.mass, 0.0);
        let in_e = input.restrict(Parity::Even);
        let in_o = input.restrict(Parity::Odd);

        let mut out_e = HalfVector::from_mat(&self.hop * in_o.as_mat(), Parity::Even);
        out_e.axpy(two_m, &in_e);
        let mut out_o = HalfVector::from_mat(
            &(&self.hop_adj * in_e.as_mat()) * Scale(c64::new(-1.0, 0.0)),
            Parity::Odd,
        );
        out_o.axpy(two_m, &in_o);

        out.merge(&out_e);
        out.merge(&out_o);
    }
}
