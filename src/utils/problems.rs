//! Synthetic staggered test problems with analytically known low modes.
//!
//! The validation strategy throughout this crate is to construct operators
//! whose spectral structure is trivial to write down, compute ground truth
//! analytically, and compare. The simplest instance is a diagonal hopping
//! block `H = i·diag(λ)`: the squared massless operator on either
//! checkerboard is `diag(λ²)`, its eigenvectors are the unit basis vectors,
//! and every complementary-parity map is again a basis vector. A Householder
//! rotation of the same spectrum gives a dense operator with a non-trivial
//! eigenbasis while keeping the ground truth exact.
//!
//! Eigenvectors produced here have unit checkerboard norm, the convention
//! under which the engine and projector normalization is exact.

use faer::{c64, prelude::*};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::eigenpack::MassShiftedEigenPack;
use crate::field::{FullVector, HalfVector, Parity};
use crate::operator::DenseStaggeredOperator;
use crate::solver::Solver;

/// Operator with hopping block `H = i·diag(lambdas)`.
///
/// Its low modes on either checkerboard are the unit basis vectors, with
/// squared-operator magnitudes `lambdas[k]²`.
pub fn diagonal_operator(mass: f64, lambdas: &[f64]) -> DenseStaggeredOperator {
    let n = lambdas.len();
    let hop = Mat::from_fn(n, n, |i, j| {
        if i == j {
            c64::new(0.0, lambdas[i])
        } else {
            c64::new(0.0, 0.0)
        }
    });
    DenseStaggeredOperator::new(mass, hop)
}

/// The `k`-th unit basis vector as a parity-restricted field.
pub fn basis_vector(dim: usize, k: usize, parity: Parity) -> HalfVector {
    let mut v = HalfVector::zeros(dim, parity);
    v.copy_from_mat(
        Mat::from_fn(dim, 1, |i, _| {
            if i == k {
                c64::new(1.0, 0.0)
            } else {
                c64::new(0.0, 0.0)
            }
        })
        .as_ref(),
    );
    v
}

/// Eigenpack of [`diagonal_operator`]: unit basis eigenvectors on `parity`
/// with magnitudes `lambdas[k]²`.
pub fn basis_eigenpack(lambdas: &[f64], mass: f64, parity: Parity) -> MassShiftedEigenPack {
    let n = lambdas.len();
    let evecs = (0..n).map(|k| basis_vector(n, k, parity)).collect();
    let mags: Vec<f64> = lambdas.iter().map(|l| l * l).collect();
    MassShiftedEigenPack::new(evecs, &mags, mass)
}

/// Operator with hopping block `H = U · i·diag(lambdas)`, where `U` is a
/// random complex Householder reflection.
///
/// Returns the operator together with its even-checkerboard eigenvectors (the
/// columns of `U`), which have unit norm and squared-operator magnitudes
/// `lambdas[k]²`.
pub fn householder_operator(
    mass: f64,
    lambdas: &[f64],
    seed: u64,
) -> (DenseStaggeredOperator, Vec<HalfVector>) {
    let n = lambdas.len();
    let mut rng = StdRng::seed_from_u64(seed);

    let u = Mat::from_fn(n, 1, |_, _| {
        c64::new(rng.random::<f64>() - 0.5, rng.random::<f64>() - 0.5)
    });
    let norm_sqr = u.norm_l2() * u.norm_l2();

    // refl = 1 - 2 u u^† / ‖u‖², unitary and Hermitian.
    let refl = Mat::from_fn(n, n, |i, j| {
        let delta = if i == j {
            c64::new(1.0, 0.0)
        } else {
            c64::new(0.0, 0.0)
        };
        delta - u[(i, 0)] * u[(j, 0)].conj() * (2.0 / norm_sqr)
    });

    let diag = Mat::from_fn(n, n, |i, j| {
        if i == j {
            c64::new(0.0, lambdas[i])
        } else {
            c64::new(0.0, 0.0)
        }
    });
    let hop = &refl * &diag;

    let evecs = (0..n)
        .map(|k| HalfVector::from_mat(refl.as_ref().subcols(k, 1).to_owned(), Parity::Even))
        .collect();

    (DenseStaggeredOperator::new(mass, hop), evecs)
}

/// Eigenpack from explicit eigenvectors and the `λ` magnitudes of `D`.
pub fn eigenpack_from_vectors(
    evecs: Vec<HalfVector>,
    lambdas: &[f64],
    mass: f64,
) -> MassShiftedEigenPack {
    let mags: Vec<f64> = lambdas.iter().map(|l| l * l).collect();
    MassShiftedEigenPack::new(evecs, &mags, mass)
}

/// A reproducible random full-lattice source.
pub fn random_full(dim: usize, seed: u64) -> FullVector {
    let mut rng = StdRng::seed_from_u64(seed);
    FullVector::from_mat(Mat::from_fn(dim, 1, |_, _| {
        c64::new(rng.random::<f64>() - 0.5, rng.random::<f64>() - 0.5)
    }))
}

/// Direct solver over the assembled dense operator.
///
/// Stands in for the production iterative stack in tests and experiments; a
/// partial-pivoting LU solve is exact to rounding, so "converged or hard
/// error" trivially holds.
pub struct DenseSolver {
    m: Mat<c64>,
}

impl DenseSolver {
    pub fn new(op: &DenseStaggeredOperator) -> Self {
        Self {
            m: op.assemble_full(),
        }
    }
}

impl Solver for DenseSolver {
    fn solve(&mut self, sol: &mut FullVector, src: &FullVector) -> anyhow::Result<()> {
        let x = self.m.partial_piv_lu().solve(src.as_mat());
        sol.copy_from_mat(x.as_ref());
        Ok(())
    }
}
