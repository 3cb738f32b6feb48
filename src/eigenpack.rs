//! Mass-shifted eigenpack adaptor.
//!
//! Upstream eigensolvers work on the Hermitian squared operator at zero mass,
//! restricted to one checkerboard: they deliver eigenvectors with real,
//! non-negative eigenvalue magnitudes `e_i = λ_i²`. The operator the rest of
//! the pipeline cares about is the non-Hermitian `M = 2m·1 + D`, whose
//! eigenvalues on that eigenspace are `2m ± iλ_i`. This adaptor performs that
//! pure data transform once: `eval[i] = 2m + i·√e_i`, keeping one member of
//! each conjugate pair.
//!
//! The pack owns its eigenvectors, so the checkerboard-retag utility can only
//! touch pack-owned data and cannot silently change vectors another component
//! still holds. Callers that need the vectors elsewhere too clone before
//! constructing the pack.

use faer::c64;

use crate::field::{HalfVector, Parity};

/// A set of one-checkerboard eigenvectors with derived complex eigenvalues of
/// the massive operator.
#[derive(Debug, Clone)]
pub struct MassShiftedEigenPack {
    evec: Vec<HalfVector>,
    eval: Vec<c64>,
    mass: f64,
}

impl MassShiftedEigenPack {
    /// Builds the pack from eigenvectors of the squared massless operator and
    /// their eigenvalue magnitudes.
    ///
    /// One derived eigenvalue is computed per entry of `eval_in`:
    /// `eval[i] = 2·mass + i·sqrt(eval_in[i])`. Matching `eval_in` length to
    /// the eigenvector count is the caller's responsibility; no sizes are
    /// checked here.
    pub fn new(evec: Vec<HalfVector>, eval_in: &[f64], mass: f64) -> Self {
        let eval = eval_in
            .iter()
            .map(|&e| c64::new(2.0 * mass, e.sqrt()))
            .collect();
        Self { evec, eval, mass }
    }

    /// Number of eigenvectors in the pack.
    pub fn len(&self) -> usize {
        self.evec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evec.is_empty()
    }

    /// The eigenvectors, restricted to their checkerboard.
    pub fn evecs(&self) -> &[HalfVector] {
        &self.evec
    }

    /// The derived complex eigenvalues of the massive operator.
    pub fn evals(&self) -> &[c64] {
        &self.eval
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Re-declares the checkerboard of every eigenvector in the pack.
    ///
    /// Used when an eigenpack computed on one parity is to be reused as the
    /// eigenspace of the complementary-parity squared operator. Only this
    /// pack's own vectors are touched.
    pub fn retag_parity(&mut self, parity: Parity) {
        for e in &mut self.evec {
            e.retag(parity);
        }
    }

    /// Releases ownership of the eigenvectors.
    pub fn into_evecs(self) -> Vec<HalfVector> {
        self.evec
    }
}
