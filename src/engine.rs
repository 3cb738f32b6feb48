//! All-to-all vector engine: low-mode pair construction, low-mode removal,
//! and high-mode solve delegation.
//!
//! The engine turns single-checkerboard eigenvectors of the squared operator
//! into pairs of full-lattice vectors spanning the eigenspaces of the massive
//! operator `M = 2m·1 + D`. For an eigenvector `u` on parity `p` with squared
//! magnitude `λ²`, the complementary-parity component `v = (1/(iλ)) D u`
//! completes `u ⊕ v` into an eigenvector of `D` with eigenvalue `iλ`, and the
//! sign-flipped partner spans the conjugate eigenvalue `-iλ`. Together the
//! two are the mutually orthogonal real/imaginary-like combinations of the
//! `(λ_M, λ_M*)` pair of `M`.
//!
//! Low-mode removal subtracts the full eigenspace component from a set of
//! stochastic vectors so the subsequent high-mode solve only sees the
//! orthogonal complement. High-mode solves themselves are delegated to the
//! wired-in [`Solver`] unchanged.
//!
//! Scratch fields are owned by the engine and reused across calls; every
//! operation takes `&mut self`, so one engine instance serializes its
//! callers. Use one instance per logical worker.
//!
//! This is a trusted-caller boundary: output slices must be large enough,
//! eigenpacks non-empty and uniformly normalized. Nothing here validates
//! sizes, and a violated precondition yields meaningless numbers (or an
//! index panic), not a recoverable error.

use faer::c64;

use crate::eigenpack::MassShiftedEigenPack;
use crate::field::{FullVector, HalfVector, Parity};
use crate::operator::{ExtendedOperator, ParityOperator};
use crate::solver::Solver;

/// Traversal order of the eigenvector sums in [`A2aEngine::remove_low_modes`].
///
/// The historical convention sweeps the direct-parity sum in ascending index
/// order and the cross-parity sum in descending order. The projection is a
/// plain linear sum and should be order-independent within rounding, but no
/// numerical rationale for the mixed order is documented, so that order stays
/// the default until confirmed safe to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepOrder {
    /// Ascending direct-parity sum, descending cross-parity sum.
    #[default]
    Reference,
    /// Ascending everywhere.
    Ascending,
}

/// Builds all-to-all vector pairs from an eigenspace and delegates high-mode
/// solves.
pub struct A2aEngine<'a, O, S> {
    op: &'a O,
    solver: &'a mut S,
    sweep: SweepOrder,
    // Single-owner scratch, reused across calls.
    sol_rb: HalfVector,
    temp: HalfVector,
    temp_ext: FullVector,
}

/// Computes `out <- (1/eval_d) · D_offdiag(evec)` with the complementary
/// parity tag.
fn off_diag_scaled<O: ParityOperator>(
    op: &O,
    out: &mut HalfVector,
    evec: &HalfVector,
    eval_d: c64,
) {
    op.apply_off_diag(out, evec);
    out.scale(eval_d.inv());
}

impl<'a, O: ParityOperator, S: Solver> A2aEngine<'a, O, S> {
    pub fn new(op: &'a O, solver: &'a mut S) -> Self {
        let h = op.half_dim();
        let f = op.full_dim();
        Self {
            op,
            solver,
            sweep: SweepOrder::default(),
            sol_rb: HalfVector::zeros(h, Parity::Even),
            temp: HalfVector::zeros(h, Parity::Even),
            temp_ext: FullVector::zeros(f),
        }
    }

    /// Selects the eigenvector traversal order for low-mode removal.
    pub fn with_sweep_order(mut self, sweep: SweepOrder) -> Self {
        self.sweep = sweep;
        self
    }

    /// Maps an eigenvector to its complementary-parity low-mode component:
    /// `out = (1/λ_D) · D(evec)`, tagged with the complementary parity.
    ///
    /// `eval_d` is the purely imaginary eigenvalue `iλ` of `D`, not the full
    /// mass-shifted eigenvalue.
    pub fn make_low_mode_off_diag(&self, out: &mut HalfVector, evec: &HalfVector, eval_d: c64) {
        off_diag_scaled(self.op, out, evec, eval_d);
    }

    /// Builds the two full-lattice low-mode vectors of one conjugate
    /// eigenvalue pair into `wout[0]` and `wout[1]`.
    ///
    /// `wout[0]` stitches the eigenvector together with its
    /// complementary-parity map; `wout[1]` is the same stitching with the
    /// sign flipped on whichever component lives on the odd checkerboard.
    /// `eval` is the full mass-shifted eigenvalue `2m + iλ`; only its
    /// imaginary part enters the construction.
    pub fn make_low_mode_pair(&mut self, wout: &mut [FullVector], evec: &HalfVector, eval: c64) {
        let lam_d = c64::new(0.0, eval.im);
        off_diag_scaled(self.op, &mut self.sol_rb, evec, lam_d);

        wout[0].merge(evec);
        wout[0].merge(&self.sol_rb);

        // The conjugate partner negates the odd-checkerboard component.
        match evec.parity() {
            Parity::Even => {
                self.temp.copy_from(&self.sol_rb);
                self.temp.scale(c64::new(-1.0, 0.0));
                wout[1].merge(evec);
                wout[1].merge(&self.temp);
            }
            Parity::Odd => {
                self.temp.copy_from(evec);
                self.temp.scale(c64::new(-1.0, 0.0));
                wout[1].merge(&self.temp);
                wout[1].merge(&self.sol_rb);
            }
        }
    }

    /// Like [`A2aEngine::make_low_mode_pair`], additionally emitting the
    /// paired eigenvalues `(1/λ, 1/λ̄)` into `eval_out`.
    ///
    /// These are the scales by which the inverse operator acts on the two
    /// constructed vectors.
    pub fn make_low_mode_pair_with_evals(
        &mut self,
        wout: &mut [FullVector],
        eval_out: &mut [c64],
        evec: &HalfVector,
        eval: c64,
    ) {
        self.make_low_mode_pair(wout, evec, eval);
        eval_out[0] = eval.inv();
        eval_out[1] = eval.conj().inv();
    }

    /// Builds the matching `(V, W)` pair: the `W` vectors as above, and the
    /// `V` vectors derived by scaling each `W` by its paired inverse
    /// eigenvalue. Restricted to the eigenspace the inverse operator acts as
    /// pure scaling, so this is exact.
    pub fn make_low_mode_vw_pair(
        &mut self,
        vout: &mut [FullVector],
        wout: &mut [FullVector],
        evec: &HalfVector,
        eval: c64,
    ) {
        let mut evals = [c64::new(0.0, 0.0); 2];
        self.make_low_mode_pair_with_evals(wout, &mut evals, evec, eval);

        vout[0].copy_from(&wout[0]);
        vout[0].scale(evals[0]);
        vout[1].copy_from(&wout[1]);
        vout[1].scale(evals[1]);
    }

    /// Removes the eigenspace component of every vector in `wout`.
    ///
    /// Per vector and parity `p` (the eigenvectors' checkerboard) with
    /// complement `p̄`:
    ///
    /// 1. the `p` component loses its direct projection onto the
    ///    eigenvectors,
    /// 2. the `p̄` component is mapped into the `p` sector through the
    ///    adjoint off-diagonal block, projected with `1/Im(λ)²` weights
    ///    (two off-diagonal hops bring two factors of `1/λ`), mapped back
    ///    through the forward block, and subtracted.
    ///
    /// The normalization is `1/‖evec₀‖`; all eigenvectors must share that
    /// magnitude.
    pub fn remove_low_modes(&mut self, wout: &mut [FullVector], pack: &MassShiftedEigenPack) {
        let evecs = pack.evecs();
        let evals = pack.evals();
        let cb = evecs[0].parity();
        let n = evecs.len();

        let norm = 1.0 / evecs[0].norm_l2();

        log::debug!(
            "removing low-mode projection from {} vectors ({} eigenvectors, {:?} sweep)",
            wout.len(),
            n,
            self.sweep
        );

        for w in wout.iter_mut() {
            let mut rbw = w.restrict(cb);
            let mut rbw_neg = w.restrict(cb.flip());

            // Direct-parity projection.
            self.temp.fill_zero();
            self.temp.retag(cb);
            for e in evecs.iter() {
                let ip = e.inner(&rbw);
                self.temp.axpy(ip, e);
            }
            rbw.axpy(c64::new(-norm, 0.0), &self.temp);
            w.merge(&rbw);

            // Move the complementary component into the eigenvectors' sector.
            self.op.apply_off_diag_adj(&mut rbw, &rbw_neg);

            self.temp.fill_zero();
            self.temp.retag(cb);
            match self.sweep {
                SweepOrder::Reference => {
                    for k in (0..n).rev() {
                        let ip = evecs[k].inner(&rbw) * (1.0 / evals[k].im.powi(2));
                        self.temp.axpy(ip, &evecs[k]);
                    }
                }
                SweepOrder::Ascending => {
                    for k in 0..n {
                        let ip = evecs[k].inner(&rbw) * (1.0 / evals[k].im.powi(2));
                        self.temp.axpy(ip, &evecs[k]);
                    }
                }
            }

            // Map the projection back and subtract it from the complement.
            self.op.apply_off_diag(&mut self.sol_rb, &self.temp);
            rbw_neg.axpy(c64::new(-norm, 0.0), &self.sol_rb);
            w.merge(&rbw_neg);
        }
    }

    /// Delegates `M · vout = noise` to the external solver.
    pub fn make_high_mode(&mut self, vout: &mut FullVector, noise: &FullVector) -> anyhow::Result<()> {
        self.solver.solve(vout, noise)
    }

    /// Delegates the solve seeded with an initial guess.
    pub fn make_high_mode_with_guess(
        &mut self,
        vout: &mut FullVector,
        noise: &FullVector,
        guess: &FullVector,
    ) -> anyhow::Result<()> {
        self.solver.solve_with_guess(vout, noise, guess)
    }
}

impl<'a, O: ExtendedOperator, S: Solver> A2aEngine<'a, O, S> {
    /// Builds the `(V, W)` low-mode pair on an extended-lattice operator and
    /// exports it to the physical lattice.
    ///
    /// The extended-lattice pair (`vout_ext`, `wout_ext`) is constructed
    /// exactly as in [`A2aEngine::make_low_mode_vw_pair`]; solutions export
    /// directly, sources pass through the adjoint surface term first.
    pub fn make_low_mode_pair_extended(
        &mut self,
        vout: &mut [FullVector],
        vout_ext: &mut [FullVector],
        wout: &mut [FullVector],
        wout_ext: &mut [FullVector],
        evec: &HalfVector,
        eval: c64,
    ) {
        self.make_low_mode_vw_pair(vout_ext, wout_ext, evec, eval);

        self.op.export_physical(&mut vout[0], &vout_ext[0]);
        self.op.export_physical(&mut vout[1], &vout_ext[1]);

        self.op.apply_surface_adj(&mut self.temp_ext, &wout_ext[0]);
        self.op.export_physical(&mut wout[0], &self.temp_ext);
        self.op.apply_surface_adj(&mut self.temp_ext, &wout_ext[1]);
        self.op.export_physical(&mut wout[1], &self.temp_ext);
    }
}
