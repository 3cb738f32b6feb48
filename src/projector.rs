//! Low-mode projector: solver-shaped callables over the eigenspace.
//!
//! Given a mass-shifted eigenpack, this module builds an operator that maps a
//! full-lattice source onto (or off of) the low-mode subspace, packaged
//! behind the generic [`Solver`] trait so it drops in anywhere a solve is
//! expected: as a cheap exact "solver" over the low subspace, or to strip
//! that subspace from a source before an expensive iterative solve.
//!
//! One parameterized construction covers every deployment: a
//! [`ProjectorStrategy`] picks the evaluation scheme, `projector` picks
//! projection versus eigenvalue-weighted low-mode inversion, and `subtract`
//! flips the output to the complement `source - PROJECT(source)`.
//!
//! The two strategies are mathematically equivalent:
//!
//! - [`ProjectorStrategy::ParityDecomposed`] works checkerboard by
//!   checkerboard: two running sums over the eigenvectors (the direct-parity
//!   projection, and the complementary projection pulled through the adjoint
//!   off-diagonal block) and a single cross-parity map-back at the end.
//! - [`ProjectorStrategy::FullLattice`] builds, per eigenvector, the
//!   symmetric and antisymmetric full-lattice combinations (the same vectors
//!   the pair construction emits) and projects the source onto each. Simpler
//!   parity algebra, two extra full-lattice temporaries per eigenvector per
//!   call.
//!
//! Both share the `1/‖evec₀‖` normalization convention of the engine and are
//! exact for eigenvectors of unit checkerboard norm; the full-lattice weights
//! fold in the pair-norm factor `‖pair‖² = 2‖evec‖²` so the strategies
//! agree.
//!
//! Unlike the rest of the crate, configuration is validated here: a bad
//! eigenvector sub-range is a setup error, never a first-use surprise.

use faer::c64;

use crate::eigenpack::MassShiftedEigenPack;
use crate::error::{LowModeError, LowModeErrorKind};
use crate::field::{FullVector, HalfVector, Parity};
use crate::operator::ParityOperator;
use crate::solver::Solver;

/// Evaluation scheme of the projection; see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectorStrategy {
    #[default]
    ParityDecomposed,
    FullLattice,
}

/// Setup-time configuration of a [`LowModeProjector`].
#[derive(Debug, Clone, Copy)]
pub struct ProjectorConfig {
    /// `true`: the callable is a true orthogonal projector (idempotent).
    /// `false`: it is the eigenvalue-weighted approximation to the inverse
    /// restricted to the low subspace, and must not be assumed idempotent.
    pub projector: bool,
    /// First eigenvector of the contiguous sub-range to use.
    pub eig_start: usize,
    /// Number of eigenvectors in the sub-range; must be at least 1.
    pub n_eigs: usize,
    pub strategy: ProjectorStrategy,
    /// `true`: the callable computes `source - PROJECT(source)`. Requires
    /// `projector`.
    pub subtract: bool,
}

impl ProjectorConfig {
    /// Projection over every eigenvector of `pack` with default strategy.
    pub fn over(pack: &MassShiftedEigenPack) -> Self {
        Self {
            projector: true,
            eig_start: 0,
            n_eigs: pack.len(),
            strategy: ProjectorStrategy::default(),
            subtract: false,
        }
    }
}

/// A solver-shaped projection onto (or off of) the low-mode subspace.
pub struct LowModeProjector<'a, O> {
    op: &'a O,
    pack: &'a MassShiftedEigenPack,
    cfg: ProjectorConfig,
    // Single-owner scratch, reused across calls.
    rb_temp: HalfVector,
    rb_temp_neg: HalfVector,
    m_rb_neg: HalfVector,
    rb_map: HalfVector,
    full_temp: FullVector,
    full_temp_dag: FullVector,
}

impl<'a, O: ParityOperator> LowModeProjector<'a, O> {
    /// Validates `cfg` against the eigenpack and builds the projector.
    ///
    /// # Errors
    /// Fails if the eigenvector sub-range is empty or exceeds the pack, or if
    /// `subtract` is requested without `projector`.
    pub fn new(
        op: &'a O,
        pack: &'a MassShiftedEigenPack,
        cfg: ProjectorConfig,
    ) -> Result<Self, LowModeError> {
        if cfg.n_eigs == 0 {
            return Err(LowModeErrorKind::EmptyEigRange.into());
        }
        if cfg.eig_start >= pack.len() || cfg.n_eigs > pack.len() - cfg.eig_start {
            return Err(LowModeErrorKind::EigRangeOutOfBounds {
                eig_start: cfg.eig_start,
                n_eigs: cfg.n_eigs,
                pack_size: pack.len(),
            }
            .into());
        }
        if cfg.subtract && !cfg.projector {
            return Err(LowModeErrorKind::SubtractWithoutProjector.into());
        }

        log::info!(
            "setting up low mode projector over eigenvectors [{}, {}) ({:?}, projector: {}, subtract: {})",
            cfg.eig_start,
            cfg.eig_start + cfg.n_eigs,
            cfg.strategy,
            cfg.projector,
            cfg.subtract
        );

        let h = op.half_dim();
        let f = op.full_dim();
        Ok(Self {
            op,
            pack,
            cfg,
            rb_temp: HalfVector::zeros(h, Parity::Even),
            rb_temp_neg: HalfVector::zeros(h, Parity::Even),
            m_rb_neg: HalfVector::zeros(h, Parity::Even),
            rb_map: HalfVector::zeros(h, Parity::Even),
            full_temp: FullVector::zeros(f),
            full_temp_dag: FullVector::zeros(f),
        })
    }

    /// Convenience constructor for the usual deployment: the projecting form
    /// and its subtracting complement over the same configuration.
    pub fn project_and_subtract(
        op: &'a O,
        pack: &'a MassShiftedEigenPack,
        cfg: ProjectorConfig,
    ) -> Result<(Self, Self), LowModeError> {
        let project = Self::new(
            op,
            pack,
            ProjectorConfig {
                subtract: false,
                ..cfg
            },
        )?;
        let subtract = Self::new(
            op,
            pack,
            ProjectorConfig {
                subtract: true,
                ..cfg
            },
        )?;
        Ok((project, subtract))
    }

    fn eig_range(&self) -> std::ops::Range<usize> {
        self.cfg.eig_start..self.cfg.eig_start + self.cfg.n_eigs
    }

    /// Checkerboard-decomposed projection; see the module docs.
    fn project_parity(&mut self, sol: &mut FullVector, src: &FullVector) {
        let evecs = self.pack.evecs();
        let evals = self.pack.evals();
        let cb = evecs[0].parity();
        let norm = 1.0 / evecs[0].norm_l2();

        let rb_ferm = src.restrict(cb);
        let rb_ferm_neg = src.restrict(cb.flip());

        // Complementary component pulled into the eigenvectors' sector.
        self.op.apply_off_diag_adj(&mut self.m_rb_neg, &rb_ferm_neg);

        self.rb_temp.fill_zero();
        self.rb_temp.retag(cb);
        self.rb_temp_neg.fill_zero();
        self.rb_temp_neg.retag(cb);

        for k in self.eig_range().rev() {
            let e = &evecs[k];
            let m_re = evals[k].re;
            let lam_d = evals[k].im;
            let inv_lam = 1.0 / lam_d;

            if self.cfg.projector {
                let ip = e.inner(&rb_ferm);
                let ip_neg = e.inner(&self.m_rb_neg);
                self.rb_temp.axpy(ip, e);
                self.rb_temp_neg.axpy(ip_neg * (inv_lam * inv_lam), e);
            } else {
                let inv_mag = 1.0 / (m_re * m_re + lam_d * lam_d);
                let ip = e.inner(&rb_ferm) * inv_mag;
                let ip_neg = e.inner(&self.m_rb_neg) * inv_mag;
                self.rb_temp.axpy(ip * m_re + ip_neg, e);
                self.rb_temp_neg
                    .axpy(ip_neg * (m_re * inv_lam * inv_lam) - ip, e);
            }
        }

        // One cross-parity map-back for the whole accumulated sum.
        self.op.apply_off_diag(&mut self.rb_map, &self.rb_temp_neg);

        sol.merge(&self.rb_temp);
        sol.merge(&self.rb_map);
        sol.scale(c64::new(norm, 0.0));
    }

    /// Full-lattice projection; see the module docs.
    fn project_full(&mut self, sol: &mut FullVector, src: &FullVector) {
        let evecs = self.pack.evecs();
        let evals = self.pack.evals();
        let cb = evecs[0].parity();
        let norm = 1.0 / evecs[0].norm_l2();

        sol.fill_zero();

        for k in self.eig_range().rev() {
            let e = &evecs[k];
            let lam = evals[k];
            let lam_d = c64::new(0.0, lam.im);

            self.op.apply_off_diag(&mut self.rb_map, e);
            self.rb_map.scale(lam_d.inv());

            // Symmetric and antisymmetric full-lattice combinations; the
            // antisymmetric one negates the odd-checkerboard component.
            self.full_temp.merge(e);
            self.full_temp.merge(&self.rb_map);
            match cb {
                Parity::Even => {
                    self.rb_temp.copy_from(&self.rb_map);
                    self.rb_temp.scale(c64::new(-1.0, 0.0));
                    self.full_temp_dag.merge(e);
                    self.full_temp_dag.merge(&self.rb_temp);
                }
                Parity::Odd => {
                    self.rb_temp.copy_from(e);
                    self.rb_temp.scale(c64::new(-1.0, 0.0));
                    self.full_temp_dag.merge(&self.rb_temp);
                    self.full_temp_dag.merge(&self.rb_map);
                }
            }

            let ip = self.full_temp.inner(src);
            let ip_dag = self.full_temp_dag.inner(src);
            let (w, w_dag) = if self.cfg.projector {
                (ip, ip_dag)
            } else {
                (ip / lam, ip_dag / lam.conj())
            };

            sol.axpy(w, &self.full_temp);
            sol.axpy(w_dag, &self.full_temp_dag);
        }

        // The pair-norm factor 2‖e‖² folds into one overall scale.
        sol.scale(c64::new(0.5 * norm, 0.0));
    }
}

impl<O: ParityOperator> Solver for LowModeProjector<'_, O> {
    fn solve(&mut self, sol: &mut FullVector, src: &FullVector) -> anyhow::Result<()> {
        match self.cfg.strategy {
            ProjectorStrategy::ParityDecomposed => self.project_parity(sol, src),
            ProjectorStrategy::FullLattice => self.project_full(sol, src),
        }
        if self.cfg.subtract {
            sol.subtract_from(src);
        }
        Ok(())
    }
}
