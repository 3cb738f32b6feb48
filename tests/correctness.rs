//! Integration test suite to verify the mathematical correctness of the
//! low-mode machinery.
//!
//! # Test Methodology
//!
//! The core principle of this suite is to validate every operation against a
//! ground truth that can be computed analytically. Operators are constructed
//! with a known spectral structure (see `utils::problems`): a hopping block
//! `i·diag(λ)`, whose low modes are unit basis vectors, or its Householder
//! rotation, whose low modes are the reflection columns. In both cases the
//! squared massless operator on the eigenvectors' checkerboard is
//! `diag(λ²)` in the chosen basis, so:
//!
//! 1. pair construction has a closed form to compare signs and parities
//!    against,
//! 2. deflation must annihilate any combination of constructed pairs,
//! 3. the orthogonal projector must be exactly idempotent up to rounding,
//! 4. a direct dense solve stands in for the production iterative solver,
//!    making high-mode residuals checkable with `apply_full`.
//!
//! Tolerances distinguish properties that hold by construction (rounding
//! only) from those accumulating error over sums of modes.

use a2a_lowmode::utils::problems::{
    basis_eigenpack, basis_vector, diagonal_operator, eigenpack_from_vectors,
    householder_operator, random_full, DenseSolver,
};
use a2a_lowmode::{
    A2aEngine, DenseStaggeredOperator, ExtendedOperator, FullVector, HalfVector,
    LowModeProjector, MassShiftedEigenPack, Parity, ParityOperator, ProjectorConfig,
    ProjectorStrategy, Solver, SweepOrder,
};
use faer::c64;

/// Tolerance for properties that hold by construction, up to rounding.
const EXACT_TOLERANCE: f64 = 1e-12;

/// Tolerance for properties accumulating rounding over sums of modes.
const APPROX_TOLERANCE: f64 = 1e-10;

const ONE: c64 = c64 { re: 1.0, im: 0.0 };

fn spread_lambdas(n: usize) -> Vec<f64> {
    (0..n).map(|k| 0.3 * (k + 1) as f64).collect()
}

/// Householder problem with an eigenpack over its leading `n_eigs` modes.
fn rotated_problem(
    mass: f64,
    n: usize,
    n_eigs: usize,
    seed: u64,
) -> (DenseStaggeredOperator, MassShiftedEigenPack) {
    let lambdas = spread_lambdas(n);
    let (op, mut evecs) = householder_operator(mass, &lambdas, seed);
    evecs.truncate(n_eigs);
    let pack = eigenpack_from_vectors(evecs, &lambdas[..n_eigs], mass);
    (op, pack)
}

fn zero_pair(dim: usize) -> [FullVector; 2] {
    [FullVector::zeros(dim), FullVector::zeros(dim)]
}

fn diff_norm(a: &FullVector, b: &FullVector) -> f64 {
    let mut d = a.clone();
    d.subtract_from(b);
    d.norm_l2()
}

// --- Pair construction ---

#[test]
fn test_low_mode_pair_orthogonality_and_parity_rule() {
    // Magnitudes {1, 4} at mass 0 derive eigenvalues {i, 2i}.
    let op = diagonal_operator(0.0, &[1.0, 2.0]);
    let mut solver = DenseSolver::new(&op);

    for parity in [Parity::Even, Parity::Odd] {
        let pack = basis_eigenpack(&[1.0, 2.0], 0.0, parity);
        let mut engine = A2aEngine::new(&op, &mut solver);

        let mut wout = zero_pair(4);
        engine.make_low_mode_pair(&mut wout, &pack.evecs()[0], pack.evals()[0]);

        // The two outputs are mutually orthogonal and each carries the
        // eigenvector norm times sqrt(2).
        assert!(wout[0].inner(&wout[1]).norm() < EXACT_TOLERANCE);
        assert!((wout[0].norm_l2() - 2f64.sqrt()).abs() < EXACT_TOLERANCE);
        assert!((wout[1].norm_l2() - 2f64.sqrt()).abs() < EXACT_TOLERANCE);

        // The partner negates exactly the odd-checkerboard component,
        // regardless of which parity carries the eigenvector.
        let mut even_sum = wout[0].restrict(Parity::Even);
        even_sum.axpy(-ONE, &wout[1].restrict(Parity::Even));
        assert!(even_sum.norm_l2() < EXACT_TOLERANCE);

        let mut odd_sum = wout[0].restrict(Parity::Odd);
        odd_sum.axpy(ONE, &wout[1].restrict(Parity::Odd));
        assert!(odd_sum.norm_l2() < EXACT_TOLERANCE);
    }
}

#[test]
fn test_low_mode_pairs_are_operator_eigenvectors() {
    let mass = 0.1;
    let (op, pack) = rotated_problem(mass, 5, 5, 21);
    let mut solver = DenseSolver::new(&op);
    let mut engine = A2aEngine::new(&op, &mut solver);

    for k in 0..pack.len() {
        let mut wout = zero_pair(10);
        engine.make_low_mode_pair(&mut wout, &pack.evecs()[k], pack.evals()[k]);

        // M w₀ = λ w₀ and M w₁ = λ̄ w₁.
        let lam = pack.evals()[k];
        let mut applied = FullVector::zeros(10);
        for (w, l) in wout.iter().zip([lam, lam.conj()]) {
            op.apply_full(&mut applied, w);
            let mut scaled = w.clone();
            scaled.scale(l);
            assert!(diff_norm(&applied, &scaled) < APPROX_TOLERANCE);
        }
    }
}

#[test]
fn test_paired_evals_and_vw_scaling() {
    let mass = 0.08;
    let (op, pack) = rotated_problem(mass, 4, 4, 5);
    let mut solver = DenseSolver::new(&op);
    let mut engine = A2aEngine::new(&op, &mut solver);

    let lam = pack.evals()[2];
    let mut wout = zero_pair(8);
    let mut evals_out = [c64::new(0.0, 0.0); 2];
    engine.make_low_mode_pair_with_evals(&mut wout, &mut evals_out, &pack.evecs()[2], lam);

    assert!((evals_out[0] - lam.inv()).norm() < EXACT_TOLERANCE);
    assert!((evals_out[1] - lam.conj().inv()).norm() < EXACT_TOLERANCE);

    // V = M⁻¹ W on the eigenspace: applying M to each V recovers its W.
    let mut vout = zero_pair(8);
    engine.make_low_mode_vw_pair(&mut vout, &mut wout, &pack.evecs()[2], lam);

    let mut applied = FullVector::zeros(8);
    for (v, w) in vout.iter().zip(wout.iter()) {
        op.apply_full(&mut applied, v);
        assert!(diff_norm(&applied, w) < APPROX_TOLERANCE);
    }
}

/// An extended-lattice operator whose extended and physical representations
/// coincide, with trivial export and surface hooks.
struct TrivialExtended(DenseStaggeredOperator);

impl ParityOperator for TrivialExtended {
    fn half_dim(&self) -> usize {
        self.0.half_dim()
    }
    fn apply_off_diag(&self, out: &mut HalfVector, input: &HalfVector) {
        self.0.apply_off_diag(out, input)
    }
    fn apply_off_diag_adj(&self, out: &mut HalfVector, input: &HalfVector) {
        self.0.apply_off_diag_adj(out, input)
    }
    fn apply_full(&self, out: &mut FullVector, input: &FullVector) {
        self.0.apply_full(out, input)
    }
}

impl ExtendedOperator for TrivialExtended {
    fn physical_dim(&self) -> usize {
        self.0.full_dim()
    }
    fn export_physical(&self, out: &mut FullVector, extended: &FullVector) {
        out.copy_from(extended)
    }
    fn apply_surface_adj(&self, out: &mut FullVector, extended: &FullVector) {
        out.copy_from(extended)
    }
}

#[test]
fn test_extended_pair_reduces_to_physical_construction() {
    let mass = 0.1;
    let lambdas = [1.0, 2.0, 3.0];
    let op = TrivialExtended(diagonal_operator(mass, &lambdas));
    let pack = basis_eigenpack(&lambdas, mass, Parity::Even);
    let mut solver = DenseSolver::new(&diagonal_operator(mass, &lambdas));
    let mut engine = A2aEngine::new(&op, &mut solver);

    let mut vout = zero_pair(6);
    let mut vout_ext = zero_pair(6);
    let mut wout = zero_pair(6);
    let mut wout_ext = zero_pair(6);
    engine.make_low_mode_pair_extended(
        &mut vout,
        &mut vout_ext,
        &mut wout,
        &mut wout_ext,
        &pack.evecs()[1],
        pack.evals()[1],
    );

    // With identity hooks the exported pair equals the extended pair.
    for (phys, ext) in vout.iter().zip(vout_ext.iter()) {
        assert!(diff_norm(phys, ext) == 0.0);
    }
    for (phys, ext) in wout.iter().zip(wout_ext.iter()) {
        assert!(diff_norm(phys, ext) == 0.0);
    }
}

// --- Deflation ---

#[test]
fn test_deflation_annihilates_eigenspace_vectors() {
    let mass = 0.05;
    let (op, pack) = rotated_problem(mass, 6, 6, 33);
    let mut solver = DenseSolver::new(&op);
    let mut engine = A2aEngine::new(&op, &mut solver);

    // A combination of constructed pair vectors lies entirely inside the
    // eigenspace of the operator.
    let mut pair0 = zero_pair(12);
    let mut pair1 = zero_pair(12);
    engine.make_low_mode_pair(&mut pair0, &pack.evecs()[0], pack.evals()[0]);
    engine.make_low_mode_pair(&mut pair1, &pack.evecs()[3], pack.evals()[3]);

    let mut w = pair0[0].clone();
    w.axpy(c64::new(0.7, -0.2), &pair0[1]);
    w.axpy(c64::new(-1.3, 0.4), &pair1[0]);
    w.axpy(c64::new(0.0, 0.9), &pair1[1]);

    let mut batch = [w];
    engine.remove_low_modes(&mut batch, &pack);
    assert!(batch[0].norm_l2() < APPROX_TOLERANCE);
}

#[test]
fn test_deflated_source_is_orthogonal_to_every_pair() {
    let mass = 0.05;
    let (op, pack) = rotated_problem(mass, 5, 5, 17);
    let mut solver = DenseSolver::new(&op);
    let mut engine = A2aEngine::new(&op, &mut solver);

    let mut sources = [random_full(10, 100), random_full(10, 101)];
    engine.remove_low_modes(&mut sources, &pack);

    for k in 0..pack.len() {
        let mut pair = zero_pair(10);
        engine.make_low_mode_pair(&mut pair, &pack.evecs()[k], pack.evals()[k]);
        for w in sources.iter() {
            assert!(pair[0].inner(w).norm() < APPROX_TOLERANCE);
            assert!(pair[1].inner(w).norm() < APPROX_TOLERANCE);
        }
    }
}

#[test]
fn test_deflation_with_odd_parity_eigenpack() {
    // The parity bookkeeping must hold when the eigenvectors live on the odd
    // checkerboard as well.
    let lambdas = [1.0, 2.0, 3.0];
    let op = diagonal_operator(0.05, &lambdas);
    let pack = basis_eigenpack(&lambdas, 0.05, Parity::Odd);
    let mut solver = DenseSolver::new(&op);
    let mut engine = A2aEngine::new(&op, &mut solver);

    let mut pair = zero_pair(6);
    engine.make_low_mode_pair(&mut pair, &pack.evecs()[2], pack.evals()[2]);

    let mut w = pair[0].clone();
    w.axpy(c64::new(-0.4, 1.1), &pair[1]);

    let mut batch = [w];
    engine.remove_low_modes(&mut batch, &pack);
    assert!(batch[0].norm_l2() < APPROX_TOLERANCE);
}

#[test]
fn test_deflation_sweep_orders_agree() {
    let mass = 0.05;
    let (op, pack) = rotated_problem(mass, 6, 6, 71);
    let mut solver_a = DenseSolver::new(&op);
    let mut solver_b = DenseSolver::new(&op);

    let mut reference = [random_full(12, 7)];
    let mut ascending = [reference[0].clone()];

    let mut engine_a = A2aEngine::new(&op, &mut solver_a);
    engine_a.remove_low_modes(&mut reference, &pack);

    let mut engine_b = A2aEngine::new(&op, &mut solver_b).with_sweep_order(SweepOrder::Ascending);
    engine_b.remove_low_modes(&mut ascending, &pack);

    assert!(diff_norm(&reference[0], &ascending[0]) < EXACT_TOLERANCE);
}

// --- Projector ---

#[test]
fn test_projector_is_idempotent() {
    let mass = 0.1;
    let (op, pack) = rotated_problem(mass, 6, 6, 13);
    let src = random_full(12, 3);

    for strategy in [ProjectorStrategy::ParityDecomposed, ProjectorStrategy::FullLattice] {
        // Both over the full pack and over an interior sub-range.
        for (eig_start, n_eigs) in [(0, 6), (1, 3)] {
            let cfg = ProjectorConfig {
                projector: true,
                eig_start,
                n_eigs,
                strategy,
                subtract: false,
            };
            let mut project = LowModeProjector::new(&op, &pack, cfg).unwrap();

            let mut once = FullVector::zeros(12);
            let mut twice = FullVector::zeros(12);
            project.solve(&mut once, &src).unwrap();
            project.solve(&mut twice, &once).unwrap();
            assert!(diff_norm(&twice, &once) < APPROX_TOLERANCE);
        }
    }
}

#[test]
fn test_project_plus_subtract_reassembles_source() {
    let mass = 0.07;
    let (op, pack) = rotated_problem(mass, 5, 4, 29);
    let src = random_full(10, 4);

    for strategy in [ProjectorStrategy::ParityDecomposed, ProjectorStrategy::FullLattice] {
        let cfg = ProjectorConfig {
            projector: true,
            eig_start: 0,
            n_eigs: 4,
            strategy,
            subtract: false,
        };
        let (mut project, mut subtract) =
            LowModeProjector::project_and_subtract(&op, &pack, cfg).unwrap();

        let mut p = FullVector::zeros(10);
        let mut s = FullVector::zeros(10);
        project.solve(&mut p, &src).unwrap();
        subtract.solve(&mut s, &src).unwrap();

        p.axpy(ONE, &s);
        assert!(diff_norm(&p, &src) < EXACT_TOLERANCE);
    }
}

#[test]
fn test_projector_strategies_agree() {
    let mass = 0.12;
    let (op, pack) = rotated_problem(mass, 6, 5, 41);
    let src = random_full(12, 9);

    for projector in [true, false] {
        let mut results = Vec::new();
        for strategy in [ProjectorStrategy::ParityDecomposed, ProjectorStrategy::FullLattice] {
            let cfg = ProjectorConfig {
                projector,
                eig_start: 0,
                n_eigs: 5,
                strategy,
                subtract: false,
            };
            let mut proj = LowModeProjector::new(&op, &pack, cfg).unwrap();
            let mut sol = FullVector::zeros(12);
            proj.solve(&mut sol, &src).unwrap();
            results.push(sol);
        }
        assert!(diff_norm(&results[0], &results[1]) < APPROX_TOLERANCE);
    }
}

#[test]
fn test_inverse_mode_inverts_on_the_low_subspace() {
    let mass = 0.1;
    let (op, pack) = rotated_problem(mass, 5, 5, 57);
    let mut solver = DenseSolver::new(&op);
    let mut engine = A2aEngine::new(&op, &mut solver);

    // A source entirely inside the low subspace.
    let mut pair = zero_pair(10);
    engine.make_low_mode_pair(&mut pair, &pack.evecs()[1], pack.evals()[1]);
    let mut src = pair[0].clone();
    src.axpy(c64::new(0.5, 0.3), &pair[1]);

    let cfg = ProjectorConfig {
        projector: false,
        eig_start: 0,
        n_eigs: 5,
        strategy: ProjectorStrategy::ParityDecomposed,
        subtract: false,
    };
    let mut inverse = LowModeProjector::new(&op, &pack, cfg).unwrap();

    let mut sol = FullVector::zeros(10);
    inverse.solve(&mut sol, &src).unwrap();

    let mut applied = FullVector::zeros(10);
    op.apply_full(&mut applied, &sol);
    assert!(diff_norm(&applied, &src) < APPROX_TOLERANCE);
}

#[test]
fn test_projector_configuration_errors_at_setup() {
    let mass = 0.1;
    let (op, pack) = rotated_problem(mass, 4, 4, 3);

    let base = ProjectorConfig {
        projector: true,
        eig_start: 0,
        n_eigs: 4,
        strategy: ProjectorStrategy::ParityDecomposed,
        subtract: false,
    };

    // n_eigs = 0 against a non-empty eigenpack.
    let err = LowModeProjector::new(&op, &pack, ProjectorConfig { n_eigs: 0, ..base })
        .err()
        .expect("empty range must be rejected");
    assert!(err.to_string().contains("n_eigs must be at least 1"));

    // eig_start beyond the pack.
    let err = LowModeProjector::new(
        &op,
        &pack,
        ProjectorConfig {
            eig_start: 4,
            n_eigs: 1,
            ..base
        },
    )
    .err()
    .expect("out-of-range start must be rejected");
    assert!(err.to_string().contains("out of bounds"));

    // Range exceeding the available eigenvector count.
    let err = LowModeProjector::new(
        &op,
        &pack,
        ProjectorConfig {
            eig_start: 2,
            n_eigs: 3,
            ..base
        },
    )
    .err()
    .expect("overlong range must be rejected");
    assert!(err.to_string().contains("out of bounds"));

    // Subtracted form without projector mode.
    let err = LowModeProjector::new(
        &op,
        &pack,
        ProjectorConfig {
            projector: false,
            subtract: true,
            ..base
        },
    )
    .err()
    .expect("subtract without projector must be rejected");
    assert!(err.to_string().contains("projector = true"));
}

// --- High-mode solve ---

#[test]
fn test_high_mode_solve_roundtrip() {
    let mass = 0.2;
    let (op, _pack) = rotated_problem(mass, 5, 3, 83);
    let mut solver = DenseSolver::new(&op);
    let mut engine = A2aEngine::new(&op, &mut solver);

    let noise = random_full(10, 55);
    let mut v = FullVector::zeros(10);
    engine.make_high_mode(&mut v, &noise).unwrap();

    let mut check = FullVector::zeros(10);
    op.apply_full(&mut check, &v);
    assert!(diff_norm(&check, &noise) < APPROX_TOLERANCE);

    // The guess-seeded form delegates the same way.
    let guess = random_full(10, 56);
    let mut v_guessed = FullVector::zeros(10);
    engine
        .make_high_mode_with_guess(&mut v_guessed, &noise, &guess)
        .unwrap();
    assert!(diff_norm(&v_guessed, &v) < EXACT_TOLERANCE);
}

#[test]
fn test_deflate_then_solve_stays_off_the_low_subspace() {
    let mass = 0.1;
    let (op, pack) = rotated_problem(mass, 6, 4, 91);
    let mut solver = DenseSolver::new(&op);
    let mut engine = A2aEngine::new(&op, &mut solver);

    let mut sources = [random_full(12, 23)];
    engine.remove_low_modes(&mut sources, &pack);

    let mut v = FullVector::zeros(12);
    engine.make_high_mode(&mut v, &sources[0]).unwrap();

    // The inverse maps the deflated complement into itself, so the solution
    // has no overlap with any constructed pair either.
    for k in 0..pack.len() {
        let mut pair = zero_pair(12);
        engine.make_low_mode_pair(&mut pair, &pack.evecs()[k], pack.evals()[k]);
        assert!(pair[0].inner(&v).norm() < APPROX_TOLERANCE);
        assert!(pair[1].inner(&v).norm() < APPROX_TOLERANCE);
    }
}

// --- Basis-vector scenario from the diagonal problem ---

#[test]
fn test_diagonal_problem_pair_components_are_basis_vectors() {
    // For H = i·diag(λ), the complementary-parity map of basis eigenvector
    // e_k is e_k itself, so the pair components can be written down exactly.
    let op = diagonal_operator(0.0, &[1.0, 2.0, 3.0]);
    let pack = basis_eigenpack(&[1.0, 2.0, 3.0], 0.0, Parity::Even);
    let mut solver = DenseSolver::new(&op);
    let engine = A2aEngine::new(&op, &mut solver);

    let e1 = basis_vector(3, 1, Parity::Even);
    let mut mapped = HalfVector::zeros(3, Parity::Even);
    engine.make_low_mode_off_diag(&mut mapped, &e1, c64::new(0.0, pack.evals()[1].im));

    assert_eq!(mapped.parity(), Parity::Odd);
    let mut expected = basis_vector(3, 1, Parity::Odd);
    expected.axpy(-ONE, &mapped);
    assert!(expected.norm_l2() < EXACT_TOLERANCE);
}
