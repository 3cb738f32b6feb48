//! Low-mode deflation and all-to-all vector construction for staggered
//! lattice operators.
//!
//! This crate manipulates partial solutions of a large, nearly singular
//! lattice operator `M = 2m·1 + D` using a small known low-lying eigenspace
//! of the Hermitian squared operator. The eigenspace is computed upstream and
//! consumed here three ways:
//!
//! - **[`MassShiftedEigenPack`]** adapts real eigenpairs of the squared
//!   massless operator into complex eigenvalues `2m + iλ` of `M` itself.
//! - **[`A2aEngine`]** assembles full-lattice all-to-all vector pairs from
//!   single-checkerboard eigenvectors, removes the eigenspace component from
//!   stochastic sources (deflation), and delegates high-mode solves to an
//!   external [`Solver`].
//! - **[`LowModeProjector`]** packages exact projection onto the eigenspace
//!   (or its complement, or an eigenvalue-weighted low-mode inverse) behind
//!   the same [`Solver`] trait, so it composes with anything expecting a
//!   generic solve.
//!
//! The delicate part of all three is checkerboard bookkeeping: eigenvectors
//! live on one parity class, their complementary components are produced by
//! the operator's cross-parity block, and the sign and conjugation
//! conventions of the resulting pairs are easy to violate silently. The
//! [`field`] module makes the full/restricted distinction a type-level one.
//!
//! Numerical storage and kernels come from the [`faer`] linear algebra
//! framework; fields are dense complex columns (`Mat<c64>`). On the
//! production runtime the operator, solver, and inner products are
//! synchronous collectives over a distributed field container; this crate
//! spawns no threads and adds no timeouts of its own. Engine and projector
//! instances own their scratch fields, so every operation takes `&mut self`
//! and concurrent use of one instance is ruled out at compile time.
//!
//! ## Example
//!
//! Project a source onto the low-mode subspace of a toy operator and verify
//! that projection and complement reassemble it:
//!
//! ```rust
//! use a2a_lowmode::utils::problems;
//! use a2a_lowmode::{FullVector, LowModeProjector, Parity, ProjectorConfig, Solver};
//!
//! // A toy operator with two known low modes, and its eigenpack.
//! let op = problems::diagonal_operator(0.05, &[1.0, 2.0]);
//! let pack = problems::basis_eigenpack(&[1.0, 2.0], 0.05, Parity::Even);
//!
//! let cfg = ProjectorConfig::over(&pack);
//! let (mut project, mut subtract) =
//!     LowModeProjector::project_and_subtract(&op, &pack, cfg).unwrap();
//!
//! let src = problems::random_full(4, 7);
//! let mut p = FullVector::zeros(4);
//! let mut s = FullVector::zeros(4);
//! project.solve(&mut p, &src).unwrap();
//! subtract.solve(&mut s, &src).unwrap();
//!
//! // PROJECT(x) + SUBTRACT(x) == x.
//! p.axpy(faer::c64::new(1.0, 0.0), &s);
//! p.subtract_from(&src);
//! assert!(p.norm_l2() < 1e-12);
//! ```
//!
//! ## Trust boundaries
//!
//! Only the projector validates its configuration (the eigenvector sub-range,
//! at setup). The eigenpack adaptor and the engine check nothing: mismatched
//! array sizes or an empty eigenspace produce meaningless numbers or an index
//! panic, not a recoverable error. Solver and operator failures propagate
//! unchanged.

// Declare the modules that form the crate's API structure.
pub mod eigenpack;
pub mod engine;
pub mod error;
pub mod field;
pub mod operator;
pub mod projector;
pub mod solver;
pub mod utils;

// Re-export the main API for convenient access.
pub use eigenpack::MassShiftedEigenPack;
pub use engine::{A2aEngine, SweepOrder};
pub use error::LowModeError;
pub use field::{FullVector, HalfVector, Parity};
pub use operator::{DenseStaggeredOperator, ExtendedOperator, ParityOperator};
pub use projector::{LowModeProjector, ProjectorConfig, ProjectorStrategy};
pub use solver::Solver;
