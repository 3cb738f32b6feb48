//! The external solve abstraction.
//!
//! The engine never implements an iterative solver itself; high-mode solves
//! are delegated through this trait to whatever the caller wires in (a
//! conjugate-gradient stack in production, a dense LU factorization in the
//! tests). Implementations either converge or return a hard error; retry and
//! resource policy belong to the implementor, and calls are synchronous
//! collectives on the production runtime.

use anyhow::Result;

use crate::field::FullVector;

/// Solves `M · sol = src` for the operator the implementor was built around.
pub trait Solver {
    fn solve(&mut self, sol: &mut FullVector, src: &FullVector) -> Result<()>;

    /// Same solve seeded with an initial guess. Implementations that cannot
    /// exploit a guess (direct solvers) fall back to the plain solve.
    fn solve_with_guess(
        &mut self,
        sol: &mut FullVector,
        src: &FullVector,
        _guess: &FullVector,
    ) -> Result<()> {
        self.solve(sol, src)
    }
}
