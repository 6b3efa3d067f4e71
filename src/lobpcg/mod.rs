//!
//! Locally Optimal Block Preconditioned Conjugate Gradient (LOBPCG) is a matrix-free method for
//! finding the largest (or smallest) eigenvalues and the corresponding eigenvectors of a
//! symmetric, possibly generalized, eigenvalue problem
//! ```text
//! A x = lambda B x
//! ```
//! where A is symmetric, B is symmetric positive definite and (x, lambda) the solution. It has the
//! following advantages:
//! * matrix free: does not require storing the coefficient matrices explicitely and only
//!   evaluates matrix-block products, see [`Operator`].
//! * preconditioned: an approximate inverse of `A` can be plugged in to accelerate convergence
//! * constrained: the search can be restricted to the B-orthogonal complement of known vectors
//!
//! See also the wikipedia article at [LOBPCG](https://en.wikipedia.org/wiki/LOBPCG)
//!
mod algorithm;
mod constraints;
mod diagnostics;
mod operator;
mod ortho;
mod solver;

use ndarray::prelude::*;
use rand::distributions::Standard;
use rand::prelude::*;

pub use crate::{LinalgError, Order};
pub use constraints::Constraints;
pub use diagnostics::{Diagnostics, IterationInfo, LogDiagnostics, ProblemSummary, Silent};
pub use operator::{make_operator, BlockFn, Operator};
pub use ortho::b_orthonormalize;
pub use solver::{lobpcg, LobpcgSolver};

/// Generate random array
pub(crate) fn random<A, Sh, D, R: Rng>(sh: Sh, mut rng: R) -> Array<A, D>
where
    A: NdFloat,
    D: Dimension,
    Sh: ShapeBuilder<Dim = D>,
    Standard: Distribution<A>,
{
    ArrayBase::from_shape_fn(sh, |_| rng.gen::<A>())
}

/// How the solver terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// All residual norms fell below the tolerance
    Converged,
    /// The iteration limit was hit first, the result is only partially converged
    MaxIterReached,
    /// The problem was too small for the iteration and was solved densely
    DirectSolve,
}

/// The result of the eigensolver
///
/// Reaching the iteration limit is not an error. Check [`Lobpcg::converged`] or the residual
/// norms to judge the quality of the eigenpairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Lobpcg<A> {
    pub eigvals: Array1<A>,
    pub eigvecs: Array2<A>,
    /// Final residual norm of every eigenpair
    pub rnorm: Vec<A>,
    /// Eigenvalues after initialization and after every iteration, if requested
    pub lambda_history: Option<Vec<Array1<A>>>,
    /// Residual norms of every iteration, if requested
    pub rnorm_history: Option<Vec<Vec<A>>>,
    pub iterations: usize,
    pub termination: Termination,
}

impl<A> Lobpcg<A> {
    pub fn converged(&self) -> bool {
        matches!(
            self.termination,
            Termination::Converged | Termination::DirectSolve
        )
    }
}
