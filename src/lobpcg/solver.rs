//! Entry points of the eigensolver
//!
use log::debug;
use ndarray::prelude::*;
use ndarray::NdFloat;
use rand::distributions::Standard;
use rand::prelude::*;

use super::algorithm::{rayleigh_ritz, sorted_eig, symmetrize};
use super::{
    make_operator, random, Constraints, Diagnostics, Lobpcg, LogDiagnostics, Operator,
    ProblemSummary, Termination,
};
use crate::{norm::ColumnNorms, LinalgError, Order, Result};

/// Truncated eigenproblem solver
///
/// This struct wraps the LOBPCG algorithm and provides convenient builder-pattern access to
/// parameters like the mass operator, the preconditioner, maximal iteration, precision and
/// constraint matrix.
///
/// # Example
///
/// ```rust
/// use ndarray::{Array1, Array2};
/// use ndarray_lobpcg::{Order, lobpcg::LobpcgSolver};
/// use rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// let a = Array2::from_diag(&Array1::linspace(1., 100., 100));
///
/// let res = LobpcgSolver::new(&a, Order::Largest)
///     .precision(1e-6)
///     .maxiter(100)
///     .decompose(3, Xoshiro256Plus::seed_from_u64(42))
///     .unwrap();
///
/// assert_eq!(res.eigvals.len(), 3);
/// ```
pub struct LobpcgSolver<'a, A> {
    a: Operator<'a, A>,
    b: Option<Operator<'a, A>>,
    m: Option<Operator<'a, A>>,
    y: Option<Array2<A>>,
    order: Order,
    precision: Option<A>,
    maxiter: usize,
    lambda_history: bool,
    rnorm_history: bool,
    diagnostics: Box<dyn Diagnostics<A> + 'a>,
}

impl<'a, A: NdFloat> LobpcgSolver<'a, A> {
    /// Create a new truncated eigenproblem solver for the problem operator `a`
    ///
    /// By default the standard problem is solved without preconditioner and constraints, for
    /// at most 20 iterations. Progress is reported to the `log` facade.
    pub fn new(a: impl Into<Operator<'a, A>>, order: Order) -> Self {
        LobpcgSolver {
            a: a.into(),
            b: None,
            m: None,
            y: None,
            order,
            precision: None,
            maxiter: 20,
            lambda_history: false,
            rnorm_history: false,
            diagnostics: Box::new(LogDiagnostics),
        }
    }

    /// Solve the generalized problem `A x = lambda B x` with positive definite `b`
    pub fn mass(mut self, b: impl Into<Operator<'a, A>>) -> Self {
        self.b = Some(b.into());

        self
    }

    /// Apply a preconditioner
    ///
    /// A preconditioner approximating the inverse of `A` can speed up the solving process by
    /// improving the spectral distribution of the eigenvalues. It requires prior knowledge of the
    /// problem.
    pub fn precondition_with(mut self, m: impl Into<Operator<'a, A>>) -> Self {
        self.m = Some(m.into());

        self
    }

    /// Construct a solution, which is B-orthogonal to the columns of `constraints`
    ///
    /// If a number of eigenvectors are already known, then this function can be used to search
    /// in their orthogonal complement. The constraints must be linearly independent.
    pub fn orthogonal_to(mut self, constraints: Array2<A>) -> Self {
        self.y = Some(constraints);

        self
    }

    /// Set desired precision
    ///
    /// The optimization of an eigenpair stops once the L2 norm of its residual is below this
    /// value. Defaults to `sqrt(eps) * n`.
    pub fn precision(mut self, precision: A) -> Self {
        self.precision = Some(precision);

        self
    }

    /// Set the maximal number of iterations, capped at the problem size
    pub fn maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;

        self
    }

    /// Return the eigenvalues of every iteration
    pub fn lambda_history(mut self, enable: bool) -> Self {
        self.lambda_history = enable;

        self
    }

    /// Return the residual norms of every iteration
    pub fn residual_history(mut self, enable: bool) -> Self {
        self.rnorm_history = enable;

        self
    }

    /// Report the progress to `diagnostics` instead of the `log` facade
    pub fn diagnostics(mut self, diagnostics: impl Diagnostics<A> + 'a) -> Self {
        self.diagnostics = Box::new(diagnostics);

        self
    }

    /// Calculate the eigenpairs starting from the initial block `x`
    ///
    /// The number of columns of `x` is the number of computed eigenpairs. Small problems, where
    /// the dimension is less than five times the block size, are solved densely.
    pub fn solve(self, x: Array2<A>) -> Result<Lobpcg<A>> {
        let LobpcgSolver {
            a,
            b,
            m,
            y,
            order,
            precision,
            maxiter,
            lambda_history,
            rnorm_history,
            mut diagnostics,
        } = self;

        let (n, size_x) = x.dim();
        if size_x == 0 || size_x > n {
            return Err(LinalgError::InvalidInput {
                rows: n,
                cols: size_x,
            });
        }

        let a = make_operator(Some(a), (n, n))?;
        let b = make_operator(b, (n, n))?;
        let m = make_operator(m, (n, n))?;

        // an empty constraint block is no constraint
        let y = y.filter(|y| y.ncols() > 0);
        if let Some(y) = &y {
            if y.nrows() != n {
                return Err(LinalgError::ShapeMismatch {
                    expected: (n, y.ncols()),
                    actual: y.dim(),
                });
            }
        }
        let size_y = y.as_ref().map_or(0, |y| y.ncols());

        let mut res = if n.saturating_sub(size_y) < 5 * size_x {
            if y.is_some() {
                return Err(LinalgError::NotImplemented(
                    "constraints for problems small enough to be solved densely",
                ));
            }
            debug!(
                "lobpcg: dimension {} is too small for block size {}, solving densely",
                n, size_x
            );
            dense_solve(&a, &b, size_x, order)?
        } else {
            let tol = precision.unwrap_or_else(|| A::epsilon().sqrt() * A::from(n).unwrap());
            let maxiter = maxiter.min(n);
            let constraints = y.map(|y| Constraints::new(y, &b)).transpose()?;

            diagnostics.setup(&ProblemSummary {
                dim: n,
                block_size: size_x,
                constraints: size_y,
                generalized: !b.is_identity(),
                preconditioned: !m.is_identity(),
            });

            rayleigh_ritz(
                &a,
                x,
                &b,
                &m,
                constraints.as_ref(),
                tol,
                maxiter,
                order,
                &mut *diagnostics,
            )?
        };
        diagnostics.finish(res.eigvals.view(), &res.rnorm, res.termination);

        if !lambda_history {
            res.lambda_history = None;
        }
        if !rnorm_history {
            res.rnorm_history = None;
        }

        Ok(res)
    }

    /// Calculate the `num` extreme eigenpairs starting from a random block drawn from `rng`
    pub fn decompose<R: Rng>(self, num: usize, rng: R) -> Result<Lobpcg<A>>
    where
        Standard: Distribution<A>,
    {
        let x = random((self.a.shape().1, num), rng);
        self.solve(x)
    }
}

/// Solve the small problem with dense matrices
///
/// The operators are applied to the identity to form the matrices. Returns the eigenpairs with
/// the same ordering as the iteration.
fn dense_solve<A: NdFloat>(
    a: &Operator<'_, A>,
    b: &Operator<'_, A>,
    size: usize,
    order: Order,
) -> Result<Lobpcg<A>> {
    let n = a.shape().0;
    let eye = Array2::eye(n);

    let a_dense = symmetrize(a.apply(eye.view())?);
    let b_dense = if b.is_identity() {
        None
    } else {
        Some(symmetrize(b.apply(eye.view())?))
    };
    let (eigvals, eigvecs) = sorted_eig(a_dense, b_dense, size, order)?;

    let r = a.apply(eigvecs.view())? - b.apply(eigvecs.view())? * &eigvals;
    let rnorm = r.column_norms_l2().to_vec();

    Ok(Lobpcg {
        eigvals,
        eigvecs,
        rnorm,
        lambda_history: Some(Vec::new()),
        rnorm_history: Some(Vec::new()),
        iterations: 0,
        termination: Termination::DirectSolve,
    })
}

/// Eigenvalue solver for large symmetric eigenproblems
///
/// # Arguments
/// * `a` - An operator defining the problem, usually a sparse (sometimes also dense) matrix
/// multiplication. Also called the "stiffness matrix".
/// * `x` - Initial approximation of the k eigenvectors. If `a` has shape=(n,n), then `x` should
/// have shape=(n,k).
/// * `b` - Mass operator of the generalized problem, by default the identity.
/// * `m` - Preconditioner to `a`, by default the identity. Should approximate the inverse of `a`.
/// * `y` - Constraints of (n,size_y), iterations are performed in the B-orthogonal complement of
/// the column-space of `y`. It must be full rank.
/// * `tol` - The approximation of an eigenvalue stops when the l2-norm of its residual is below
/// this threshold. Defaults to `sqrt(eps) * n`.
/// * `maxiter` - The maximal number of iterations, capped at `n`
/// * `order` - Whether to solve for the largest or lowest eigenvalues
///
/// Progress is reported to the `log` facade, use [`LobpcgSolver`] for histories and custom
/// diagnostics.
#[allow(clippy::too_many_arguments)]
pub fn lobpcg<'a, A: NdFloat>(
    a: impl Into<Operator<'a, A>>,
    x: Array2<A>,
    b: Option<Operator<'a, A>>,
    m: Option<Operator<'a, A>>,
    y: Option<Array2<A>>,
    tol: Option<A>,
    maxiter: usize,
    order: Order,
) -> Result<Lobpcg<A>> {
    LobpcgSolver {
        a: a.into(),
        b,
        m,
        y,
        order,
        precision: tol,
        maxiter,
        lambda_history: false,
        rnorm_history: false,
        diagnostics: Box::new(LogDiagnostics),
    }
    .solve(x)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    use super::*;
    use crate::eigh::{EigSort, Eigh};
    use crate::lobpcg::Silent;

    #[test]
    fn dense_fallback() {
        let a = Array2::from_shape_fn((10, 10), |(i, j)| {
            if i == j {
                (i + 1) as f64
            } else {
                1. / (i + j + 1) as f64
            }
        });
        let (truth, _) = a.eigh().unwrap().sort_eig(Order::Largest);

        let res = LobpcgSolver::new(&a, Order::Largest)
            .diagnostics(Silent)
            .decompose(5, Xoshiro256Plus::seed_from_u64(1))
            .unwrap();
        assert_eq!(res.termination, Termination::DirectSolve);
        assert_eq!(res.iterations, 0);
        assert_abs_diff_eq!(res.eigvals, truth.slice(s![..5]), epsilon = 1e-10);
        assert!(res.rnorm.iter().all(|r| *r < 1e-10));
        assert!(res.lambda_history.is_none());

        let res = LobpcgSolver::new(&a, Order::Smallest)
            .diagnostics(Silent)
            .decompose(5, Xoshiro256Plus::seed_from_u64(1))
            .unwrap();
        assert_abs_diff_eq!(
            res.eigvals,
            truth.slice(s![5..;-1]),
            epsilon = 1e-10
        );
    }

    #[test]
    fn dense_generalized() {
        let a = Array2::from_diag(&Array1::linspace(1., 6., 6));
        let b = Array2::from_diag(&Array1::from_elem(6, 2.));

        let res = LobpcgSolver::new(&a, Order::Smallest)
            .mass(&b)
            .diagnostics(Silent)
            .solve(Array2::eye(6).slice_move(s![.., ..2]))
            .unwrap();
        assert_abs_diff_eq!(res.eigvals, array![0.5, 1.0], epsilon = 1e-12);
        assert_abs_diff_eq!(
            res.eigvecs.t().dot(&b).dot(&res.eigvecs),
            Array2::eye(2),
            epsilon = 1e-12
        );
    }

    #[test]
    fn validation() {
        let a = Array2::<f64>::eye(10);

        assert!(matches!(
            LobpcgSolver::new(&a, Order::Largest).solve(Array2::zeros((10, 11))),
            Err(LinalgError::InvalidInput { rows: 10, cols: 11 })
        ));
        assert!(matches!(
            LobpcgSolver::new(&a, Order::Largest).solve(Array2::zeros((10, 0))),
            Err(LinalgError::InvalidInput { rows: 10, cols: 0 })
        ));
        assert!(matches!(
            LobpcgSolver::new(&a, Order::Largest).solve(Array2::ones((8, 1))),
            Err(LinalgError::ShapeMismatch {
                expected: (8, 8),
                actual: (10, 10)
            })
        ));
        assert!(matches!(
            LobpcgSolver::new(&a, Order::Largest)
                .mass(Array2::eye(9))
                .solve(Array2::ones((10, 1))),
            Err(LinalgError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            LobpcgSolver::new(&a, Order::Largest)
                .orthogonal_to(Array2::ones((9, 1)))
                .solve(Array2::ones((10, 1))),
            Err(LinalgError::ShapeMismatch {
                expected: (10, 1),
                actual: (9, 1)
            })
        ));
        assert!(matches!(
            LobpcgSolver::new(&a, Order::Largest)
                .orthogonal_to(Array2::eye(10).slice_move(s![.., ..1]))
                .solve(Array2::ones((10, 5))),
            Err(LinalgError::NotImplemented(_))
        ));
    }

    #[test]
    fn empty_constraints_are_ignored() {
        let a = Array2::from_diag(&Array1::linspace(1., 10., 10));
        let res = LobpcgSolver::new(&a, Order::Largest)
            .orthogonal_to(Array2::zeros((10, 0)))
            .diagnostics(Silent)
            .solve(Array2::ones((10, 3)))
            .unwrap();
        assert_eq!(res.termination, Termination::DirectSolve);
        assert_abs_diff_eq!(res.eigvals, array![10., 9., 8.], epsilon = 1e-10);
    }
}
