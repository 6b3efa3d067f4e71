use ndarray::{Array2, ArrayView2, NdFloat};

use super::Operator;
use crate::{
    cholesky::{cho_solve_inplace, CholeskyInplace},
    LinalgError, Result,
};

/// Projection onto the B-orthogonal complement of a fixed constraint subspace `span(Y)`
#[derive(Debug, Clone)]
pub struct Constraints<A> {
    y: Array2<A>,
    by: Array2<A>,
    /// Lower Cholesky factor of `Y.t * B * Y`
    chol_yby: Array2<A>,
}

impl<A: NdFloat> Constraints<A> {
    /// Factorizes the B-Gram matrix of `y`
    ///
    /// Fails with `LinearlyDependentConstraints` if the columns of `y` are not linearly
    /// independent in the B-inner product.
    pub fn new(y: Array2<A>, b: &Operator<'_, A>) -> Result<Self> {
        let by = b.apply(y.view())?;
        let chol_yby = y
            .t()
            .dot(&by)
            .cholesky_into()
            .map_err(|_| LinalgError::LinearlyDependentConstraints)?;

        Ok(Constraints { y, by, chol_yby })
    }

    /// Returns `v - Y * (Y.t * B * Y)^-1 * (B * Y).t * v`
    pub fn apply(&self, v: ArrayView2<A>) -> Result<Array2<A>> {
        let mut coeffs = self.by.t().dot(&v);
        cho_solve_inplace(&self.chol_yby, &mut coeffs)?;
        Ok(&v - &self.y.dot(&coeffs))
    }

    /// Number of constraint vectors
    pub fn size(&self) -> usize {
        self.y.ncols()
    }

    pub fn y(&self) -> &Array2<A> {
        &self.y
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};

    use super::*;

    #[test]
    fn project_out_standard_basis() {
        let y = Array2::<f64>::eye(5).slice_move(ndarray::s![.., ..2]);
        let cons = Constraints::new(y.clone(), &Operator::identity(5)).unwrap();
        assert_eq!(cons.size(), 2);

        let v = Array2::from_shape_fn((5, 3), |(i, j)| (i * 3 + j) as f64 + 1.);
        let proj = cons.apply(v.view()).unwrap();
        assert_abs_diff_eq!(y.t().dot(&proj), Array2::zeros((2, 3)));
        // the complement is untouched
        assert_eq!(proj.row(4), v.row(4));
        assert_eq!(proj.row(0), Array1::zeros(3));
    }

    #[test]
    fn b_orthogonal_projection() {
        let b_mat = array![[2., 0.5, 0.], [0.5, 1., 0.], [0., 0., 3.]];
        let b = Operator::from(&b_mat);
        let y = array![[1.], [1.], [0.]];
        let cons = Constraints::new(y.clone(), &b).unwrap();

        let v = array![[1., 0.], [2., 1.], [3., -1.]];
        let proj = cons.apply(v.view()).unwrap();
        assert_abs_diff_eq!(y.t().dot(&b_mat).dot(&proj), Array2::zeros((1, 2)), epsilon = 1e-12);

        // projection is idempotent
        assert_abs_diff_eq!(cons.apply(proj.view()).unwrap(), proj, epsilon = 1e-12);
    }

    #[test]
    fn dependent() {
        let y = array![[1., 1.], [0., 0.], [0., 0.]];
        assert!(matches!(
            Constraints::new(y, &Operator::identity(3)),
            Err(LinalgError::LinearlyDependentConstraints)
        ));
    }
}
