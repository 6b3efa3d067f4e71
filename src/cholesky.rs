//! Cholesky decomposition of positive definite matrices

use crate::{
    check_square,
    triangular::{IntoTriangular, SolveTriangular, UPLO},
    LinalgError, Result,
};

use ndarray::{s, Array2, ArrayBase, Data, DataMut, Ix2, NdFloat};

/// Cholesky decomposition of a positive definite matrix
pub trait CholeskyInplace {
    /// Computes decomposition `A = L * L.t` where L is a lower-triangular matrix in place.
    /// The upper triangle portion is not zeroed out.
    fn cholesky_inplace_dirty(&mut self) -> Result<&mut Self>;

    /// Computes decomposition `A = L * L.t` where L is a lower-triangular matrix, passing by
    /// value.
    /// The upper triangle portion is not zeroed out.
    fn cholesky_into_dirty(mut self) -> Result<Self>
    where
        Self: Sized,
    {
        self.cholesky_inplace_dirty()?;
        Ok(self)
    }

    /// Computes decomposition `A = L * L.t` where L is a lower-triangular matrix in place.
    fn cholesky_inplace(&mut self) -> Result<&mut Self>;

    /// Computes decomposition `A = L * L.t` where L is a lower-triangular matrix, passing by
    /// value.
    fn cholesky_into(mut self) -> Result<Self>
    where
        Self: Sized,
    {
        self.cholesky_inplace()?;
        Ok(self)
    }
}

impl<A, S> CholeskyInplace for ArrayBase<S, Ix2>
where
    A: NdFloat,
    S: DataMut<Elem = A>,
{
    fn cholesky_inplace_dirty(&mut self) -> Result<&mut Self> {
        let n = check_square(self)?;

        // column by column, only the lower triangle is read and written
        for j in 0..n {
            let row_j = self.slice(s![j, ..j]).to_owned();
            let d = self[(j, j)] - row_j.dot(&row_j);

            // also rejects NaN pivots
            if !(d > A::zero()) {
                return Err(LinalgError::NotPositiveDefinite);
            }
            let d = d.sqrt();
            self[(j, j)] = d;

            for i in j + 1..n {
                let s = self.slice(s![i, ..j]).dot(&row_j);
                self[(i, j)] = (self[(i, j)] - s) / d;
            }
        }
        Ok(self)
    }

    fn cholesky_inplace(&mut self) -> Result<&mut Self> {
        self.cholesky_inplace_dirty()?;
        self.triangular_inplace(UPLO::Lower)?;
        Ok(self)
    }
}

/// Cholesky decomposition of a positive definite matrix, without modifying the original
pub trait Cholesky {
    type Output;

    /// Computes decomposition `A = L * L.t` where L is a lower-triangular matrix without modifying
    /// or consuming the original.
    /// The upper triangle portion is not zeroed out.
    fn cholesky_dirty(&self) -> Result<Self::Output>;

    /// Computes decomposition `A = L * L.t` where L is a lower-triangular matrix without modifying
    /// or consuming the original.
    fn cholesky(&self) -> Result<Self::Output>;
}

impl<A, S> Cholesky for ArrayBase<S, Ix2>
where
    A: NdFloat,
    S: Data<Elem = A>,
{
    type Output = Array2<A>;

    fn cholesky_dirty(&self) -> Result<Self::Output> {
        self.to_owned().cholesky_into_dirty()
    }

    fn cholesky(&self) -> Result<Self::Output> {
        self.to_owned().cholesky_into()
    }
}

/// Solves `L * L.t * x = b` in place, given the lower Cholesky factor `L`
///
/// The upper triangle of `factor` is ignored, so a dirty factor works as well.
pub fn cho_solve_inplace<A, Sf, Sb>(
    factor: &ArrayBase<Sf, Ix2>,
    b: &mut ArrayBase<Sb, Ix2>,
) -> Result<()>
where
    A: NdFloat,
    Sf: Data<Elem = A>,
    Sb: DataMut<Elem = A>,
{
    factor.solve_triangular_inplace(b, UPLO::Lower)?;
    factor.t().solve_triangular_inplace(b, UPLO::Upper)?;
    Ok(())
}
