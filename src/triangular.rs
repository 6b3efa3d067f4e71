//! Traits for creating and manipulating triangular matrices

use crate::{check_square, LinalgError, Result};

use ndarray::{Array2, ArrayBase, Data, DataMut, Ix2, NdFloat};
use num_traits::Zero;

/// Denotes an upper-triangular or lower-triangular matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UPLO {
    Upper,
    Lower,
}

/// Transform square matrix into triangular matrix
pub trait IntoTriangular {
    /// Zero out the elements outside of the triangle given by `uplo`, in place
    fn triangular_inplace(&mut self, uplo: UPLO) -> Result<&mut Self>;

    /// Zero out the elements outside of the triangle given by `uplo`
    fn into_triangular(mut self, uplo: UPLO) -> Result<Self>
    where
        Self: Sized,
    {
        self.triangular_inplace(uplo)?;
        Ok(self)
    }
}

impl<A, S> IntoTriangular for ArrayBase<S, Ix2>
where
    A: Zero,
    S: DataMut<Elem = A>,
{
    fn triangular_inplace(&mut self, uplo: UPLO) -> Result<&mut Self> {
        check_square(self)?;
        for ((i, j), elem) in self.indexed_iter_mut() {
            let outside = match uplo {
                UPLO::Upper => j < i,
                UPLO::Lower => j > i,
            };
            if outside {
                *elem = A::zero();
            }
        }
        Ok(self)
    }
}

/// Check whether a matrix is triangular
pub trait Triangular {
    fn is_triangular(&self, uplo: UPLO) -> bool;
}

impl<A, S> Triangular for ArrayBase<S, Ix2>
where
    A: Zero,
    S: Data<Elem = A>,
{
    fn is_triangular(&self, uplo: UPLO) -> bool {
        if check_square(self).is_err() {
            return false;
        }
        self.indexed_iter().all(|((i, j), elem)| match uplo {
            UPLO::Upper => j >= i || elem.is_zero(),
            UPLO::Lower => j <= i || elem.is_zero(),
        })
    }
}

/// Solve `self * x = b` where `self` is triangular
///
/// Only the triangle given by `uplo` is read, the other half of `self` may contain anything.
pub trait SolveTriangular<A: NdFloat> {
    /// Overwrites `b` with the solution
    fn solve_triangular_inplace<'a, S: DataMut<Elem = A>>(
        &self,
        b: &'a mut ArrayBase<S, Ix2>,
        uplo: UPLO,
    ) -> Result<&'a mut ArrayBase<S, Ix2>>;

    fn solve_triangular_into<S: DataMut<Elem = A>>(
        &self,
        mut b: ArrayBase<S, Ix2>,
        uplo: UPLO,
    ) -> Result<ArrayBase<S, Ix2>> {
        self.solve_triangular_inplace(&mut b, uplo)?;
        Ok(b)
    }

    fn solve_triangular<S: Data<Elem = A>>(
        &self,
        b: &ArrayBase<S, Ix2>,
        uplo: UPLO,
    ) -> Result<Array2<A>> {
        self.solve_triangular_into(b.to_owned(), uplo)
    }
}

impl<A: NdFloat, Sa: Data<Elem = A>> SolveTriangular<A> for ArrayBase<Sa, Ix2> {
    fn solve_triangular_inplace<'a, S: DataMut<Elem = A>>(
        &self,
        b: &'a mut ArrayBase<S, Ix2>,
        uplo: UPLO,
    ) -> Result<&'a mut ArrayBase<S, Ix2>> {
        let n = check_square(self)?;
        if b.nrows() != n {
            return Err(LinalgError::WrongRows {
                expected: n,
                actual: b.nrows(),
            });
        }

        for mut col in b.columns_mut() {
            match uplo {
                UPLO::Lower => {
                    for i in 0..n {
                        let mut s = col[i];
                        for j in 0..i {
                            s -= self[(i, j)] * col[j];
                        }
                        col[i] = s / self[(i, i)];
                    }
                }
                UPLO::Upper => {
                    for i in (0..n).rev() {
                        let mut s = col[i];
                        for j in i + 1..n {
                            s -= self[(i, j)] * col[j];
                        }
                        col[i] = s / self[(i, i)];
                    }
                }
            }
        }

        Ok(b)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn corner_cases() {
        let empty = Array2::<f64>::zeros((0, 0));
        assert!(empty.is_triangular(UPLO::Lower));
        assert!(empty.is_triangular(UPLO::Upper));
        assert_eq!(empty.clone().into_triangular(UPLO::Lower).unwrap(), empty);

        let one = array![[1]];
        assert!(one.is_triangular(UPLO::Lower));
        assert!(one.is_triangular(UPLO::Upper));
        assert_eq!(one.clone().into_triangular(UPLO::Upper).unwrap(), one);
    }

    #[test]
    fn non_square() {
        let row = array![[1, 2, 3], [3, 4, 5]];
        assert!(!row.is_triangular(UPLO::Lower));
        assert!(matches!(
            row.into_triangular(UPLO::Lower),
            Err(LinalgError::NotSquare { rows: 2, cols: 3 })
        ));

        let a = array![[2., 0.], [1., 1.]];
        assert!(matches!(
            a.solve_triangular(&array![[1.], [2.], [3.]], UPLO::Lower),
            Err(LinalgError::WrongRows {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn square() {
        let square = array![[1, 2, 3], [4, 5, 6], [7, 8, 9]];
        assert!(!square.is_triangular(UPLO::Lower));
        assert!(!square.is_triangular(UPLO::Upper));

        let upper = square.clone().into_triangular(UPLO::Upper).unwrap();
        assert_eq!(upper, array![[1, 2, 3], [0, 5, 6], [0, 0, 9]]);
        assert!(upper.is_triangular(UPLO::Upper));
        assert!(!upper.is_triangular(UPLO::Lower));

        let lower = square.into_triangular(UPLO::Lower).unwrap();
        assert_eq!(lower, array![[1, 0, 0], [4, 5, 0], [7, 8, 9]]);
        assert!(lower.is_triangular(UPLO::Lower));
    }

    #[test]
    fn solve_ignores_other_triangle() {
        // upper half is garbage and must not be read
        let a = array![[2., 100.], [1., 4.]];
        let x = a
            .solve_triangular(&array![[2., 4.], [5., 2.]], UPLO::Lower)
            .unwrap();
        assert_abs_diff_eq!(x, array![[1., 2.], [1., 0.]], epsilon = 1e-12);

        let x = a
            .t()
            .solve_triangular(&array![[6.], [4.]], UPLO::Upper)
            .unwrap();
        assert_abs_diff_eq!(x, array![[2.5], [1.]], epsilon = 1e-12);
    }
}
