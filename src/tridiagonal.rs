//! Tridiagonal decomposition of a symmetric matrix

use ndarray::{s, Array1, Array2, ArrayBase, DataMut, Ix2, NdFloat, RawDataClone};

use crate::{
    check_square,
    householder::{reflection_axis_mut, Reflection},
    Result,
};

/// Reduction of a symmetric matrix to tridiagonal form by Householder reflections
pub trait SymmetricTridiagonal {
    type Decomp;

    /// Calculate the decomposition `A = Q * T * Q.t` with `T` tridiagonal and `Q` orthogonal.
    ///
    /// Only meaningful for symmetric matrices. Non-symmetric input is accepted but the
    /// decomposition is then not related to the input.
    fn sym_tridiagonal(self) -> Result<Self::Decomp>;
}

impl<A: NdFloat, S: DataMut<Elem = A>> SymmetricTridiagonal for ArrayBase<S, Ix2> {
    type Decomp = TridiagonalDecomp<A, S>;

    fn sym_tridiagonal(mut self) -> Result<Self::Decomp> {
        let dim = check_square(&self)?;
        let mut off_diag = Array1::zeros(dim.saturating_sub(1));

        for i in 0..dim.saturating_sub(1) {
            let (mut axis, mut rest) = self.multi_slice_mut((s![i + 1.., i], s![i + 1.., i + 1..]));
            // a zero axis is left as is and represents the identity
            if let Some(norm) = reflection_axis_mut(&mut axis) {
                off_diag[i] = norm;
                let refl = Reflection::new(axis);
                refl.reflect_cols(&mut rest);
                refl.reflect_rows(&mut rest);
            }
        }

        let diag = self.diag().to_owned();
        Ok(TridiagonalDecomp {
            reflectors: self,
            diag,
            off_diag,
        })
    }
}

#[derive(Debug)]
/// Compact tridiagonal decomposition. The Householder axes are stored below the subdiagonal of
/// the input matrix.
pub struct TridiagonalDecomp<A, S: DataMut<Elem = A>> {
    reflectors: ArrayBase<S, Ix2>,
    diag: Array1<A>,
    off_diag: Array1<A>,
}

impl<A: Clone, S: DataMut<Elem = A> + RawDataClone> Clone for TridiagonalDecomp<A, S> {
    fn clone(&self) -> Self {
        Self {
            reflectors: self.reflectors.clone(),
            diag: self.diag.clone(),
            off_diag: self.off_diag.clone(),
        }
    }
}

impl<A: NdFloat, S: DataMut<Elem = A>> TridiagonalDecomp<A, S> {
    /// Assemble the orthogonal matrix `Q`
    pub fn generate_q(&self) -> Array2<A> {
        let dim = self.reflectors.nrows();
        let mut q = Array2::eye(dim);

        // Q = H_0 * H_1 * ... , applied from the innermost reflection outwards
        for i in (0..dim.saturating_sub(1)).rev() {
            let refl = Reflection::new(self.reflectors.slice(s![i + 1.., i]));
            refl.reflect_cols(&mut q.slice_mut(s![i + 1.., ..]));
        }
        q
    }

    /// Returns the diagonal and the off-diagonal of `T`
    pub fn into_diagonals(self) -> (Array1<A>, Array1<A>) {
        (self.diag, self.off_diag)
    }

    /// Returns `T` as a dense matrix
    pub fn into_tridiag_matrix(self) -> Array2<A> {
        let mut tri = Array2::from_diag(&self.diag);
        for (i, &e) in self.off_diag.iter().enumerate() {
            tri[(i, i + 1)] = e;
            tri[(i + 1, i)] = e;
        }
        tri
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn decompose() {
        let arr = array![
            [4.0f64, 1., -2., 2.],
            [1., 2., 0., 1.],
            [-2., 0., 3., -2.],
            [2., 1., -2., -1.]
        ];
        let decomp = arr.clone().sym_tridiagonal().unwrap();
        let q = decomp.generate_q();
        let tri = decomp.into_tridiag_matrix();

        assert_abs_diff_eq!(q.dot(&q.t()), Array2::eye(4), epsilon = 1e-12);
        assert_abs_diff_eq!(q.dot(&tri).dot(&q.t()), arr, epsilon = 1e-12);
        // the first row is untouched by the reduction
        assert_abs_diff_eq!(tri[(0, 0)], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tri[(0, 1)].abs(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn corner_cases() {
        let one = array![[2.0f64]];
        let decomp = one.sym_tridiagonal().unwrap();
        assert_eq!(decomp.generate_q(), array![[1.]]);
        assert_eq!(decomp.into_tridiag_matrix(), array![[2.]]);

        // already diagonal, no reflection happens
        let diag = Array2::from_diag(&array![1.0f64, 2., 3.]);
        let (d, e) = diag.sym_tridiagonal().unwrap().into_diagonals();
        assert_eq!(d, array![1., 2., 3.]);
        assert_eq!(e, array![0., 0.]);
    }
}
