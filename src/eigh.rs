//! Eigendecomposition for symmetric square matrices, including the generalized problem
//! `A x = lambda B x` with positive definite `B`

use std::cmp::Ordering;

use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, DataMut, Ix2, NdFloat};

use crate::{
    check_square,
    cholesky::CholeskyInplace,
    givens::GivensRotation,
    triangular::{SolveTriangular, UPLO},
    tridiagonal::SymmetricTridiagonal,
    LinalgError, Order, Result,
};

fn symmetric_eig<A: NdFloat, S: DataMut<Elem = A>>(
    mut matrix: ArrayBase<S, Ix2>,
    eigenvectors: bool,
    eps: A,
) -> Result<(Array1<A>, Option<Array2<A>>)> {
    let dim = check_square(&matrix)?;
    if dim == 0 {
        return Ok((Array1::zeros(0), eigenvectors.then(|| Array2::zeros((0, 0)))));
    }

    let amax = matrix.iter().fold(A::zero(), |m, x| m.max(x.abs()));
    if !amax.is_zero() {
        matrix /= amax;
    }

    let tridiag_decomp = matrix.sym_tridiagonal()?;
    let mut q_mat = eigenvectors.then(|| tridiag_decomp.generate_q());
    let (mut diag, mut off_diag) = tridiag_decomp.into_diagonals();

    let (mut start, mut end) = delimit_subproblem(&diag, &mut off_diag, dim - 1, eps);

    // implicit QR steps with Wilkinson shift on the unreduced block `start..=end`
    while end != start {
        let subdim = end - start + 1;

        if subdim > 2 {
            let m = end - 1;
            let n = end;

            let mut x = diag[start] - wilkinson_shift(diag[m], diag[n], off_diag[m]);
            let mut y = off_diag[start];

            for i in start..n {
                let j = i + 1;

                let (rot, norm) = match GivensRotation::cancel_y(x, y) {
                    Some(res) => res,
                    None => break,
                };
                if i > start {
                    off_diag[i - 1] = norm;
                }

                let (c, s) = (rot.c(), rot.s());
                let (mii, mjj, mij) = (diag[i], diag[j], off_diag[i]);
                let (cc, ss, cs) = (c * c, s * s, c * s);
                let b = cs * mij * A::from(2.0).unwrap();

                diag[i] = cc * mii + ss * mjj - b;
                diag[j] = ss * mii + cc * mjj + b;
                off_diag[i] = cs * (mii - mjj) + mij * (cc - ss);

                // chase the bulge one row down
                if i != n - 1 {
                    x = off_diag[i];
                    y = -s * off_diag[i + 1];
                    off_diag[i + 1] *= c;
                }

                if let Some(q) = &mut q_mat {
                    rot.inverse().rotate_rows(&mut q.slice_mut(s![.., i..=j]))?;
                }
            }

            if off_diag[m].abs() <= eps * (diag[m].abs() + diag[n].abs()) {
                end -= 1;
            }
        } else {
            let (rot, d0, d1) =
                GivensRotation::diagonalize_sym(diag[start], off_diag[start], diag[start + 1]);
            diag[start] = d0;
            diag[start + 1] = d1;
            off_diag[start] = A::zero();

            if let (Some(q), Some(rot)) = (&mut q_mat, rot) {
                rot.inverse()
                    .rotate_rows(&mut q.slice_mut(s![.., start..=start + 1]))?;
            }

            end -= 1;
        }

        // decoupling may have happened anywhere in the block
        let sub = delimit_subproblem(&diag, &mut off_diag, end, eps);
        start = sub.0;
        end = sub.1;
    }

    diag *= amax;

    Ok((diag, q_mat))
}

/// Finds the trailing unreduced block of the tridiagonal matrix ending at or before `end`
fn delimit_subproblem<A: NdFloat>(
    diag: &Array1<A>,
    off_diag: &mut Array1<A>,
    end: usize,
    eps: A,
) -> (usize, usize) {
    let mut n = end;

    while n > 0 {
        let m = n - 1;
        if off_diag[m].abs() > eps * (diag[n].abs() + diag[m].abs()) {
            break;
        }
        n -= 1;
    }

    if n == 0 {
        return (0, 0);
    }

    let mut new_start = n - 1;
    while new_start > 0 {
        let m = new_start - 1;
        if off_diag[m].is_zero()
            || off_diag[m].abs() <= eps * (diag[new_start].abs() + diag[m].abs())
        {
            off_diag[m] = A::zero();
            break;
        }
        new_start -= 1;
    }

    (new_start, n)
}

/// Computes the wilkinson shift, i.e., the 2x2 symmetric matrix eigenvalue to its tailing
/// component `tnn`.
///
/// The inputs are interpreted as the 2x2 matrix:
///     tmm  tmn
///     tmn  tnn
pub(crate) fn wilkinson_shift<A: NdFloat>(tmm: A, tnn: A, tmn: A) -> A {
    let tmn_sq = tmn * tmn;
    if !tmn_sq.is_zero() {
        let d = (tmm - tnn) * A::from(0.5).unwrap();
        tnn - tmn_sq / (d + d.signum() * (d * d + tmn_sq).sqrt())
    } else {
        tnn
    }
}

/// Eigendecomposition of symmetric matrices, consuming the input
pub trait EighInto: Sized {
    type EigVal;
    type EigVec;

    /// Calculate eigenvalues and eigenvectors of symmetric matrices, consuming the original.
    ///
    /// Eigenvalues are returned in no particular order, paired with the columns of the
    /// eigenvector matrix.
    fn eigh_into(self) -> Result<(Self::EigVal, Self::EigVec)>;

    /// Calculate eigenvalues of symmetric matrices without eigenvectors, consuming the original
    fn eigvalsh_into(self) -> Result<Self::EigVal>;
}

impl<A: NdFloat, S: DataMut<Elem = A>> EighInto for ArrayBase<S, Ix2> {
    type EigVal = Array1<A>;
    type EigVec = Array2<A>;

    fn eigh_into(self) -> Result<(Self::EigVal, Self::EigVec)> {
        let (val, vecs) = symmetric_eig(self, true, A::epsilon())?;
        // eigenvectors were requested
        Ok((val, vecs.unwrap()))
    }

    fn eigvalsh_into(self) -> Result<Self::EigVal> {
        symmetric_eig(self, false, A::epsilon()).map(|(val, _)| val)
    }
}

/// Eigendecomposition of symmetric matrices
pub trait Eigh {
    type EigVal;
    type EigVec;

    fn eigh(&self) -> Result<(Self::EigVal, Self::EigVec)>;

    fn eigvalsh(&self) -> Result<Self::EigVal>;
}

impl<A: NdFloat, S: Data<Elem = A>> Eigh for ArrayBase<S, Ix2> {
    type EigVal = Array1<A>;
    type EigVec = Array2<A>;

    fn eigh(&self) -> Result<(Self::EigVal, Self::EigVec)> {
        self.to_owned().eigh_into()
    }

    fn eigvalsh(&self) -> Result<Self::EigVal> {
        self.to_owned().eigvalsh_into()
    }
}

/// Solve the generalized eigenvalue problem with pencil `(a, b)`
///
/// `b` has to be positive definite. It is reduced with its Cholesky factor `b = L * L.t` to the
/// standard problem `L^-1 * a * L^-t`, so that the returned eigenvectors are `b`-orthonormal.
pub fn generalized_eigh<A: NdFloat>(a: Array2<A>, b: Array2<A>) -> Result<(Array1<A>, Array2<A>)> {
    let n = check_square(&a)?;
    if check_square(&b)? != n {
        return Err(LinalgError::WrongRows {
            expected: n,
            actual: b.nrows(),
        });
    }

    let l = b.cholesky_into()?;
    let l_inv_a = l.solve_triangular_into(a, UPLO::Lower)?;
    let reduced = l.solve_triangular_into(l_inv_a.reversed_axes(), UPLO::Lower)?;
    // reduction is symmetric only up to rounding
    let reduced = (&reduced + &reduced.t()) * A::from(0.5).unwrap();

    let (vals, vecs) = reduced.eigh_into()?;
    let vecs = l.t().solve_triangular_into(vecs, UPLO::Upper)?;

    Ok((vals, vecs))
}

/// Sorting of eigendecomposition by the eigenvalues.
pub trait EigSort: Sized {
    /// Sort eigenvalues and eigenvectors, ascending for `Order::Smallest` and descending for
    /// `Order::Largest`. The sort is stable, ties keep their original order.
    fn sort_eig(self, order: Order) -> Self;

    fn sort_eig_asc(self) -> Self {
        self.sort_eig(Order::Smallest)
    }

    fn sort_eig_desc(self) -> Self {
        self.sort_eig(Order::Largest)
    }
}

impl<A: NdFloat> EigSort for (Array1<A>, Array2<A>) {
    fn sort_eig(self, order: Order) -> Self {
        let (vals, vecs) = self;
        let mut indices: Vec<usize> = (0..vals.len()).collect();
        indices.sort_by(|&i, &j| {
            let ord = vals[i].partial_cmp(&vals[j]).unwrap_or(Ordering::Equal);
            match order {
                Order::Smallest => ord,
                Order::Largest => ord.reverse(),
            }
        });

        (
            vals.select(Axis(0), &indices),
            vecs.select(Axis(1), &indices),
        )
    }
}

impl<A: NdFloat> EigSort for Array1<A> {
    fn sort_eig(self, order: Order) -> Self {
        let mut vals = self.to_vec();
        vals.sort_by(|a, b| {
            let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            match order {
                Order::Smallest => ord,
                Order::Largest => ord.reverse(),
            }
        });
        Array1::from(vals)
    }
}
