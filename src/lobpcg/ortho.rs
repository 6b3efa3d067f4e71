use ndarray::{Array2, NdFloat};

use super::Operator;
use crate::{
    cholesky::CholeskyInplace,
    triangular::{SolveTriangular, UPLO},
    LinalgError, Result,
};

/// B-orthonormalize the columns of `v` with a Cholesky factorization of their Gram matrix
///
/// `bv` is the image `B * v`. When absent it is computed, or copied from `v` if `b` is the
/// identity. Returns `(v', bv', inv_r)` with `v'.t * bv' = I` and `v' = v * inv_r`, where `inv_r`
/// is the inverse of the upper triangular Cholesky factor `R` of `v.t * B * v = R.t * R`. Other
/// blocks depending linearly on `v` (e.g. `A * v`) can be rescaled with `inv_r` as well.
///
/// Fails with `RankDeficiency` if the columns are linearly dependent in the B-inner product, or
/// so close to it that a squared Cholesky pivot drops to `eps * size * max(diag(v.t * B * v))`.
pub fn b_orthonormalize<A: NdFloat>(
    b: &Operator<'_, A>,
    v: Array2<A>,
    bv: Option<Array2<A>>,
) -> Result<(Array2<A>, Array2<A>, Array2<A>)> {
    let bv = match bv {
        Some(bv) => Some(bv),
        None if b.is_identity() => None,
        None => Some(b.apply(v.view())?),
    };

    let gram = match &bv {
        Some(bv) => v.t().dot(bv),
        None => v.t().dot(&v),
    };
    let size = gram.nrows();
    let scale = gram.diag().fold(A::zero(), |acc, &d| acc.max(d));
    // rounding may break the symmetry, only the lower triangle is read
    let factor = gram.cholesky_into().map_err(|err| match err {
        LinalgError::NotPositiveDefinite => LinalgError::RankDeficiency,
        err => err,
    })?;

    // a pivot at rounding level passes the Cholesky but leaves v' far from B-orthonormal
    let threshold = A::epsilon() * A::from(size).unwrap() * scale;
    if factor.diag().iter().any(|&d| d * d <= threshold) {
        return Err(LinalgError::RankDeficiency);
    }

    // R^-1 = (L^-1).t
    let inv_r = factor
        .solve_triangular_into(Array2::eye(size), UPLO::Lower)?
        .reversed_axes();

    let v = v.dot(&inv_r);
    let bv = match bv {
        Some(bv) => bv.dot(&inv_r),
        None => v.clone(),
    };

    Ok((v, bv, inv_r))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{array, s, Array1};
    use ndarray_rand::{rand_distr::Uniform, RandomExt};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    use super::*;
    use crate::triangular::Triangular;

    #[test]
    fn orthonormalize_identity() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let v = Array2::<f64>::random_using((10, 4), Uniform::new(-1., 1.), &mut rng);
        let b = Operator::identity(10);

        let (q, bq, inv_r) = b_orthonormalize(&b, v.clone(), None).unwrap();
        assert_abs_diff_eq!(q.t().dot(&q), Array2::eye(4), epsilon = 1e-10);
        assert_eq!(q, bq);
        assert!(inv_r.is_triangular(UPLO::Upper));
        assert_abs_diff_eq!(v.dot(&inv_r), q, epsilon = 1e-12);
    }

    #[test]
    fn orthonormalize_generalized() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let v = Array2::<f64>::random_using((8, 3), Uniform::new(-1., 1.), &mut rng);
        let b_mat = Array2::from_diag(&Array1::linspace(1., 8., 8));
        let b = Operator::from(&b_mat);

        let (q, bq, _) = b_orthonormalize(&b, v.clone(), None).unwrap();
        assert_abs_diff_eq!(q.t().dot(&b_mat).dot(&q), Array2::eye(3), epsilon = 1e-10);
        assert_abs_diff_eq!(bq, b_mat.dot(&q), epsilon = 1e-10);

        // a supplied image is trusted and rescaled, and the same factor rescales other images
        let av = v.mapv(|x| x * 2.);
        let bv = b_mat.dot(&v);
        let (q2, bq2, inv_r) = b_orthonormalize(&b, v, Some(bv)).unwrap();
        assert_abs_diff_eq!(q2, q, epsilon = 1e-10);
        assert_abs_diff_eq!(bq2, b_mat.dot(&q2), epsilon = 1e-10);
        assert_abs_diff_eq!(av.dot(&inv_r), q2.mapv(|x| x * 2.), epsilon = 1e-10);
    }

    #[test]
    fn rank_deficient() {
        let mut v = array![[1., 2.], [0., 1.], [1., 0.]];
        let first = v.column(0).to_owned();
        v.slice_mut(s![.., 1]).assign(&first);
        let b = Operator::identity(3);

        assert!(matches!(
            b_orthonormalize(&b, v, None),
            Err(LinalgError::RankDeficiency)
        ));
        assert!(matches!(
            b_orthonormalize(&b, Array2::zeros((3, 1)), None),
            Err(LinalgError::RankDeficiency)
        ));

        // duplicated columns leave a pivot of rounding size instead of an exact zero
        let dup = array![[1., 1.], [0., 0.], [1., 1.]];
        assert!(matches!(
            b_orthonormalize(&b, dup, None),
            Err(LinalgError::RankDeficiency)
        ));
    }

    #[test]
    fn nearly_dependent_but_accepted() {
        // well above rounding level, so the result must be B-orthonormal
        let v = array![[1., 1.], [0., 1e-3], [1., 1.]];
        let b = Operator::identity(3);
        let (q, _, inv_r) = b_orthonormalize(&b, v.clone(), None).unwrap();
        assert_abs_diff_eq!(q.t().dot(&q), Array2::eye(2), epsilon = 1e-8);
        assert_abs_diff_eq!(v.dot(&inv_r), q, epsilon = 1e-8);
    }
}
