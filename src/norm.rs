//! Norms of vectors and of the columns of a block

use ndarray::{prelude::*, Data};

/// Norm of an array, treating the whole array as one big vector.
pub trait Norm {
    type Output;

    /// L-1 norm
    fn norm_l1(&self) -> Self::Output;
    /// L-2 norm
    fn norm_l2(&self) -> Self::Output;
    /// Maximum norm (L-infinite)
    fn norm_max(&self) -> Self::Output;
}

impl<A, S, D> Norm for ArrayBase<S, D>
where
    A: NdFloat,
    S: Data<Elem = A>,
    D: Dimension,
{
    type Output = A;

    fn norm_l1(&self) -> Self::Output {
        self.fold(A::zero(), |acc, x| acc + x.abs())
    }

    fn norm_l2(&self) -> Self::Output {
        self.fold(A::zero(), |acc, &x| acc + x * x).sqrt()
    }

    fn norm_max(&self) -> Self::Output {
        self.fold(A::zero(), |acc, x| acc.max(x.abs()))
    }
}

/// Euclidean norm of every column of a block
pub trait ColumnNorms {
    type Output;

    fn column_norms_l2(&self) -> Self::Output;
}

impl<A, S> ColumnNorms for ArrayBase<S, Ix2>
where
    A: NdFloat,
    S: Data<Elem = A>,
{
    type Output = Array1<A>;

    fn column_norms_l2(&self) -> Self::Output {
        self.map_axis(Axis(0), |col| col.norm_l2())
    }
}
