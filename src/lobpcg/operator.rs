//! Uniform "apply to a block" abstraction over the operators `A`, `B` and `M`

use std::fmt;

use ndarray::{Array2, ArrayView2, CowArray, Ix2, NdFloat};

use crate::{LinalgError, Result};

/// Boxed block function, mapping a `n x k` block to a `n x k` block
pub type BlockFn<'a, A> = Box<dyn Fn(ArrayView2<A>) -> Array2<A> + 'a>;

/// Linear operator with a fixed declared shape, applied to whole blocks at once
///
/// Matrices (owned or borrowed) convert into operators with `From`, anything else, for example a
/// sparse matrix product or a matrix-free stencil, is wrapped as a function with
/// [`Operator::from_fn`].
pub enum Operator<'a, A> {
    /// Identity of the given dimension
    Identity(usize),
    /// Dense matrix
    Matrix(CowArray<'a, A, Ix2>),
    /// Function of a block with declared square shape `(dim, dim)`
    Function { dim: usize, func: BlockFn<'a, A> },
}

impl<'a, A: NdFloat> Operator<'a, A> {
    pub fn identity(dim: usize) -> Self {
        Operator::Identity(dim)
    }

    /// Wraps a block function as an operator of shape `(dim, dim)`
    pub fn from_fn<F>(dim: usize, func: F) -> Self
    where
        F: Fn(ArrayView2<A>) -> Array2<A> + 'a,
    {
        Operator::Function {
            dim,
            func: Box::new(func),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            Operator::Identity(dim) | Operator::Function { dim, .. } => (*dim, *dim),
            Operator::Matrix(mat) => mat.dim(),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Operator::Identity(_))
    }

    /// Applies the operator to every column of `block` with a single product
    ///
    /// The identity returns a copy, so the result never aliases the input.
    pub fn apply(&self, block: ArrayView2<A>) -> Result<Array2<A>> {
        let (rows, cols) = self.shape();
        if block.nrows() != cols {
            return Err(LinalgError::ShapeMismatch {
                expected: (cols, block.ncols()),
                actual: block.dim(),
            });
        }

        match self {
            Operator::Identity(_) => Ok(block.to_owned()),
            Operator::Matrix(mat) => Ok(mat.dot(&block)),
            Operator::Function { func, .. } => {
                let out = func(block.view());
                if out.dim() != (rows, block.ncols()) {
                    return Err(LinalgError::ShapeMismatch {
                        expected: (rows, block.ncols()),
                        actual: out.dim(),
                    });
                }
                Ok(out)
            }
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Operator<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Identity(dim) => f.debug_tuple("Identity").field(dim).finish(),
            Operator::Matrix(mat) => f.debug_tuple("Matrix").field(mat).finish(),
            Operator::Function { dim, .. } => f
                .debug_struct("Function")
                .field("dim", dim)
                .finish_non_exhaustive(),
        }
    }
}

impl<A> From<Array2<A>> for Operator<'_, A> {
    fn from(mat: Array2<A>) -> Self {
        Operator::Matrix(CowArray::from(mat))
    }
}

impl<'a, A> From<ArrayView2<'a, A>> for Operator<'a, A> {
    fn from(mat: ArrayView2<'a, A>) -> Self {
        Operator::Matrix(CowArray::from(mat))
    }
}

impl<'a, A> From<&'a Array2<A>> for Operator<'a, A> {
    fn from(mat: &'a Array2<A>) -> Self {
        Operator::Matrix(CowArray::from(mat.view()))
    }
}

/// Returns the identity if `input` is absent, otherwise checks that `input` has the `expected`
/// shape
pub fn make_operator<A: NdFloat>(
    input: Option<Operator<'_, A>>,
    expected: (usize, usize),
) -> Result<Operator<'_, A>> {
    match input {
        None => Ok(Operator::Identity(expected.0)),
        Some(op) if op.shape() != expected => Err(LinalgError::ShapeMismatch {
            expected,
            actual: op.shape(),
        }),
        Some(op) => Ok(op),
    }
}
