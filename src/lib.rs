//! Matrix-free computation of a few extreme eigenpairs of large symmetric eigenproblems
//! ```text
//! A x = lambda B x
//! ```
//! built on `ndarray` without depending on external LAPACK/BLAS libraries.
//!
//! The solver lives in [`lobpcg`]. The remaining modules are the small dense kernels it relies
//! on (Cholesky factorization, triangular solves, symmetric tridiagonalization and the
//! symmetric eigendecomposition), which are usable on their own.

#![allow(clippy::many_single_char_names)]
#![allow(clippy::result_large_err)]

pub mod cholesky;
pub mod eigh;
mod givens;
mod householder;
pub mod lobpcg;
pub mod norm;
pub mod triangular;
pub mod tridiagonal;

use ndarray::{ArrayBase, Ix2, RawData};
use thiserror::Error;

/// Which end of the spectrum to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Largest,
    Smallest,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LinalgError {
    /// Non-square matrix
    #[error("Matrix with {rows} rows and {cols} cols is not square")]
    NotSquare { rows: usize, cols: usize },
    /// Cholesky pivot was not positive
    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,
    /// Unexpected number of rows
    #[error("Expected {expected} rows, got {actual}")]
    WrongRows { expected: usize, actual: usize },
    /// Unexpected number of columns
    #[error("Expected {expected} columns, got {actual}")]
    WrongColumns { expected: usize, actual: usize },
    /// Initial block is not a non-empty thin matrix
    #[error("Initial block with {rows} rows and {cols} cols must satisfy 1 <= cols <= rows")]
    InvalidInput { rows: usize, cols: usize },
    /// Operator or block does not have the declared shape
    #[error("Expected shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// Block is linearly dependent in the B-inner product
    #[error("Block is rank deficient in the B-inner product")]
    RankDeficiency,
    /// Gram matrix of the constraints could not be factorized
    #[error("Cannot handle linearly dependent constraints")]
    LinearlyDependentConstraints,
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
}

pub type Result<T> = std::result::Result<T, LinalgError>;

pub(crate) fn check_square<S: RawData>(arr: &ArrayBase<S, Ix2>) -> Result<usize> {
    let (n, m) = (arr.nrows(), arr.ncols());
    if n != m {
        Err(LinalgError::NotSquare { rows: n, cols: m })
    } else {
        Ok(n)
    }
}
