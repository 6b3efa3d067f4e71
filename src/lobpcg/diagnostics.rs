//! Observation hooks of the eigensolver
//!
//! The solver calls a [`Diagnostics`] sink at fixed points: once after setup, for every Gram
//! matrix pair, after every iteration and once with the final outcome. All methods default to
//! no-ops, so a sink only implements what it is interested in.

use std::fmt;

use log::{debug, info, trace};
use ndarray::{ArrayView1, ArrayView2, NdFloat};

use super::Termination;

/// Shape of the problem handed to the iterative solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemSummary {
    pub dim: usize,
    pub block_size: usize,
    pub constraints: usize,
    pub generalized: bool,
    pub preconditioned: bool,
}

impl fmt::Display for ProblemSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} problem of size {}, block size {}, {} constraints, {}",
            if self.generalized {
                "generalized"
            } else {
                "standard"
            },
            self.dim,
            self.block_size,
            self.constraints,
            if self.preconditioned {
                "preconditioned"
            } else {
                "no preconditioner"
            }
        )
    }
}

/// State after the residuals of an iteration were computed
#[derive(Debug, Clone)]
pub struct IterationInfo<'a, A> {
    pub iteration: usize,
    /// Number of columns still being refined
    pub active: usize,
    pub eigvals: ArrayView1<'a, A>,
    pub rnorm: &'a [A],
    pub mask: &'a [bool],
}

pub trait Diagnostics<A> {
    fn setup(&mut self, _summary: &ProblemSummary) {}

    fn iteration(&mut self, _info: &IterationInfo<'_, A>) {}

    /// Gram matrices of the Rayleigh-Ritz step, before they are solved
    fn gram(&mut self, _gram_a: ArrayView2<'_, A>, _gram_b: ArrayView2<'_, A>) {}

    fn finish(&mut self, _eigvals: ArrayView1<'_, A>, _rnorm: &[A], _termination: Termination) {}
}

impl<A, D: Diagnostics<A> + ?Sized> Diagnostics<A> for &mut D {
    fn setup(&mut self, summary: &ProblemSummary) {
        (**self).setup(summary)
    }

    fn iteration(&mut self, info: &IterationInfo<'_, A>) {
        (**self).iteration(info)
    }

    fn gram(&mut self, gram_a: ArrayView2<'_, A>, gram_b: ArrayView2<'_, A>) {
        (**self).gram(gram_a, gram_b)
    }

    fn finish(&mut self, eigvals: ArrayView1<'_, A>, rnorm: &[A], termination: Termination) {
        (**self).finish(eigvals, rnorm, termination)
    }
}

/// Ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl<A> Diagnostics<A> for Silent {}

/// Forwards to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl<A: NdFloat> Diagnostics<A> for LogDiagnostics {
    fn setup(&mut self, summary: &ProblemSummary) {
        info!("lobpcg: solving {}", summary);
    }

    fn iteration(&mut self, info: &IterationInfo<'_, A>) {
        debug!(
            "lobpcg: iteration {}, {} active, eigenvalues {}",
            info.iteration, info.active, info.eigvals
        );
        trace!(
            "lobpcg: residual norms {:?}, active mask {:?}",
            info.rnorm,
            info.mask
        );
    }

    fn gram(&mut self, gram_a: ArrayView2<'_, A>, gram_b: ArrayView2<'_, A>) {
        trace!("lobpcg: gramA\n{}\ngramB\n{}", gram_a, gram_b);
    }

    fn finish(&mut self, eigvals: ArrayView1<'_, A>, rnorm: &[A], termination: Termination) {
        info!(
            "lobpcg: {:?} with eigenvalues {} and residual norms {:?}",
            termination, eigvals, rnorm
        );
    }
}
