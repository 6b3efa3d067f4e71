//! Locally Optimal Block Preconditioned Conjugate Gradient
//!
//! The Rayleigh-Ritz loop of the solver. Every iteration projects the problem onto the span of
//! the current approximation `X`, the preconditioned residuals `R` and the previous search
//! directions `P`, solves the small projected problem and updates the three blocks from its
//! solution. Converged columns are deflated with a mask that only ever switches off.

use ndarray::prelude::*;
use ndarray::{concatenate, NdFloat};

use super::{
    b_orthonormalize, Constraints, Diagnostics, IterationInfo, Lobpcg, Operator, Termination,
};
use crate::{
    eigh::{generalized_eigh, EigSort, EighInto},
    norm::ColumnNorms,
    LinalgError, Order, Result,
};

/// Solve the dense (generalized) eigenproblem, sort by `order` and truncate to `size`
///
/// Eigenvectors are flipped so that their first component is non-negative.
pub(crate) fn sorted_eig<A: NdFloat>(
    a: Array2<A>,
    b: Option<Array2<A>>,
    size: usize,
    order: Order,
) -> Result<(Array1<A>, Array2<A>)> {
    let res = match b {
        Some(b) => generalized_eigh(a, b)?,
        None => a.eigh_into()?,
    };

    let (vals, vecs) = res.sort_eig(order);
    let vals = vals.slice_move(s![..size]);
    let mut vecs = vecs.slice_move(s![.., ..size]);
    for mut col in vecs.columns_mut() {
        if col[0] < A::zero() {
            col.mapv_inplace(|x| -x);
        }
    }

    Ok((vals, vecs))
}

/// Returns `(a + a.t) / 2`
pub(crate) fn symmetrize<A: NdFloat>(a: Array2<A>) -> Array2<A> {
    (&a + &a.t()) * A::from(0.5).unwrap()
}

/// Indices of the active columns
fn active_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, active)| **active)
        .map(|(i, _)| i)
        .collect()
}

/// Run the Rayleigh-Ritz iteration on the initial block `x`
///
/// `x` must have full rank and at most `n` columns, the operators all have shape `(n, n)`. The
/// iteration stops when all residual norms fell below `tol` or after `maxiter` iterations. Both
/// histories are always recorded.
#[allow(clippy::too_many_arguments)]
pub(crate) fn rayleigh_ritz<A: NdFloat, D: Diagnostics<A> + ?Sized>(
    a: &Operator<'_, A>,
    x: Array2<A>,
    b: &Operator<'_, A>,
    m: &Operator<'_, A>,
    constraints: Option<&Constraints<A>>,
    tol: A,
    maxiter: usize,
    order: Order,
    diagnostics: &mut D,
) -> Result<Lobpcg<A>> {
    let size_x = x.ncols();

    // move the initial guess into the complement of the constraints and B-orthonormalize
    let x = match constraints {
        Some(cons) => cons.apply(x.view())?,
        None => x,
    };
    let (x, bx, _) = b_orthonormalize(b, x, None)?;

    // initial Ritz pairs in span{X}
    let ax = a.apply(x.view())?;
    let xax = symmetrize(x.t().dot(&ax));
    let (mut lambda, eig_block) = sorted_eig(xax, None, size_x, order)?;

    let mut x = x.dot(&eig_block);
    let mut ax = ax.dot(&eig_block);
    let mut bx = bx.dot(&eig_block);

    let mut mask = vec![true; size_x];
    let mut previous_block_size = size_x;
    let ident0: Array2<A> = Array2::eye(size_x);
    let mut ident: Array2<A> = Array2::eye(size_x);

    // previous search directions P, AP and BP
    let mut previous_p: Option<(Array2<A>, Array2<A>, Array2<A>)> = None;

    let mut lambda_history = vec![lambda.clone()];
    let mut rnorm_history = Vec::new();
    let mut iteration = 0;

    let (rnorm, termination) = loop {
        // residual AX - BX * diag(lambda)
        let r = &ax - &(&bx * &lambda);
        let rnorm = r.column_norms_l2().to_vec();

        if iteration == maxiter {
            // columns deflated earlier count as converged
            let converged = mask
                .iter()
                .zip(&rnorm)
                .all(|(active, norm)| !*active || *norm <= tol);
            let termination = if converged {
                Termination::Converged
            } else {
                Termination::MaxIterReached
            };
            break (rnorm, termination);
        }
        rnorm_history.push(rnorm.clone());

        for (active, norm) in mask.iter_mut().zip(&rnorm) {
            *active = *active && *norm > tol;
        }
        let active = active_indices(&mask);
        let current_block_size = active.len();
        if current_block_size != previous_block_size {
            previous_block_size = current_block_size;
            ident = Array2::eye(current_block_size);
        }

        diagnostics.iteration(&IterationInfo {
            iteration,
            active: current_block_size,
            eigvals: lambda.view(),
            rnorm: &rnorm,
            mask: &mask,
        });

        if current_block_size == 0 {
            break (rnorm, Termination::Converged);
        }

        // precondition the active residuals and move them into the complement of the constraints
        let r = m.apply(r.select(Axis(1), &active).view())?;
        let mut r = match constraints {
            Some(cons) => cons.apply(r.view())?,
            None => r,
        };
        // performs `R = -1 X . (BX.t R) + 1 R`, therefore `R -= X (BX.t R)`
        ndarray::linalg::general_mat_mul(-A::one(), &x, &bx.t().dot(&r), A::one(), &mut r);

        let (r, br, _) = b_orthonormalize(b, r, None)?;
        let ar = a.apply(r.view())?;

        // B-orthonormalize the active directions, reusing BP and rescaling AP
        let active_p = match previous_p.take() {
            Some((p, ap, bp)) => {
                let (p, bp, inv_r) = b_orthonormalize(
                    b,
                    p.select(Axis(1), &active),
                    Some(bp.select(Axis(1), &active)),
                )?;
                let ap = ap.select(Axis(1), &active).dot(&inv_r);
                Some((p, ap, bp))
            }
            None => None,
        };

        // Gram matrices over the basis [X | R | P]
        let lambda_diag = Array2::from_diag(&lambda);
        let xar = x.t().dot(&ar);
        let rar = symmetrize(r.t().dot(&ar));
        let xbr = x.t().dot(&br);

        let (gram_a, gram_b) = match &active_p {
            Some((p, ap, bp)) => {
                let xap = x.t().dot(ap);
                let rap = r.t().dot(ap);
                let pap = symmetrize(p.t().dot(ap));
                let xbp = x.t().dot(bp);
                let rbp = r.t().dot(bp);

                (
                    concatenate![
                        Axis(0),
                        concatenate![Axis(1), lambda_diag, xar, xap],
                        concatenate![Axis(1), xar.t(), rar, rap],
                        concatenate![Axis(1), xap.t(), rap.t(), pap]
                    ],
                    concatenate![
                        Axis(0),
                        concatenate![Axis(1), ident0, xbr, xbp],
                        concatenate![Axis(1), xbr.t(), ident, rbp],
                        concatenate![Axis(1), xbp.t(), rbp.t(), ident]
                    ],
                )
            }
            None => (
                concatenate![
                    Axis(0),
                    concatenate![Axis(1), lambda_diag, xar],
                    concatenate![Axis(1), xar.t(), rar]
                ],
                concatenate![
                    Axis(0),
                    concatenate![Axis(1), ident0, xbr],
                    concatenate![Axis(1), xbr.t(), ident]
                ],
            ),
        };
        debug_assert!(gram_a == gram_a.t() && gram_b == gram_b.t());
        diagnostics.gram(gram_a.view(), gram_b.view());

        // a singular gramB means that the search basis collapsed
        let (new_lambda, eig_vecs) =
            sorted_eig(gram_a, Some(gram_b), size_x, order).map_err(|err| match err {
                LinalgError::NotPositiveDefinite => LinalgError::RankDeficiency,
                err => err,
            })?;
        lambda = new_lambda;

        let eig_x = eig_vecs.slice(s![..size_x, ..]);
        let eig_r = eig_vecs.slice(s![size_x..size_x + current_block_size, ..]);

        // new directions as linear combinations of span{R, P}
        let (pp, app, bpp) = match active_p {
            Some((p, ap, bp)) => {
                let eig_p = eig_vecs.slice(s![size_x + current_block_size.., ..]);
                (
                    r.dot(&eig_r) + p.dot(&eig_p),
                    ar.dot(&eig_r) + ap.dot(&eig_p),
                    br.dot(&eig_r) + bp.dot(&eig_p),
                )
            }
            None => (r.dot(&eig_r), ar.dot(&eig_r), br.dot(&eig_r)),
        };

        x = x.dot(&eig_x) + &pp;
        ax = ax.dot(&eig_x) + &app;
        bx = bx.dot(&eig_x) + &bpp;
        previous_p = Some((pp, app, bpp));

        lambda_history.push(lambda.clone());
        iteration += 1;
    };

    Ok(Lobpcg {
        eigvals: lambda,
        eigvecs: x,
        rnorm,
        lambda_history: Some(lambda_history),
        rnorm_history: Some(rnorm_history),
        iterations: iteration,
        termination,
    })
}
