use ndarray::{ArrayBase, DataMut, Ix2, NdFloat};

use crate::{LinalgError, Result};

/// A Givens Rotation, represented by the 2x2 matrix `[[c, -s], [s, c]]`
#[derive(Debug, Clone)]
pub struct GivensRotation<A> {
    c: A,
    s: A,
}

impl<A: NdFloat> GivensRotation<A> {
    /// Computes rotation `R` such that the `y` component of `R * [x, y].t` is 0
    ///
    /// Returns `None` if `y` is 0 (no rotation needed), otherwise return the rotation and the norm
    /// of vector `[x, y]`.
    pub fn cancel_y(x: A, y: A) -> Option<(Self, A)> {
        if !y.is_zero() {
            let r = x.hypot(y);
            Some((Self { c: x / r, s: -y / r }, r))
        } else {
            None
        }
    }

    /// Rotation that diagonalizes the symmetric 2x2 matrix `[[a, b], [b, d]]`
    ///
    /// Returns the rotation `R` together with the diagonal of `R * M * R.t`. The smaller root of
    /// the rotation angle is picked so that the rotation stays close to the identity.
    pub fn diagonalize_sym(a: A, b: A, d: A) -> (Option<Self>, A, A) {
        if b.is_zero() {
            return (None, a, d);
        }
        let two = A::from(2.0).unwrap();
        let tau = (d - a) / (two * b);
        let t = tau.signum() / (tau.abs() + tau.hypot(A::one()));
        let c = A::one() / t.hypot(A::one());
        let s = t * c;
        (Some(Self { c, s }), a - t * b, d + t * b)
    }

    pub fn c(&self) -> A {
        self.c
    }
    pub fn s(&self) -> A {
        self.s
    }

    /// The inverse Givens rotation
    pub fn inverse(self) -> Self {
        Self {
            c: self.c,
            s: -self.s,
        }
    }

    /// Performs the multiplication `lhs = lhs * self` in-place.
    pub fn rotate_rows<S: DataMut<Elem = A>>(&self, lhs: &mut ArrayBase<S, Ix2>) -> Result<()> {
        let cols = lhs.ncols();
        if cols != 2 {
            return Err(LinalgError::WrongColumns {
                expected: 2,
                actual: cols,
            });
        }
        let (c, s) = (self.c, self.s);

        for mut row in lhs.rows_mut() {
            let (a, b) = (row[0], row[1]);
            row[0] = a * c + s * b;
            row[1] = -s * a + b * c;
        }

        Ok(())
    }
}
