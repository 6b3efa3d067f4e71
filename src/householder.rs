use ndarray::{ArrayBase, Data, DataMut, Ix1, Ix2, NdFloat};

/// Turns `col` into the unit axis of the Householder reflection `H = I - 2 v v.t` that maps
/// `col` onto a multiple of the first unit vector.
///
/// Returns the first component of `H * col`, or `None` if `col` is zero, in which case it is left
/// untouched and represents the identity.
pub fn reflection_axis_mut<A: NdFloat, S: DataMut<Elem = A>>(
    col: &mut ArrayBase<S, Ix1>,
) -> Option<A> {
    let norm_sq = col.dot(col);
    let norm = norm_sq.sqrt();

    let first = col[0];
    let signed_norm = first.signum() * norm;
    col[0] += signed_norm;
    // squared norm of the shifted column
    let shifted_norm_sq = (norm_sq + first.abs() * norm) * A::from(2.0).unwrap();

    if shifted_norm_sq.is_zero() {
        None
    } else {
        *col /= shifted_norm_sq.sqrt();
        Some(-signed_norm)
    }
}

/// Householder reflection `I - 2 v v.t` around a unit axis `v`
pub struct Reflection<S: Data> {
    axis: ArrayBase<S, Ix1>,
}

impl<A: NdFloat, S: Data<Elem = A>> Reflection<S> {
    pub fn new(axis: ArrayBase<S, Ix1>) -> Self {
        Self { axis }
    }

    /// `rhs = H * rhs`
    pub fn reflect_cols<M: DataMut<Elem = A>>(&self, rhs: &mut ArrayBase<M, Ix2>) {
        let m_two = A::from(-2.0).unwrap();
        for mut col in rhs.columns_mut() {
            let factor = self.axis.dot(&col) * m_two;
            col.scaled_add(factor, &self.axis);
        }
    }

    /// `lhs = lhs * H`
    pub fn reflect_rows<M: DataMut<Elem = A>>(&self, lhs: &mut ArrayBase<M, Ix2>) {
        let m_two = A::from(-2.0).unwrap();
        for mut row in lhs.rows_mut() {
            let factor = self.axis.dot(&row) * m_two;
            row.scaled_add(factor, &self.axis);
        }
    }
}
