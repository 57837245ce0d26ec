//! Smoothing-free B-spline fits: interpolating and fixed-knot least squares.
//!
//! Basis functions come from the Cox-de Boor recursion. The normal system is
//! never formed; observation rows are rotated into a banded upper-triangular
//! factor with Givens rotations, one row at a time.

use crate::error::{DoradoError, Result};

/// Relative pivot size below which the system counts as rank deficient.
const RANK_TOLERANCE: f64 = 1e-10;

/// A B-spline of degree `k` on a clamped knot vector.
#[derive(Clone, Debug, PartialEq)]
pub struct BSpline {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
    degree: usize,
}

impl BSpline {
    /// Interpolating spline of degree `k` through every sample.
    ///
    /// Interior knots are placed on the data abscissae, skipping the
    /// `(k + 1) / 2` samples nearest each end, which gives as many
    /// coefficients as samples.
    pub fn interpolate(x: &[f64], y: &[f64], k: usize) -> Result<Self> {
        check_samples(x, y, k)?;
        let skip = (k + 1) / 2;
        let interior = &x[skip..x.len() - skip];
        Self::fit(x, y, interior, k)
    }

    /// Least-squares spline of degree `k` with fixed interior knots.
    pub fn least_squares(x: &[f64], y: &[f64], interior: &[f64], k: usize) -> Result<Self> {
        check_samples(x, y, k)?;
        let (lo, hi) = (x[0], x[x.len() - 1]);
        if interior.windows(2).any(|w| w[1] < w[0]) {
            return Err(DoradoError::InvalidInput("interior knots are not sorted".into()));
        }
        if interior.iter().any(|&t| t <= lo || t >= hi) {
            return Err(DoradoError::InvalidInput(format!(
                "interior knots must lie strictly inside ({lo}, {hi})"
            )));
        }
        Self::fit(x, y, interior, k)
    }

    fn fit(x: &[f64], y: &[f64], interior: &[f64], k: usize) -> Result<Self> {
        let (lo, hi) = (x[0], x[x.len() - 1]);
        let mut knots = Vec::with_capacity(interior.len() + 2 * (k + 1));
        knots.extend(std::iter::repeat(lo).take(k + 1));
        knots.extend_from_slice(interior);
        knots.extend(std::iter::repeat(hi).take(k + 1));

        let n_coef = knots.len() - k - 1;
        if x.len() < n_coef {
            return Err(DoradoError::InvalidInput(format!(
                "{} samples cannot determine {} spline coefficients",
                x.len(),
                n_coef
            )));
        }

        // Banded upper-triangular factor: r[i][m] holds element (i, i + m)
        let mut r = vec![vec![0.0; k + 1]; n_coef];
        let mut z = vec![0.0; n_coef];
        let mut basis = vec![0.0; k + 1];

        for (&xi, &yi) in x.iter().zip(y) {
            let span = find_span(&knots, n_coef, k, xi);
            basis_functions(&knots, k, span, xi, &mut basis);
            let mut h = basis.clone();
            let mut rhs = yi;
            let first = span - k;

            for i in 0..=k {
                let piv = h[i];
                if piv == 0.0 {
                    continue;
                }
                let row = first + i;
                let (cos, sin) = givens(&mut r[row][0], piv);
                let zr = z[row];
                z[row] = cos * zr + sin * rhs;
                rhs = -sin * zr + cos * rhs;
                for j in i + 1..=k {
                    let rv = r[row][j - i];
                    r[row][j - i] = cos * rv + sin * h[j];
                    h[j] = -sin * rv + cos * h[j];
                }
            }
        }

        let max_diag = r.iter().map(|row| row[0].abs()).fold(0.0, f64::max);
        let mut coeffs = vec![0.0; n_coef];
        for i in (0..n_coef).rev() {
            let diag = r[i][0];
            if diag.abs() <= RANK_TOLERANCE * max_diag || max_diag == 0.0 {
                return Err(DoradoError::InvalidInput(format!(
                    "spline system is rank deficient at coefficient {i}"
                )));
            }
            let mut acc = z[i];
            for m in 1..=k {
                if i + m < n_coef {
                    acc -= r[i][m] * coeffs[i + m];
                }
            }
            coeffs[i] = acc / diag;
        }

        Ok(Self {
            knots,
            coeffs,
            degree: k,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Knots strictly between the boundary knots.
    pub fn interior_knots(&self) -> &[f64] {
        let k = self.degree;
        &self.knots[k + 1..self.knots.len() - k - 1]
    }

    /// Evaluate the spline at `x`. Outside the knot range the end
    /// polynomial pieces are extended.
    pub fn eval(&self, x: f64) -> f64 {
        let k = self.degree;
        let n_coef = self.coeffs.len();
        let span = find_span(&self.knots, n_coef, k, x);
        let mut basis = vec![0.0; k + 1];
        basis_functions(&self.knots, k, span, x, &mut basis);
        basis
            .iter()
            .enumerate()
            .map(|(i, b)| b * self.coeffs[span - k + i])
            .sum()
    }

    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

fn check_samples(x: &[f64], y: &[f64], k: usize) -> Result<()> {
    if x.len() != y.len() {
        return Err(DoradoError::InvalidInput(format!(
            "{} abscissae but {} ordinates",
            x.len(),
            y.len()
        )));
    }
    let min = (k + 1).max(6);
    if x.len() < min {
        return Err(DoradoError::InvalidInput(format!(
            "spline fit needs at least {min} samples, got {}",
            x.len()
        )));
    }
    if x.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(DoradoError::InvalidInput(
            "sample times must be strictly increasing".into(),
        ));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(DoradoError::InvalidInput("non-finite sample value".into()));
    }
    Ok(())
}

/// Index `l` in `k..n_coef` with `t[l] <= x < t[l + 1]`, clamped at the ends.
fn find_span(knots: &[f64], n_coef: usize, k: usize, x: f64) -> usize {
    let upper = knots[k + 1..n_coef].partition_point(|&t| t <= x);
    k + upper
}

/// Non-zero basis functions `N[l-k..=l]` at `x` by Cox-de Boor.
fn basis_functions(knots: &[f64], k: usize, span: usize, x: f64, out: &mut [f64]) {
    let mut left = vec![0.0; k + 1];
    let mut right = vec![0.0; k + 1];
    out[0] = 1.0;
    for j in 1..=k {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom != 0.0 { out[r] / denom } else { 0.0 };
            out[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        out[j] = saved;
    }
}

/// Rotate `(*a, b)` onto `(hypot, 0)`, returning `(cos, sin)`.
fn givens(a: &mut f64, b: f64) -> (f64, f64) {
    let h = a.hypot(b);
    let (cos, sin) = (*a / h, b / h);
    *a = h;
    (cos, sin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_partition_of_unity() {
        let knots = [0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0, 3.0];
        let mut out = [0.0; 4];
        for &x in &[0.0, 0.3, 1.5, 2.9, 3.0] {
            let span = find_span(&knots, 6, 3, x);
            basis_functions(&knots, 3, span, x, &mut out);
            assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn span_clamps_to_last_interval() {
        let knots = [0.0, 0.0, 1.0, 2.0, 2.0];
        assert_eq!(find_span(&knots, 3, 1, 2.0), 2);
        assert_eq!(find_span(&knots, 3, 1, -1.0), 1);
    }
}
