use ndarray::Array2;

/// Vertex offset of the parabola through three equally spaced samples.
///
/// Returns the fractional offset of the extremum from the middle sample,
/// clamped to +/- 0.5. Flat triples give 0.
pub fn parabolic_vertex(prev: f64, curr: f64, next: f64) -> f64 {
    let curvature = prev - 2.0 * curr + next;
    if curvature.abs() > 1e-12 {
        ((prev - next) / (2.0 * curvature)).clamp(-0.5, 0.5)
    } else {
        0.0
    }
}

/// Refine peak location using paraboloid fitting on the 3x3 neighborhood.
///
/// Returns (delta_row, delta_col) as fractional pixel offsets from the integer peak.
pub fn refine_peak_paraboloid(
    correlation: &Array2<f64>,
    peak_row: usize,
    peak_col: usize,
) -> (f64, f64) {
    let (h, w) = correlation.dim();

    // Need 3x3 neighborhood; skip refinement at the edge
    if peak_row == 0 || peak_row >= h - 1 || peak_col == 0 || peak_col >= w - 1 {
        return (0.0, 0.0);
    }

    let delta_row = parabolic_vertex(
        correlation[[peak_row - 1, peak_col]],
        correlation[[peak_row, peak_col]],
        correlation[[peak_row + 1, peak_col]],
    );
    let delta_col = parabolic_vertex(
        correlation[[peak_row, peak_col - 1]],
        correlation[[peak_row, peak_col]],
        correlation[[peak_row, peak_col + 1]],
    );

    (delta_row, delta_col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_of_symmetric_triple_is_centre() {
        assert_eq!(parabolic_vertex(1.0, 2.0, 1.0), 0.0);
    }

    #[test]
    fn vertex_of_sampled_parabola() {
        // y = -(x - 0.25)^2 sampled at -1, 0, 1
        let f = |x: f64| -(x - 0.25) * (x - 0.25);
        let d = parabolic_vertex(f(-1.0), f(0.0), f(1.0));
        assert!((d - 0.25).abs() < 1e-12);
    }
}
