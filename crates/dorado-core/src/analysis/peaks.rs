use crate::align::subpixel::parabolic_vertex;

/// Indices of local maxima in `values`.
///
/// A maximum is strictly greater than its neighbours; a flat top counts once,
/// at its middle sample (rounded down). The first and last samples are never
/// maxima. With `min_height`, maxima below it are discarded.
pub fn find_peaks(values: &[f64], min_height: Option<f64>) -> Vec<usize> {
    let n = values.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let mut i = 1;
    while i < n - 1 {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    if let Some(height) = min_height {
        peaks.retain(|&p| values[p] >= height);
    }
    peaks
}

/// Abscissa of the parabola vertex through the peak and its neighbours.
///
/// `peak` must be an interior index.
pub fn refine_peak(times: &[f64], values: &[f64], peak: usize) -> f64 {
    let offset = parabolic_vertex(values[peak - 1], values[peak], values[peak + 1]);
    let step = if offset >= 0.0 {
        times[peak + 1] - times[peak]
    } else {
        times[peak] - times[peak - 1]
    };
    times[peak] + offset * step
}
