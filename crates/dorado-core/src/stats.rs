//! Robust statistics over pixel and sample buffers.

use crate::consts::MAD_TO_SIGMA;

/// Median of `values`, reordering the buffer. Returns 0.0 when empty.
pub fn median_mut(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    let (_, upper, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    let upper = *upper;
    if n % 2 == 1 {
        upper
    } else {
        let lower = values[..mid]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (lower + upper) / 2.0
    }
}

pub fn median(values: &[f64]) -> f64 {
    let mut scratch = values.to_vec();
    median_mut(&mut scratch)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median absolute deviation scaled to a Gaussian sigma.
pub fn mad_std(values: &[f64]) -> f64 {
    let mut scratch = values.to_vec();
    let med = median_mut(&mut scratch);
    for v in scratch.iter_mut() {
        *v = (*v - med).abs();
    }
    median_mut(&mut scratch) * MAD_TO_SIGMA
}

/// `mad_std` over every pixel of a 2-D array.
pub fn mad_std_pixels(data: &ndarray::Array2<f32>) -> f64 {
    let values: Vec<f64> = data.iter().map(|&v| v as f64).collect();
    mad_std(&values)
}
