use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::consts::DEFAULT_MAX_SHIFT_FRACTION;
use crate::error::{DoradoError, Result};
use crate::frame::AlignmentOffset;

use super::registrar::ImageRegistrar;
use super::subpixel::refine_peak_paraboloid;

/// Translation-only registration by FFT phase correlation.
///
/// The target is shifted onto the reference with bilinear resampling;
/// pixels that fall outside the source are zero.
#[derive(Clone, Debug)]
pub struct PhaseCorrelationRegistrar {
    /// Largest accepted shift as a fraction of the smaller frame side
    pub max_shift_fraction: f64,
}

impl Default for PhaseCorrelationRegistrar {
    fn default() -> Self {
        Self {
            max_shift_fraction: DEFAULT_MAX_SHIFT_FRACTION,
        }
    }
}

impl ImageRegistrar for PhaseCorrelationRegistrar {
    fn register(&self, reference: &Array2<f32>, target: &Array2<f32>) -> Result<Array2<f32>> {
        let offset = compute_offset(reference, target)?;
        let (h, w) = reference.dim();
        let limit = self.max_shift_fraction * h.min(w) as f64;
        if offset.dx.abs() > limit || offset.dy.abs() > limit {
            return Err(DoradoError::Registration(format!(
                "shift ({:.1}, {:.1}) exceeds {:.1} px",
                offset.dx, offset.dy, limit
            )));
        }
        Ok(shift_array(target, &offset))
    }
}

/// Compute the translation offset between two arrays using FFT phase correlation.
///
/// Shifting `target` by the returned offset lines it up with `reference`.
pub fn compute_offset(reference: &Array2<f32>, target: &Array2<f32>) -> Result<AlignmentOffset> {
    let (h, w) = reference.dim();
    let (th, tw) = target.dim();
    if h != th || w != tw {
        return Err(DoradoError::Registration(format!(
            "array size mismatch: {}x{} vs {}x{}",
            w, h, tw, th
        )));
    }
    if h < 2 || w < 2 {
        return Err(DoradoError::Registration(format!(
            "frame too small to register: {}x{}",
            w, h
        )));
    }
    if reference.iter().any(|v| !v.is_finite()) {
        return Err(DoradoError::Registration(
            "reference contains non-finite pixel values".into(),
        ));
    }
    if target.iter().any(|v| !v.is_finite()) {
        return Err(DoradoError::Registration(
            "target contains non-finite pixel values".into(),
        ));
    }

    // Mean removal and Hann window to reduce spectral leakage
    let ref_fft = fft2d(&apply_hann(reference));
    let tgt_fft = fft2d(&apply_hann(target));

    let cross_power = normalized_cross_power(&ref_fft, &tgt_fft);
    let correlation = ifft2d(&cross_power);

    let (peak_row, peak_col, peak_val) = find_peak(&correlation);
    if !peak_val.is_finite() || peak_val <= 0.0 {
        return Err(DoradoError::Registration(
            "no correlation peak between frames".into(),
        ));
    }

    // Signed offset, handling wrap-around
    let dy = if peak_row > h / 2 {
        peak_row as f64 - h as f64
    } else {
        peak_row as f64
    };
    let dx = if peak_col > w / 2 {
        peak_col as f64 - w as f64
    } else {
        peak_col as f64
    };

    let (sub_dy, sub_dx) = refine_peak_paraboloid(&correlation, peak_row, peak_col);

    Ok(AlignmentOffset {
        dx: dx + sub_dx,
        dy: dy + sub_dy,
    })
}

/// Shift an array by the given offset using bilinear interpolation.
pub fn shift_array(data: &Array2<f32>, offset: &AlignmentOffset) -> Array2<f32> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(row, col)| {
        bilinear_sample(data, row as f64 - offset.dy, col as f64 - offset.dx)
    })
}

fn apply_hann(data: &Array2<f32>) -> Array2<f32> {
    let (h, w) = data.dim();
    let mean = data.mean().unwrap_or(0.0);
    Array2::from_shape_fn((h, w), |(row, col)| {
        let wy = 0.5 * (1.0 - (std::f64::consts::TAU * row as f64 / h as f64).cos());
        let wx = 0.5 * (1.0 - (std::f64::consts::TAU * col as f64 / w as f64).cos());
        (data[[row, col]] - mean) * (wy * wx) as f32
    })
}

/// 2D FFT: row-wise FFT, then column-wise FFT.
fn fft2d(data: &Array2<f32>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.mapv(|v| Complex::new(v as f64, 0.0));

    for mut row in result.rows_mut() {
        let mut buf: Vec<Complex<f64>> = row.to_vec();
        fft_row.process(&mut buf);
        row.assign(&ndarray::ArrayView1::from(&buf));
    }

    for mut col in result.columns_mut() {
        let mut buf: Vec<Complex<f64>> = col.to_vec();
        fft_col.process(&mut buf);
        col.assign(&ndarray::ArrayView1::from(&buf));
    }

    result
}

/// Inverse 2D FFT, real part, normalized.
fn ifft2d(data: &Array2<Complex<f64>>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();

    for mut col in work.columns_mut() {
        let mut buf: Vec<Complex<f64>> = col.to_vec();
        ifft_col.process(&mut buf);
        col.assign(&ndarray::ArrayView1::from(&buf));
    }

    for mut row in work.rows_mut() {
        let mut buf: Vec<Complex<f64>> = row.to_vec();
        ifft_row.process(&mut buf);
        row.assign(&ndarray::ArrayView1::from(&buf));
    }

    let scale = 1.0 / (h * w) as f64;
    work.mapv(|c| c.re * scale)
}

fn normalized_cross_power(
    ref_fft: &Array2<Complex<f64>>,
    tgt_fft: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    let mut result = Array2::<Complex<f64>>::zeros(ref_fft.dim());
    ndarray::Zip::from(&mut result)
        .and(ref_fft)
        .and(tgt_fft)
        .for_each(|out, &r, &t| {
            let cross = r * t.conj();
            let mag = cross.norm();
            *out = if mag > 1e-12 {
                cross / mag
            } else {
                Complex::new(0.0, 0.0)
            };
        });
    result
}

fn find_peak(data: &Array2<f64>) -> (usize, usize, f64) {
    let mut best = (0, 0, f64::NEG_INFINITY);
    for ((row, col), &v) in data.indexed_iter() {
        if v > best.2 {
            best = (row, col, v);
        }
    }
    best
}

/// Bilinear interpolation at fractional `(y, x)`. Pixels outside the array
/// count as zero.
pub fn bilinear_sample(data: &Array2<f32>, y: f64, x: f64) -> f32 {
    let (row, col) = (y.floor(), x.floor());
    let (ty, tx) = ((y - row) as f32, (x - col) as f32);
    let (row, col) = (row as i64, col as i64);

    let pixel = |r: i64, c: i64| -> f32 {
        usize::try_from(r)
            .ok()
            .zip(usize::try_from(c).ok())
            .and_then(|(r, c)| data.get((r, c)).copied())
            .unwrap_or(0.0)
    };

    let top = pixel(row, col) + (pixel(row, col + 1) - pixel(row, col)) * tx;
    let bottom = pixel(row + 1, col) + (pixel(row + 1, col + 1) - pixel(row + 1, col)) * tx;
    top + (bottom - top) * ty
}
