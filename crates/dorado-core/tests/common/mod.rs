use std::f64::consts::PI;

use ndarray::Array2;

use dorado_core::filter::Filter;
use dorado_core::frame::{Frame, FrameHeader};
use dorado_core::series::ImageSeries;
use dorado_core::wcs::Wcs;

/// Frame header for a V-band exposure.
pub fn header(date_obs: f64, exptime: f64) -> FrameHeader {
    FrameHeader {
        date_obs,
        exptime,
        filter: Some(Filter::V),
        bit_depth: 16,
    }
}

/// Constant-valued frame.
pub fn uniform_frame(h: usize, w: usize, value: f32) -> Frame {
    Frame::new(Array2::from_elem((h, w), value), header(60000.0, 30.0))
}

/// Series of `n` constant frames one minute apart.
pub fn uniform_series(filter: Filter, n: usize, h: usize, w: usize, value: f32) -> ImageSeries {
    let frames = (0..n)
        .map(|i| {
            Frame::new(
                Array2::from_elem((h, w), value),
                header(60000.0 + i as f64 / 1440.0, 30.0),
            )
        })
        .collect();
    ImageSeries::new(filter, frames)
}

/// Add a circular Gaussian star with total flux `flux` centred on
/// 0-based pixel `(x, y)`.
pub fn add_star(data: &mut Array2<f32>, x: f64, y: f64, flux: f64, sigma: f64) {
    let norm = flux / (2.0 * PI * sigma * sigma);
    for ((r, c), v) in data.indexed_iter_mut() {
        let dx = c as f64 - x;
        let dy = r as f64 - y;
        *v += (norm * (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp()) as f32;
    }
}

/// A field of a few smooth blobs, good texture for phase correlation.
pub fn blob_field(h: usize, w: usize) -> Array2<f32> {
    let mut data = Array2::<f32>::from_elem((h, w), 10.0);
    let stars = [
        (0.25, 0.30, 4000.0),
        (0.70, 0.20, 2500.0),
        (0.45, 0.55, 6000.0),
        (0.20, 0.75, 3000.0),
        (0.80, 0.70, 5000.0),
    ];
    for (fx, fy, flux) in stars {
        add_star(&mut data, fx * w as f64, fy * h as f64, flux, 2.5);
    }
    data
}

/// Copy of `data` translated by whole pixels, zero filled.
pub fn translate(data: &Array2<f32>, dx: i64, dy: i64) -> Array2<f32> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(r, c)| {
        let sr = r as i64 - dy;
        let sc = c as i64 - dx;
        if sr >= 0 && sc >= 0 && (sr as usize) < h && (sc as usize) < w {
            data[[sr as usize, sc as usize]]
        } else {
            0.0
        }
    })
}

/// One arcsecond per pixel, north up, reference pixel at the frame centre,
/// pointed at RA 180 Dec +30.
pub fn field_wcs(h: usize, w: usize) -> Wcs {
    Wcs::from_scale_rotation(
        ((w as f64 + 1.0) / 2.0, (h as f64 + 1.0) / 2.0),
        (180.0, 30.0),
        1.0,
        0.0,
        (w as u32, h as u32),
    )
}

/// Evenly sampled sinusoid: mean 10, amplitude 1, period 2 days, maxima at
/// t = 1, 3, 5.
pub fn sinusoid(n: usize, step: f64) -> (Vec<f64>, Vec<f64>) {
    let times: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
    let flux = times
        .iter()
        .map(|&t| 10.0 + (2.0 * PI * (t - 0.5) / 2.0).sin())
        .collect();
    (times, flux)
}
