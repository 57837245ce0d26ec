use std::f64::consts::PI;

use ndarray::{s, Array2};
use tracing::debug;

use crate::error::{DoradoError, Result};
use crate::stats::median_mut;

/// What to fit in one frame.
#[derive(Clone, Debug)]
pub struct PsfRequest<'a> {
    /// Fixed source positions, 0-based (x = column, y = row)
    pub positions: &'a [(f64, f64)],
    /// Gaussian PSF sigma in pixels
    pub sigma: f64,
    /// FWHM used by the source finder
    pub fwhm: f64,
    /// Detection threshold above background, ADU
    pub threshold: f64,
    /// Side of the square fit window, odd
    pub fit_shape: usize,
    /// Number of fit/subtract passes
    pub niters: usize,
}

/// One fitted source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceFit {
    pub x: f64,
    pub y: f64,
    pub flux: f64,
    pub flux_unc: f64,
}

/// PSF photometry engine.
///
/// Returns one fit per requested position, in request order, followed by
/// any extra sources the engine found on its own.
pub trait PsfPhotometry: Send + Sync {
    fn fit(&self, data: &Array2<f32>, request: &PsfRequest<'_>) -> Result<Vec<SourceFit>>;
}

/// Fixed-position Gaussian PSF flux fit with iterative source subtraction.
///
/// Each source is fit in a `fit_shape` square window: the background is the
/// median of the window border and the flux is the linear least-squares
/// amplitude of a unit-integral Gaussian. Fitted sources are subtracted
/// before the next one, so overlapping neighbours do not count twice.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaussianPsfPhotometry;

impl PsfPhotometry for GaussianPsfPhotometry {
    fn fit(&self, data: &Array2<f32>, request: &PsfRequest<'_>) -> Result<Vec<SourceFit>> {
        if request.fit_shape < 3 || request.fit_shape % 2 == 0 {
            return Err(DoradoError::InvalidInput(format!(
                "fit shape must be odd and at least 3, got {}",
                request.fit_shape
            )));
        }
        if request.sigma <= 0.0 {
            return Err(DoradoError::InvalidInput(format!(
                "PSF sigma must be positive, got {}",
                request.sigma
            )));
        }

        let mut residual = data.mapv(|v| v as f64);
        let mut fits = Vec::with_capacity(request.positions.len());

        for &(x, y) in request.positions {
            fits.push(fit_and_subtract(&mut residual, x, y, request)?);
        }

        for pass in 1..request.niters.max(1) {
            let found = find_sources(&residual, request, &fits);
            debug!(pass, sources = found.len(), "Residual sources");
            if found.is_empty() {
                break;
            }
            for (x, y) in found {
                fits.push(fit_and_subtract(&mut residual, x, y, request)?);
            }
        }

        Ok(fits)
    }
}

fn gaussian(dx: f64, dy: f64, sigma: f64) -> f64 {
    let two_sigma_sq = 2.0 * sigma * sigma;
    (-(dx * dx + dy * dy) / two_sigma_sq).exp() / (PI * two_sigma_sq)
}

/// Window bounds `(row0, col0)` for a source at `(x, y)`, if it fits.
fn window_origin(dim: (usize, usize), x: f64, y: f64, shape: usize) -> Option<(usize, usize)> {
    let (h, w) = dim;
    let half = (shape / 2) as i64;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let (cx, cy) = (x.round() as i64, y.round() as i64);
    let (r0, c0) = (cy - half, cx - half);
    if r0 < 0 || c0 < 0 || cy + half >= h as i64 || cx + half >= w as i64 {
        return None;
    }
    Some((r0 as usize, c0 as usize))
}

fn fit_and_subtract(
    residual: &mut Array2<f64>,
    x: f64,
    y: f64,
    request: &PsfRequest<'_>,
) -> Result<SourceFit> {
    let shape = request.fit_shape;
    let (r0, c0) = window_origin(residual.dim(), x, y, shape).ok_or_else(|| {
        DoradoError::Photometry(format!(
            "fit window around ({x:.1}, {y:.1}) leaves the frame"
        ))
    })?;

    let mut window = residual.slice_mut(s![r0..r0 + shape, c0..c0 + shape]);

    let mut border: Vec<f64> = window
        .indexed_iter()
        .filter(|((r, c), _)| *r == 0 || *c == 0 || *r == shape - 1 || *c == shape - 1)
        .map(|(_, &v)| v)
        .collect();
    let background = median_mut(&mut border);

    let mut sum_dp = 0.0;
    let mut sum_pp = 0.0;
    for ((r, c), &v) in window.indexed_iter() {
        let p = gaussian((c0 + c) as f64 - x, (r0 + r) as f64 - y, request.sigma);
        sum_dp += (v - background) * p;
        sum_pp += p * p;
    }
    if sum_pp <= 0.0 {
        return Err(DoradoError::Photometry("degenerate PSF model".into()));
    }
    let flux = sum_dp / sum_pp;

    let mut sum_res_sq = 0.0;
    for ((r, c), v) in window.indexed_iter_mut() {
        let model = flux * gaussian((c0 + c) as f64 - x, (r0 + r) as f64 - y, request.sigma);
        let res = *v - background - model;
        sum_res_sq += res * res;
        *v -= model;
    }
    let dof = (shape * shape).saturating_sub(2).max(1) as f64;
    let flux_unc = (sum_res_sq / dof / sum_pp).sqrt();

    if !flux.is_finite() {
        return Err(DoradoError::Photometry(format!(
            "non-finite flux at ({x:.1}, {y:.1})"
        )));
    }

    Ok(SourceFit { x, y, flux, flux_unc })
}

/// Local maxima of the residual above `threshold` that are not already fit
/// and whose fit window lies inside the frame.
fn find_sources(
    residual: &Array2<f64>,
    request: &PsfRequest<'_>,
    known: &[SourceFit],
) -> Vec<(f64, f64)> {
    let (h, w) = residual.dim();
    let mut values: Vec<f64> = residual.iter().copied().collect();
    let background = median_mut(&mut values);
    let min_sep = request.fwhm.max(1.0);

    let mut found: Vec<(f64, f64)> = Vec::new();
    for row in 1..h.saturating_sub(1) {
        for col in 1..w.saturating_sub(1) {
            let v = residual[[row, col]];
            if v - background <= request.threshold {
                continue;
            }
            let is_peak = (-1i64..=1).all(|dr| {
                (-1i64..=1).all(|dc| {
                    (dr == 0 && dc == 0)
                        || v > residual[[(row as i64 + dr) as usize, (col as i64 + dc) as usize]]
                })
            });
            if !is_peak {
                continue;
            }
            let (x, y) = (col as f64, row as f64);
            let near = |sx: f64, sy: f64| (sx - x).hypot(sy - y) < min_sep;
            if known.iter().any(|f| near(f.x, f.y)) || found.iter().any(|&(fx, fy)| near(fx, fy)) {
                continue;
            }
            if window_origin((h, w), x, y, request.fit_shape).is_some() {
                found.push((x, y));
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star_field(h: usize, w: usize, stars: &[(f64, f64, f64)], background: f64) -> Array2<f32> {
        Array2::from_shape_fn((h, w), |(r, c)| {
            let mut v = background;
            for &(x, y, flux) in stars {
                v += flux * gaussian(c as f64 - x, r as f64 - y, 2.0);
            }
            v as f32
        })
    }

    fn request(positions: &[(f64, f64)]) -> PsfRequest<'_> {
        PsfRequest {
            positions,
            sigma: 2.0,
            fwhm: 4.0,
            threshold: 5.0,
            fit_shape: 21,
            niters: 1,
        }
    }

    #[test]
    fn recovers_flux_of_isolated_star() {
        let data = star_field(64, 64, &[(30.0, 32.0, 5000.0)], 100.0);
        let positions = [(30.0, 32.0)];
        let fits = GaussianPsfPhotometry.fit(&data, &request(&positions)).unwrap();
        assert_eq!(fits.len(), 1);
        assert!((fits[0].flux - 5000.0).abs() < 5.0, "flux {}", fits[0].flux);
    }

    #[test]
    fn window_outside_frame_is_an_error() {
        let data = star_field(32, 32, &[], 0.0);
        let positions = [(2.0, 2.0)];
        assert!(matches!(
            GaussianPsfPhotometry.fit(&data, &request(&positions)),
            Err(DoradoError::Photometry(_))
        ));
    }

    #[test]
    fn extra_iterations_pick_up_unrequested_sources() {
        let data = star_field(96, 96, &[(30.0, 30.0, 5000.0), (65.0, 60.0, 3000.0)], 10.0);
        let positions = [(30.0, 30.0)];
        let mut req = request(&positions);
        req.niters = 2;
        let fits = GaussianPsfPhotometry.fit(&data, &req).unwrap();
        assert_eq!(fits.len(), 2);
        assert_eq!((fits[1].x, fits[1].y), (65.0, 60.0));
        assert!((fits[1].flux - 3000.0).abs() < 5.0);
    }
}
