mod common;

use approx::assert_relative_eq;
use ndarray::Array2;

use dorado_core::align::{solve_wcs, FixedSolver, WcsSource};
use dorado_core::ceres::Ceres;
use dorado_core::error::{DoradoError, Result};
use dorado_core::filter::Filter;
use dorado_core::frame::Frame;
use dorado_core::photometry::{extract, GaussianPsfPhotometry, PsfPhotometry, PsfRequest, SourceFit};
use dorado_core::pipeline::config::PhotometryConfig;
use dorado_core::pipeline::{NoOpReporter, PipelineStage};
use dorado_core::series::ImageSeries;
use dorado_core::target::Target;
use dorado_core::wcs::SkyCoord;

use common::{add_star, field_wcs, header};

const SIZE: usize = 64;
const EXPTIME: f64 = 20.0;
const TARGET_XY: (f64, f64) = (20.0, 30.0);
const CONTROL_XY: (f64, f64) = (44.0, 34.0);
const CONTROL_FLUX: f64 = 3000.0;

fn target_flux(i: usize) -> f64 {
    8000.0 + 250.0 * i as f64
}

/// Sky position of a 0-based pixel in the test field.
fn sky_at(xy: (f64, f64)) -> SkyCoord {
    field_wcs(SIZE, SIZE).pixel_to_sky(xy.0 + 1.0, xy.1 + 1.0)
}

fn star_series(n: usize) -> ImageSeries {
    let frames = (0..n)
        .map(|i| {
            let mut data = Array2::<f32>::from_elem((SIZE, SIZE), 50.0);
            add_star(&mut data, TARGET_XY.0, TARGET_XY.1, target_flux(i), 2.0);
            add_star(&mut data, CONTROL_XY.0, CONTROL_XY.1, CONTROL_FLUX, 2.0);
            Frame::new(data, header(60000.0 + i as f64 * 0.002, EXPTIME))
        })
        .collect();
    let mut series = ImageSeries::new(Filter::V, frames);
    let solver = FixedSolver {
        wcs: field_wcs(SIZE, SIZE),
    };
    solve_wcs(
        &mut series,
        None,
        WcsSource::Solve {
            solver: &solver,
            cache_dir: None,
        },
    )
    .unwrap();
    series
}

/// Engine that returns canned fits, for checking the bookkeeping alone.
struct CannedEngine;

impl PsfPhotometry for CannedEngine {
    fn fit(&self, _data: &Array2<f32>, request: &PsfRequest<'_>) -> Result<Vec<SourceFit>> {
        let canned = [(1000.0, 3.0), (400.0, 4.0)];
        Ok(request
            .positions
            .iter()
            .zip(canned)
            .map(|(&(x, y), (flux, flux_unc))| SourceFit {
                x,
                y,
                flux,
                flux_unc,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Differential and absolute flux
// ---------------------------------------------------------------------------

#[test]
fn test_differential_flux_is_target_minus_control_per_second() {
    let series = star_series(5);
    let (ts, report) = extract(
        &series,
        &GaussianPsfPhotometry,
        &sky_at(TARGET_XY),
        Some(&sky_at(CONTROL_XY)),
        &PhotometryConfig::default(),
        &NoOpReporter,
    )
    .unwrap();

    assert!(report.is_complete());
    assert_eq!(ts.len(), 5);
    for i in 0..5 {
        let raw = target_flux(i) - CONTROL_FLUX;
        assert_relative_eq!(ts.flux()[i], raw / EXPTIME, max_relative = 1e-3);
        assert_relative_eq!(ts.apsum()[i], raw, max_relative = 1e-3);
        assert_eq!(ts.exptime()[i], EXPTIME);
        assert_eq!(ts.time()[i], series.frames()[i].header().date_obs);
    }
    assert_eq!(ts.frame_index(), &[0, 1, 2, 3, 4]);
}

#[test]
fn test_absolute_flux_without_control() {
    let series = star_series(3);
    let (ts, _) = extract(
        &series,
        &GaussianPsfPhotometry,
        &sky_at(TARGET_XY),
        None,
        &PhotometryConfig::default(),
        &NoOpReporter,
    )
    .unwrap();

    for i in 0..3 {
        assert_relative_eq!(ts.flux()[i], target_flux(i) / EXPTIME, max_relative = 1e-3);
    }
}

#[test]
fn test_positions_are_reported_in_pixels_and_on_sky() {
    let series = star_series(2);
    let target = sky_at(TARGET_XY);
    let (ts, _) = extract(
        &series,
        &GaussianPsfPhotometry,
        &target,
        None,
        &PhotometryConfig::default(),
        &NoOpReporter,
    )
    .unwrap();

    assert_relative_eq!(ts.x()[0], TARGET_XY.0, epsilon = 1e-6);
    assert_relative_eq!(ts.y()[0], TARGET_XY.1, epsilon = 1e-6);
    assert_relative_eq!(ts.ra()[0], target.ra, epsilon = 1e-9);
    assert_relative_eq!(ts.dec()[0], target.dec, epsilon = 1e-9);
}

#[test]
fn test_uncertainties_combine_in_quadrature() {
    let series = star_series(2);
    let (ts, _) = extract(
        &series,
        &CannedEngine,
        &sky_at(TARGET_XY),
        Some(&sky_at(CONTROL_XY)),
        &PhotometryConfig::default(),
        &NoOpReporter,
    )
    .unwrap();

    assert_relative_eq!(ts.flux()[0], 600.0 / EXPTIME);
    assert_relative_eq!(ts.apsum_unc()[0], 5.0);
    assert_relative_eq!(ts.flux_unc()[0], 5.0 / EXPTIME);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_unsolved_series_is_rejected() {
    let series = ImageSeries::new(Filter::V, star_series(2).frames().to_vec());
    let err = extract(
        &series,
        &GaussianPsfPhotometry,
        &sky_at(TARGET_XY),
        None,
        &PhotometryConfig::default(),
        &NoOpReporter,
    )
    .unwrap_err();
    assert!(matches!(err, DoradoError::NotSolved(_)));
}

#[test]
fn test_zero_exposure_frame_is_absent_and_reported() {
    let mut series = star_series(4);
    let broken = series.frames()[2].data.clone();
    series.frames_mut()[2] = Frame::new(broken, header(60000.004, 0.0));

    let (ts, report) = extract(
        &series,
        &GaussianPsfPhotometry,
        &sky_at(TARGET_XY),
        None,
        &PhotometryConfig::default(),
        &NoOpReporter,
    )
    .unwrap();

    assert_eq!(ts.len(), 3);
    assert_eq!(ts.frame_index(), &[0, 1, 3]);
    assert_eq!(report.stage, PipelineStage::Photometry);
    assert_eq!(report.failed_indices(), vec![2]);
}

#[test]
fn test_target_off_the_frame_fails_every_frame() {
    let series = star_series(3);
    let (ts, report) = extract(
        &series,
        &GaussianPsfPhotometry,
        &sky_at((2.0, 2.0)),
        None,
        &PhotometryConfig::default(),
        &NoOpReporter,
    )
    .unwrap();

    assert!(ts.is_empty());
    assert_eq!(report.dropped(), 3);
    assert_eq!(report.succeeded(), 0);
}

// ---------------------------------------------------------------------------
// Night container and magnitudes
// ---------------------------------------------------------------------------

#[test]
fn test_ceres_stores_light_curve_on_target() {
    let mut night = Ceres::new(60000);
    night.add_stack(star_series(3));
    let mut target = Target::new("SYN 1", sky_at(TARGET_XY));
    let control = sky_at(CONTROL_XY);

    let report = night
        .photometry(
            Filter::V,
            &GaussianPsfPhotometry,
            &mut target,
            Some(&control),
            &PhotometryConfig::default(),
            &NoOpReporter,
        )
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(target.series(Filter::V).unwrap().len(), 3);
    assert_eq!(
        night.stack(Filter::V).unwrap().last_report(PipelineStage::Photometry),
        Some(&report)
    );
}

#[test]
fn test_calc_mag_against_zero_point() {
    let series = star_series(2);
    let mut target = Target::new("SYN 1", sky_at(TARGET_XY));
    let (ts, _) = extract(
        &series,
        &CannedEngine,
        target.coords(),
        None,
        &PhotometryConfig::default(),
        &NoOpReporter,
    )
    .unwrap();
    target.insert(Filter::V, ts);

    target.calc_mag(Filter::V, 15.0).unwrap();

    let ts = target.series(Filter::V).unwrap();
    let flux = 1000.0 / EXPTIME;
    assert_relative_eq!(ts.mag[0], -2.5 * (flux / 15.0).log10(), epsilon = 1e-12);
    assert_relative_eq!(
        ts.mag_unc[0],
        (3.0 / EXPTIME) / ((flux / 15.0) * std::f64::consts::LN_10),
        epsilon = 1e-12
    );
    assert!(matches!(
        target.calc_mag(Filter::B, 15.0),
        Err(DoradoError::FilterNotFound(_))
    ));
}
