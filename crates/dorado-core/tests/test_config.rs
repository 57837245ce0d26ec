mod common;

use approx::assert_abs_diff_eq;

use dorado_core::analysis::Window;
use dorado_core::error::DoradoError;
use dorado_core::filter::Filter;
use dorado_core::pipeline::config::{
    FailurePolicy, ReductionConfig, SampleSpacing, SmoothingConfig,
};
use dorado_core::wcs::{SkyCoord, Wcs};

use common::field_wcs;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[test]
fn test_filter_names_round_trip() {
    for filter in Filter::ALL {
        let parsed: Filter = filter.to_string().parse().unwrap();
        assert_eq!(parsed, filter);
    }
}

#[test]
fn test_filter_aliases() {
    assert_eq!("Rc".parse::<Filter>().unwrap(), Filter::R);
    assert_eq!(" g ".parse::<Filter>().unwrap(), Filter::SloanG);
    assert_eq!("H-alpha".parse::<Filter>().unwrap(), Filter::HAlpha);
}

#[test]
fn test_unknown_filter() {
    match "W".parse::<Filter>() {
        Err(DoradoError::UnknownFilter(name)) => assert_eq!(name, "W"),
        other => panic!("expected UnknownFilter, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

#[test]
fn test_sexagesimal_parsing() {
    let c = SkyCoord::from_sexagesimal("19 25 27.9", "+42 47 03.7").unwrap();
    assert_abs_diff_eq!(c.ra, (19.0 + 25.0 / 60.0 + 27.9 / 3600.0) * 15.0, epsilon = 1e-9);
    assert_abs_diff_eq!(c.dec, 42.0 + 47.0 / 60.0 + 3.7 / 3600.0, epsilon = 1e-9);

    let south = SkyCoord::from_sexagesimal("05:35:17.3", "-05:23:28").unwrap();
    assert!(south.dec < -5.39 && south.dec > -5.40);
}

#[test]
fn test_sexagesimal_rejects_garbage() {
    assert!(SkyCoord::from_sexagesimal("25 00 00", "+10 00 00").is_err());
    assert!(SkyCoord::from_sexagesimal("10 00 00", "+95 00 00").is_err());
    assert!(SkyCoord::from_sexagesimal("ten", "+10").is_err());
}

#[test]
fn test_wcs_reference_pixel_maps_to_reference_coordinate() {
    let wcs = field_wcs(100, 140);
    let c = wcs.pixel_to_sky(70.5, 50.5);
    assert_abs_diff_eq!(c.ra, 180.0, epsilon = 1e-12);
    assert_abs_diff_eq!(c.dec, 30.0, epsilon = 1e-12);
    assert_abs_diff_eq!(wcs.pixel_scale_arcsec(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_wcs_pixel_sky_round_trip() {
    let wcs = Wcs::from_scale_rotation((512.0, 384.0), (291.366, 42.784), 1.6, 23.0, (1024, 768));
    for (x, y) in [(1.0, 1.0), (512.0, 384.0), (1000.25, 17.5), (300.0, 760.0)] {
        let sky = wcs.pixel_to_sky(x, y);
        let (bx, by) = wcs.sky_to_pixel(&sky).unwrap();
        assert_abs_diff_eq!(bx, x, epsilon = 1e-6);
        assert_abs_diff_eq!(by, y, epsilon = 1e-6);
    }
}

#[test]
fn test_wcs_east_is_left() {
    let wcs = field_wcs(100, 100);
    let centre = wcs.pixel_to_sky(50.5, 50.5);
    let left = wcs.pixel_to_sky(40.5, 50.5);
    let up = wcs.pixel_to_sky(50.5, 60.5);
    assert!(left.ra > centre.ra);
    assert!(up.dec > centre.dec);
}

#[test]
fn test_sky_behind_projection_plane_is_rejected() {
    let wcs = field_wcs(100, 100);
    assert!(wcs.sky_to_pixel(&SkyCoord::new(0.0, -30.0)).is_err());
}

// ---------------------------------------------------------------------------
// Reduction settings
// ---------------------------------------------------------------------------

#[test]
fn test_reduction_config_defaults() {
    let config = ReductionConfig::default();
    assert_eq!(config.calibration.failure_policy, FailurePolicy::Isolate);
    assert!(!config.calibration.normalize_flat);
    assert_eq!(config.alignment.align_to, None);
    assert_eq!(config.photometry.fit_shape % 2, 1);
    assert_eq!(config.analysis.smoothing.window, Window::Hanning);
    assert_eq!(config.analysis.smoothing.window_len, 11);
    assert_abs_diff_eq!(config.analysis.zero_point, 15.0);
    assert_abs_diff_eq!(config.analysis.extrema.height_factor, 1.1);
    assert_eq!(config.analysis.frequency.spacing, SampleSpacing::MeanExposure);
    assert!(!config.analysis.frequency.remove_mean);
    assert!(!config.analysis.extrema.refine_vertex);
}

#[test]
fn test_empty_document_gives_defaults() {
    let config: ReductionConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.calibration.failure_policy, FailurePolicy::Isolate);
    assert_abs_diff_eq!(
        config.alignment.max_shift_fraction,
        ReductionConfig::default().alignment.max_shift_fraction
    );
}

#[test]
fn test_config_serialization_round_trip() {
    let mut config = ReductionConfig::default();
    config.calibration.failure_policy = FailurePolicy::Abort;
    config.alignment.align_to = Some(4);
    config.analysis.smoothing.window = Window::Blackman;
    config.analysis.smoothing.terms = Some(12);

    let text = serde_json::to_string(&config).unwrap();
    assert!(text.contains("\"blackman\""));
    let back: ReductionConfig = serde_json::from_str(&text).unwrap();

    assert_eq!(back.calibration.failure_policy, FailurePolicy::Abort);
    assert_eq!(back.alignment.align_to, Some(4));
    assert_eq!(back.analysis.smoothing.window, Window::Blackman);
    assert_eq!(back.analysis.smoothing.terms, Some(12));
}

#[test]
fn test_smoothing_resolves_against_series_length() {
    let params = SmoothingConfig::default().resolve(90);
    assert_eq!(params.terms, 30);
    assert_eq!(params.samples, 90);

    let fixed = SmoothingConfig {
        terms: Some(5),
        samples: Some(200),
        ..Default::default()
    }
    .resolve(90);
    assert_eq!(fixed.terms, 5);
    assert_eq!(fixed.samples, 200);
}

#[test]
fn test_display_names() {
    assert_eq!(SampleSpacing::MeanExposure.to_string(), "Mean Exposure");
    assert_eq!(FailurePolicy::Abort.to_string(), "Abort");
    assert_eq!(Window::Bartlett.to_string(), "bartlett");
}
