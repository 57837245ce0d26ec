mod common;

use std::fs;
use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use dorado_core::align::{PlateSolution, SolutionCache};
use dorado_core::error::DoradoError;
use dorado_core::filter::Filter;
use dorado_core::frame::{Frame, FrameHeader};
use dorado_core::io::frame_file::{FrameFileReader, DFR_HEADER_SIZE};
use dorado_core::io::layout::timeseries_file_name;
use dorado_core::io::{
    classify, read_frame_file, read_timeseries, write_frame_file, write_timeseries,
    DirectoryFrameStore, DirectorySolutionCache, FrameStore, NightLayout, SeriesFormat,
};
use dorado_core::pipeline::NoOpReporter;
use dorado_core::target::Target;
use dorado_core::timeseries::TimeSeries;
use dorado_core::wcs::SkyCoord;

use common::{field_wcs, header};

fn gradient_frame(h: usize, w: usize) -> Frame {
    let data = Array2::from_shape_fn((h, w), |(r, c)| (r * 1000 + c) as f32 + 0.25);
    Frame::new(data, header(60234.8125, 45.0))
}

// ---------------------------------------------------------------------------
// Frame files
// ---------------------------------------------------------------------------

#[test]
fn test_dfr_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.dfr");
    let frame = gradient_frame(12, 17);

    write_frame_file(&path, &frame).unwrap();
    assert_eq!(
        fs::metadata(&path).unwrap().len() as usize,
        DFR_HEADER_SIZE + 12 * 17 * 4
    );

    let back = read_frame_file(&path).unwrap();
    assert_eq!(back.dim(), (12, 17));
    assert_eq!(back.data, frame.data);
    assert_eq!(back.header(), frame.header());
}

#[test]
fn test_dfr_header_without_filter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nofilter.dfr");
    let frame = Frame::new(
        Array2::zeros((4, 4)),
        FrameHeader {
            filter: None,
            bit_depth: 12,
            ..header(60000.0, 5.0)
        },
    );

    write_frame_file(&path, &frame).unwrap();
    let reader = FrameFileReader::open(&path).unwrap();
    assert_eq!(reader.header.width, 4);
    assert_eq!(reader.header.header.filter, None);
    assert_eq!(reader.header.header.bit_depth, 12);
}

#[test]
fn test_dfr_rejects_bad_magic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.dfr");
    fs::write(&path, vec![0u8; 128]).unwrap();
    assert!(matches!(
        read_frame_file(&path),
        Err(DoradoError::InvalidFrameFile(_))
    ));
}

#[test]
fn test_dfr_rejects_truncated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.dfr");
    write_frame_file(&path, &gradient_frame(8, 8)).unwrap();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

    assert!(matches!(
        read_frame_file(&path),
        Err(DoradoError::InvalidFrameFile(_))
    ));
}

// ---------------------------------------------------------------------------
// Frame store
// ---------------------------------------------------------------------------

#[test]
fn test_store_series_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryFrameStore::new(dir.path().join("calibrated"));
    let series = common::uniform_series(Filter::V, 3, 6, 5, 120.0);

    let names = store.write_series(&series, "V", &NoOpReporter).unwrap();
    assert_eq!(names, vec!["V_0000.dfr", "V_0001.dfr", "V_0002.dfr"]);
    assert_eq!(store.list().unwrap(), names);

    let back = store.read_series(Filter::V, &names, &NoOpReporter).unwrap();
    assert_eq!(back.len(), 3);
    assert_eq!(back.filter(), Filter::V);
    for (a, b) in back.frames().iter().zip(series.frames()) {
        assert_eq!(a.data, b.data);
        assert_eq!(a.header(), b.header());
    }
}

#[test]
fn test_store_tiff_keeps_integer_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryFrameStore::new(dir.path());
    let data = Array2::from_shape_fn((5, 7), |(r, c)| (r * 100 + c * 3) as f32);
    let frame = Frame::new(data.clone(), header(60000.0, 10.0));

    store.write("preview.tif", &frame).unwrap();
    let back = store.read("preview.tif").unwrap();
    assert_eq!(back.data, data);
}

#[test]
fn test_store_rejects_fits_and_unknown_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryFrameStore::new(dir.path());
    fs::write(dir.path().join("light.fits"), b"SIMPLE  =").unwrap();
    fs::write(dir.path().join("notes.txt"), b"clear").unwrap();

    assert!(matches!(
        store.read("light.fits"),
        Err(DoradoError::InvalidFrameFile(_))
    ));
    assert!(matches!(
        store.read("notes.txt"),
        Err(DoradoError::InvalidFrameFile(_))
    ));
    assert!(store.list().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Night layout
// ---------------------------------------------------------------------------

#[test]
fn test_classify_night_files() {
    let names = [
        "RRLyr_V_002.fit",
        "BIAS_001.fit",
        "FlatField_V_001.fits",
        "RRLyr_V_001.FIT",
        "Bias_002.fit",
        "FLAT_V_002.fit",
        "observing_log.txt",
        "RRLyr_V_003.dfr",
    ];
    let listing = classify(&names);

    assert_eq!(
        listing.bias,
        vec![PathBuf::from("BIAS_001.fit"), PathBuf::from("Bias_002.fit")]
    );
    assert_eq!(
        listing.flats,
        vec![
            PathBuf::from("FLAT_V_002.fit"),
            PathBuf::from("FlatField_V_001.fits")
        ]
    );
    assert_eq!(
        listing.lights,
        vec![
            PathBuf::from("RRLyr_V_001.FIT"),
            PathBuf::from("RRLyr_V_002.fit"),
            PathBuf::from("RRLyr_V_003.dfr")
        ]
    );
}

#[test]
fn test_scan_and_create_night_directory() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["BIAS_1.fit", "flat_but_lowercase.fit", "Flat_1.fit", "m13_1.dfr"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    let layout = NightLayout::new(dir.path());
    layout.create().unwrap();
    // Second call keeps the tree
    layout.create().unwrap();

    assert!(layout.calibrated_dir().is_dir());
    assert!(layout.aligned_dir().is_dir());
    assert_eq!(layout.bias_dir(), dir.path().join("wrk").join("bias"));

    let listing = layout.scan().unwrap();
    assert_eq!(listing.bias, vec![dir.path().join("BIAS_1.fit")]);
    assert_eq!(listing.flats, vec![dir.path().join("Flat_1.fit")]);
    assert_eq!(
        listing.lights,
        vec![
            dir.path().join("flat_but_lowercase.fit"),
            dir.path().join("m13_1.dfr")
        ]
    );
}

#[test]
fn test_timeseries_file_name() {
    assert_eq!(
        timeseries_file_name("RRLyr", Filter::V, 60234, SeriesFormat::Json),
        "RRLyr_V-60234.json"
    );
    let layout = NightLayout::new("/data/night");
    assert_eq!(
        layout.timeseries_path("RRLyr", Filter::R, 60234, SeriesFormat::Csv),
        PathBuf::from("/data/night/wrk/RRLyr_R-60234.csv")
    );
}

// ---------------------------------------------------------------------------
// Light curves
// ---------------------------------------------------------------------------

fn light_curve() -> TimeSeries {
    let mut ts =
        TimeSeries::from_light_curve(&[60000.1, 60000.2, 60000.3], &[50.0, -2.0, 48.0], 30.0)
            .unwrap();
    ts.mag = vec![15.0 - 2.5 * 50f64.log10(), f64::NAN, 15.0 - 2.5 * 48f64.log10()];
    ts.mag_unc = vec![0.01, f64::NAN, 0.012];
    ts.toml = vec![60000.2];
    ts
}

#[test]
fn test_json_timeseries_round_trip_keeps_nan_magnitudes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lc.json");
    let ts = light_curve();

    write_timeseries(&path, &ts, SeriesFormat::Json).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("null"));

    let back = read_timeseries(&path).unwrap();
    assert_eq!(back.len(), 3);
    for (a, b) in back.time().iter().zip(ts.time()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
    }
    assert_eq!(back.flux(), ts.flux());
    assert_eq!(back.frame_index(), &[0, 1, 2]);
    assert_eq!(back.toml.len(), 1);
    assert_abs_diff_eq!(back.mag[0], ts.mag[0], epsilon = 1e-12);
    assert!(back.mag[1].is_nan());
    assert!(back.mag_unc[1].is_nan());
}

#[test]
fn test_json_timeseries_with_ragged_columns_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lc.json");
    write_timeseries(&path, &light_curve(), SeriesFormat::Json).unwrap();

    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    value["flux"].as_array_mut().unwrap().pop();
    fs::write(&path, value.to_string()).unwrap();

    assert!(matches!(
        read_timeseries(&path),
        Err(DoradoError::InvalidInput(_))
    ));
}

#[test]
fn test_csv_timeseries_is_write_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lc.csv");

    write_timeseries(&path, &light_curve(), SeriesFormat::Csv).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("time,exptime,x,y"));
    assert!(lines[0].ends_with(",mag,mag_unc"));
    assert!(lines[2].ends_with("NaN,NaN"));

    assert!(matches!(
        read_timeseries(&path),
        Err(DoradoError::InvalidInput(_))
    ));
}

#[test]
fn test_series_format_parsing() {
    assert_eq!("CSV".parse::<SeriesFormat>().unwrap(), SeriesFormat::Csv);
    assert_eq!(SeriesFormat::default(), SeriesFormat::Json);
    assert_eq!(format!("{}", SeriesFormat::Csv), "csv");
    assert!("fits".parse::<SeriesFormat>().is_err());
}

#[test]
fn test_target_record_writes_one_file_per_filter() {
    let dir = tempfile::tempdir().unwrap();
    let layout = NightLayout::new(dir.path());
    let mut target = Target::new("RRLyr", SkyCoord::new(291.366, 42.784));
    target.insert(Filter::V, light_curve());
    target.insert(Filter::B, light_curve());

    let written = target.record(&layout, 60234, SeriesFormat::Json).unwrap();

    assert_eq!(
        written,
        vec![
            layout.wrk().join("RRLyr_B-60234.json"),
            layout.wrk().join("RRLyr_V-60234.json")
        ]
    );
    let back = read_timeseries(&written[1]).unwrap();
    assert_eq!(back.len(), 3);
}

// ---------------------------------------------------------------------------
// Plate solution cache
// ---------------------------------------------------------------------------

#[test]
fn test_solution_cache_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DirectorySolutionCache::new(dir.path().join("wcs"));
    let solved = gradient_frame(16, 24);
    let solution = PlateSolution {
        wcs: field_wcs(16, 24),
        solved: Some(solved.clone()),
    };

    cache.store(&solution).unwrap();
    let back = cache.load().unwrap();
    assert_eq!(back.wcs.naxis, (24, 16));
    let (a, b) = (back.wcs.pixel_to_sky(3.0, 5.0), solution.wcs.pixel_to_sky(3.0, 5.0));
    assert_abs_diff_eq!(a.ra, b.ra, epsilon = 1e-12);
    assert_abs_diff_eq!(a.dec, b.dec, epsilon = 1e-12);
    assert_eq!(back.solved.unwrap().data, solved.data);

    // Storing a solution without a frame removes the stale one
    cache
        .store(&PlateSolution {
            wcs: field_wcs(16, 24),
            solved: None,
        })
        .unwrap();
    assert!(cache.load().unwrap().solved.is_none());
}

#[test]
fn test_missing_solution_is_a_plate_solve_error() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DirectorySolutionCache::new(dir.path());
    assert!(matches!(cache.load(), Err(DoradoError::PlateSolve(_))));
}
