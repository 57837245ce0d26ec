use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::filter::Filter;

use super::timeseries_io::SeriesFormat;

const LIGHT_EXTENSIONS: [&str; 3] = ["fit", "fits", "dfr"];

/// Night directory conventions: raw frames at the top, processing output
/// under `wrk/`.
#[derive(Clone, Debug)]
pub struct NightLayout {
    root: PathBuf,
}

/// Raw frame files of a night, sorted by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NightListing {
    pub bias: Vec<PathBuf>,
    pub flats: Vec<PathBuf>,
    pub lights: Vec<PathBuf>,
}

impl NightLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn wrk(&self) -> PathBuf {
        self.root.join("wrk")
    }

    pub fn bias_dir(&self) -> PathBuf {
        self.wrk().join("bias")
    }

    pub fn flats_dir(&self) -> PathBuf {
        self.wrk().join("flats")
    }

    pub fn lights_dir(&self) -> PathBuf {
        self.wrk().join("lights")
    }

    pub fn calibrated_dir(&self) -> PathBuf {
        self.wrk().join("calibrated")
    }

    pub fn aligned_dir(&self) -> PathBuf {
        self.wrk().join("aligned")
    }

    /// Create the working directory tree. Existing directories are kept.
    pub fn create(&self) -> Result<()> {
        for dir in [
            self.bias_dir(),
            self.flats_dir(),
            self.lights_dir(),
            self.calibrated_dir(),
            self.aligned_dir(),
        ] {
            fs::create_dir_all(&dir)?;
        }
        debug!(root = %self.root.display(), "Working directories ready");
        Ok(())
    }

    /// Classify the files directly under the night directory.
    pub fn scan(&self) -> Result<NightListing> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        let listing = classify(&names);
        Ok(NightListing {
            bias: listing.bias.into_iter().map(|p| self.root.join(p)).collect(),
            flats: listing.flats.into_iter().map(|p| self.root.join(p)).collect(),
            lights: listing.lights.into_iter().map(|p| self.root.join(p)).collect(),
        })
    }

    /// `wrk/{target}_{filter}-{mjd}.{ext}`
    pub fn timeseries_path(
        &self,
        target: &str,
        filter: Filter,
        night_mjd: i64,
        format: SeriesFormat,
    ) -> PathBuf {
        self.wrk().join(timeseries_file_name(target, filter, night_mjd, format))
    }
}

pub fn timeseries_file_name(
    target: &str,
    filter: Filter,
    night_mjd: i64,
    format: SeriesFormat,
) -> String {
    format!("{}_{}-{}.{}", target, filter, night_mjd, format.extension())
}

/// Sort file names into bias, flat and light frames.
///
/// Bias frames carry `BIAS` or `Bias` in the name, flats `FLAT` or `Flat`
/// (as in `FlatField`). Everything else with a FITS or `.dfr` extension is a
/// light frame.
pub fn classify<S: AsRef<str>>(names: &[S]) -> NightListing {
    let mut listing = NightListing::default();
    let mut sorted: Vec<&str> = names.iter().map(|s| s.as_ref()).collect();
    sorted.sort_unstable();

    for name in sorted {
        if name.contains("BIAS") || name.contains("Bias") {
            listing.bias.push(PathBuf::from(name));
        } else if name.contains("FLAT") || name.contains("Flat") {
            listing.flats.push(PathBuf::from(name));
        } else if is_light(name) {
            listing.lights.push(PathBuf::from(name));
        }
    }
    listing
}

fn is_light(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| LIGHT_EXTENSIONS.iter().any(|l| l.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
