use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{DoradoError, Result};
use crate::filter::Filter;
use crate::io::layout::NightLayout;
use crate::io::timeseries_io::{write_timeseries, SeriesFormat};
use crate::timeseries::TimeSeries;
use crate::wcs::SkyCoord;

/// Looks up a target's sky position by name.
pub trait TargetResolver {
    fn resolve(&self, name: &str) -> Result<SkyCoord>;
}

/// In-memory name to position table. Lookups ignore case and whitespace.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    entries: HashMap<String, SkyCoord>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, coords: SkyCoord) -> Self {
        self.insert(name, coords);
        self
    }

    pub fn insert(&mut self, name: &str, coords: SkyCoord) {
        self.entries.insert(normalize_name(name), coords);
    }
}

impl TargetResolver for StaticCatalog {
    fn resolve(&self, name: &str) -> Result<SkyCoord> {
        self.entries
            .get(&normalize_name(name))
            .copied()
            .ok_or_else(|| DoradoError::TargetResolution {
                name: name.to_string(),
                reason: "not in catalog".into(),
            })
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_lowercase()
}

/// A named sky position and its light curves, one per filter.
#[derive(Clone, Debug)]
pub struct Target {
    name: String,
    coords: SkyCoord,
    series: BTreeMap<Filter, TimeSeries>,
}

impl Target {
    pub fn new(name: impl Into<String>, coords: SkyCoord) -> Self {
        Self {
            name: name.into(),
            coords,
            series: BTreeMap::new(),
        }
    }

    /// Resolve `name` once and build the target. Resolution failures abort
    /// construction.
    pub fn resolve(name: &str, resolver: &dyn TargetResolver) -> Result<Self> {
        let coords = resolver.resolve(name)?;
        debug!(target_name = name, ra = coords.ra, dec = coords.dec, "Resolved target");
        Ok(Self::new(name, coords))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coords(&self) -> &SkyCoord {
        &self.coords
    }

    pub fn filters(&self) -> impl Iterator<Item = Filter> + '_ {
        self.series.keys().copied()
    }

    pub fn series(&self, filter: Filter) -> Result<&TimeSeries> {
        self.series
            .get(&filter)
            .ok_or_else(|| DoradoError::FilterNotFound(filter.to_string()))
    }

    pub fn series_mut(&mut self, filter: Filter) -> Result<&mut TimeSeries> {
        self.series
            .get_mut(&filter)
            .ok_or_else(|| DoradoError::FilterNotFound(filter.to_string()))
    }

    /// Store the light curve for `filter`, returning the one it replaces.
    pub fn insert(&mut self, filter: Filter, series: TimeSeries) -> Option<TimeSeries> {
        self.series.insert(filter, series)
    }

    pub fn remove(&mut self, filter: Filter) -> Option<TimeSeries> {
        self.series.remove(&filter)
    }

    /// Convert flux to instrumental magnitudes against `zero_point`.
    ///
    /// Non-positive fluxes give NaN magnitudes rather than an error, since
    /// differential fluxes are routinely negative.
    pub fn calc_mag(&mut self, filter: Filter, zero_point: f64) -> Result<()> {
        let ts = self.series_mut(filter)?;
        let (mag, mag_unc): (Vec<f64>, Vec<f64>) = ts
            .flux()
            .iter()
            .zip(ts.flux_unc())
            .map(|(&flux, &unc)| {
                let ratio = flux / zero_point;
                if ratio > 0.0 {
                    (-2.5 * ratio.log10(), unc / (ratio * std::f64::consts::LN_10))
                } else {
                    (f64::NAN, f64::NAN)
                }
            })
            .unzip();
        ts.mag = mag;
        ts.mag_unc = mag_unc;
        Ok(())
    }

    /// Write every light curve into the night's working directory as
    /// `{target}_{filter}-{mjd}.{ext}`.
    pub fn record(
        &self,
        layout: &NightLayout,
        night_mjd: i64,
        format: SeriesFormat,
    ) -> Result<Vec<PathBuf>> {
        layout.create()?;
        let mut written = Vec::with_capacity(self.series.len());
        for (&filter, ts) in &self.series {
            let path = layout.timeseries_path(&self.name, filter, night_mjd, format);
            write_timeseries(&path, ts, format)?;
            written.push(path);
        }
        info!(target_name = %self.name, files = written.len(), "Time series recorded");
        Ok(written)
    }
}
