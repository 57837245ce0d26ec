//! Per-filter photometric time series.
//!
//! The raw columns are filled one record at a time by photometry and are
//! never edited afterwards. Analysis stages write the derived columns,
//! replacing whatever an earlier run left there.

use serde::{Deserialize, Serialize};

use crate::consts::SECONDS_PER_DAY;
use crate::error::{DoradoError, Result};
use crate::stats::mean;

/// One photometry measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeriesRecord {
    /// Observation time, MJD
    pub time: f64,
    /// Exposure time, seconds
    pub exptime: f64,
    /// Fitted pixel position, 0-based array coordinates
    pub x: f64,
    pub y: f64,
    /// Sky position of the fit, degrees
    pub ra: f64,
    pub dec: f64,
    /// Exposure-normalized flux (differential when a control star was used)
    pub flux: f64,
    pub flux_unc: f64,
    /// Un-normalized flux
    pub apsum: f64,
    pub apsum_unc: f64,
    /// Index of the source frame in the aligned series
    pub frame_index: usize,
}

/// Power spectrum of a light curve and the indices of its peaks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencySpectrum {
    /// Frequencies in cycles per day, `fftfreq` ordering
    pub freq: Vec<f64>,
    pub power: Vec<f64>,
    pub peaks: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    time: Vec<f64>,
    exptime: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    ra: Vec<f64>,
    dec: Vec<f64>,
    flux: Vec<f64>,
    flux_unc: Vec<f64>,
    apsum: Vec<f64>,
    apsum_unc: Vec<f64>,
    frame_index: Vec<usize>,

    /// Instrumental magnitudes; NaN where the flux was not positive
    #[serde(default, with = "nan_as_null")]
    pub mag: Vec<f64>,
    #[serde(default, with = "nan_as_null")]
    pub mag_unc: Vec<f64>,
    #[serde(default)]
    pub fit_flux: Vec<f64>,
    #[serde(default)]
    pub fit_times: Vec<f64>,
    /// Times of maximum light
    #[serde(default)]
    pub toml: Vec<f64>,
    #[serde(default)]
    pub omc: Vec<f64>,
    #[serde(default)]
    pub cycle: Vec<i64>,
    #[serde(default)]
    pub spectrum: Option<FrequencySpectrum>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from bare `(time, flux)` samples sharing one exposure
    /// time. Positions are zero and uncertainties are zero.
    pub fn from_light_curve(times: &[f64], flux: &[f64], exptime: f64) -> Result<Self> {
        if times.len() != flux.len() {
            return Err(DoradoError::InvalidInput(format!(
                "{} times but {} flux values",
                times.len(),
                flux.len()
            )));
        }
        let mut series = Self::new();
        for (i, (&time, &f)) in times.iter().zip(flux).enumerate() {
            series.push(TimeSeriesRecord {
                time,
                exptime,
                x: 0.0,
                y: 0.0,
                ra: 0.0,
                dec: 0.0,
                flux: f,
                flux_unc: 0.0,
                apsum: f * exptime,
                apsum_unc: 0.0,
                frame_index: i,
            });
        }
        Ok(series)
    }

    pub fn push(&mut self, record: TimeSeriesRecord) {
        self.time.push(record.time);
        self.exptime.push(record.exptime);
        self.x.push(record.x);
        self.y.push(record.y);
        self.ra.push(record.ra);
        self.dec.push(record.dec);
        self.flux.push(record.flux);
        self.flux_unc.push(record.flux_unc);
        self.apsum.push(record.apsum);
        self.apsum_unc.push(record.apsum_unc);
        self.frame_index.push(record.frame_index);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn exptime(&self) -> &[f64] {
        &self.exptime
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn ra(&self) -> &[f64] {
        &self.ra
    }

    pub fn dec(&self) -> &[f64] {
        &self.dec
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn flux_unc(&self) -> &[f64] {
        &self.flux_unc
    }

    pub fn apsum(&self) -> &[f64] {
        &self.apsum
    }

    pub fn apsum_unc(&self) -> &[f64] {
        &self.apsum_unc
    }

    pub fn frame_index(&self) -> &[usize] {
        &self.frame_index
    }

    /// Mean exposure time in days.
    pub fn mean_exptime_days(&self) -> f64 {
        mean(&self.exptime) / SECONDS_PER_DAY
    }

    /// Check that every raw column has the same length, as it must after
    /// loading from an untrusted source.
    pub fn check_lengths(&self) -> Result<()> {
        let n = self.time.len();
        let lengths = [
            self.exptime.len(),
            self.x.len(),
            self.y.len(),
            self.ra.len(),
            self.dec.len(),
            self.flux.len(),
            self.flux_unc.len(),
            self.apsum.len(),
            self.apsum_unc.len(),
            self.frame_index.len(),
        ];
        if lengths.iter().any(|&l| l != n) {
            return Err(DoradoError::InvalidInput(format!(
                "time series columns differ in length: time has {n}, others {lengths:?}"
            )));
        }
        Ok(())
    }
}

/// JSON has no NaN; undefined magnitudes travel as `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(values.iter().map(|v| v.is_finite().then_some(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        let values: Vec<Option<f64>> = Vec::deserialize(d)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_light_curve_rejects_ragged_input() {
        assert!(TimeSeries::from_light_curve(&[0.0, 1.0], &[1.0], 10.0).is_err());
    }

    #[test]
    fn push_keeps_columns_parallel() {
        let ts = TimeSeries::from_light_curve(&[0.0, 0.5, 1.0], &[3.0, 4.0, 5.0], 60.0).unwrap();
        assert_eq!(ts.len(), 3);
        assert_eq!(ts.flux(), &[3.0, 4.0, 5.0]);
        assert_eq!(ts.apsum(), &[180.0, 240.0, 300.0]);
        assert_eq!(ts.frame_index(), &[0, 1, 2]);
        ts.check_lengths().unwrap();
        assert!((ts.mean_exptime_days() - 60.0 / 86400.0).abs() < 1e-15);
    }
}
