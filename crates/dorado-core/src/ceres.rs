use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::align::{align_series, solve_wcs, ImageRegistrar, WcsSource};
use crate::calibrate::{calibrate_series, imarith, Operand, Operator};
use crate::error::{DoradoError, Result};
use crate::filter::Filter;
use crate::frame::Frame;
use crate::photometry::{extract, PsfPhotometry};
use crate::pipeline::config::{AlignmentConfig, CalibrationConfig, PhotometryConfig};
use crate::pipeline::{ProgressReporter, StageReport};
use crate::series::ImageSeries;
use crate::target::Target;
use crate::wcs::SkyCoord;

/// One observation night: a shared bias frame and one image series per
/// filter.
#[derive(Clone, Debug)]
pub struct Ceres {
    night_mjd: i64,
    date_str: Option<String>,
    /// Master bias shared by every filter
    pub bias: Option<Frame>,
    stacks: BTreeMap<Filter, ImageSeries>,
}

impl Ceres {
    pub fn new(night_mjd: i64) -> Self {
        Self {
            night_mjd,
            date_str: None,
            bias: None,
            stacks: BTreeMap::new(),
        }
    }

    /// Night containing the observation time `mjd`.
    pub fn for_observation(mjd: f64) -> Self {
        Self::new(mjd.floor() as i64)
    }

    pub fn with_bias(mut self, bias: Frame) -> Self {
        self.bias = Some(bias);
        self
    }

    pub fn with_date_str(mut self, date: impl Into<String>) -> Self {
        self.date_str = Some(date.into());
        self
    }

    pub fn night_mjd(&self) -> i64 {
        self.night_mjd
    }

    /// Directory name for the night: the date string when one was given,
    /// the integer MJD otherwise.
    pub fn date_str(&self) -> String {
        self.date_str
            .clone()
            .unwrap_or_else(|| self.night_mjd.to_string())
    }

    pub fn filters(&self) -> impl Iterator<Item = Filter> + '_ {
        self.stacks.keys().copied()
    }

    /// Add a series under its own filter, returning any series it replaces.
    pub fn add_stack(&mut self, series: ImageSeries) -> Option<ImageSeries> {
        let filter = series.filter();
        debug!(filter = %filter, frames = series.len(), "Adding stack");
        self.stacks.insert(filter, series)
    }

    pub fn rem_stack(&mut self, filter: Filter) -> Result<ImageSeries> {
        self.stacks
            .remove(&filter)
            .ok_or_else(|| DoradoError::FilterNotFound(filter.to_string()))
    }

    pub fn stack(&self, filter: Filter) -> Result<&ImageSeries> {
        self.stacks
            .get(&filter)
            .ok_or_else(|| DoradoError::FilterNotFound(filter.to_string()))
    }

    pub fn stack_mut(&mut self, filter: Filter) -> Result<&mut ImageSeries> {
        self.stacks
            .get_mut(&filter)
            .ok_or_else(|| DoradoError::FilterNotFound(filter.to_string()))
    }

    /// Bias-subtract and flat-divide one filter's frames.
    pub fn calibrate(
        &mut self,
        filter: Filter,
        config: &CalibrationConfig,
        reporter: &dyn ProgressReporter,
    ) -> Result<StageReport> {
        let bias = self
            .bias
            .as_ref()
            .ok_or_else(|| DoradoError::Calibration("night has no bias frame".into()))?;
        let series = self
            .stacks
            .get_mut(&filter)
            .ok_or_else(|| DoradoError::FilterNotFound(filter.to_string()))?;
        calibrate_series(series, bias, config, reporter)
    }

    pub fn imarith(&mut self, filter: Filter, op: Operator, operand: Operand<'_>) -> Result<()> {
        imarith(self.stack_mut(filter)?.frames_mut(), op, operand)
    }

    /// Attach a WCS to one filter's series, solving or loading from cache.
    pub fn solve_wcs(
        &mut self,
        filter: Filter,
        source: WcsSource<'_>,
        align_to: Option<usize>,
    ) -> Result<()> {
        solve_wcs(self.stack_mut(filter)?, align_to, source)
    }

    /// Register every frame of one filter onto its reference, optionally
    /// obtaining the WCS first. Frames that fail to register are dropped.
    pub fn align(
        &mut self,
        filter: Filter,
        registrar: &dyn ImageRegistrar,
        wcs: Option<WcsSource<'_>>,
        config: &AlignmentConfig,
        reporter: &dyn ProgressReporter,
    ) -> Result<StageReport> {
        let series = self.stack_mut(filter)?;
        if let Some(source) = wcs {
            solve_wcs(series, config.align_to, source)?;
        }
        align_series(series, registrar, config.align_to, reporter)
    }

    /// Extract a light curve for `target` from one filter and store it on
    /// the target, replacing any earlier one.
    pub fn photometry(
        &mut self,
        filter: Filter,
        engine: &dyn PsfPhotometry,
        target: &mut Target,
        control: Option<&SkyCoord>,
        config: &PhotometryConfig,
        reporter: &dyn ProgressReporter,
    ) -> Result<StageReport> {
        let series = self.stack_mut(filter)?;
        let (timeseries, report) =
            extract(series, engine, target.coords(), control, config, reporter)?;
        series.push_report(report.clone());
        info!(
            target_name = target.name(),
            filter = %filter,
            points = timeseries.len(),
            "Light curve stored"
        );
        target.insert(filter, timeseries);
        Ok(report)
    }
}
