use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::consts::{FIT_SPLINE_DEGREE, KNOT_SPLINE_DEGREE};
use crate::error::{DoradoError, Result};
use crate::filter::Filter;
use crate::pipeline::config::{AnalysisConfig, ExtremaConfig, FrequencyConfig, SampleSpacing, SuperfitParams};
use crate::pipeline::{PipelineStage, ProgressReporter};
use crate::stats::mean;
use crate::target::Target;
use crate::timeseries::{FrequencySpectrum, TimeSeries};

use super::fourier::{fftfreq, lowpass, power_spectrum};
use super::peaks::{find_peaks, refine_peak};
use super::smooth::smooth;
use super::spline::BSpline;

/// Linear ephemeris of a periodic event. Either part may be unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ephemeris {
    /// Reference time of maximum, MJD
    pub epoch: Option<f64>,
    /// Period in days
    pub period: Option<f64>,
}

impl Ephemeris {
    pub fn new(epoch: f64, period: f64) -> Self {
        Self {
            epoch: Some(epoch),
            period: Some(period),
        }
    }

    /// Both parts, or the name of the first missing one.
    pub fn require(&self) -> Result<(f64, f64)> {
        let epoch = self.epoch.ok_or(DoradoError::EphemerisMissing("epoch"))?;
        let period = self.period.ok_or(DoradoError::EphemerisMissing("period"))?;
        if !(period > 0.0) {
            return Err(DoradoError::InvalidInput(format!(
                "period must be positive, got {period}"
            )));
        }
        Ok((epoch, period))
    }
}

/// Period analysis over a target's light curves.
#[derive(Clone, Debug)]
pub struct Fournax {
    target: Target,
    ephemeris: Ephemeris,
    freq: Vec<f64>,
}

impl Fournax {
    pub fn new(target: Target, ephemeris: Ephemeris) -> Self {
        match (ephemeris.epoch, ephemeris.period) {
            (None, None) => warn!(target_name = target.name(), "No ephemeris given"),
            (Some(_), None) => warn!(target_name = target.name(), "Ephemeris has no period"),
            (None, Some(_)) => warn!(target_name = target.name(), "Ephemeris has no epoch"),
            (Some(_), Some(_)) => {}
        }
        Self {
            target,
            ephemeris,
            freq: Vec::new(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut Target {
        &mut self.target
    }

    pub fn into_target(self) -> Target {
        self.target
    }

    pub fn ephemeris(&self) -> &Ephemeris {
        &self.ephemeris
    }

    pub fn set_ephemeris(&mut self, ephemeris: Ephemeris) {
        self.ephemeris = ephemeris;
    }

    /// Positive frequencies of the last spectrum's peaks, strongest first,
    /// in cycles per day.
    pub fn freq(&self) -> &[f64] {
        &self.freq
    }

    pub fn series(&self, filter: Filter) -> Result<&TimeSeries> {
        self.target.series(filter)
    }

    /// Smooth the raw flux into `fit_times`/`fit_flux`.
    ///
    /// A Fourier low-pass of the flux fixes the knots (those of a degree-5
    /// interpolating spline through it); a cubic least-squares spline on
    /// those knots is fit to the raw flux, sampled at `samples` evenly spaced
    /// times, window-smoothed and trimmed back to `samples` points.
    pub fn superfit(&mut self, filter: Filter, params: &SuperfitParams) -> Result<()> {
        let ts = self.target.series_mut(filter)?;
        if params.samples < 2 {
            return Err(DoradoError::InvalidInput(format!(
                "superfit needs at least 2 output samples, got {}",
                params.samples
            )));
        }

        let times = ts.time();
        let flux = ts.flux();
        let smoothed = lowpass(flux, params.terms);
        let knot_spline = BSpline::interpolate(times, &smoothed, KNOT_SPLINE_DEGREE)?;
        let fit = BSpline::least_squares(
            times,
            flux,
            knot_spline.interior_knots(),
            FIT_SPLINE_DEGREE,
        )?;

        let fit_times = linspace(times[0], times[times.len() - 1], params.samples);
        let resampled = Array1::from(fit.eval_many(&fit_times));
        let windowed = smooth(&resampled, params.window_len, params.window)?;

        let excess = windowed.len() - fit_times.len();
        let lead = excess / 2;
        let fit_flux = windowed
            .iter()
            .skip(lead)
            .take(fit_times.len())
            .copied()
            .collect();

        debug!(
            filter = %filter,
            terms = params.terms,
            knots = knot_spline.interior_knots().len(),
            samples = params.samples,
            "Superfit"
        );
        ts.fit_flux = fit_flux;
        ts.fit_times = fit_times;
        Ok(())
    }

    /// Find times of maximum light.
    pub fn toml_find(&mut self, filter: Filter, config: &ExtremaConfig) -> Result<()> {
        let ts = self.target.series_mut(filter)?;
        let (times, values) = if config.use_fit && !ts.fit_flux.is_empty() {
            (ts.fit_times.as_slice(), ts.fit_flux.as_slice())
        } else {
            (ts.time(), ts.flux())
        };
        if values.is_empty() {
            return Err(DoradoError::InvalidInput(format!(
                "no flux to search for maxima in filter {filter}"
            )));
        }

        let height = config.height_factor * mean(values);
        let toml: Vec<f64> = find_peaks(values, Some(height))
            .into_iter()
            .map(|p| {
                if config.refine_vertex {
                    refine_peak(times, values, p)
                } else {
                    times[p]
                }
            })
            .collect();

        debug!(filter = %filter, maxima = toml.len(), height, "Times of maximum light");
        ts.toml = toml;
        Ok(())
    }

    /// Observed minus calculated times of maximum against the ephemeris.
    pub fn o_minus_c(&mut self, filter: Filter) -> Result<()> {
        let (epoch, period) = self.ephemeris.require()?;
        let ts = self.target.series_mut(filter)?;

        let (cycle, omc): (Vec<i64>, Vec<f64>) = ts
            .toml
            .iter()
            .map(|&t| {
                let cycle = ((t - epoch) / period).round_ties_even();
                (cycle as i64, t - (epoch + cycle * period))
            })
            .unzip();

        ts.cycle = cycle;
        ts.omc = omc;
        Ok(())
    }

    /// Power spectrum of the light curve and its peaks above mean power.
    pub fn four_find(&mut self, filter: Filter, config: &FrequencyConfig) -> Result<()> {
        let ts = self.target.series_mut(filter)?;
        let fitted = config.use_fit && !ts.fit_flux.is_empty();
        let values = if fitted { ts.fit_flux.as_slice() } else { ts.flux() };
        if values.len() < 2 {
            return Err(DoradoError::InvalidInput(format!(
                "need at least 2 samples for a spectrum in filter {filter}"
            )));
        }

        let spacing = match config.spacing {
            SampleSpacing::Auto if fitted => ts.fit_times[1] - ts.fit_times[0],
            _ => ts.mean_exptime_days(),
        };
        if !(spacing > 0.0) {
            return Err(DoradoError::InvalidInput(format!(
                "sample spacing must be positive, got {spacing} days"
            )));
        }

        let power = power_spectrum(values, config.remove_mean);
        let freq = fftfreq(values.len(), spacing);
        let peaks = find_peaks(&power, Some(mean(&power)));

        let mut positive: Vec<usize> = peaks.iter().copied().filter(|&p| freq[p] > 0.0).collect();
        positive.sort_by(|&a, &b| power[b].total_cmp(&power[a]));
        self.freq = positive.iter().map(|&p| freq[p]).collect();

        debug!(
            filter = %filter,
            spacing_days = spacing,
            peaks = peaks.len(),
            dominant = self.freq.first().copied(),
            "Frequency analysis"
        );
        ts.spectrum = Some(FrequencySpectrum { freq, power, peaks });
        Ok(())
    }

    /// Smoothing, maxima, O-C and frequency analysis, in that order.
    ///
    /// Fails before touching the series when the ephemeris is incomplete.
    /// Every step overwrites what an earlier run stored.
    pub fn analyze(
        &mut self,
        filter: Filter,
        config: &AnalysisConfig,
        reporter: &dyn ProgressReporter,
    ) -> Result<()> {
        self.ephemeris.require()?;
        let n = self.target.series(filter)?.len();
        let params = config.smoothing.resolve(n);

        reporter.begin_stage(PipelineStage::Smoothing, None);
        self.superfit(filter, &params)?;
        reporter.finish_stage();

        reporter.begin_stage(PipelineStage::Extrema, None);
        self.toml_find(filter, &config.extrema)?;
        reporter.finish_stage();

        reporter.begin_stage(PipelineStage::OMinusC, None);
        self.o_minus_c(filter)?;
        reporter.finish_stage();

        reporter.begin_stage(PipelineStage::Frequency, None);
        self.four_find(filter, &config.frequency)?;
        reporter.finish_stage();

        let ts = self.target.series(filter)?;
        info!(
            target_name = self.target.name(),
            filter = %filter,
            maxima = ts.toml.len(),
            dominant_freq = self.freq.first().copied(),
            "Period analysis complete"
        );
        Ok(())
    }
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
        .collect()
}
