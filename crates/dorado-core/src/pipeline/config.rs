use serde::{Deserialize, Serialize};

use crate::analysis::smooth::Window;
use crate::consts::{
    DEFAULT_DETECTION_SIGMA, DEFAULT_FINDER_FWHM, DEFAULT_FIT_SHAPE, DEFAULT_MAX_SHIFT_FRACTION,
    DEFAULT_PEAK_HEIGHT_FACTOR, DEFAULT_PSF_ITERATIONS, DEFAULT_PSF_SIGMA, DEFAULT_WINDOW_LEN,
    DEFAULT_ZERO_POINT,
};

/// Settings for a full night reduction, from calibration to period analysis.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReductionConfig {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub photometry: PhotometryConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// What a per-frame calibration failure does to the rest of the series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Drop the frame, count it, keep going.
    #[default]
    Isolate,
    /// Abort the stage on the first failure and leave the series untouched.
    Abort,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Isolate => write!(f, "Isolate"),
            Self::Abort => write!(f, "Abort"),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Divide by the flat normalized to its mean instead of the raw flat.
    #[serde(default)]
    pub normalize_flat: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Reference frame index. `None` uses the series' own `align_to`.
    #[serde(default)]
    pub align_to: Option<usize>,
    /// Largest accepted shift as a fraction of the smaller frame side.
    pub max_shift_fraction: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            align_to: None,
            max_shift_fraction: DEFAULT_MAX_SHIFT_FRACTION,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhotometryConfig {
    /// Gaussian PSF sigma in pixels.
    pub psf_sigma: f64,
    /// FWHM used by the source finder in pixels.
    pub finder_fwhm: f64,
    /// Detection threshold in units of the MAD background sigma.
    pub detection_sigma: f64,
    /// Side of the square fit window in pixels (odd).
    pub fit_shape: usize,
    /// Fit/subtract iterations; extra iterations fit sources found in the residual.
    pub iterations: usize,
}

impl Default for PhotometryConfig {
    fn default() -> Self {
        Self {
            psf_sigma: DEFAULT_PSF_SIGMA,
            finder_fwhm: DEFAULT_FINDER_FWHM,
            detection_sigma: DEFAULT_DETECTION_SIGMA,
            fit_shape: DEFAULT_FIT_SHAPE,
            iterations: DEFAULT_PSF_ITERATIONS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub extrema: ExtremaConfig,
    #[serde(default)]
    pub frequency: FrequencyConfig,
    /// Flux that maps to instrumental magnitude 0.
    pub zero_point: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingConfig::default(),
            extrema: ExtremaConfig::default(),
            frequency: FrequencyConfig::default(),
            zero_point: DEFAULT_ZERO_POINT,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Fourier terms kept by the low-pass step. `None` = a third of the samples.
    #[serde(default)]
    pub terms: Option<usize>,
    /// Size of the resampled fit. `None` = same as the input.
    #[serde(default)]
    pub samples: Option<usize>,
    pub window: Window,
    pub window_len: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            terms: None,
            samples: None,
            window: Window::Hanning,
            window_len: DEFAULT_WINDOW_LEN,
        }
    }
}

impl SmoothingConfig {
    /// Concrete superfit parameters for a light curve of `n` samples.
    pub fn resolve(&self, n: usize) -> SuperfitParams {
        SuperfitParams {
            terms: self.terms.unwrap_or(n / 3),
            samples: self.samples.unwrap_or(n),
            window: self.window,
            window_len: self.window_len,
        }
    }
}

/// Fully resolved smoothing parameters for one superfit run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SuperfitParams {
    pub terms: usize,
    pub samples: usize,
    pub window: Window,
    pub window_len: usize,
}

impl SuperfitParams {
    pub fn new(terms: usize, samples: usize) -> Self {
        Self {
            terms,
            samples,
            window: Window::Hanning,
            window_len: DEFAULT_WINDOW_LEN,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtremaConfig {
    /// Maxima must reach `height_factor * mean(flux)`.
    pub height_factor: f64,
    /// Refine each maximum with a three-point parabola through its
    /// neighbours. Off by default so `toml` holds sample times.
    pub refine_vertex: bool,
    /// Search the fitted curve when one exists.
    pub use_fit: bool,
}

impl Default for ExtremaConfig {
    fn default() -> Self {
        Self {
            height_factor: DEFAULT_PEAK_HEIGHT_FACTOR,
            refine_vertex: false,
            use_fit: true,
        }
    }
}

/// Sample spacing used for the frequency axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleSpacing {
    /// Mean exposure time for raw flux, the resampled cadence for the fit.
    Auto,
    /// Always the mean exposure time.
    #[default]
    MeanExposure,
}

impl std::fmt::Display for SampleSpacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::MeanExposure => write!(f, "Mean Exposure"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrequencyConfig {
    #[serde(default)]
    pub spacing: SampleSpacing,
    /// Subtract the mean flux before the transform.
    pub remove_mean: bool,
    /// Transform the fitted curve when one exists.
    pub use_fit: bool,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            spacing: SampleSpacing::MeanExposure,
            remove_mean: false,
            use_fit: true,
        }
    }
}
