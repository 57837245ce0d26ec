/// Minimum frame count to use frame-level Rayon parallelism.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Largest value of the unsigned 16-bit fixed-point pixel grid used for calibration.
pub const FIXED_POINT_MAX: f32 = 65_535.0;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;

/// Seconds in one day, for converting exposure times to time-axis units.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Scale factor turning a median absolute deviation into a Gaussian sigma.
pub const MAD_TO_SIGMA: f64 = 1.482_602_218_505_602;

/// Default Gaussian PSF sigma in pixels.
pub const DEFAULT_PSF_SIGMA: f64 = 2.0;

/// Default source finder FWHM in pixels.
pub const DEFAULT_FINDER_FWHM: f64 = 4.0;

/// Default detection threshold, in units of the MAD background sigma.
pub const DEFAULT_DETECTION_SIGMA: f64 = 3.0;

/// Default side length of the square PSF fit window in pixels.
pub const DEFAULT_FIT_SHAPE: usize = 21;

/// Default number of fit/subtract iterations of the PSF photometry.
pub const DEFAULT_PSF_ITERATIONS: usize = 1;

/// Default instrumental magnitude zero-point flux.
pub const DEFAULT_ZERO_POINT: f64 = 15.0;

/// Default smoothing window length in samples.
pub const DEFAULT_WINDOW_LEN: usize = 11;

/// Degree of the interpolating spline used to place knots.
pub const KNOT_SPLINE_DEGREE: usize = 5;

/// Degree of the least-squares spline fitted to the raw light curve.
pub const FIT_SPLINE_DEGREE: usize = 3;

/// Default peak height threshold as a multiple of the mean flux.
pub const DEFAULT_PEAK_HEIGHT_FACTOR: f64 = 1.1;

/// Default maximum registration shift, as a fraction of the smaller frame side.
pub const DEFAULT_MAX_SHIFT_FRACTION: f64 = 0.45;
