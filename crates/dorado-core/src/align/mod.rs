pub mod phase_correlation;
mod registrar;
mod solve;
pub mod subpixel;

pub use phase_correlation::{bilinear_sample, compute_offset, shift_array, PhaseCorrelationRegistrar};
pub use registrar::{align_series, ImageRegistrar};
pub use solve::{solve_wcs, FixedSolver, PlateSolution, PlateSolver, SolutionCache, WcsSource};
