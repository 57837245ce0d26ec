use std::path::Path;

use tracing::{debug, info};

use crate::error::{DoradoError, Result};
use crate::frame::Frame;
use crate::series::ImageSeries;
use crate::wcs::Wcs;

/// Output of a plate solve: the pixel/sky transform and, optionally, the
/// reference frame resampled by the solver.
#[derive(Clone, Debug)]
pub struct PlateSolution {
    pub wcs: Wcs,
    pub solved: Option<Frame>,
}

/// Derives a world-coordinate solution for a frame.
pub trait PlateSolver: Send + Sync {
    fn solve(&self, frame: &Frame, cache_dir: Option<&Path>) -> Result<PlateSolution>;
}

/// A previously stored plate solution.
///
/// Staleness is the caller's concern; nothing here checks that the cached
/// solution belongs to the series it is attached to.
pub trait SolutionCache {
    fn load(&self) -> Result<PlateSolution>;
}

/// Solver that always returns the same transform, for frames whose
/// geometry is known in advance.
#[derive(Clone, Debug)]
pub struct FixedSolver {
    pub wcs: Wcs,
}

impl PlateSolver for FixedSolver {
    fn solve(&self, frame: &Frame, _cache_dir: Option<&Path>) -> Result<PlateSolution> {
        let (w, h) = (self.wcs.naxis.0 as usize, self.wcs.naxis.1 as usize);
        if (w, h) != (frame.width(), frame.height()) {
            return Err(DoradoError::PlateSolve(format!(
                "solution is for {}x{}, frame is {}x{}",
                w,
                h,
                frame.width(),
                frame.height()
            )));
        }
        Ok(PlateSolution {
            wcs: self.wcs.clone(),
            solved: None,
        })
    }
}

/// Where a series gets its WCS from.
pub enum WcsSource<'a> {
    /// Run the solver on the reference frame.
    Solve {
        solver: &'a dyn PlateSolver,
        cache_dir: Option<&'a Path>,
    },
    /// Reuse a stored solution.
    Cached(&'a dyn SolutionCache),
}

/// Obtain a WCS for `series` and attach it, with the solved frame if any.
///
/// Failures are fatal for the series: a plate solve error propagates and
/// the series keeps whatever solution it had before.
pub fn solve_wcs(
    series: &mut ImageSeries,
    align_to: Option<usize>,
    source: WcsSource<'_>,
) -> Result<()> {
    if series.is_empty() {
        return Err(DoradoError::EmptySequence);
    }

    let solution = match source {
        WcsSource::Solve { solver, cache_dir } => {
            let index = series.reference_index(align_to)?;
            debug!(filter = %series.filter(), reference = index, "Plate solving");
            solver.solve(&series.frames()[index], cache_dir)?
        }
        WcsSource::Cached(cache) => {
            debug!(filter = %series.filter(), "Loading cached plate solution");
            cache.load()?
        }
    };

    let center = solution.wcs.pixel_to_sky(solution.wcs.crpix.0, solution.wcs.crpix.1);
    info!(
        filter = %series.filter(),
        ra = center.ra,
        dec = center.dec,
        scale_arcsec = solution.wcs.pixel_scale_arcsec(),
        "WCS attached"
    );
    series.attach_solution(solution.wcs, solution.solved);
    Ok(())
}
