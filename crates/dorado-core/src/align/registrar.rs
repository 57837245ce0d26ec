use ndarray::Array2;
use tracing::{info, warn};

use crate::error::{DoradoError, Result};
use crate::frame::Frame;
use crate::pipeline::helpers::{map_frames, split_outcomes};
use crate::pipeline::{PipelineStage, ProgressReporter, StageReport};
use crate::series::ImageSeries;

/// Warps a target image onto the pixel geometry of a reference image.
pub trait ImageRegistrar: Send + Sync {
    fn register(&self, reference: &Array2<f32>, target: &Array2<f32>) -> Result<Array2<f32>>;
}

/// Align every frame of `series` onto its reference.
///
/// The reference is the plate-solved frame when one is attached, otherwise
/// the frame at `align_to` (falling back to the series' own index). Frames
/// that fail to register are dropped and listed in the returned report. The
/// series is marked aligned even if nothing survives.
pub fn align_series(
    series: &mut ImageSeries,
    registrar: &dyn ImageRegistrar,
    align_to: Option<usize>,
    reporter: &dyn ProgressReporter,
) -> Result<StageReport> {
    if series.is_empty() {
        return Err(DoradoError::EmptySequence);
    }

    let (reference, skip) = match series.solved() {
        Some(solved) => (solved.data.clone(), None),
        None => {
            let index = series.reference_index(align_to)?;
            (series.frames()[index].data.clone(), Some(index))
        }
    };

    reporter.begin_stage(PipelineStage::Alignment, Some(series.len()));
    let results = map_frames(series.frames(), reporter, |i, frame| -> Result<Frame> {
        if skip == Some(i) {
            return Ok(frame.clone());
        }
        registrar
            .register(&reference, &frame.data)
            .map(|data| frame.with_data(data))
    });
    reporter.finish_stage();

    let (kept, report) = split_outcomes(PipelineStage::Alignment, results);
    series.replace_frames(kept);
    series.mark_aligned();

    if report.is_complete() {
        info!(filter = %series.filter(), frames = report.processed, "Alignment complete");
    } else {
        warn!(
            filter = %series.filter(),
            aligned = report.succeeded(),
            dropped = report.dropped(),
            failed = ?report.failed_indices(),
            "Alignment complete with dropped frames"
        );
    }
    series.push_report(report.clone());
    Ok(report)
}
