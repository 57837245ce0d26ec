use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::warn;

use crate::consts::PARALLEL_FRAME_THRESHOLD;
use crate::error::Result;
use crate::frame::Frame;

use super::types::{FrameFailure, PipelineStage, ProgressReporter, StageReport};

/// Run `op` on every frame, in parallel above the frame threshold.
///
/// Results come back in frame order whatever the scheduling was.
pub(crate) fn map_frames<T, F>(
    frames: &[Frame],
    reporter: &dyn ProgressReporter,
    op: F,
) -> Vec<Result<T>>
where
    T: Send,
    F: Fn(usize, &Frame) -> Result<T> + Send + Sync,
{
    let counter = AtomicUsize::new(0);
    let run = |(i, frame): (usize, &Frame)| {
        let result = op(i, frame);
        let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
        reporter.advance(done);
        result
    };

    if frames.len() >= PARALLEL_FRAME_THRESHOLD {
        frames.par_iter().enumerate().map(&run).collect()
    } else {
        frames.iter().enumerate().map(&run).collect()
    }
}

/// Split per-frame results into the surviving values (with their frame
/// index) and a stage report listing every failure.
pub(crate) fn split_outcomes<T>(
    stage: PipelineStage,
    results: Vec<Result<T>>,
) -> (Vec<(usize, T)>, StageReport) {
    let mut report = StageReport::new(stage);
    report.processed = results.len();
    let mut kept = Vec::with_capacity(results.len());

    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(value) => kept.push((index, value)),
            Err(e) => {
                warn!(stage = %stage, frame = index, reason = %e, "Frame dropped");
                report.failures.push(FrameFailure {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    (kept, report)
}
