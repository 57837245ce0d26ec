pub mod arith;
mod master;

use ndarray::{Array2, Zip};
use tracing::{info, warn};

use crate::consts::FIXED_POINT_MAX;
use crate::error::{DoradoError, Result};
use crate::frame::Frame;
use crate::pipeline::config::{CalibrationConfig, FailurePolicy};
use crate::pipeline::helpers::{map_frames, split_outcomes};
use crate::pipeline::{PipelineStage, ProgressReporter, StageReport};
use crate::series::ImageSeries;

pub use arith::{imarith, Operand, Operator};
pub use master::master_frame;

/// Round and clamp pixel values onto the unsigned 16-bit grid.
pub fn to_fixed_point(data: &Array2<f32>) -> Array2<u16> {
    data.mapv(|v| {
        if v.is_nan() {
            0
        } else {
            v.round().clamp(0.0, FIXED_POINT_MAX) as u16
        }
    })
}

/// Bias-subtract and flat-divide a single frame.
///
/// All three arrays are coerced to the 16-bit grid before the arithmetic
/// and the result is cast back onto it. Flat pixels at or below zero leave
/// the pixel bias-subtracted only.
pub fn calibrate_frame(
    frame: &Array2<f32>,
    bias: &Array2<u16>,
    flat: &Array2<u16>,
    flat_scale: f32,
) -> Result<Array2<f32>> {
    if bias.dim() != frame.dim() {
        return Err(DoradoError::Calibration(format!(
            "bias is {:?}, frame is {:?}",
            bias.dim(),
            frame.dim()
        )));
    }
    if flat.dim() != frame.dim() {
        return Err(DoradoError::Calibration(format!(
            "flat is {:?}, frame is {:?}",
            flat.dim(),
            frame.dim()
        )));
    }

    let light = to_fixed_point(frame);
    let mut out = Array2::<f32>::zeros(frame.dim());
    Zip::from(&mut out)
        .and(&light)
        .and(bias)
        .and(flat)
        .for_each(|o, &v, &b, &f| {
            let corrected = v as f32 - b as f32;
            let divisor = f as f32 / flat_scale;
            let value = if divisor > 0.0 {
                corrected / divisor
            } else {
                corrected
            };
            *o = value.round().clamp(0.0, FIXED_POINT_MAX);
        });
    Ok(out)
}

/// Calibrate every frame of `series` against `bias` and the series' flat.
///
/// Per-frame failures (geometry mismatch) are isolated and counted, or abort
/// the whole call under [`FailurePolicy::Abort`]. On success the frame list
/// is replaced and the series is marked calibrated.
pub fn calibrate_series(
    series: &mut ImageSeries,
    bias: &Frame,
    config: &CalibrationConfig,
    reporter: &dyn ProgressReporter,
) -> Result<StageReport> {
    let flat = series.flat.as_ref().ok_or_else(|| {
        DoradoError::Calibration(format!("no flat for filter {}", series.filter()))
    })?;

    let bias_fixed = to_fixed_point(&bias.data);
    let flat_fixed = to_fixed_point(&flat.data);
    let flat_scale = if config.normalize_flat {
        let mean = flat_fixed.iter().map(|&v| v as f64).sum::<f64>() / flat_fixed.len().max(1) as f64;
        if mean <= 0.0 {
            return Err(DoradoError::Calibration("flat mean is zero".into()));
        }
        mean as f32
    } else {
        1.0
    };

    reporter.begin_stage(PipelineStage::Calibration, Some(series.len()));
    let results = map_frames(series.frames(), reporter, |_, frame| {
        calibrate_frame(&frame.data, &bias_fixed, &flat_fixed, flat_scale)
            .map(|data| frame.with_data(data))
    });

    if config.failure_policy == FailurePolicy::Abort {
        if let Some((index, Err(e))) = results.iter().enumerate().find(|(_, r)| r.is_err()) {
            reporter.finish_stage();
            return Err(DoradoError::Calibration(format!("frame {index}: {e}")));
        }
    }

    let (kept, report) = split_outcomes(PipelineStage::Calibration, results);
    series.replace_frames(kept);
    series.mark_calibrated();
    reporter.finish_stage();

    if report.is_complete() {
        info!(filter = %series.filter(), frames = report.processed, "Calibration complete");
    } else {
        warn!(
            filter = %series.filter(),
            calibrated = report.succeeded(),
            dropped = report.dropped(),
            "Calibration complete with dropped frames"
        );
    }
    series.push_report(report.clone());
    Ok(report)
}
