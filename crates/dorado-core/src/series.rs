use std::sync::Arc;

use tracing::warn;

use crate::error::{DoradoError, Result};
use crate::filter::Filter;
use crate::frame::Frame;
use crate::pipeline::{PipelineStage, StageReport};
use crate::wcs::Wcs;

/// Ordered frames of one filter plus their reduction state.
///
/// `calibrated` and `aligned` only ever flip from false to true. When
/// `aligned` is set every frame shares the reference geometry.
#[derive(Clone, Debug)]
pub struct ImageSeries {
    filter: Filter,
    frames: Vec<Frame>,
    /// Master flat for this filter
    pub flat: Option<Frame>,
    /// Index of the reference frame used for plate solving and alignment
    pub align_to: usize,
    calibrated: bool,
    aligned: bool,
    wcs: Option<Arc<Wcs>>,
    solved: Option<Frame>,
    reports: Vec<StageReport>,
}

impl ImageSeries {
    pub fn new(filter: Filter, frames: Vec<Frame>) -> Self {
        Self {
            filter,
            frames,
            flat: None,
            align_to: 0,
            calibrated: false,
            aligned: false,
            wcs: None,
            solved: None,
            reports: Vec::new(),
        }
    }

    pub fn with_flat(mut self, flat: Frame) -> Self {
        self.flat = Some(flat);
        self
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    /// Shared WCS solution, if the series has been plate solved.
    pub fn wcs(&self) -> Option<Arc<Wcs>> {
        self.wcs.clone()
    }

    /// The frame returned by the plate solver, if it produced one.
    pub fn solved(&self) -> Option<&Frame> {
        self.solved.as_ref()
    }

    /// Reports from every per-frame stage run on this series, oldest first.
    pub fn reports(&self) -> &[StageReport] {
        &self.reports
    }

    /// Most recent report for `stage`.
    pub fn last_report(&self, stage: PipelineStage) -> Option<&StageReport> {
        self.reports.iter().rev().find(|r| r.stage == stage)
    }

    /// Resolve a reference index, falling back to the series' own `align_to`.
    pub fn reference_index(&self, align_to: Option<usize>) -> Result<usize> {
        let index = align_to.unwrap_or(self.align_to);
        if index >= self.frames.len() {
            return Err(DoradoError::FrameIndexOutOfRange {
                index,
                total: self.frames.len(),
            });
        }
        Ok(index)
    }

    /// Keep only the surviving frames, each paired with its index before
    /// the stage ran, and move `align_to` with its frame.
    ///
    /// When the reference frame itself was dropped, `align_to` falls back to
    /// the first survivor.
    pub(crate) fn replace_frames(&mut self, kept: Vec<(usize, Frame)>) {
        let reference = self.align_to;
        self.align_to = match kept.iter().position(|&(original, _)| original == reference) {
            Some(position) => position,
            None => {
                if !kept.is_empty() {
                    warn!(
                        filter = %self.filter,
                        dropped_reference = reference,
                        "Reference frame dropped, falling back to the first frame"
                    );
                }
                0
            }
        };
        self.frames = kept.into_iter().map(|(_, frame)| frame).collect();
    }

    pub(crate) fn mark_calibrated(&mut self) {
        self.calibrated = true;
    }

    pub(crate) fn mark_aligned(&mut self) {
        self.aligned = true;
    }

    pub(crate) fn attach_solution(&mut self, wcs: Wcs, solved: Option<Frame>) {
        self.wcs = Some(Arc::new(wcs));
        self.solved = solved;
    }

    pub(crate) fn push_report(&mut self, report: StageReport) {
        self.reports.push(report);
    }
}
