use std::fmt;

/// Pipeline processing stage, used for progress reporting and stage reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Reading,
    Calibration,
    PlateSolve,
    Alignment,
    Photometry,
    Smoothing,
    Extrema,
    OMinusC,
    Frequency,
    Writing,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading frames"),
            Self::Calibration => write!(f, "Calibrating"),
            Self::PlateSolve => write!(f, "Plate solving"),
            Self::Alignment => write!(f, "Aligning frames"),
            Self::Photometry => write!(f, "PSF photometry"),
            Self::Smoothing => write!(f, "Smoothing light curve"),
            Self::Extrema => write!(f, "Finding maxima"),
            Self::OMinusC => write!(f, "Computing O-C"),
            Self::Frequency => write!(f, "Frequency analysis"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Receives stage and per-frame progress from a reduction.
///
/// Called from worker threads during parallel stages. Every method does
/// nothing by default.
pub trait ProgressReporter: Send + Sync {
    /// `total_items` is the frame count for per-frame stages, `None` for
    /// single-step stages such as the analysis steps.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` frames of the current stage are finished.
    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

/// Progress reporter that ignores everything.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// A frame that failed inside a per-frame stage.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameFailure {
    /// Index of the frame in the series as it was when the stage started
    pub index: usize,
    pub reason: String,
}

/// Summary of one per-frame stage run.
///
/// Per-frame failures never abort a stage; they end up here so callers can
/// detect an under-populated series.
#[derive(Clone, Debug, PartialEq)]
pub struct StageReport {
    pub stage: PipelineStage,
    /// Number of frames the stage attempted
    pub processed: usize,
    pub failures: Vec<FrameFailure>,
}

impl StageReport {
    pub fn new(stage: PipelineStage) -> Self {
        Self {
            stage,
            processed: 0,
            failures: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.processed - self.failures.len()
    }

    /// Number of frames dropped or left without output.
    pub fn dropped(&self) -> usize {
        self.failures.len()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}/{} frames", self.stage, self.succeeded(), self.processed)?;
        if !self.failures.is_empty() {
            write!(f, " ({} dropped: {:?})", self.dropped(), self.failed_indices())?;
        }
        Ok(())
    }
}
