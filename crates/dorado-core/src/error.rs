use thiserror::Error;

#[derive(Error, Debug)]
pub enum DoradoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid frame file: {0}")]
    InvalidFrameFile(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Unknown arithmetic operator: {0}")]
    UnknownOperator(String),

    #[error("No stack or time series for filter {0}")]
    FilterNotFound(String),

    #[error("Could not resolve target {name}: {reason}")]
    TargetResolution { name: String, reason: String },

    #[error("Calibration error: {0}")]
    Calibration(String),

    #[error("Plate solve failed: {0}")]
    PlateSolve(String),

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Photometry failed: {0}")]
    Photometry(String),

    #[error("Series for filter {0} has no WCS solution")]
    NotSolved(String),

    #[error("Ephemeris incomplete: {0} not set")]
    EphemerisMissing(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Empty frame sequence")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, DoradoError>;
