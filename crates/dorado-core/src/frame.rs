use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::filter::Filter;

/// A single grayscale exposure.
/// Pixel values are f32 ADU counts.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Acquisition metadata, fixed at ingestion
    header: FrameHeader,
}

impl Frame {
    pub fn new(data: Array2<f32>, header: FrameHeader) -> Self {
        Self { data, header }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Same header, new pixels. Used by stages that resample or correct pixel data.
    pub fn with_data(&self, data: Array2<f32>) -> Self {
        Self {
            data,
            header: self.header.clone(),
        }
    }
}

/// Acquisition metadata carried by every frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Start of exposure as Modified Julian Date (days)
    pub date_obs: f64,
    /// Exposure time in seconds
    pub exptime: f64,
    pub filter: Option<Filter>,
    /// Sensor bit depth (8..=16)
    pub bit_depth: u8,
}

impl Default for FrameHeader {
    fn default() -> Self {
        Self {
            date_obs: 0.0,
            exptime: 0.0,
            filter: None,
            bit_depth: 16,
        }
    }
}

/// Translation of a frame relative to a reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlignmentOffset {
    pub dx: f64,
    pub dy: f64,
}
