use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{DoradoError, Result};
use crate::filter::Filter;
use crate::frame::Frame;
use crate::pipeline::{PipelineStage, ProgressReporter};
use crate::series::ImageSeries;

use super::frame_file::{read_frame_file, write_frame_file};
use super::image_io::{load_image, save_image};

/// Named frame storage.
pub trait FrameStore {
    fn read(&self, name: &str) -> Result<Frame>;
    fn write(&self, name: &str, frame: &Frame) -> Result<()>;
    /// Names of every readable frame, sorted.
    fn list(&self) -> Result<Vec<String>>;
}

/// Frames stored as files in one directory. The extension picks the
/// format: `.dfr` round-trips everything, `.tif`/`.tiff`/`.png` keep pixels
/// only.
#[derive(Clone, Debug)]
pub struct DirectoryFrameStore {
    root: PathBuf,
}

impl DirectoryFrameStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every frame in `names` into a series for `filter`.
    pub fn read_series(
        &self,
        filter: Filter,
        names: &[String],
        reporter: &dyn ProgressReporter,
    ) -> Result<ImageSeries> {
        reporter.begin_stage(PipelineStage::Reading, Some(names.len()));
        let mut frames = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            frames.push(self.read(name)?);
            reporter.advance(i + 1);
        }
        reporter.finish_stage();
        info!(filter = %filter, frames = frames.len(), "Frames loaded");
        Ok(ImageSeries::new(filter, frames))
    }

    /// Write every frame of `series` as `{prefix}_{index:04}.dfr`.
    pub fn write_series(
        &self,
        series: &ImageSeries,
        prefix: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<String>> {
        fs::create_dir_all(&self.root)?;
        reporter.begin_stage(PipelineStage::Writing, Some(series.len()));
        let mut names = Vec::with_capacity(series.len());
        for (i, frame) in series.frames().iter().enumerate() {
            let name = format!("{prefix}_{i:04}.dfr");
            self.write(&name, frame)?;
            names.push(name);
            reporter.advance(i + 1);
        }
        reporter.finish_stage();
        Ok(names)
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

impl FrameStore for DirectoryFrameStore {
    fn read(&self, name: &str) -> Result<Frame> {
        let path = self.root.join(name);
        match extension(name).as_deref() {
            Some("dfr") => read_frame_file(&path),
            Some("tif" | "tiff" | "png") => load_image(&path),
            Some("fit" | "fits") => Err(DoradoError::InvalidFrameFile(format!(
                "{name}: FITS input is not supported, convert to .dfr"
            ))),
            _ => Err(DoradoError::InvalidFrameFile(format!(
                "{name}: unknown frame format"
            ))),
        }
    }

    fn write(&self, name: &str, frame: &Frame) -> Result<()> {
        let path = self.root.join(name);
        match extension(name).as_deref() {
            Some("dfr") => write_frame_file(&path, frame),
            Some("tif" | "tiff" | "png") => save_image(frame, &path),
            _ => Err(DoradoError::InvalidFrameFile(format!(
                "{name}: unknown frame format"
            ))),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if matches!(extension(&name).as_deref(), Some("dfr" | "tif" | "tiff" | "png")) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
