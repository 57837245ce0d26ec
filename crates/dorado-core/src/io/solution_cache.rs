use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::align::{PlateSolution, SolutionCache};
use crate::error::{DoradoError, Result};
use crate::wcs::Wcs;

use super::frame_file::{read_frame_file, write_frame_file};

const SOLUTION_FILE: &str = "solution.json";
const SOLVED_FILE: &str = "solved.dfr";

/// Plate solution kept in a directory: `solution.json` holds the WCS and
/// `solved.dfr`, when present, the solver's resampled frame.
#[derive(Clone, Debug)]
pub struct DirectorySolutionCache {
    dir: PathBuf,
}

impl DirectorySolutionCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self, solution: &PlateSolution) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let w = BufWriter::new(File::create(self.dir.join(SOLUTION_FILE))?);
        serde_json::to_writer_pretty(w, &solution.wcs)?;

        let solved_path = self.dir.join(SOLVED_FILE);
        match &solution.solved {
            Some(frame) => write_frame_file(&solved_path, frame)?,
            None if solved_path.exists() => fs::remove_file(&solved_path)?,
            None => {}
        }
        debug!(dir = %self.dir.display(), "Plate solution cached");
        Ok(())
    }
}

impl SolutionCache for DirectorySolutionCache {
    fn load(&self) -> Result<PlateSolution> {
        let path = self.dir.join(SOLUTION_FILE);
        let file = File::open(&path).map_err(|e| {
            DoradoError::PlateSolve(format!("no cached solution at {}: {e}", path.display()))
        })?;
        let wcs: Wcs = serde_json::from_reader(BufReader::new(file))?;

        let solved_path = self.dir.join(SOLVED_FILE);
        let solved = if solved_path.exists() {
            Some(read_frame_file(&solved_path)?)
        } else {
            None
        };
        Ok(PlateSolution { wcs, solved })
    }
}
