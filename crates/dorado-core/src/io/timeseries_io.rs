use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DoradoError, Result};
use crate::timeseries::TimeSeries;

/// On-disk format of a light curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesFormat {
    /// Every column, raw and derived
    #[default]
    Json,
    /// Raw columns plus magnitudes, one row per measurement
    Csv,
}

impl SeriesFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                DoradoError::InvalidInput(format!("{} has no extension", path.display()))
            })?
            .parse()
    }
}

impl fmt::Display for SeriesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SeriesFormat {
    type Err = DoradoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(DoradoError::InvalidInput(format!(
                "unsupported time series format: {other}"
            ))),
        }
    }
}

pub fn write_timeseries(path: &Path, series: &TimeSeries, format: SeriesFormat) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    match format {
        SeriesFormat::Json => serde_json::to_writer_pretty(&mut w, series)?,
        SeriesFormat::Csv => write_csv(&mut w, series)?,
    }
    w.flush()?;
    Ok(())
}

/// Load a JSON light curve, checking that its columns line up.
pub fn read_timeseries(path: &Path) -> Result<TimeSeries> {
    match SeriesFormat::from_path(path)? {
        SeriesFormat::Json => {
            let series: TimeSeries = serde_json::from_reader(BufReader::new(File::open(path)?))?;
            series.check_lengths()?;
            Ok(series)
        }
        SeriesFormat::Csv => Err(DoradoError::InvalidInput(
            "CSV light curves are write-only; use JSON".into(),
        )),
    }
}

fn write_csv(w: &mut impl Write, series: &TimeSeries) -> Result<()> {
    let with_mag = series.mag.len() == series.len() && !series.is_empty();
    write!(w, "time,exptime,x,y,ra,dec,flux,flux_unc,apsum,apsum_unc,frame_index")?;
    if with_mag {
        write!(w, ",mag,mag_unc")?;
    }
    writeln!(w)?;

    for i in 0..series.len() {
        write!(
            w,
            "{},{},{},{},{},{},{},{},{},{},{}",
            series.time()[i],
            series.exptime()[i],
            series.x()[i],
            series.y()[i],
            series.ra()[i],
            series.dec()[i],
            series.flux()[i],
            series.flux_unc()[i],
            series.apsum()[i],
            series.apsum_unc()[i],
            series.frame_index()[i],
        )?;
        if with_mag {
            write!(w, ",{},{}", series.mag[i], series.mag_unc[i])?;
        }
        writeln!(w)?;
    }
    Ok(())
}
