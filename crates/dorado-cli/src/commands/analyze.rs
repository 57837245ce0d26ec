use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use dorado_core::analysis::{Ephemeris, Fournax};
use dorado_core::filter::Filter;
use dorado_core::io::{read_timeseries, write_timeseries, SeriesFormat};
use dorado_core::target::Target;
use dorado_core::wcs::SkyCoord;

use super::load_config;
use crate::progress::BarReporter;
use crate::summary::print_analysis;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Light curve JSON written by `dorado reduce`
    pub file: PathBuf,

    /// Filter the light curve was measured in
    #[arg(short, long)]
    pub filter: Filter,

    /// Ephemeris epoch of maximum light (MJD)
    #[arg(long)]
    pub epoch: Option<f64>,

    /// Ephemeris period (days)
    #[arg(long)]
    pub period: Option<f64>,

    /// Fourier terms kept before placing spline knots
    #[arg(long)]
    pub terms: Option<usize>,

    /// Samples in the smoothed curve
    #[arg(long)]
    pub samples: Option<usize>,

    /// Reduction config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the analysed light curve here (.json or .csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.terms.is_some() {
        config.analysis.smoothing.terms = args.terms;
    }
    if args.samples.is_some() {
        config.analysis.smoothing.samples = args.samples;
    }

    let ts = read_timeseries(&args.file)
        .with_context(|| format!("Failed to read light curve {}", args.file.display()))?;
    let coords = SkyCoord::new(
        ts.ra().first().copied().unwrap_or_default(),
        ts.dec().first().copied().unwrap_or_default(),
    );
    let mut target = Target::new(target_name(&args.file), coords);
    target.insert(args.filter, ts);

    let ephemeris = Ephemeris {
        epoch: args.epoch,
        period: args.period,
    };
    let mut fournax = Fournax::new(target, ephemeris);
    fournax
        .analyze(args.filter, &config.analysis, &BarReporter::new())
        .context("Period analysis failed")?;

    let ts = fournax.series(args.filter)?;
    print_analysis(&fournax, args.filter, ts);

    if let Some(ref path) = args.output {
        write_timeseries(path, ts, SeriesFormat::from_path(path)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Light curve saved to {}", path.display());
    }
    Ok(())
}

/// `RRLyr_V-60234.json` names target `RRLyr`.
fn target_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("target");
    match stem.rsplit_once('_') {
        Some((name, _)) if !name.is_empty() => name.to_string(),
        _ => stem.to_string(),
    }
}
