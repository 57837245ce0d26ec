use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use dorado_core::align::{PhaseCorrelationRegistrar, WcsSource};
use dorado_core::calibrate::master_frame;
use dorado_core::ceres::Ceres;
use dorado_core::filter::Filter;
use dorado_core::frame::Frame;
use dorado_core::io::{
    DirectoryFrameStore, DirectorySolutionCache, FrameStore, NightLayout, SeriesFormat,
};
use dorado_core::photometry::GaussianPsfPhotometry;
use dorado_core::pipeline::ProgressReporter;
use dorado_core::series::ImageSeries;
use dorado_core::target::{StaticCatalog, Target};
use dorado_core::wcs::SkyCoord;
use tracing::{info, warn};

use super::{file_names, load_config};
use crate::progress::BarReporter;
use crate::summary::{print_reduce_summary, print_reports, ReduceSummary};

#[derive(Args)]
pub struct ReduceArgs {
    /// Night directory holding bias, flat and light frames
    pub night: PathBuf,

    /// Filter of the light frames to reduce
    #[arg(short, long)]
    pub filter: Filter,

    /// Directory holding the cached plate solution
    #[arg(long)]
    pub wcs: PathBuf,

    /// Target name, used in output file names
    #[arg(short, long)]
    pub target: String,

    /// Target right ascension, sexagesimal hours ("19 25 27.9")
    #[arg(long, allow_hyphen_values = true)]
    pub ra: Option<String>,

    /// Target declination, sexagesimal degrees ("+42 47 03.7")
    #[arg(long, allow_hyphen_values = true)]
    pub dec: Option<String>,

    /// Control star right ascension for differential photometry
    #[arg(long, allow_hyphen_values = true, requires = "control_dec")]
    pub control_ra: Option<String>,

    /// Control star declination for differential photometry
    #[arg(long, allow_hyphen_values = true, requires = "control_ra")]
    pub control_dec: Option<String>,

    /// Reduction config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reference frame index for alignment
    #[arg(long)]
    pub align_to: Option<usize>,

    /// Light curve format
    #[arg(long, default_value = "json")]
    pub format: SeriesFormat,

    /// Also write calibrated and aligned frames under wrk/
    #[arg(long)]
    pub save_frames: bool,
}

pub fn run(args: &ReduceArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.align_to.is_some() {
        config.alignment.align_to = args.align_to;
    }
    let filter = args.filter;

    let layout = NightLayout::new(&args.night);
    let listing = layout
        .scan()
        .with_context(|| format!("Failed to list {}", args.night.display()))?;
    if listing.lights.is_empty() {
        bail!("No light frames in {}", args.night.display());
    }
    layout.create().context("Failed to create working directories")?;

    let mut target = resolve_target(args)?;
    let control = match (&args.control_ra, &args.control_dec) {
        (Some(ra), Some(dec)) => {
            Some(SkyCoord::from_sexagesimal(ra, dec).context("Invalid control star position")?)
        }
        _ => None,
    };

    print_reduce_summary(
        &ReduceSummary {
            night: &args.night,
            filter,
            target: target.name(),
            lights: listing.lights.len(),
            bias: listing.bias.len(),
            flats: listing.flats.len(),
            differential: control.is_some(),
        },
        &config,
    );

    let reporter = BarReporter::new();
    let store = DirectoryFrameStore::new(layout.root());
    let bias = read_master(&store, &listing.bias, "bias")?;
    let flat = read_master(&store, &listing.flats, "flat")?;
    let lights = read_lights(&store, filter, &listing.lights, &reporter)?;

    let first_mjd = lights.frames()[0].header().date_obs;
    let mut ceres = Ceres::for_observation(first_mjd).with_bias(bias);
    ceres.add_stack(lights.with_flat(flat));
    let mut reports = Vec::new();

    reports.push(
        ceres
            .calibrate(filter, &config.calibration, &reporter)
            .context("Calibration failed")?,
    );
    if args.save_frames {
        DirectoryFrameStore::new(layout.calibrated_dir()).write_series(
            ceres.stack(filter)?,
            filter.as_str(),
            &reporter,
        )?;
    }

    let registrar = PhaseCorrelationRegistrar {
        max_shift_fraction: config.alignment.max_shift_fraction,
    };
    let cache = DirectorySolutionCache::new(&args.wcs);
    reports.push(
        ceres
            .align(
                filter,
                &registrar,
                Some(WcsSource::Cached(&cache)),
                &config.alignment,
                &reporter,
            )
            .context("Alignment failed")?,
    );
    if args.save_frames {
        DirectoryFrameStore::new(layout.aligned_dir()).write_series(
            ceres.stack(filter)?,
            filter.as_str(),
            &reporter,
        )?;
    }

    reports.push(
        ceres
            .photometry(
                filter,
                &GaussianPsfPhotometry,
                &mut target,
                control.as_ref(),
                &config.photometry,
                &reporter,
            )
            .context("Photometry failed")?,
    );
    target.calc_mag(filter, config.analysis.zero_point)?;

    let written = target
        .record(&layout, ceres.night_mjd(), args.format)
        .context("Failed to write light curve")?;

    print_reports(&reports);
    for path in written {
        println!("Light curve saved to {}", path.display());
    }
    Ok(())
}

fn resolve_target(args: &ReduceArgs) -> Result<Target> {
    let mut catalog = StaticCatalog::new();
    if let (Some(ra), Some(dec)) = (&args.ra, &args.dec) {
        let coords = SkyCoord::from_sexagesimal(ra, dec).context("Invalid target position")?;
        catalog.insert(&args.target, coords);
    }
    Target::resolve(&args.target, &catalog).context("Give the target position with --ra and --dec")
}

fn read_master(store: &DirectoryFrameStore, paths: &[PathBuf], kind: &str) -> Result<Frame> {
    if paths.is_empty() {
        bail!("No {kind} frames in the night directory");
    }
    let frames = file_names(paths)
        .iter()
        .map(|name| {
            store
                .read(name)
                .with_context(|| format!("Failed to read {kind} frame {name}"))
        })
        .collect::<Result<Vec<_>>>()?;
    let master = master_frame(&frames).with_context(|| format!("Failed to combine {kind} frames"))?;
    info!(kind, frames = frames.len(), "Master frame ready");
    Ok(master)
}

fn read_lights(
    store: &DirectoryFrameStore,
    filter: Filter,
    paths: &[PathBuf],
    reporter: &dyn ProgressReporter,
) -> Result<ImageSeries> {
    let series = store
        .read_series(filter, &file_names(paths), reporter)
        .context("Failed to read light frames")?;

    let other = |f: &Frame| f.header().filter.is_some_and(|band| band != filter);
    let skipped = series.frames().iter().filter(|&f| other(f)).count();
    let series = if skipped > 0 {
        warn!(filter = %filter, skipped, "Light frames taken through another filter skipped");
        let kept = series.frames().iter().filter(|&f| !other(f)).cloned().collect();
        ImageSeries::new(filter, kept)
    } else {
        series
    };

    if series.is_empty() {
        bail!("No light frames taken through filter {filter}");
    }
    Ok(series)
}
