use tracing::{info, warn};

use crate::error::{DoradoError, Result};
use crate::pipeline::config::PhotometryConfig;
use crate::pipeline::helpers::{map_frames, split_outcomes};
use crate::pipeline::{PipelineStage, ProgressReporter, StageReport};
use crate::series::ImageSeries;
use crate::stats::mad_std_pixels;
use crate::timeseries::{TimeSeries, TimeSeriesRecord};
use crate::wcs::SkyCoord;

use super::psf::{PsfPhotometry, PsfRequest, SourceFit};

/// Run PSF photometry on every frame of a solved series.
///
/// With a `control` star the flux is differential (target minus control),
/// otherwise absolute; either way it is divided by the frame's exposure
/// time. Frames that fail are absent from the returned series and listed in
/// the report.
pub fn extract(
    series: &ImageSeries,
    engine: &dyn PsfPhotometry,
    target: &SkyCoord,
    control: Option<&SkyCoord>,
    config: &PhotometryConfig,
    reporter: &dyn ProgressReporter,
) -> Result<(TimeSeries, StageReport)> {
    let wcs = series
        .wcs()
        .ok_or_else(|| DoradoError::NotSolved(series.filter().to_string()))?;
    let first = series.frames().first().ok_or(DoradoError::EmptySequence)?;

    let to_index = |coord: &SkyCoord| -> Result<(f64, f64)> {
        let (x, y) = wcs.sky_to_pixel(coord)?;
        Ok((x - 1.0, y - 1.0))
    };
    let mut positions = vec![to_index(target)?];
    if let Some(control) = control {
        positions.push(to_index(control)?);
    }

    let threshold = config.detection_sigma * mad_std_pixels(&first.data);
    let request = PsfRequest {
        positions: &positions,
        sigma: config.psf_sigma,
        fwhm: config.finder_fwhm,
        threshold,
        fit_shape: config.fit_shape,
        niters: config.iterations,
    };
    info!(
        filter = %series.filter(),
        x = positions[0].0,
        y = positions[0].1,
        differential = control.is_some(),
        threshold,
        "Starting photometry"
    );

    reporter.begin_stage(PipelineStage::Photometry, Some(series.len()));
    let results = map_frames(series.frames(), reporter, |i, frame| {
        let exptime = frame.header().exptime;
        if exptime <= 0.0 {
            return Err(DoradoError::Photometry(format!(
                "non-positive exposure time {exptime}"
            )));
        }

        let fits = engine.fit(&frame.data, &request)?;
        let target_fit = fits
            .first()
            .ok_or_else(|| DoradoError::Photometry("engine returned no target fit".into()))?;
        let (raw, unc) = match control {
            Some(_) => {
                let control_fit = fits.get(1).ok_or_else(|| {
                    DoradoError::Photometry("engine returned no control fit".into())
                })?;
                differential(target_fit, control_fit)
            }
            None => (target_fit.flux, target_fit.flux_unc),
        };

        let sky = wcs.pixel_to_sky(target_fit.x + 1.0, target_fit.y + 1.0);
        Ok(TimeSeriesRecord {
            time: frame.header().date_obs,
            exptime,
            x: target_fit.x,
            y: target_fit.y,
            ra: sky.ra,
            dec: sky.dec,
            flux: raw / exptime,
            flux_unc: unc / exptime,
            apsum: raw,
            apsum_unc: unc,
            frame_index: i,
        })
    });
    reporter.finish_stage();

    let (kept, report) = split_outcomes(PipelineStage::Photometry, results);
    let mut timeseries = TimeSeries::new();
    for (_, record) in kept {
        timeseries.push(record);
    }

    if report.is_complete() {
        info!(filter = %series.filter(), points = timeseries.len(), "Photometry complete");
    } else {
        warn!(
            filter = %series.filter(),
            points = timeseries.len(),
            failed = report.dropped(),
            "Photometry complete with failed frames"
        );
    }
    Ok((timeseries, report))
}

fn differential(target: &SourceFit, control: &SourceFit) -> (f64, f64) {
    (
        target.flux - control.flux,
        target.flux_unc.hypot(control.flux_unc),
    )
}
