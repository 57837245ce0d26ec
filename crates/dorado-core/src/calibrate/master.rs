use ndarray::{Array2, Zip};

use crate::error::{DoradoError, Result};
use crate::frame::Frame;

/// Median-combine calibration exposures into a master frame.
///
/// The master keeps the header of the first exposure.
pub fn master_frame(frames: &[Frame]) -> Result<Frame> {
    let first = frames.first().ok_or(DoradoError::EmptySequence)?;
    let dim = first.dim();
    if let Some((i, f)) = frames.iter().enumerate().find(|(_, f)| f.dim() != dim) {
        return Err(DoradoError::Calibration(format!(
            "exposure {i} is {}x{}, expected {}x{}",
            f.width(),
            f.height(),
            dim.1,
            dim.0
        )));
    }
    if frames.len() == 1 {
        return Ok(first.clone());
    }

    let mut result = Array2::<f32>::zeros(dim);
    Zip::indexed(&mut result).par_for_each(|(row, col), out| {
        let mut values: Vec<f32> = frames.iter().map(|f| f.data[[row, col]]).collect();
        *out = median_f32(&mut values);
    });
    Ok(first.with_data(result))
}

fn median_f32(values: &mut [f32]) -> f32 {
    let n = values.len();
    let mid = n / 2;
    let upper = *values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1;
    if n % 2 == 1 {
        upper
    } else {
        let lower = values[..mid].iter().copied().fold(f32::NEG_INFINITY, f32::max);
        (lower + upper) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameHeader;

    #[test]
    fn median_rejects_outlier() {
        let frames: Vec<Frame> = [10.0, 11.0, 500.0]
            .iter()
            .map(|&v| Frame::new(Array2::from_elem((3, 3), v), FrameHeader::default()))
            .collect();
        let master = master_frame(&frames).unwrap();
        assert!(master.data.iter().all(|&v| v == 11.0));
    }

    #[test]
    fn mismatched_exposure_is_rejected() {
        let frames = vec![
            Frame::new(Array2::zeros((3, 3)), FrameHeader::default()),
            Frame::new(Array2::zeros((3, 4)), FrameHeader::default()),
        ];
        assert!(matches!(master_frame(&frames), Err(DoradoError::Calibration(_))));
    }
}
