use std::path::Path;

use image::{GrayImage, ImageBuffer, ImageFormat, Luma};
use ndarray::Array2;

use crate::consts::FIXED_POINT_MAX;
use crate::error::{DoradoError, Result};
use crate::frame::{Frame, FrameHeader};

/// Save a frame as 16-bit grayscale TIFF. ADU values map one to one onto
/// the 16-bit range.
pub fn save_tiff(frame: &Frame, path: &Path) -> Result<()> {
    let (w, h) = (frame.width() as u32, frame.height() as u32);
    let pixels: Vec<u16> = frame
        .data
        .iter()
        .map(|&v| v.round().clamp(0.0, FIXED_POINT_MAX) as u16)
        .collect();

    let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w, h, pixels)
        .ok_or(DoradoError::InvalidDimensions { width: w, height: h })?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save an 8-bit PNG preview, stretched linearly between the frame's
/// minimum and maximum.
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let (lo, hi) = frame
        .data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = if hi > lo { hi - lo } else { 1.0 };

    let mut img = GrayImage::new(frame.width() as u32, frame.height() as u32);
    for ((row, col), &v) in frame.data.indexed_iter() {
        let val = ((v - lo) / range * 255.0).clamp(0.0, 255.0) as u8;
        img.put_pixel(col as u32, row as u32, Luma([val]));
    }
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a preview, choosing the format from the file extension.
pub fn save_image(frame: &Frame, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_png(frame, path),
        _ => save_tiff(frame, path),
    }
}

/// Load a grayscale image as ADU counts on the 16-bit grid. The header is
/// empty; callers supply timing from elsewhere.
pub fn load_image(path: &Path) -> Result<Frame> {
    let gray = image::open(path)?.to_luma16();
    let (w, h) = gray.dimensions();
    let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        gray.get_pixel(col as u32, row as u32).0[0] as f32
    });
    Ok(Frame::new(data, FrameHeader::default()))
}
