//! World coordinate system and sky positions.
//!
//! Pixel coordinates follow the FITS convention: the centre of the first
//! pixel is (1, 1). Callers working with 0-based array indices add or
//! subtract one at the boundary.

use serde::{Deserialize, Serialize};

use crate::consts::EPSILON;
use crate::error::{DoradoError, Result};

/// ICRS sky position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkyCoord {
    pub ra: f64,
    pub dec: f64,
}

impl SkyCoord {
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }

    /// Parse catalog-style sexagesimal strings: RA in hours ("19 41 48.9"
    /// or "19:41:48.9"), Dec in degrees ("+50 31 30.2").
    pub fn from_sexagesimal(ra: &str, dec: &str) -> Result<Self> {
        let ra_hours = parse_sexagesimal(ra)?;
        let dec_deg = parse_sexagesimal(dec)?;
        if !(0.0..24.0).contains(&ra_hours) {
            return Err(DoradoError::InvalidInput(format!("RA out of range: {ra}")));
        }
        if !(-90.0..=90.0).contains(&dec_deg) {
            return Err(DoradoError::InvalidInput(format!("Dec out of range: {dec}")));
        }
        Ok(Self {
            ra: ra_hours * 15.0,
            dec: dec_deg,
        })
    }
}

fn parse_sexagesimal(s: &str) -> Result<f64> {
    let trimmed = s.trim();
    let negative = trimmed.starts_with('-');
    let body = trimmed.trim_start_matches(['+', '-']);
    let parts: Vec<&str> = body
        .split([' ', ':', 'h', 'm', 's', 'd', '\''])
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(DoradoError::InvalidInput(format!(
            "not a sexagesimal value: {s:?}"
        )));
    }

    let mut value = 0.0;
    let mut scale = 1.0;
    for part in parts {
        let v: f64 = part
            .parse()
            .map_err(|_| DoradoError::InvalidInput(format!("not a sexagesimal value: {s:?}")))?;
        value += v / scale;
        scale *= 60.0;
    }
    Ok(if negative { -value } else { value })
}

/// Gnomonic (TAN) world coordinate solution.
///
/// 1. Pixel to intermediate: `(xi, eta) = CD x (x - CRPIX1, y - CRPIX2)`
/// 2. Intermediate to sky: de-project from the tangent plane
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wcs {
    /// Reference pixel (CRPIX1, CRPIX2)
    pub crpix: (f64, f64),
    /// Reference sky position in degrees (CRVAL1 = RA, CRVAL2 = Dec)
    pub crval: (f64, f64),
    /// CD matrix in degrees per pixel: [[CD1_1, CD1_2], [CD2_1, CD2_2]]
    pub cd: [[f64; 2]; 2],
    /// Image dimensions (width, height) in pixels
    pub naxis: (u32, u32),
}

impl Wcs {
    pub fn new(crpix: (f64, f64), crval: (f64, f64), cd: [[f64; 2]; 2], naxis: (u32, u32)) -> Self {
        Self {
            crpix,
            crval,
            cd,
            naxis,
        }
    }

    /// Build a solution from a plate scale (arcsec/pixel) and a rotation
    /// (degrees, North through East). RA increases to the left, as on the sky.
    pub fn from_scale_rotation(
        crpix: (f64, f64),
        crval: (f64, f64),
        scale_arcsec: f64,
        rotation_deg: f64,
        naxis: (u32, u32),
    ) -> Self {
        let scale = scale_arcsec / 3600.0;
        let (sin_r, cos_r) = rotation_deg.to_radians().sin_cos();
        let cd = [
            [-scale * cos_r, scale * sin_r],
            [scale * sin_r, scale * cos_r],
        ];
        Self::new(crpix, crval, cd, naxis)
    }

    /// Convert pixel coordinates to sky coordinates.
    pub fn pixel_to_sky(&self, x: f64, y: f64) -> SkyCoord {
        let dx = x - self.crpix.0;
        let dy = y - self.crpix.1;

        let xi = (self.cd[0][0] * dx + self.cd[0][1] * dy).to_radians();
        let eta = (self.cd[1][0] * dx + self.cd[1][1] * dy).to_radians();

        let ra0 = self.crval.0.to_radians();
        let dec0 = self.crval.1.to_radians();
        let (sin_dec0, cos_dec0) = dec0.sin_cos();
        let denom = cos_dec0 - eta * sin_dec0;

        let ra = ra0 + xi.atan2(denom);
        let dec = (sin_dec0 + eta * cos_dec0).atan2((xi * xi + denom * denom).sqrt());

        SkyCoord {
            ra: ra.to_degrees().rem_euclid(360.0),
            dec: dec.to_degrees(),
        }
    }

    /// Convert sky coordinates to pixel coordinates.
    ///
    /// Fails for a singular CD matrix or a position on the far hemisphere.
    pub fn sky_to_pixel(&self, coord: &SkyCoord) -> Result<(f64, f64)> {
        let ra = coord.ra.to_radians();
        let dec = coord.dec.to_radians();
        let ra0 = self.crval.0.to_radians();
        let dec0 = self.crval.1.to_radians();

        let (sin_dec, cos_dec) = dec.sin_cos();
        let (sin_dec0, cos_dec0) = dec0.sin_cos();
        let (sin_dra, cos_dra) = (ra - ra0).sin_cos();

        let d = sin_dec * sin_dec0 + cos_dec * cos_dec0 * cos_dra;
        if d <= EPSILON {
            return Err(DoradoError::InvalidInput(format!(
                "({:.5}, {:.5}) is not on the tangent plane of this solution",
                coord.ra, coord.dec
            )));
        }

        let xi = (cos_dec * sin_dra / d).to_degrees();
        let eta = ((sin_dec * cos_dec0 - cos_dec * sin_dec0 * cos_dra) / d).to_degrees();

        let det = self.cd[0][0] * self.cd[1][1] - self.cd[0][1] * self.cd[1][0];
        if det.abs() < 1e-15 {
            return Err(DoradoError::InvalidInput(format!(
                "CD matrix is singular (det = {det})"
            )));
        }

        let dx = (self.cd[1][1] * xi - self.cd[0][1] * eta) / det;
        let dy = (-self.cd[1][0] * xi + self.cd[0][0] * eta) / det;

        Ok((self.crpix.0 + dx, self.crpix.1 + dy))
    }

    /// Plate scale in arcseconds per pixel, averaged over both axes.
    pub fn pixel_scale_arcsec(&self) -> f64 {
        let scale_x = (self.cd[0][0].powi(2) + self.cd[1][0].powi(2)).sqrt();
        let scale_y = (self.cd[0][1].powi(2) + self.cd[1][1].powi(2)).sqrt();
        (scale_x + scale_y) / 2.0 * 3600.0
    }
}
