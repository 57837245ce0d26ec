use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DoradoError;

/// Photometric band of an image series or light curve.
///
/// Filters are parsed at the boundary; any name outside this set is an
/// [`DoradoError::UnknownFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Filter {
    U,
    B,
    V,
    R,
    I,
    SloanG,
    SloanR,
    SloanI,
    SloanZ,
    Luminance,
    Red,
    Green,
    Blue,
    HAlpha,
    OIII,
    SII,
    Clear,
}

impl Filter {
    pub const ALL: [Filter; 17] = [
        Filter::U,
        Filter::B,
        Filter::V,
        Filter::R,
        Filter::I,
        Filter::SloanG,
        Filter::SloanR,
        Filter::SloanI,
        Filter::SloanZ,
        Filter::Luminance,
        Filter::Red,
        Filter::Green,
        Filter::Blue,
        Filter::HAlpha,
        Filter::OIII,
        Filter::SII,
        Filter::Clear,
    ];

    /// Short name used in file names and headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::U => "U",
            Self::B => "B",
            Self::V => "V",
            Self::R => "R",
            Self::I => "I",
            Self::SloanG => "g'",
            Self::SloanR => "r'",
            Self::SloanI => "i'",
            Self::SloanZ => "z'",
            Self::Luminance => "L",
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::HAlpha => "Ha",
            Self::OIII => "OIII",
            Self::SII => "SII",
            Self::Clear => "Clear",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Filter {
    type Err = DoradoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let filter = match s.trim() {
            "U" => Self::U,
            "B" => Self::B,
            "V" => Self::V,
            "R" | "Rc" => Self::R,
            "I" | "Ic" => Self::I,
            "g'" | "g" | "sloan_g" => Self::SloanG,
            "r'" | "r" | "sloan_r" => Self::SloanR,
            "i'" | "i" | "sloan_i" => Self::SloanI,
            "z'" | "z" | "sloan_z" => Self::SloanZ,
            "L" | "Lum" | "Luminance" => Self::Luminance,
            "Red" => Self::Red,
            "Green" => Self::Green,
            "Blue" => Self::Blue,
            "Ha" | "H-alpha" | "HAlpha" => Self::HAlpha,
            "OIII" => Self::OIII,
            "SII" => Self::SII,
            "Clear" | "C" => Self::Clear,
            other => return Err(DoradoError::UnknownFilter(other.to_string())),
        };
        Ok(filter)
    }
}
