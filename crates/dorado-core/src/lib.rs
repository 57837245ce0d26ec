pub mod consts;
pub mod error;
pub mod filter;
pub mod frame;
pub mod io;
pub mod stats;
pub mod wcs;
pub mod series;
pub mod calibrate;
pub mod align;
pub mod photometry;
pub mod timeseries;
pub mod target;
pub mod analysis;
pub mod ceres;
pub mod pipeline;
