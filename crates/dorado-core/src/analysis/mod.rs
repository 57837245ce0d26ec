//! Period analysis of light curves.

pub mod fourier;
mod fournax;
pub mod peaks;
pub mod smooth;
pub mod spline;

pub use fournax::{Ephemeris, Fournax};
pub use smooth::{smooth, Window};
pub use spline::BSpline;
