//! Frame files, night directories and light-curve output.

pub mod frame_file;
pub mod image_io;
pub mod layout;
pub mod solution_cache;
pub mod store;
pub mod timeseries_io;

pub use frame_file::{read_frame_file, write_frame_file};
pub use layout::{classify, NightLayout, NightListing};
pub use solution_cache::DirectorySolutionCache;
pub use store::{DirectoryFrameStore, FrameStore};
pub use timeseries_io::{read_timeseries, write_timeseries, SeriesFormat};
