mod extract;
mod psf;

pub use extract::extract;
pub use psf::{GaussianPsfPhotometry, PsfPhotometry, PsfRequest, SourceFit};
