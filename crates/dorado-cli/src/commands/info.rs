use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dorado_core::io::frame_file::FrameFileReader;

#[derive(Args)]
pub struct InfoArgs {
    /// Input .dfr frame file
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let reader = FrameFileReader::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let header = &reader.header;

    println!("File:        {}", args.file.display());
    println!("Version:     {}", header.version);
    println!("Dimensions:  {}x{}", header.width, header.height);
    println!("Bit depth:   {}", header.header.bit_depth);
    match header.header.filter {
        Some(filter) => println!("Filter:      {}", filter),
        None => println!("Filter:      unknown"),
    }
    println!("Start (MJD): {:.6}", header.header.date_obs);
    println!("Exposure:    {:.2} s", header.header.exptime);

    let total_mb = header.pixel_byte_size() as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(())
}
