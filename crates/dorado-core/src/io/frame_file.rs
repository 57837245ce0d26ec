//! `.dfr` frame container.
//!
//! Layout, all little-endian:
//! magic (8) | version u16 | width u32 | height u32 | bit depth u8 |
//! reserved u8 | filter (16, NUL padded) | date_obs f64 (MJD) |
//! exptime f64 (s) | width * height f32 pixels, row-major.

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::Mmap;
use ndarray::Array2;

use crate::error::{DoradoError, Result};
use crate::filter::Filter;
use crate::frame::{Frame, FrameHeader};

pub const DFR_MAGIC: &[u8; 8] = b"DORADOFR";
pub const DFR_VERSION: u16 = 1;
pub const DFR_HEADER_SIZE: usize = 52;
const FILTER_FIELD_LEN: usize = 16;

/// Parsed `.dfr` header.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameFileHeader {
    pub version: u16,
    pub width: u32,
    pub height: u32,
    pub header: FrameHeader,
}

impl FrameFileHeader {
    pub fn pixel_byte_size(&self) -> usize {
        self.width as usize * self.height as usize * std::mem::size_of::<f32>()
    }
}

/// Memory-mapped `.dfr` reader.
pub struct FrameFileReader {
    mmap: Mmap,
    pub header: FrameFileHeader,
}

impl FrameFileReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < DFR_HEADER_SIZE {
            return Err(DoradoError::InvalidFrameFile(
                "file too small for frame header".into(),
            ));
        }
        if &mmap[0..8] != DFR_MAGIC {
            return Err(DoradoError::InvalidFrameFile("missing DORADOFR magic".into()));
        }

        let header = parse_header(&mmap[..DFR_HEADER_SIZE])?;
        let expected = DFR_HEADER_SIZE + header.pixel_byte_size();
        if mmap.len() < expected {
            return Err(DoradoError::InvalidFrameFile(format!(
                "file truncated: expected at least {} bytes, got {}",
                expected,
                mmap.len()
            )));
        }

        Ok(Self { mmap, header })
    }

    pub fn read_frame(&self) -> Result<Frame> {
        let w = self.header.width as usize;
        let h = self.header.height as usize;
        let raw = &self.mmap[DFR_HEADER_SIZE..DFR_HEADER_SIZE + self.header.pixel_byte_size()];

        let mut cursor = Cursor::new(raw);
        let mut pixels = Vec::with_capacity(w * h);
        for _ in 0..w * h {
            pixels.push(cursor.read_f32::<LittleEndian>()?);
        }
        let data = Array2::from_shape_vec((h, w), pixels)
            .map_err(|e| DoradoError::InvalidFrameFile(e.to_string()))?;
        Ok(Frame::new(data, self.header.header.clone()))
    }
}

/// Read a whole `.dfr` file.
pub fn read_frame_file(path: &Path) -> Result<Frame> {
    FrameFileReader::open(path)?.read_frame()
}

/// Write `frame` as a `.dfr` file, replacing any existing file.
pub fn write_frame_file(path: &Path, frame: &Frame) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    let header = frame.header();
    w.write_all(DFR_MAGIC)?;
    w.write_u16::<LittleEndian>(DFR_VERSION)?;
    w.write_u32::<LittleEndian>(frame.width() as u32)?;
    w.write_u32::<LittleEndian>(frame.height() as u32)?;
    w.write_u8(header.bit_depth)?;
    w.write_u8(0)?;
    let filter = header.filter.map(|f| f.as_str()).unwrap_or("");
    write_fixed_string(&mut w, filter, FILTER_FIELD_LEN)?;
    w.write_f64::<LittleEndian>(header.date_obs)?;
    w.write_f64::<LittleEndian>(header.exptime)?;

    for &v in frame.data.iter() {
        w.write_f32::<LittleEndian>(v)?;
    }
    w.flush()?;
    Ok(())
}

fn parse_header(buf: &[u8]) -> Result<FrameFileHeader> {
    let mut cursor = Cursor::new(&buf[8..]);
    let version = cursor.read_u16::<LittleEndian>()?;
    let width = cursor.read_u32::<LittleEndian>()?;
    let height = cursor.read_u32::<LittleEndian>()?;
    let bit_depth = cursor.read_u8()?;
    let _reserved = cursor.read_u8()?;

    if version != DFR_VERSION {
        return Err(DoradoError::InvalidFrameFile(format!(
            "unsupported version {version}"
        )));
    }
    if width == 0 || height == 0 {
        return Err(DoradoError::InvalidDimensions { width, height });
    }

    let filter_field = read_fixed_string(&buf[20..20 + FILTER_FIELD_LEN]);
    let filter = if filter_field.is_empty() {
        None
    } else {
        Some(
            filter_field
                .parse::<Filter>()
                .map_err(|e| DoradoError::InvalidFrameFile(e.to_string()))?,
        )
    };

    let mut cursor = Cursor::new(&buf[20 + FILTER_FIELD_LEN..]);
    let date_obs = cursor.read_f64::<LittleEndian>()?;
    let exptime = cursor.read_f64::<LittleEndian>()?;

    Ok(FrameFileHeader {
        version,
        width,
        height,
        header: FrameHeader {
            date_obs,
            exptime,
            filter,
            bit_depth,
        },
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn write_fixed_string(w: &mut impl Write, s: &str, len: usize) -> Result<()> {
    let bytes = s.as_bytes();
    let to_write = bytes.len().min(len);
    w.write_all(&bytes[..to_write])?;
    for _ in to_write..len {
        w.write_all(&[0u8])?;
    }
    Ok(())
}
