use std::path::PathBuf;

use thiserror::Error;

use crate::info::MediaTagKind;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no image format recognizes {}", .0.display())]
    NotRecognized(PathBuf),

    #[error("image size {size} is not a non-zero multiple of {sector_size}-byte sectors")]
    InvalidSize { size: u64, sector_size: u32 },

    #[error("sectors {lba}+{count} out of range (image has {sectors})")]
    SectorOutOfRange { lba: u64, count: u64, sectors: u64 },

    #[error("byte range {offset}+{len} past end of image ({size} bytes)")]
    ByteOutOfRange { offset: u64, len: u64, size: u64 },

    #[error("CUE sheet line {line}: {message}")]
    CueSyntax { line: usize, message: String },

    #[error("data file not found: {}", .0.display())]
    MissingDataFile(PathBuf),

    #[error("media tag {0} not present")]
    TagNotPresent(MediaTagKind),

    #[error("track {0} has no subchannel data")]
    NoSubchannel(u32),

    #[error("track {0} does not exist")]
    NoSuchTrack(u32),
}

pub type Result<T> = std::result::Result<T, ImageError>;
