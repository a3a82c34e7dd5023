//! Sector-addressable media images
//!
//! Opens disc and disk images and exposes them through one trait,
//! [`MediaImage`], so analysis code never cares which container format the
//! sectors came from.
//!
//! # Supported formats
//!
//! - Raw sector dumps: `.iso`/`.cdr`/`.toast` (2048-byte sectors, one data
//!   track) and anything else in 512-byte sectors, with optional companion
//!   tag files (`.atip`, `.pma`, `.bca`, `.pfi`, `.dmi`, `.cmi`)
//! - CUE sheets with one or more BIN files and an optional `.sub` subchannel
//!
//! # Example
//!
//! ```no_run
//! use mediaimage::{FormatRegistry, Result};
//!
//! fn main() -> Result<()> {
//!     let mut image = FormatRegistry::global().open("disc.cue")?;
//!     println!("{} sectors of {} bytes", image.sector_count(), image.sector_size());
//!
//!     for track in image.tracks().to_vec() {
//!         let first = image.read_sector(track.start_sector)?;
//!         println!("track {}: {} bytes per sector", track.sequence, first.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cuesheet;
pub mod error;
pub mod info;
pub mod raw;
pub mod registry;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

pub use cuesheet::{CueImage, CueSheet};
pub use error::{ImageError, Result};
pub use info::{ImageInfo, MediaTagKind, MediaType, Session, Track, TrackKind};
pub use raw::RawImage;
pub use registry::{FormatKind, FormatRegistry};

/// Bytes of CloneCD-style subchannel data stored per sector
pub const SUBCHANNEL_SIZE: u32 = 96;

/// An opened image.
///
/// Sector reads return user data, except the `_long` variants which return
/// each sector as stored (2352 bytes for raw CD sectors).
pub trait MediaImage: Send {
    /// Name of the format that opened this image
    fn format_name(&self) -> &'static str;

    fn info(&self) -> &ImageInfo;

    fn sector_count(&self) -> u64 {
        self.info().sectors
    }

    fn sector_size(&self) -> u32 {
        self.info().sector_size
    }

    /// Total bytes of the underlying data file(s)
    fn image_size(&self) -> u64 {
        self.info().image_size
    }

    fn read_sectors(&mut self, lba: u64, count: u32) -> Result<Vec<u8>>;

    fn read_sector(&mut self, lba: u64) -> Result<Vec<u8>> {
        self.read_sectors(lba, 1)
    }

    fn read_sectors_long(&mut self, lba: u64, count: u32) -> Result<Vec<u8>> {
        self.read_sectors(lba, count)
    }

    fn read_sector_long(&mut self, lba: u64) -> Result<Vec<u8>> {
        self.read_sectors_long(lba, 1)
    }

    /// Read raw bytes of the data file(s), concatenated in order.
    fn read_bytes(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    fn tracks(&self) -> &[Track] {
        &[]
    }

    fn sessions(&self) -> &[Session] {
        &[]
    }

    fn track_at(&self, lba: u64) -> Option<&Track> {
        self.tracks().iter().find(|t| t.contains(lba))
    }

    /// User-data size of the sector at `lba`
    fn sector_size_at(&self, lba: u64) -> u32 {
        self.track_at(lba)
            .map(|t| t.sector_size())
            .unwrap_or_else(|| self.sector_size())
    }

    /// Stored size of the sector at `lba`
    fn long_sector_size_at(&self, lba: u64) -> u32 {
        self.track_at(lba)
            .map(|t| t.raw_sector_size)
            .unwrap_or_else(|| self.sector_size())
    }

    /// Subchannel bytes for `count` sectors of `track` starting at `lba`.
    fn read_subchannel(&mut self, track: u32, lba: u64, count: u32) -> Result<Vec<u8>> {
        let _ = (lba, count);
        Err(ImageError::NoSubchannel(track))
    }

    fn read_disk_tag(&mut self, kind: MediaTagKind) -> Result<Vec<u8>> {
        Err(ImageError::TagNotPresent(kind))
    }
}

pub(crate) fn check_sector_range(lba: u64, count: u64, sectors: u64) -> Result<()> {
    match lba.checked_add(count) {
        Some(end) if end <= sectors => Ok(()),
        _ => Err(ImageError::SectorOutOfRange {
            lba,
            count,
            sectors,
        }),
    }
}

pub(crate) fn read_exact_at(file: &mut File, offset: u64, buf: &mut [u8]) -> Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(buf)?;
    Ok(())
}

pub(crate) fn file_times(
    meta: &std::fs::Metadata,
) -> (
    Option<chrono::DateTime<chrono::Utc>>,
    Option<chrono::DateTime<chrono::Utc>>,
) {
    (
        meta.created().ok().map(Into::into),
        meta.modified().ok().map(Into::into),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_range() {
        assert!(check_sector_range(0, 10, 10).is_ok());
        assert!(check_sector_range(9, 1, 10).is_ok());
        assert!(check_sector_range(9, 2, 10).is_err());
        assert!(check_sector_range(u64::MAX, 2, 10).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ImageError::TagNotPresent(MediaTagKind::DvdBca);
        assert_eq!(err.to_string(), "media tag BCA not present");

        let err = ImageError::CueSyntax {
            line: 3,
            message: "INDEX before TRACK".to_string(),
        };
        assert_eq!(err.to_string(), "CUE sheet line 3: INDEX before TRACK");
    }
}
