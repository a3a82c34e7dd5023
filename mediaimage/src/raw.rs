//! Raw sector dumps.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ImageError, Result};
use crate::info::{ImageInfo, MediaTagKind, MediaType, Session, Track, TrackKind};
use crate::{check_sector_range, file_times, read_exact_at, MediaImage};

/// Extensions treated as 2048-byte-sector optical dumps
pub const OPTICAL_EXTENSIONS: &[&str] = &["iso", "cdr", "toast"];

const OPTICAL_SECTOR_SIZE: u32 = 2048;
const BLOCK_SECTOR_SIZE: u32 = 512;

/// Largest 80-minute CD in 2048-byte sectors
const CD_MAX_SECTORS: u64 = 360_000;
/// Dual-layer DVD
const DVD_MAX_SECTORS: u64 = 4_173_824;

fn has_optical_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| OPTICAL_EXTENSIONS.iter().any(|o| e.eq_ignore_ascii_case(o)))
        .unwrap_or(false)
}

/// Sector size implied by a path's extension
pub fn sector_size_for(path: &Path) -> u32 {
    if has_optical_extension(path) {
        OPTICAL_SECTOR_SIZE
    } else {
        BLOCK_SECTOR_SIZE
    }
}

fn optical_media_type(sectors: u64) -> MediaType {
    if sectors <= CD_MAX_SECTORS {
        MediaType::CdRom
    } else if sectors <= DVD_MAX_SECTORS {
        MediaType::DvdRom
    } else {
        MediaType::BdRom
    }
}

fn block_media_type(size: u64) -> MediaType {
    match size {
        163_840 => MediaType::Dos525Ss,
        368_640 => MediaType::Dos525Ds,
        737_280 => MediaType::Dos35Dd,
        1_228_800 => MediaType::Dos525Hd,
        1_474_560 => MediaType::Dos35Hd,
        2_949_120 => MediaType::Dos35Ed,
        _ => MediaType::GenericHdd,
    }
}

/// A file that is nothing but sectors.
pub struct RawImage {
    file: File,
    path: PathBuf,
    info: ImageInfo,
    tracks: Vec<Track>,
    sessions: Vec<Session>,
    tags: BTreeMap<MediaTagKind, Vec<u8>>,
}

impl RawImage {
    /// Check whether `path` looks like a raw image of a plausible size.
    pub fn identify(path: &Path) -> bool {
        let sector_size = sector_size_for(path) as u64;
        fs::metadata(path)
            .map(|m| m.is_file() && m.len() > 0 && m.len() % sector_size == 0)
            .unwrap_or(false)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let meta = file.metadata()?;
        let size = meta.len();
        let sector_size = sector_size_for(path);

        if size == 0 || size % sector_size as u64 != 0 {
            return Err(ImageError::InvalidSize { size, sector_size });
        }

        let sectors = size / sector_size as u64;
        let optical = has_optical_extension(path);
        let (creation_time, modification_time) = file_times(&meta);

        let mut tags = BTreeMap::new();
        for kind in MediaTagKind::ALL {
            let tag_path = path.with_extension(kind.extension());
            if tag_path.is_file() {
                let data = fs::read(&tag_path)?;
                debug!(tag = %kind, path = %tag_path.display(), len = data.len(), "loaded media tag");
                tags.insert(kind, data);
            }
        }

        let (tracks, sessions) = if optical {
            let track = Track {
                sequence: 1,
                session: 1,
                kind: TrackKind::Mode1,
                start_sector: 0,
                end_sector: sectors - 1,
                pregap: 0,
                raw_sector_size: sector_size,
                file: path.to_path_buf(),
                file_offset: 0,
                has_subchannel: false,
                title: None,
                performer: None,
            };
            let session = Session {
                sequence: 1,
                start_track: 1,
                end_track: 1,
                start_sector: 0,
                end_sector: sectors - 1,
            };
            (vec![track], vec![session])
        } else {
            (Vec::new(), Vec::new())
        };

        let info = ImageInfo {
            sectors,
            sector_size,
            image_size: size,
            media_type: if optical {
                optical_media_type(sectors)
            } else {
                block_media_type(size)
            },
            creation_time,
            modification_time,
            readable_tags: tags.keys().copied().collect(),
            has_partitions: optical,
            has_sessions: optical,
            sessions: sessions.len() as u32,
            ..ImageInfo::default()
        };

        debug!(
            path = %path.display(),
            sectors,
            sector_size,
            media = %info.media_type,
            "opened raw image"
        );

        Ok(RawImage {
            file,
            path: path.to_path_buf(),
            info,
            tracks,
            sessions,
            tags,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MediaImage for RawImage {
    fn format_name(&self) -> &'static str {
        "Raw disk image"
    }

    fn info(&self) -> &ImageInfo {
        &self.info
    }

    fn read_sectors(&mut self, lba: u64, count: u32) -> Result<Vec<u8>> {
        check_sector_range(lba, count as u64, self.info.sectors)?;
        let sector_size = self.info.sector_size as u64;
        let mut buf = vec![0u8; (count as u64 * sector_size) as usize];
        read_exact_at(&mut self.file, lba * sector_size, &mut buf)?;
        Ok(buf)
    }

    fn read_bytes(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let len = buf.len() as u64;
        if offset.checked_add(len).map_or(true, |end| end > self.info.image_size) {
            return Err(ImageError::ByteOutOfRange {
                offset,
                len,
                size: self.info.image_size,
            });
        }
        read_exact_at(&mut self.file, offset, buf)
    }

    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    fn read_disk_tag(&mut self, kind: MediaTagKind) -> Result<Vec<u8>> {
        self.tags
            .get(&kind)
            .cloned()
            .ok_or(ImageError::TagNotPresent(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_image(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    fn patterned(sectors: usize, sector_size: usize) -> Vec<u8> {
        (0..sectors * sector_size)
            .map(|i| (i / sector_size) as u8 ^ (i % 7) as u8)
            .collect()
    }

    #[test]
    fn test_block_image_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "floppy.img", &vec![0u8; 1_474_560]);
        let image = RawImage::open(&path).unwrap();
        assert_eq!(image.sector_size(), 512);
        assert_eq!(image.sector_count(), 2880);
        assert_eq!(image.info().media_type, MediaType::Dos35Hd);
        assert!(image.tracks().is_empty());
        assert!(!image.info().has_sessions);
        assert!(!image.info().has_partitions);
    }

    #[test]
    fn test_iso_has_one_data_track() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "disc.iso", &patterned(20, 2048));
        let image = RawImage::open(&path).unwrap();
        assert_eq!(image.sector_size(), 2048);
        assert_eq!(image.info().media_type, MediaType::CdRom);
        assert_eq!(image.tracks().len(), 1);
        assert_eq!(image.tracks()[0].end_sector, 19);
        assert_eq!(image.info().sessions, 1);
        assert!(image.info().has_partitions);
    }

    #[test]
    fn test_read_sectors_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let data = patterned(8, 512);
        let path = write_image(dir.path(), "disk.img", &data);
        let mut image = RawImage::open(&path).unwrap();

        let sectors = image.read_sectors(2, 3).unwrap();
        assert_eq!(sectors, &data[1024..2560]);
        assert_eq!(image.read_sector(7).unwrap(), &data[3584..]);

        let mut buf = [0u8; 10];
        image.read_bytes(100, &mut buf).unwrap();
        assert_eq!(&buf, &data[100..110]);

        assert!(matches!(
            image.read_sectors(7, 2),
            Err(ImageError::SectorOutOfRange { .. })
        ));
        assert!(image.read_bytes(4090, &mut buf).is_err());
    }

    #[test]
    fn test_rejects_partial_sector() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "odd.img", &[0u8; 700]);
        assert!(!RawImage::identify(&path));
        assert!(matches!(
            RawImage::open(&path),
            Err(ImageError::InvalidSize { size: 700, sector_size: 512 })
        ));
    }

    #[test]
    fn test_companion_tags_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "dvd.iso", &patterned(4, 2048));
        write_image(dir.path(), "dvd.pfi", &[1, 2, 3, 4]);
        let mut image = RawImage::open(&path).unwrap();
        assert_eq!(image.info().readable_tags, vec![MediaTagKind::DvdPfi]);
        assert_eq!(image.read_disk_tag(MediaTagKind::DvdPfi).unwrap(), vec![1, 2, 3, 4]);
        assert!(matches!(
            image.read_disk_tag(MediaTagKind::DvdBca),
            Err(ImageError::TagNotPresent(MediaTagKind::DvdBca))
        ));
    }
}
