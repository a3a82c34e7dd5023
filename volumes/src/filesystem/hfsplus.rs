//! HFS+ and HFSX volume header.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Duration, TimeZone, Utc};
use mediaimage::MediaImage;

use super::{FilesystemInfo, FilesystemKind};
use crate::error::{Result, VolumeError};
use crate::region::Region;

/// Volume header offset from the start of the partition
pub const VOLUME_HEADER_OFFSET: u64 = 1024;
const VOLUME_HEADER_SIZE: usize = 512;

/// "H+"
pub const HFS_PLUS_SIGNATURE: u16 = 0x482B;
/// "HX", the case-sensitive variant
pub const HFSX_SIGNATURE: u16 = 0x4858;

pub const HFS_PLUS_VERSION: u16 = 4;
pub const HFSX_VERSION: u16 = 5;

const ATTR_UNMOUNTED: u32 = 1 << 8;
const ATTR_JOURNALED: u32 = 1 << 13;

#[derive(Debug, Clone)]
struct VolumeHeader {
    is_hfsx: bool,
    attributes: u32,
    last_mounted_version: [u8; 4],
    create_date: u32,
    modify_date: u32,
    backup_date: u32,
    file_count: u32,
    folder_count: u32,
    block_size: u32,
    total_blocks: u32,
    free_blocks: u32,
    write_count: u32,
    /// Finder info words 6 and 7
    volume_id: u64,
}

impl VolumeHeader {
    fn parse(raw: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(raw);

        let signature = reader.read_u16::<BigEndian>()?;
        let is_hfsx = match signature {
            HFS_PLUS_SIGNATURE => false,
            HFSX_SIGNATURE => true,
            _ => {
                return Err(VolumeError::InvalidSignature {
                    structure: "HFS+ volume header",
                })
            }
        };
        let version = reader.read_u16::<BigEndian>()?;
        if !matches!(version, HFS_PLUS_VERSION | HFSX_VERSION) {
            return Err(VolumeError::CorruptedData(format!(
                "unsupported HFS+ version {version}"
            )));
        }

        let attributes = reader.read_u32::<BigEndian>()?;
        let last_mounted_version = reader.read_u32::<BigEndian>()?.to_be_bytes();
        let _journal_info_block = reader.read_u32::<BigEndian>()?;
        let create_date = reader.read_u32::<BigEndian>()?;
        let modify_date = reader.read_u32::<BigEndian>()?;
        let backup_date = reader.read_u32::<BigEndian>()?;
        let _checked_date = reader.read_u32::<BigEndian>()?;
        let file_count = reader.read_u32::<BigEndian>()?;
        let folder_count = reader.read_u32::<BigEndian>()?;
        let block_size = reader.read_u32::<BigEndian>()?;
        let total_blocks = reader.read_u32::<BigEndian>()?;
        let free_blocks = reader.read_u32::<BigEndian>()?;
        let _next_allocation = reader.read_u32::<BigEndian>()?;
        let _rsrc_clump_size = reader.read_u32::<BigEndian>()?;
        let _data_clump_size = reader.read_u32::<BigEndian>()?;
        let _next_catalog_id = reader.read_u32::<BigEndian>()?;
        let write_count = reader.read_u32::<BigEndian>()?;
        let _encoding_bitmap = reader.read_u64::<BigEndian>()?;

        let mut finder_info = [0u32; 8];
        for word in &mut finder_info {
            *word = reader.read_u32::<BigEndian>()?;
        }

        if block_size == 0 || !block_size.is_power_of_two() {
            return Err(VolumeError::CorruptedData(format!(
                "HFS+ block size {block_size}"
            )));
        }

        Ok(VolumeHeader {
            is_hfsx,
            attributes,
            last_mounted_version,
            create_date,
            modify_date,
            backup_date,
            file_count,
            folder_count,
            block_size,
            total_blocks,
            free_blocks,
            write_count,
            volume_id: ((finder_info[6] as u64) << 32) | finder_info[7] as u64,
        })
    }
}

/// Seconds since 1904-01-01; zero means "never".
fn mac_date(seconds: u32) -> Option<DateTime<Utc>> {
    if seconds == 0 {
        return None;
    }
    let epoch = Utc.with_ymd_and_hms(1904, 1, 1, 0, 0, 0).single()?;
    Some(epoch + Duration::seconds(seconds as i64))
}

fn read_header(image: &mut dyn MediaImage, region: Region) -> Result<VolumeHeader> {
    let raw = region.read(image, VOLUME_HEADER_OFFSET, VOLUME_HEADER_SIZE)?;
    VolumeHeader::parse(&raw)
}

pub fn identify(image: &mut dyn MediaImage, region: Region) -> bool {
    read_header(image, region).is_ok()
}

pub fn information(image: &mut dyn MediaImage, region: Region) -> Result<FilesystemInfo> {
    let header = read_header(image, region)?;

    let mut info = FilesystemInfo::new(
        FilesystemKind::HfsPlus,
        if header.is_hfsx { "HFSX" } else { "HFS+" },
    );
    info.cluster_size = header.block_size;
    info.clusters = header.total_blocks as u64;
    info.free_clusters = Some(header.free_blocks as u64);
    if header.volume_id != 0 {
        info.serial = Some(format!("{:016X}", header.volume_id));
    }

    info.field(
        "Last mounted by",
        String::from_utf8_lossy(&header.last_mounted_version),
    );
    info.field("Files", header.file_count);
    info.field("Folders", header.folder_count);
    info.field("Write count", header.write_count);
    info.field("Journaled", header.attributes & ATTR_JOURNALED != 0);
    info.field("Cleanly unmounted", header.attributes & ATTR_UNMOUNTED != 0);
    let dates = [
        ("Creation date", header.create_date),
        ("Modification date", header.modify_date),
        ("Backup date", header.backup_date),
    ];
    for (name, seconds) in dates {
        if let Some(date) = mac_date(seconds) {
            info.field(name, date.to_rfc3339());
        }
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ByteOrder;
    use crate::testing::MemImage;

    fn hfs_image(signature: u16, version: u16) -> MemImage {
        let mut data = vec![0u8; 64 * 512];
        let h = &mut data[1024..1536];
        BigEndian::write_u16(&mut h[0..2], signature);
        BigEndian::write_u16(&mut h[2..4], version);
        BigEndian::write_u32(&mut h[4..8], ATTR_UNMOUNTED | ATTR_JOURNALED);
        h[8..12].copy_from_slice(b"HFSJ");
        // 2001-01-01 00:00:00 UTC
        BigEndian::write_u32(&mut h[16..20], 3_061_152_000);
        BigEndian::write_u32(&mut h[32..36], 12);
        BigEndian::write_u32(&mut h[36..40], 3);
        BigEndian::write_u32(&mut h[40..44], 4096);
        BigEndian::write_u32(&mut h[44..48], 8);
        BigEndian::write_u32(&mut h[48..52], 5);
        BigEndian::write_u32(&mut h[80 + 24..80 + 28], 0xDEADBEEF);
        BigEndian::write_u32(&mut h[80 + 28..80 + 32], 0x01020304);
        MemImage::new(data, 512)
    }

    #[test]
    fn test_hfs_plus() {
        let mut image = hfs_image(HFS_PLUS_SIGNATURE, HFS_PLUS_VERSION);
        let region = Region::whole(&image);
        assert!(identify(&mut image, region));

        let info = information(&mut image, region).unwrap();
        assert_eq!(info.type_name, "HFS+");
        assert_eq!((info.cluster_size, info.clusters), (4096, 8));
        assert_eq!(info.free_clusters, Some(5));
        assert_eq!(info.serial.as_deref(), Some("DEADBEEF01020304"));
        assert!(info.fields.contains(&(
            "Creation date".to_string(),
            "2001-01-01T00:00:00+00:00".to_string()
        )));
        assert!(info
            .fields
            .contains(&("Last mounted by".to_string(), "HFSJ".to_string())));
    }

    #[test]
    fn test_hfsx() {
        let mut image = hfs_image(HFSX_SIGNATURE, HFSX_VERSION);
        let region = Region::whole(&image);
        assert_eq!(information(&mut image, region).unwrap().type_name, "HFSX");
    }

    #[test]
    fn test_bad_version() {
        let mut image = hfs_image(HFS_PLUS_SIGNATURE, 9);
        let region = Region::whole(&image);
        assert!(!identify(&mut image, region));
    }
}
