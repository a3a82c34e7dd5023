//! ISO 9660 primary volume descriptor.

use byteorder::{ByteOrder, LittleEndian};
use chrono::{FixedOffset, NaiveDate, TimeZone};
use mediaimage::MediaImage;

use super::{padded_string, FilesystemInfo, FilesystemKind};
use crate::error::{Result, VolumeError};
use crate::region::Region;

/// Volume descriptors start at logical sector 16 (2048-byte sectors)
pub const DESCRIPTOR_OFFSET: u64 = 0x8000;
const DESCRIPTOR_SIZE: usize = 2048;
pub const STANDARD_ID: &[u8; 5] = b"CD001";
const PRIMARY: u8 = 1;

fn read_descriptor(image: &mut dyn MediaImage, region: Region) -> Result<Vec<u8>> {
    let pvd = region.read(image, DESCRIPTOR_OFFSET, DESCRIPTOR_SIZE)?;
    if pvd[0] != PRIMARY || &pvd[1..6] != STANDARD_ID {
        return Err(VolumeError::InvalidSignature {
            structure: "ISO9660 primary volume descriptor",
        });
    }
    Ok(pvd)
}

pub fn identify(image: &mut dyn MediaImage, region: Region) -> bool {
    read_descriptor(image, region).is_ok()
}

/// `YYYYMMDDHHMMSScc` digits followed by a signed offset in 15-minute units.
fn decimal_datetime(raw: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(&raw[..16]).ok()?;
    let num = |range: std::ops::Range<usize>| text.get(range)?.parse::<u32>().ok();
    let year = num(0..4)?;
    if year == 0 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year as i32, num(4..6)?, num(6..8)?)?;
    let naive = date.and_hms_opt(num(8..10)?, num(10..12)?, num(12..14)?)?;
    let offset = FixedOffset::east_opt(raw[16] as i8 as i32 * 15 * 60)?;
    let stamp = offset.from_local_datetime(&naive).single()?;
    Some(stamp.to_rfc3339())
}

pub fn information(image: &mut dyn MediaImage, region: Region) -> Result<FilesystemInfo> {
    let pvd = read_descriptor(image, region)?;

    let mut info = FilesystemInfo::new(FilesystemKind::Iso9660, "ISO9660");
    info.volume_name = padded_string(&pvd[40..72]);
    info.cluster_size = LittleEndian::read_u16(&pvd[128..130]) as u32;
    info.clusters = LittleEndian::read_u32(&pvd[80..84]) as u64;
    info.free_clusters = Some(0);

    let strings = [
        ("System identifier", 8..40),
        ("Volume set identifier", 190..318),
        ("Publisher identifier", 318..446),
        ("Data preparer identifier", 446..574),
        ("Application identifier", 574..702),
    ];
    for (name, range) in strings {
        if let Some(value) = padded_string(&pvd[range]) {
            info.field(name, value);
        }
    }
    if let Some(created) = decimal_datetime(&pvd[813..830]) {
        info.field("Creation date", created);
    }
    if let Some(modified) = decimal_datetime(&pvd[830..847]) {
        info.field("Modification date", modified);
    }
    Ok(info)
}
