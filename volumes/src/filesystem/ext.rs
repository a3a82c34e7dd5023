//! ext2/ext3/ext4 superblock.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::DateTime;
use mediaimage::MediaImage;

use super::{format_uuid, padded_string, FilesystemInfo, FilesystemKind};
use crate::error::{Result, VolumeError};
use crate::region::Region;

pub const SUPERBLOCK_OFFSET: u64 = 1024;
const SUPERBLOCK_SIZE: usize = 1024;
pub const EXT_SUPER_MAGIC: u16 = 0xEF53;

const COMPAT_HAS_JOURNAL: u32 = 0x0004;
const INCOMPAT_EXTENTS: u32 = 0x0040;
const INCOMPAT_64BIT: u32 = 0x0080;
const INCOMPAT_FLEX_BG: u32 = 0x0200;
const RO_COMPAT_HUGE_FILE: u32 = 0x0008;
const RO_COMPAT_GDT_CSUM: u32 = 0x0010;

#[derive(Debug, Clone)]
struct Superblock {
    inode_count: u32,
    block_count: u64,
    free_block_count: u64,
    block_size: u32,
    mount_time: u32,
    write_time: u32,
    mount_count: u16,
    state: u16,
    creator_os: u32,
    feature_compat: u32,
    feature_incompat: u32,
    feature_ro_compat: u32,
    uuid: [u8; 16],
    volume_name: Option<String>,
    last_mounted: Option<String>,
}

impl Superblock {
    fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);

        cursor.set_position(56);
        if cursor.read_u16::<LittleEndian>()? != EXT_SUPER_MAGIC {
            return Err(VolumeError::InvalidSignature {
                structure: "ext superblock",
            });
        }

        cursor.set_position(0);
        let inode_count = cursor.read_u32::<LittleEndian>()?;
        let block_count_lo = cursor.read_u32::<LittleEndian>()?;
        cursor.set_position(12);
        let free_blocks_lo = cursor.read_u32::<LittleEndian>()?;

        cursor.set_position(24);
        let log_block_size = cursor.read_u32::<LittleEndian>()?;
        if log_block_size > 6 {
            return Err(VolumeError::CorruptedData(format!(
                "ext log block size {log_block_size}"
            )));
        }
        let block_size = 1024u32 << log_block_size;

        cursor.set_position(44);
        let mount_time = cursor.read_u32::<LittleEndian>()?;
        let write_time = cursor.read_u32::<LittleEndian>()?;
        let mount_count = cursor.read_u16::<LittleEndian>()?;
        cursor.set_position(58);
        let state = cursor.read_u16::<LittleEndian>()?;

        cursor.set_position(72);
        let creator_os = cursor.read_u32::<LittleEndian>()?;

        cursor.set_position(92);
        let feature_compat = cursor.read_u32::<LittleEndian>()?;
        let feature_incompat = cursor.read_u32::<LittleEndian>()?;
        let feature_ro_compat = cursor.read_u32::<LittleEndian>()?;

        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&data[104..120]);

        let (mut block_count, mut free_block_count) = (block_count_lo as u64, free_blocks_lo as u64);
        if feature_incompat & INCOMPAT_64BIT != 0 {
            cursor.set_position(0x150);
            block_count |= (cursor.read_u32::<LittleEndian>()? as u64) << 32;
            cursor.set_position(0x158);
            free_block_count |= (cursor.read_u32::<LittleEndian>()? as u64) << 32;
        }

        Ok(Superblock {
            inode_count,
            block_count,
            free_block_count,
            block_size,
            mount_time,
            write_time,
            mount_count,
            state,
            creator_os,
            feature_compat,
            feature_incompat,
            feature_ro_compat,
            uuid,
            volume_name: padded_string(&data[120..136]),
            last_mounted: padded_string(&data[136..200]),
        })
    }

    fn variant(&self) -> &'static str {
        if self.feature_incompat & (INCOMPAT_EXTENTS | INCOMPAT_64BIT | INCOMPAT_FLEX_BG) != 0
            || self.feature_ro_compat & (RO_COMPAT_HUGE_FILE | RO_COMPAT_GDT_CSUM) != 0
        {
            "ext4"
        } else if self.feature_compat & COMPAT_HAS_JOURNAL != 0 {
            "ext3"
        } else {
            "ext2"
        }
    }
}

fn creator_os(os: u32) -> &'static str {
    match os {
        0 => "Linux",
        1 => "Hurd",
        2 => "Masix",
        3 => "FreeBSD",
        4 => "Lites",
        _ => "Unknown",
    }
}

fn read_superblock(image: &mut dyn MediaImage, region: Region) -> Result<Superblock> {
    let data = region.read(image, SUPERBLOCK_OFFSET, SUPERBLOCK_SIZE)?;
    Superblock::parse(&data)
}

pub fn identify(image: &mut dyn MediaImage, region: Region) -> bool {
    read_superblock(image, region).is_ok()
}

pub fn information(image: &mut dyn MediaImage, region: Region) -> Result<FilesystemInfo> {
    let sb = read_superblock(image, region)?;

    let mut info = FilesystemInfo::new(FilesystemKind::Ext, sb.variant());
    info.volume_name = sb.volume_name.clone();
    info.serial = Some(format_uuid(&sb.uuid));
    info.cluster_size = sb.block_size;
    info.clusters = sb.block_count;
    info.free_clusters = Some(sb.free_block_count);

    info.field("Inodes", sb.inode_count);
    info.field("Creator OS", creator_os(sb.creator_os));
    info.field("Mount count", sb.mount_count);
    info.field("Cleanly unmounted", sb.state & 0x1 != 0);
    if let Some(path) = &sb.last_mounted {
        info.field("Last mount point", path);
    }
    let times = [("Last mount", sb.mount_time), ("Last write", sb.write_time)];
    for (name, seconds) in times {
        if seconds == 0 {
            continue;
        }
        if let Some(time) = DateTime::from_timestamp(seconds as i64, 0) {
            info.field(name, time.to_rfc3339());
        }
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ByteOrder;
    use crate::testing::MemImage;

    fn ext_image(compat: u32, incompat: u32) -> MemImage {
        let mut data = vec![0u8; 64 * 512];
        let sb = &mut data[1024..2048];
        LittleEndian::write_u32(&mut sb[0..4], 128);
        LittleEndian::write_u32(&mut sb[4..8], 32);
        LittleEndian::write_u32(&mut sb[12..16], 20);
        LittleEndian::write_u32(&mut sb[24..28], 0);
        LittleEndian::write_u32(&mut sb[48..52], 1_000_000_000);
        LittleEndian::write_u16(&mut sb[56..58], EXT_SUPER_MAGIC);
        LittleEndian::write_u16(&mut sb[58..60], 1);
        LittleEndian::write_u32(&mut sb[92..96], compat);
        LittleEndian::write_u32(&mut sb[96..100], incompat);
        sb[104..120].copy_from_slice(&[0x11; 16]);
        sb[120..124].copy_from_slice(b"root");
        MemImage::new(data, 512)
    }

    #[test]
    fn test_variants() {
        for (compat, incompat, expected) in [
            (0, 0, "ext2"),
            (COMPAT_HAS_JOURNAL, 0, "ext3"),
            (COMPAT_HAS_JOURNAL, INCOMPAT_EXTENTS | INCOMPAT_FLEX_BG, "ext4"),
        ] {
            let mut image = ext_image(compat, incompat);
            let region = Region::whole(&image);
            assert!(identify(&mut image, region));
            assert_eq!(information(&mut image, region).unwrap().type_name, expected);
        }
    }

    #[test]
    fn test_information() {
        let mut image = ext_image(0, 0);
        let region = Region::whole(&image);
        let info = information(&mut image, region).unwrap();
        assert_eq!(info.volume_name.as_deref(), Some("root"));
        assert_eq!((info.cluster_size, info.clusters), (1024, 32));
        assert_eq!(info.free_clusters, Some(20));
        assert_eq!(
            info.serial.as_deref(),
            Some("11111111-1111-1111-1111-111111111111")
        );
        assert!(info.fields.contains(&(
            "Last write".to_string(),
            "2001-09-09T01:46:40+00:00".to_string()
        )));
    }

    #[test]
    fn test_64bit_block_count() {
        let mut image = ext_image(0, INCOMPAT_64BIT);
        LittleEndian::write_u32(&mut image.data[1024 + 0x150..1024 + 0x154], 1);
        let region = Region::whole(&image);
        let info = information(&mut image, region).unwrap();
        assert_eq!(info.clusters, (1u64 << 32) + 32);
    }
}
