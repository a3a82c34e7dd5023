//! FAT12/16/32 boot sector.
//!
//! The FAT width is never taken from the type string in the boot sector;
//! it follows from the cluster count.

use byteorder::{ByteOrder, LittleEndian};
use mediaimage::MediaImage;

use super::{padded_string, FilesystemInfo, FilesystemKind};
use crate::error::{Result, VolumeError};
use crate::region::Region;

const FAT12_MAX_CLUSTERS: u64 = 4085;
const FAT16_MAX_CLUSTERS: u64 = 65525;

#[derive(Debug, Clone)]
struct BiosParameterBlock {
    bytes_per_sector: u32,
    sectors_per_cluster: u32,
    reserved_sectors: u32,
    fats: u32,
    root_entries: u32,
    total_sectors: u64,
    media: u8,
    fat_sectors: u64,
    hidden_sectors: u32,
}

impl BiosParameterBlock {
    fn parse(boot: &[u8]) -> Option<Self> {
        if !matches!(boot[0], 0xEB | 0xE9) {
            return None;
        }
        let bytes_per_sector = LittleEndian::read_u16(&boot[11..13]) as u32;
        let sectors_per_cluster = boot[13] as u32;
        let reserved_sectors = LittleEndian::read_u16(&boot[14..16]) as u32;
        let fats = boot[16] as u32;
        let media = boot[21];

        if !matches!(bytes_per_sector, 512 | 1024 | 2048 | 4096)
            || !sectors_per_cluster.is_power_of_two()
            || reserved_sectors == 0
            || !matches!(fats, 1 | 2)
            || !(media == 0xF0 || media >= 0xF8)
        {
            return None;
        }

        let total16 = LittleEndian::read_u16(&boot[19..21]) as u64;
        let total_sectors = if total16 != 0 {
            total16
        } else {
            LittleEndian::read_u32(&boot[32..36]) as u64
        };
        let fat16 = LittleEndian::read_u16(&boot[22..24]) as u64;
        let fat_sectors = if fat16 != 0 {
            fat16
        } else {
            LittleEndian::read_u32(&boot[36..40]) as u64
        };
        if total_sectors == 0 || fat_sectors == 0 {
            return None;
        }

        Some(BiosParameterBlock {
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors,
            fats,
            root_entries: LittleEndian::read_u16(&boot[17..19]) as u32,
            total_sectors,
            media,
            fat_sectors,
            hidden_sectors: LittleEndian::read_u32(&boot[28..32]),
        })
    }

    fn root_dir_sectors(&self) -> u64 {
        (self.root_entries as u64 * 32).div_ceil(self.bytes_per_sector as u64)
    }

    fn clusters(&self) -> Option<u64> {
        let overhead = self.reserved_sectors as u64
            + self.fats as u64 * self.fat_sectors
            + self.root_dir_sectors();
        let data = self.total_sectors.checked_sub(overhead)?;
        Some(data / self.sectors_per_cluster as u64)
    }
}

fn read_bpb(image: &mut dyn MediaImage, region: Region) -> Result<(Vec<u8>, BiosParameterBlock)> {
    let boot = region.read(image, 0, 512)?;
    let bpb = BiosParameterBlock::parse(&boot).ok_or(VolumeError::InvalidSignature {
        structure: "FAT boot sector",
    })?;
    Ok((boot, bpb))
}

pub fn identify(image: &mut dyn MediaImage, region: Region) -> bool {
    matches!(read_bpb(image, region), Ok((_, bpb)) if bpb.clusters().is_some_and(|c| c > 0))
}

pub fn information(image: &mut dyn MediaImage, region: Region) -> Result<FilesystemInfo> {
    let (boot, bpb) = read_bpb(image, region)?;
    let clusters = bpb
        .clusters()
        .ok_or_else(|| VolumeError::CorruptedData("FAT metadata exceeds volume".to_string()))?;

    let (type_name, extended) = if clusters < FAT12_MAX_CLUSTERS {
        ("FAT12", 0x24)
    } else if clusters < FAT16_MAX_CLUSTERS {
        ("FAT16", 0x24)
    } else {
        ("FAT32", 0x40)
    };

    let mut info = FilesystemInfo::new(FilesystemKind::Fat, type_name);
    info.cluster_size = bpb.bytes_per_sector * bpb.sectors_per_cluster;
    info.clusters = clusters;

    // Extended BPB: drive number, reserved, signature, serial, label, type
    let signature = boot[extended + 2];
    if matches!(signature, 0x28 | 0x29) {
        let serial = LittleEndian::read_u32(&boot[extended + 3..extended + 7]);
        info.serial = Some(format!("{:04X}-{:04X}", serial >> 16, serial & 0xFFFF));
        if signature == 0x29 {
            info.volume_name = padded_string(&boot[extended + 7..extended + 18])
                .filter(|label| label != "NO NAME");
        }
    }
    if let Some(oem) = padded_string(&boot[3..11]) {
        info.field("OEM name", oem);
    }
    info.field("Media descriptor", format!("0x{:02X}", bpb.media));
    info.field("FAT copies", bpb.fats);
    info.field("Sectors per FAT", bpb.fat_sectors);
    info.field("Hidden sectors", bpb.hidden_sectors);
    if bpb.root_entries > 0 {
        info.field("Root directory entries", bpb.root_entries);
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemImage;

    /// 1.44 MB floppy boot sector
    fn floppy() -> MemImage {
        let mut data = vec![0u8; 2880 * 512];
        let b = &mut data[..512];
        b[0..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        b[3..11].copy_from_slice(b"MSDOS5.0");
        LittleEndian::write_u16(&mut b[11..13], 512);
        b[13] = 1;
        LittleEndian::write_u16(&mut b[14..16], 1);
        b[16] = 2;
        LittleEndian::write_u16(&mut b[17..19], 224);
        LittleEndian::write_u16(&mut b[19..21], 2880);
        b[21] = 0xF0;
        LittleEndian::write_u16(&mut b[22..24], 9);
        b[0x26] = 0x29;
        LittleEndian::write_u32(&mut b[0x27..0x2B], 0x1234_ABCD);
        b[0x2B..0x36].copy_from_slice(b"BACKUP     ");
        b[0x36..0x3E].copy_from_slice(b"FAT12   ");
        b[510] = 0x55;
        b[511] = 0xAA;
        MemImage::new(data, 512)
    }

    #[test]
    fn test_floppy_is_fat12() {
        let mut image = floppy();
        let region = Region::whole(&image);
        assert!(identify(&mut image, region));

        let info = information(&mut image, region).unwrap();
        assert_eq!(info.type_name, "FAT12");
        // 2880 - 1 - 18 - 14 data sectors
        assert_eq!(info.clusters, 2847);
        assert_eq!(info.cluster_size, 512);
        assert_eq!(info.serial.as_deref(), Some("1234-ABCD"));
        assert_eq!(info.volume_name.as_deref(), Some("BACKUP"));
    }

    #[test]
    fn test_type_follows_cluster_count() {
        // FAT32-style BPB with few clusters is still FAT16 by count
        let mut data = vec![0u8; 512];
        data[0] = 0xEB;
        LittleEndian::write_u16(&mut data[11..13], 512);
        data[13] = 4;
        LittleEndian::write_u16(&mut data[14..16], 32);
        data[16] = 2;
        data[21] = 0xF8;
        LittleEndian::write_u32(&mut data[32..36], 200_000);
        LittleEndian::write_u32(&mut data[36..40], 200);
        data[0x42] = 0x29;
        data[0x52..0x5A].copy_from_slice(b"FAT32   ");
        data.resize(64 * 512, 0);
        let mut image = MemImage::new(data, 512);
        let region = Region::whole(&image);

        let info = information(&mut image, region).unwrap();
        assert_eq!(info.clusters, (200_000 - 32 - 400) / 4);
        assert_eq!(info.type_name, "FAT16");
    }

    #[test]
    fn test_rejects_non_fat_boot_sector() {
        let mut image = floppy();
        image.data[13] = 3;
        let region = Region::whole(&image);
        assert!(!identify(&mut image, region));
    }
}
