//! APFS container superblock (NXSB).

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use mediaimage::MediaImage;

use super::{format_uuid, FilesystemInfo, FilesystemKind};
use crate::error::{Result, VolumeError};
use crate::region::Region;

/// "NXSB" as little-endian u32
pub const NX_MAGIC: u32 = 0x4253584E;
const OBJECT_TYPE_NX_SUPERBLOCK: u32 = 0x1;
const OBJECT_TYPE_MASK: u32 = 0x0000_FFFF;

const MIN_BLOCK_SIZE: u32 = 4096;
const MAX_BLOCK_SIZE: u32 = 65536;

/// APFS Fletcher-64 over 32-bit little-endian words, modulo 2^32 - 1.
///
/// `data` is the object without its leading checksum field.
pub fn fletcher64(data: &[u8]) -> u64 {
    const MODULUS: u64 = 0xFFFF_FFFF;
    let mut sum1: u64 = 0;
    let mut sum2: u64 = 0;

    for word in data.chunks_exact(4) {
        let word = u32::from_le_bytes([word[0], word[1], word[2], word[3]]) as u64;
        sum1 = (sum1 + word) % MODULUS;
        sum2 = (sum2 + sum1) % MODULUS;
    }

    let check1 = MODULUS - ((sum1 + sum2) % MODULUS);
    let check2 = MODULUS - ((sum1 + check1) % MODULUS);
    (check2 << 32) | check1
}

#[derive(Debug, Clone)]
struct NxSuperblock {
    stored_checksum: u64,
    xid: u64,
    block_size: u32,
    block_count: u64,
    features: u64,
    incompatible_features: u64,
    uuid: [u8; 16],
    max_file_systems: u32,
}

impl NxSuperblock {
    fn parse(block: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(block);
        let stored_checksum = cursor.read_u64::<LittleEndian>()?;
        let _oid = cursor.read_u64::<LittleEndian>()?;
        let xid = cursor.read_u64::<LittleEndian>()?;
        let object_type = cursor.read_u32::<LittleEndian>()?;
        let _subtype = cursor.read_u32::<LittleEndian>()?;

        let magic = cursor.read_u32::<LittleEndian>()?;
        if magic != NX_MAGIC || object_type & OBJECT_TYPE_MASK != OBJECT_TYPE_NX_SUPERBLOCK {
            return Err(VolumeError::InvalidSignature {
                structure: "APFS container superblock",
            });
        }

        let block_size = cursor.read_u32::<LittleEndian>()?;
        let block_count = cursor.read_u64::<LittleEndian>()?;
        let features = cursor.read_u64::<LittleEndian>()?;
        let _readonly_compatible_features = cursor.read_u64::<LittleEndian>()?;
        let incompatible_features = cursor.read_u64::<LittleEndian>()?;
        let mut uuid = [0u8; 16];
        cursor.read_exact(&mut uuid)?;

        // nx_max_file_systems follows the checkpoint and tree fields
        cursor.set_position(180);
        let max_file_systems = cursor.read_u32::<LittleEndian>()?;

        Ok(NxSuperblock {
            stored_checksum,
            xid,
            block_size,
            block_count,
            features,
            incompatible_features,
            uuid,
            max_file_systems,
        })
    }
}

fn read_superblock(image: &mut dyn MediaImage, region: Region) -> Result<(Vec<u8>, NxSuperblock)> {
    let block = region.read(image, 0, MIN_BLOCK_SIZE as usize)?;
    let superblock = NxSuperblock::parse(&block)?;
    Ok((block, superblock))
}

pub fn identify(image: &mut dyn MediaImage, region: Region) -> bool {
    read_superblock(image, region).is_ok()
}

pub fn information(image: &mut dyn MediaImage, region: Region) -> Result<FilesystemInfo> {
    let (mut block, nx) = read_superblock(image, region)?;
    if !nx.block_size.is_power_of_two() || !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&nx.block_size) {
        return Err(VolumeError::CorruptedData(format!(
            "APFS block size {}",
            nx.block_size
        )));
    }
    if nx.block_size != MIN_BLOCK_SIZE {
        block = region.read(image, 0, nx.block_size as usize)?;
    }

    let computed = fletcher64(&block[8..]);
    if computed != nx.stored_checksum {
        return Err(VolumeError::ChecksumMismatch {
            structure: "APFS container superblock",
            stored: nx.stored_checksum,
            computed,
        });
    }

    let mut info = FilesystemInfo::new(FilesystemKind::Apfs, "APFS");
    info.cluster_size = nx.block_size;
    info.clusters = nx.block_count;
    info.serial = Some(format_uuid(&nx.uuid));
    info.field("Transaction", nx.xid);
    info.field("Maximum volumes", nx.max_file_systems);
    info.field("Features", format!("0x{:016X}", nx.features));
    info.field(
        "Incompatible features",
        format!("0x{:016X}", nx.incompatible_features),
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ByteOrder;
    use crate::testing::MemImage;

    fn container() -> MemImage {
        let mut data = vec![0u8; 4 * 4096];
        let b = &mut data[..4096];
        LittleEndian::write_u64(&mut b[8..16], 1);
        LittleEndian::write_u64(&mut b[16..24], 42);
        LittleEndian::write_u32(&mut b[24..28], 0x8000_0001);
        LittleEndian::write_u32(&mut b[32..36], NX_MAGIC);
        LittleEndian::write_u32(&mut b[36..40], 4096);
        LittleEndian::write_u64(&mut b[40..48], 4);
        for (i, byte) in b[72..88].iter_mut().enumerate() {
            *byte = 0xA0 + i as u8;
        }
        LittleEndian::write_u32(&mut b[180..184], 100);
        let sum = fletcher64(&b[8..]);
        LittleEndian::write_u64(&mut b[0..8], sum);
        MemImage::new(data, 512)
    }

    #[test]
    fn test_fletcher64_known_values() {
        assert_eq!(fletcher64(&[]), 0xFFFF_FFFF_FFFF_FFFF);
        assert_eq!(fletcher64(&[1, 0, 0, 0]), 0x0000_0001_FFFF_FFFD);
    }

    #[test]
    fn test_container_information() {
        let mut image = container();
        let region = Region::whole(&image);
        assert!(identify(&mut image, region));

        let info = information(&mut image, region).unwrap();
        assert_eq!((info.cluster_size, info.clusters), (4096, 4));
        assert_eq!(
            info.serial.as_deref(),
            Some("a0a1a2a3-a4a5-a6a7-a8a9-aaabacadaeaf")
        );
        assert!(info
            .fields
            .contains(&("Transaction".to_string(), "42".to_string())));
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut image = container();
        image.data[100] ^= 1;
        let region = Region::whole(&image);
        assert!(identify(&mut image, region));
        assert!(matches!(
            information(&mut image, region),
            Err(VolumeError::ChecksumMismatch { .. })
        ));
    }
}
