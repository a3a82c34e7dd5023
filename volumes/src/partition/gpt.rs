//! GUID Partition Table.
//!
//! The primary header lives at LBA 1; its CRC32 is verified before the
//! entry array is trusted. The backup header is not consulted.

use byteorder::{ByteOrder, LittleEndian};
use mediaimage::MediaImage;
use tracing::{debug, warn};

use super::{Partition, PartitionScheme};
use crate::error::{Result, VolumeError};
use crate::region::Region;

pub const SIGNATURE: &[u8; 8] = b"EFI PART";

const MIN_HEADER_SIZE: usize = 92;
const MIN_ENTRY_SIZE: usize = 128;
const MAX_ENTRIES: u32 = 1024;

const KNOWN_TYPES: &[(&str, &str)] = &[
    ("C12A7328-F81F-11D2-BA4B-00A0C93EC93B", "EFI System"),
    ("21686148-6449-6E6F-744E-656564454649", "BIOS boot"),
    ("E3C9E316-0B5C-4DB8-817D-F92DF00215AE", "Microsoft reserved"),
    ("EBD0A0A2-B9E5-4433-87C0-68B6B72699C7", "Microsoft basic data"),
    ("0FC63DAF-8483-4772-8E79-3D69D8477DE4", "Linux filesystem"),
    ("0657FD6D-A4AB-43C4-84E5-0933C84B4F4F", "Linux swap"),
    ("E6D6D379-F507-44C2-A23C-238F2A3DF928", "Linux LVM"),
    ("48465300-0000-11AA-AA11-00306543ECAC", "Apple HFS+"),
    ("7C3457EF-0000-11AA-AA11-00306543ECAC", "Apple APFS"),
    ("426F6F74-0000-11AA-AA11-00306543ECAC", "Apple boot"),
];

/// Format a GUID stored in the mixed-endian on-disk layout.
pub fn format_guid(bytes: &[u8]) -> String {
    format!(
        "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        LittleEndian::read_u32(&bytes[0..4]),
        LittleEndian::read_u16(&bytes[4..6]),
        LittleEndian::read_u16(&bytes[6..8]),
        bytes[8],
        bytes[9],
        bytes[10],
        bytes[11],
        bytes[12],
        bytes[13],
        bytes[14],
        bytes[15],
    )
}

pub fn type_name(guid: &str) -> &'static str {
    KNOWN_TYPES
        .iter()
        .find(|(g, _)| *g == guid)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

#[derive(Debug, Clone)]
struct Header {
    disk_guid: String,
    entries_lba: u64,
    entry_count: u32,
    entry_size: usize,
    entries_crc: u32,
}

fn parse_header(sector: &[u8]) -> Result<Option<Header>> {
    if sector.len() < MIN_HEADER_SIZE || &sector[0..8] != SIGNATURE {
        return Ok(None);
    }

    let header_size = LittleEndian::read_u32(&sector[12..16]) as usize;
    if header_size < MIN_HEADER_SIZE || header_size > sector.len() {
        return Err(VolumeError::CorruptedData(format!(
            "GPT header size {header_size}"
        )));
    }

    let stored = LittleEndian::read_u32(&sector[16..20]);
    let mut header = sector[..header_size].to_vec();
    header[16..20].fill(0);
    let computed = digests::crc32(&header);
    if stored != computed {
        return Err(VolumeError::ChecksumMismatch {
            structure: "GPT header",
            stored: stored as u64,
            computed: computed as u64,
        });
    }

    let entry_size = LittleEndian::read_u32(&sector[84..88]) as usize;
    if entry_size < MIN_ENTRY_SIZE || entry_size % 8 != 0 {
        return Err(VolumeError::CorruptedData(format!(
            "GPT entry size {entry_size}"
        )));
    }

    Ok(Some(Header {
        disk_guid: format_guid(&sector[56..72]),
        entries_lba: LittleEndian::read_u64(&sector[72..80]),
        entry_count: LittleEndian::read_u32(&sector[80..84]).min(MAX_ENTRIES),
        entry_size,
        entries_crc: LittleEndian::read_u32(&sector[88..92]),
    }))
}

fn entry_name(raw: &[u8]) -> Option<String> {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(LittleEndian::read_u16)
        .take_while(|&u| u != 0)
        .collect();
    if units.is_empty() {
        return None;
    }
    Some(String::from_utf16_lossy(&units))
}

pub fn parse(image: &mut dyn MediaImage) -> Result<Option<Vec<Partition>>> {
    let device_sectors = image.sector_count();
    let sector_size = image.sector_size() as u64;
    if device_sectors < 3 || sector_size < 512 {
        return Ok(None);
    }

    let sector = image.read_sector(1)?;
    let Some(header) = parse_header(&sector)? else {
        return Ok(None);
    };
    debug!(disk = %header.disk_guid, entries = header.entry_count, "GPT header");

    let table_len = header.entry_count as usize * header.entry_size;
    let table = Region::whole(image).read(image, header.entries_lba * sector_size, table_len)?;

    let computed = digests::crc32(&table);
    if computed != header.entries_crc {
        warn!(
            stored = header.entries_crc,
            computed, "GPT entry array checksum mismatch"
        );
    }

    let mut partitions = Vec::new();
    for (index, raw) in table.chunks_exact(header.entry_size).enumerate() {
        if raw[0..16].iter().all(|&b| b == 0) {
            continue;
        }
        let first = LittleEndian::read_u64(&raw[32..40]);
        let last = LittleEndian::read_u64(&raw[40..48]);
        if last < first || last >= device_sectors {
            debug!(index, first, last, "GPT entry outside device");
            continue;
        }
        let attributes = LittleEndian::read_u64(&raw[48..56]);
        let type_id = format_guid(&raw[0..16]);

        partitions.push(Partition {
            sequence: index as u32 + 1,
            start_sector: first,
            sectors: last - first + 1,
            scheme: PartitionScheme::Gpt,
            type_name: type_name(&type_id).to_string(),
            type_id,
            name: entry_name(&raw[56..128]),
            // Legacy BIOS bootable
            bootable: attributes & 0x4 != 0,
        });
    }

    Ok(Some(partitions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::identify_partitions;
    use crate::testing::{write_mbr_entry, MemImage};

    const EFI_SYSTEM: [u8; 16] = [
        0x28, 0x73, 0x2A, 0xC1, 0x1F, 0xF8, 0xD2, 0x11, 0xBA, 0x4B, 0x00, 0xA0, 0xC9, 0x3E, 0xC9,
        0x3B,
    ];
    const LINUX_FS: [u8; 16] = [
        0xAF, 0x3D, 0xC6, 0x0F, 0x83, 0x84, 0x72, 0x47, 0x8E, 0x79, 0x3D, 0x69, 0xD8, 0x47, 0x7D,
        0xE4,
    ];

    fn gpt_image(entries: &[([u8; 16], u64, u64, &str)]) -> MemImage {
        let mut data = vec![0u8; 4096 * 512];
        let table_start = 2 * 512;
        for (i, (kind, first, last, name)) in entries.iter().enumerate() {
            let e = &mut data[table_start + i * 128..table_start + (i + 1) * 128];
            e[0..16].copy_from_slice(kind);
            e[16] = i as u8 + 1;
            LittleEndian::write_u64(&mut e[32..40], *first);
            LittleEndian::write_u64(&mut e[40..48], *last);
            for (j, unit) in name.encode_utf16().enumerate() {
                LittleEndian::write_u16(&mut e[56 + j * 2..58 + j * 2], unit);
            }
        }
        let entries_crc = digests::crc32(&data[table_start..table_start + 128 * 128]);

        let h = &mut data[512..1024];
        h[0..8].copy_from_slice(SIGNATURE);
        LittleEndian::write_u32(&mut h[8..12], 0x0001_0000);
        LittleEndian::write_u32(&mut h[12..16], 92);
        LittleEndian::write_u64(&mut h[24..32], 1);
        LittleEndian::write_u64(&mut h[32..40], 4095);
        LittleEndian::write_u64(&mut h[40..48], 34);
        LittleEndian::write_u64(&mut h[48..56], 4062);
        h[56..72].copy_from_slice(&[0x11; 16]);
        LittleEndian::write_u64(&mut h[72..80], 2);
        LittleEndian::write_u32(&mut h[80..84], 128);
        LittleEndian::write_u32(&mut h[84..88], 128);
        LittleEndian::write_u32(&mut h[88..92], entries_crc);
        let crc = digests::crc32(&h[..92]);
        LittleEndian::write_u32(&mut h[16..20], crc);

        let mut image = MemImage::new(data, 512);
        write_mbr_entry(&mut image, 0, 0, 0xEE, 1, 4095);
        image
    }

    #[test]
    fn test_format_guid() {
        assert_eq!(
            format_guid(&EFI_SYSTEM),
            "C12A7328-F81F-11D2-BA4B-00A0C93EC93B"
        );
        assert_eq!(type_name(&format_guid(&LINUX_FS)), "Linux filesystem");
        assert_eq!(type_name("00000000-0000-0000-0000-000000000001"), "Unknown");
    }

    #[test]
    fn test_parse_entries() {
        let mut image = gpt_image(&[
            (EFI_SYSTEM, 34, 1057, "EFI"),
            (LINUX_FS, 1058, 4000, "root"),
        ]);
        let parts = parse(&mut image).unwrap().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].type_name, "EFI System");
        assert_eq!(parts[0].name.as_deref(), Some("EFI"));
        assert_eq!((parts[1].start_sector, parts[1].sectors), (1058, 2943));
        assert_eq!(parts[1].scheme, PartitionScheme::Gpt);
    }

    #[test]
    fn test_gpt_preferred_over_protective_mbr() {
        let mut image = gpt_image(&[(LINUX_FS, 34, 2047, "data")]);
        let parts = identify_partitions(&mut image);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].scheme, PartitionScheme::Gpt);
    }

    #[test]
    fn test_header_crc_mismatch() {
        let mut image = gpt_image(&[(LINUX_FS, 34, 2047, "data")]);
        image.data[512 + 40] ^= 0xFF;
        match parse(&mut image) {
            Err(VolumeError::ChecksumMismatch { structure, .. }) => {
                assert_eq!(structure, "GPT header")
            }
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
        // A damaged GPT is reported as absent by the probe loop
        assert!(identify_partitions(&mut image).is_empty());
    }

    #[test]
    fn test_entry_past_device_is_skipped() {
        let mut image = gpt_image(&[(LINUX_FS, 34, 2047, "ok"), (LINUX_FS, 2048, 99999, "bad")]);
        let parts = parse(&mut image).unwrap().unwrap();
        assert_eq!(parts.len(), 1);
    }
}
