//! DOS/MBR partition tables, including extended partition chains.

use std::collections::HashSet;

use byteorder::{ByteOrder, LittleEndian};
use mediaimage::MediaImage;
use tracing::debug;

use super::{Partition, PartitionScheme};
use crate::error::Result;

pub const BOOT_SIGNATURE: u16 = 0xAA55;
const SIGNATURE_OFFSET: usize = 510;
const TABLE_OFFSET: usize = 446;
const ENTRY_SIZE: usize = 16;

/// Logical partitions followed before an EBR chain is considered looping
const MAX_LOGICAL: usize = 128;

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: u8,
    kind: u8,
    start: u32,
    sectors: u32,
}

fn is_extended(kind: u8) -> bool {
    matches!(kind, 0x05 | 0x0F | 0x85)
}

pub fn type_name(kind: u8) -> &'static str {
    match kind {
        0x01 => "FAT12",
        0x04 | 0x06 | 0x0E => "FAT16",
        0x05 | 0x0F => "Extended",
        0x07 => "NTFS/exFAT/HPFS",
        0x0B | 0x0C => "FAT32",
        0x82 => "Linux swap",
        0x83 => "Linux",
        0x85 => "Linux extended",
        0x8E => "Linux LVM",
        0xA5 => "FreeBSD",
        0xA8 => "Apple UFS",
        0xAB => "Apple boot",
        0xAF => "Apple HFS/HFS+",
        0xEE => "GPT protective",
        0xEF => "EFI System",
        0xFD => "Linux RAID",
        _ => "Unknown",
    }
}

/// The four entries of a table sector, if it carries the boot signature.
fn read_table(sector: &[u8]) -> Option<[Entry; 4]> {
    if sector.len() < 512 || LittleEndian::read_u16(&sector[SIGNATURE_OFFSET..]) != BOOT_SIGNATURE {
        return None;
    }
    let entry = |i: usize| {
        let e = &sector[TABLE_OFFSET + i * ENTRY_SIZE..TABLE_OFFSET + (i + 1) * ENTRY_SIZE];
        Entry {
            status: e[0],
            kind: e[4],
            start: LittleEndian::read_u32(&e[8..12]),
            sectors: LittleEndian::read_u32(&e[12..16]),
        }
    };
    Some([entry(0), entry(1), entry(2), entry(3)])
}

fn partition(sequence: u32, entry: &Entry, start: u64) -> Partition {
    Partition {
        sequence,
        start_sector: start,
        sectors: entry.sectors as u64,
        scheme: PartitionScheme::Mbr,
        type_id: format!("0x{:02X}", entry.kind),
        type_name: type_name(entry.kind).to_string(),
        name: None,
        bootable: entry.status == 0x80,
    }
}

pub fn parse(image: &mut dyn MediaImage) -> Result<Option<Vec<Partition>>> {
    let device_sectors = image.sector_count();
    if device_sectors == 0 || image.sector_size() < 512 {
        return Ok(None);
    }

    let boot = image.read_sector(0)?;
    let Some(entries) = read_table(&boot) else {
        return Ok(None);
    };

    // A boot sector with code in the table area is a VBR, not an MBR
    if entries.iter().any(|e| e.status != 0x00 && e.status != 0x80) {
        return Ok(None);
    }
    if entries.iter().all(|e| e.kind == 0) || entries.iter().any(|e| e.kind == 0xEE) {
        return Ok(None);
    }

    let mut partitions = Vec::new();
    let mut next_logical = 5;

    for (slot, entry) in entries.iter().enumerate() {
        if entry.kind == 0 || entry.sectors == 0 {
            continue;
        }
        let start = entry.start as u64;
        if start + entry.sectors as u64 > device_sectors {
            debug!(slot, start, sectors = entry.sectors, "MBR entry past end of device");
            continue;
        }
        if is_extended(entry.kind) {
            walk_extended(image, start, &mut next_logical, &mut partitions)?;
        } else {
            partitions.push(partition(slot as u32 + 1, entry, start));
        }
    }

    Ok(Some(partitions))
}

/// Follow the EBR chain starting at `base`. Each EBR's first entry is a
/// logical partition relative to the EBR itself; the second links to the
/// next EBR relative to `base`.
fn walk_extended(
    image: &mut dyn MediaImage,
    base: u64,
    next_sequence: &mut u32,
    partitions: &mut Vec<Partition>,
) -> Result<()> {
    let device_sectors = image.sector_count();
    let mut seen = HashSet::new();
    let mut next = 0u64;

    for _ in 0..MAX_LOGICAL {
        let ebr = base + next;
        if ebr >= device_sectors || !seen.insert(ebr) {
            break;
        }
        let sector = image.read_sector(ebr)?;
        let Some(entries) = read_table(&sector) else {
            debug!(lba = ebr, "EBR without boot signature");
            break;
        };

        let logical = &entries[0];
        if logical.kind != 0 && logical.sectors > 0 {
            let start = ebr + logical.start as u64;
            if start + logical.sectors as u64 <= device_sectors {
                partitions.push(partition(*next_sequence, logical, start));
                *next_sequence += 1;
            }
        }

        let link = &entries[1];
        if !is_extended(link.kind) || link.start == 0 {
            break;
        }
        next = link.start as u64;
    }
    Ok(())
}
