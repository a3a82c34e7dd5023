//! Partition schemes, probed in a fixed order.

pub mod gpt;
pub mod mbr;

use std::fmt;

use mediaimage::MediaImage;
use tracing::debug;

use crate::error::Result;
use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionScheme {
    Gpt,
    Mbr,
}

impl PartitionScheme {
    /// Probe order. A protective MBR must not hide the GPT behind it.
    pub const ALL: [PartitionScheme; 2] = [PartitionScheme::Gpt, PartitionScheme::Mbr];

    pub fn name(self) -> &'static str {
        match self {
            PartitionScheme::Gpt => "GUID Partition Table",
            PartitionScheme::Mbr => "Master Boot Record",
        }
    }

    /// Parse this scheme's table. `Ok(None)` when the scheme is absent.
    pub fn parse(self, image: &mut dyn MediaImage) -> Result<Option<Vec<Partition>>> {
        match self {
            PartitionScheme::Gpt => gpt::parse(image),
            PartitionScheme::Mbr => mbr::parse(image),
        }
    }
}

impl fmt::Display for PartitionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of a partition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub sequence: u32,
    pub start_sector: u64,
    pub sectors: u64,
    pub scheme: PartitionScheme,
    /// Raw type: hex byte for MBR, GUID for GPT
    pub type_id: String,
    pub type_name: String,
    pub name: Option<String>,
    pub bootable: bool,
}

impl Partition {
    pub fn region(&self) -> Region {
        Region::new(self.start_sector, self.sectors)
    }

    pub fn end_sector(&self) -> u64 {
        self.start_sector + self.sectors
    }
}

/// Find the partitions of `image` with the first scheme that recognizes it.
///
/// Read or parse failures count as "scheme not present".
pub fn identify_partitions(image: &mut dyn MediaImage) -> Vec<Partition> {
    for scheme in PartitionScheme::ALL {
        match scheme.parse(image) {
            Ok(Some(partitions)) => {
                debug!(scheme = %scheme, count = partitions.len(), "partitions found");
                return partitions;
            }
            Ok(None) => {}
            Err(e) => debug!(scheme = %scheme, error = %e, "partition probe failed"),
        }
    }
    Vec::new()
}

/// Partitions that overlap `range`, clipped to it.
pub fn partitions_in(partitions: &[Partition], range: Region) -> Vec<Partition> {
    partitions
        .iter()
        .filter(|p| p.start_sector < range.end_sector() && p.end_sector() > range.start_sector)
        .map(|p| {
            let start = p.start_sector.max(range.start_sector);
            let end = p.end_sector().min(range.end_sector());
            Partition {
                start_sector: start,
                sectors: end - start,
                ..p.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{mbr_image, MemImage};

    #[test]
    fn test_no_partitions_on_blank_image() {
        let mut image = MemImage::new(vec![0u8; 64 * 512], 512);
        assert!(identify_partitions(&mut image).is_empty());
    }

    #[test]
    fn test_tiny_image_is_not_an_error() {
        let mut image = MemImage::new(vec![0u8; 512], 512);
        assert!(identify_partitions(&mut image).is_empty());
    }

    #[test]
    fn test_mbr_found_when_no_gpt() {
        let mut image = mbr_image(&[(0x0C, 2048, 4096)], 8192);
        let parts = identify_partitions(&mut image);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].scheme, PartitionScheme::Mbr);
    }

    #[test]
    fn test_partitions_in_clips() {
        let p = Partition {
            sequence: 1,
            start_sector: 10,
            sectors: 100,
            scheme: PartitionScheme::Mbr,
            type_id: "0x83".to_string(),
            type_name: "Linux".to_string(),
            name: None,
            bootable: false,
        };
        let clipped = partitions_in(&[p], Region::new(50, 200));
        assert_eq!(clipped[0].start_sector, 50);
        assert_eq!(clipped[0].sectors, 60);
        assert!(partitions_in(&clipped, Region::new(0, 50)).is_empty());
    }
}
