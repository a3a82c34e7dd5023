//! Filesystem identification.
//!
//! Each [`FilesystemKind`] knows how to recognise its superblock inside a
//! [`Region`] and how to summarise it as a [`FilesystemInfo`]. Nothing here
//! walks directories; only volume-level metadata is read.

pub mod apfs;
pub mod ext;
pub mod fat;
pub mod hfsplus;
pub mod iso9660;

use std::fmt;

use mediaimage::MediaImage;
use tracing::debug;

use crate::error::Result;
use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilesystemKind {
    Iso9660,
    Fat,
    HfsPlus,
    Apfs,
    Ext,
}

impl FilesystemKind {
    pub const ALL: [FilesystemKind; 5] = [
        FilesystemKind::Iso9660,
        FilesystemKind::Fat,
        FilesystemKind::HfsPlus,
        FilesystemKind::Apfs,
        FilesystemKind::Ext,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilesystemKind::Iso9660 => "ISO9660 Filesystem",
            FilesystemKind::Fat => "Microsoft File Allocation Table",
            FilesystemKind::HfsPlus => "Apple HFS+ Filesystem",
            FilesystemKind::Apfs => "Apple File System",
            FilesystemKind::Ext => "Linux extended Filesystem",
        }
    }

    /// Cheap signature check. Read errors count as "not this filesystem".
    pub fn identify(self, image: &mut dyn MediaImage, region: Region) -> bool {
        match self {
            FilesystemKind::Iso9660 => iso9660::identify(image, region),
            FilesystemKind::Fat => fat::identify(image, region),
            FilesystemKind::HfsPlus => hfsplus::identify(image, region),
            FilesystemKind::Apfs => apfs::identify(image, region),
            FilesystemKind::Ext => ext::identify(image, region),
        }
    }

    pub fn information(self, image: &mut dyn MediaImage, region: Region) -> Result<FilesystemInfo> {
        match self {
            FilesystemKind::Iso9660 => iso9660::information(image, region),
            FilesystemKind::Fat => fat::information(image, region),
            FilesystemKind::HfsPlus => hfsplus::information(image, region),
            FilesystemKind::Apfs => apfs::information(image, region),
            FilesystemKind::Ext => ext::information(image, region),
        }
    }
}

impl fmt::Display for FilesystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Volume-level summary of an identified filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemInfo {
    pub kind: FilesystemKind,
    /// Variant name, e.g. `FAT16`, `HFSX`, `ext4`
    pub type_name: String,
    pub volume_name: Option<String>,
    pub serial: Option<String>,
    pub cluster_size: u32,
    pub clusters: u64,
    pub free_clusters: Option<u64>,
    /// Extra named values, in display order
    pub fields: Vec<(String, String)>,
}

impl FilesystemInfo {
    fn new(kind: FilesystemKind, type_name: impl Into<String>) -> Self {
        FilesystemInfo {
            kind,
            type_name: type_name.into(),
            volume_name: None,
            serial: None,
            cluster_size: 0,
            clusters: 0,
            free_clusters: None,
            fields: Vec::new(),
        }
    }

    fn field(&mut self, name: &str, value: impl ToString) {
        self.fields.push((name.to_string(), value.to_string()));
    }
}

/// Every filesystem recognised in `region`.
///
/// A probe whose information step fails is logged and left out.
pub fn identify_filesystems(image: &mut dyn MediaImage, region: Region) -> Vec<FilesystemInfo> {
    let mut found = Vec::new();
    for kind in FilesystemKind::ALL {
        if !kind.identify(image, region) {
            continue;
        }
        match kind.information(image, region) {
            Ok(info) => {
                debug!(kind = %kind, start = region.start_sector, "filesystem identified");
                found.push(info);
            }
            Err(e) => debug!(kind = %kind, error = %e, "filesystem information failed"),
        }
    }
    found
}

/// Space- and NUL-padded on-disk string, or `None` when blank.
fn padded_string(raw: &[u8]) -> Option<String> {
    let text: String = String::from_utf8_lossy(raw)
        .trim_end_matches(['\0', ' '])
        .trim_start()
        .to_string();
    (!text.is_empty()).then_some(text)
}

/// Big-endian UUID bytes in the usual 8-4-4-4-12 form.
fn format_uuid(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemImage;

    #[test]
    fn test_padded_string() {
        assert_eq!(padded_string(b"NO NAME    ").as_deref(), Some("NO NAME"));
        assert_eq!(padded_string(b"CDROM\0\0\0"), Some("CDROM".to_string()));
        assert_eq!(padded_string(b"     "), None);
    }

    #[test]
    fn test_format_uuid() {
        let bytes: Vec<u8> = (0..16).collect();
        assert_eq!(format_uuid(&bytes), "00010203-0405-0607-0809-0a0b0c0d0e0f");
    }

    #[test]
    fn test_blank_region_has_no_filesystem() {
        let mut image = MemImage::new(vec![0u8; 128 * 512], 512);
        let region = Region::whole(&image);
        assert!(identify_filesystems(&mut image, region).is_empty());
    }

    #[test]
    fn test_tiny_region_is_not_an_error() {
        let mut image = MemImage::new(vec![0u8; 512], 512);
        let region = Region::whole(&image);
        for kind in FilesystemKind::ALL {
            assert!(!kind.identify(&mut image, region), "{kind}");
        }
    }
}
