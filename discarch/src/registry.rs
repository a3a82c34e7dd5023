//! Everything the toolkit can recognise, gathered once per process.

use std::path::Path;
use std::sync::OnceLock;

use mediaimage::{FormatKind, FormatRegistry, ImageError, MediaImage};
use tracing::debug;
use volumes::{FilesystemKind, PartitionScheme};

use crate::error::{Error, Result};

/// Read-only lookup of image formats, partition schemes and filesystems.
#[derive(Debug)]
pub struct Registry {
    formats: &'static FormatRegistry,
    partition_schemes: Vec<PartitionScheme>,
    filesystems: Vec<FilesystemKind>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

impl Registry {
    pub fn global() -> &'static Registry {
        REGISTRY.get_or_init(|| {
            let registry = Registry {
                formats: FormatRegistry::global(),
                partition_schemes: PartitionScheme::ALL.to_vec(),
                filesystems: FilesystemKind::ALL.to_vec(),
            };
            debug!(
                formats = registry.formats.formats().len(),
                partition_schemes = registry.partition_schemes.len(),
                filesystems = registry.filesystems.len(),
                "registry built"
            );
            registry
        })
    }

    pub fn formats(&self) -> &[FormatKind] {
        self.formats.formats()
    }

    pub fn partition_schemes(&self) -> &[PartitionScheme] {
        &self.partition_schemes
    }

    pub fn filesystems(&self) -> &[FilesystemKind] {
        &self.filesystems
    }

    /// Open `path` with the first format that claims it.
    pub fn open(&self, path: &Path) -> Result<Box<dyn MediaImage>> {
        self.formats.open(path).map_err(|e| match e {
            ImageError::NotRecognized(path) => Error::FormatUnrecognized(path),
            source => Error::CannotOpenSource {
                path: path.to_path_buf(),
                source,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_global_lists_everything() {
        let registry = Registry::global();
        assert!(std::ptr::eq(registry, Registry::global()));
        assert_eq!(registry.formats().len(), 2);
        assert_eq!(registry.partition_schemes()[0], PartitionScheme::Gpt);
        assert_eq!(registry.filesystems().len(), FilesystemKind::ALL.len());
    }

    #[test]
    fn test_open_errors() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("odd.bin");
        fs::write(&odd, [0u8; 7]).unwrap();

        let registry = Registry::global();
        assert!(matches!(
            registry.open(&odd),
            Err(Error::FormatUnrecognized(_))
        ));
        assert!(matches!(
            registry.open(&dir.path().join("missing.iso")),
            Err(Error::CannotOpenSource { .. })
        ));
    }
}
