//! Process-wide list of image formats, built once.

use std::path::Path;
use std::sync::OnceLock;

use tracing::debug;

use crate::cuesheet::CueImage;
use crate::error::{ImageError, Result};
use crate::raw::RawImage;
use crate::MediaImage;

/// Image container formats this crate can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    CueSheet,
    Raw,
}

impl FormatKind {
    pub fn name(self) -> &'static str {
        match self {
            FormatKind::CueSheet => "CUE sheet",
            FormatKind::Raw => "Raw disk image",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FormatKind::CueSheet => &["cue"],
            FormatKind::Raw => &["iso", "cdr", "toast", "img", "ima", "bin", "raw", "dd"],
        }
    }

    pub fn identify(self, path: &Path) -> bool {
        match self {
            FormatKind::CueSheet => CueImage::identify(path),
            FormatKind::Raw => RawImage::identify(path),
        }
    }

    pub fn open(self, path: &Path) -> Result<Box<dyn MediaImage>> {
        Ok(match self {
            FormatKind::CueSheet => Box::new(CueImage::open(path)?),
            FormatKind::Raw => Box::new(RawImage::open(path)?),
        })
    }
}

/// Read-only format table shared by the whole process.
#[derive(Debug)]
pub struct FormatRegistry {
    formats: Vec<FormatKind>,
}

static REGISTRY: OnceLock<FormatRegistry> = OnceLock::new();

impl FormatRegistry {
    pub fn global() -> &'static FormatRegistry {
        REGISTRY.get_or_init(|| FormatRegistry {
            // Raw claims any well-sized file, so it is probed last
            formats: vec![FormatKind::CueSheet, FormatKind::Raw],
        })
    }

    pub fn formats(&self) -> &[FormatKind] {
        &self.formats
    }

    /// First format that claims `path`.
    pub fn detect<P: AsRef<Path>>(&self, path: P) -> Option<FormatKind> {
        let path = path.as_ref();
        self.formats.iter().copied().find(|f| f.identify(path))
    }

    /// Open `path` with the first format that claims it.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn MediaImage>> {
        let path = path.as_ref();
        // Surface a missing or unreadable file as I/O, not as an unknown format
        std::fs::metadata(path)?;
        let format = self
            .detect(path)
            .ok_or_else(|| ImageError::NotRecognized(path.to_path_buf()))?;
        debug!(path = %path.display(), format = format.name(), "format detected");
        format.open(path)
    }
}
