//! Sector-by-sector comparison of two images.
//!
//! Both images are read in batches of equally sized sectors, the two reads
//! of a batch running concurrently. A batch that fails to read is retried
//! sector by sector so one bad sector never hides its neighbours; sectors
//! that still cannot be read are recorded as skipped.

use std::fmt;

use chrono::{DateTime, Utc};
use mediaimage::{MediaImage, MediaTagKind, MediaType};
use tracing::{debug, info, warn};
use volumes::identify_partitions;

use crate::abort::AbortFlag;
use crate::error::Result;
use crate::extent::{sector_size, uniform_run_end};
use crate::progress::Progress;

/// Metadata of one image, flattened for side-by-side comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSnapshot {
    pub format: &'static str,
    pub sectors: u64,
    pub sector_size: u32,
    pub image_size: u64,
    pub media_type: MediaType,
    pub creation_time: Option<DateTime<Utc>>,
    pub modification_time: Option<DateTime<Utc>>,
    pub application: Option<String>,
    pub application_version: Option<String>,
    pub creator: Option<String>,
    pub comments: Option<String>,
    pub media_title: Option<String>,
    pub media_serial: Option<String>,
    pub media_manufacturer: Option<String>,
    pub media_model: Option<String>,
    pub drive_manufacturer: Option<String>,
    pub drive_model: Option<String>,
    pub drive_serial: Option<String>,
    pub readable_tags: Vec<MediaTagKind>,
    pub has_partitions: bool,
    pub has_sessions: bool,
    pub sessions: u32,
    pub tracks: usize,
}

impl ImageSnapshot {
    /// Snapshot `image`. A block image counts as partitioned when a
    /// partition scheme recognises it.
    pub fn capture(image: &mut dyn MediaImage) -> Self {
        let has_partitions = image.info().has_partitions || {
            let found = identify_partitions(image);
            debug!(partitions = found.len(), "partition presence probed");
            !found.is_empty()
        };
        let info = image.info();
        ImageSnapshot {
            format: image.format_name(),
            sectors: image.sector_count(),
            sector_size: image.sector_size(),
            image_size: image.image_size(),
            media_type: info.media_type,
            creation_time: info.creation_time,
            modification_time: info.modification_time,
            application: info.application.clone(),
            application_version: info.application_version.clone(),
            creator: info.creator.clone(),
            comments: info.comments.clone(),
            media_title: info.media_title.clone(),
            media_serial: info.media_serial.clone(),
            media_manufacturer: info.media_manufacturer.clone(),
            media_model: info.media_model.clone(),
            drive_manufacturer: info.drive_manufacturer.clone(),
            drive_model: info.drive_model.clone(),
            drive_serial: info.drive_serial.clone(),
            readable_tags: info.readable_tags.clone(),
            has_partitions,
            has_sessions: info.has_sessions,
            sessions: info.sessions,
            tracks: image.tracks().len(),
        }
    }

    /// Every field as `(label, value)`, in display order.
    fn rows(&self) -> Vec<(&'static str, String)> {
        fn text(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }
        fn time(value: &Option<DateTime<Utc>>) -> String {
            value.map(|t| t.to_rfc3339()).unwrap_or_default()
        }
        let mut rows = vec![
            ("Format", self.format.to_string()),
            ("Sectors", self.sectors.to_string()),
            ("Sector size", self.sector_size.to_string()),
            ("Image size", self.image_size.to_string()),
            ("Media type", self.media_type.to_string()),
            ("Creation time", time(&self.creation_time)),
            ("Modification time", time(&self.modification_time)),
            ("Application", text(&self.application)),
            ("Application version", text(&self.application_version)),
            ("Creator", text(&self.creator)),
            ("Comments", text(&self.comments)),
            ("Media title", text(&self.media_title)),
            ("Media serial", text(&self.media_serial)),
            ("Media manufacturer", text(&self.media_manufacturer)),
            ("Media model", text(&self.media_model)),
            ("Drive manufacturer", text(&self.drive_manufacturer)),
            ("Drive model", text(&self.drive_model)),
            ("Drive serial", text(&self.drive_serial)),
            ("Has partitions", yes_no(self.has_partitions)),
            ("Has sessions", yes_no(self.has_sessions)),
            ("Sessions", self.sessions.to_string()),
            ("Tracks", self.tracks.to_string()),
        ];
        for kind in MediaTagKind::ALL {
            rows.push((kind.name(), yes_no(self.readable_tags.contains(&kind))));
        }
        rows
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// Sectors read from each image per batch
    pub batch_sectors: u32,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions { batch_sectors: 256 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceKind {
    /// Some byte differs within the common length
    Content,
    /// Same bytes up to the shorter sector, different lengths
    Size { len_a: usize, len_b: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorDifference {
    pub sector: u64,
    pub kind: DifferenceKind,
}

/// A characteristic that alone makes two images differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDifference {
    pub field: &'static str,
    pub a: String,
    pub b: String,
}

#[derive(Debug, Clone)]
pub struct CompareReport {
    pub images_differ: bool,
    pub metadata_differences: Vec<MetadataDifference>,
    pub sector_differences: Vec<SectorDifference>,
    /// Sectors that could not be read from one of the images
    pub skipped_sectors: Vec<u64>,
    pub sectors_compared: u64,
    pub interrupted: bool,
    pub first: ImageSnapshot,
    pub second: ImageSnapshot,
}

impl CompareReport {
    /// Text rendering; `verbose` adds a table of every metadata field.
    pub fn display(&self, verbose: bool) -> ReportDisplay<'_> {
        ReportDisplay {
            report: self,
            verbose,
        }
    }
}

/// Classify a pair of sectors, `None` when identical.
pub fn classify(a: &[u8], b: &[u8]) -> Option<DifferenceKind> {
    let common = a.len().min(b.len());
    if a[..common] != b[..common] {
        Some(DifferenceKind::Content)
    } else if a.len() != b.len() {
        Some(DifferenceKind::Size {
            len_a: a.len(),
            len_b: b.len(),
        })
    } else {
        None
    }
}

fn metadata_differences(a: &ImageSnapshot, b: &ImageSnapshot) -> Vec<MetadataDifference> {
    let mut found = Vec::new();
    let mut check = |field: &'static str, x: String, y: String| {
        if x != y {
            found.push(MetadataDifference { field, a: x, b: y });
        }
    };
    check("Sectors", a.sectors.to_string(), b.sectors.to_string());
    check(
        "Sector size",
        a.sector_size.to_string(),
        b.sector_size.to_string(),
    );
    check("Media type", a.media_type.to_string(), b.media_type.to_string());
    check(
        "Has partitions",
        yes_no(a.has_partitions),
        yes_no(b.has_partitions),
    );
    check("Has sessions", yes_no(a.has_sessions), yes_no(b.has_sessions));
    if a.has_sessions && b.has_sessions {
        check("Sessions", a.sessions.to_string(), b.sessions.to_string());
    }
    found
}

/// Compare `a` against `b`, sector by sector, up to the shorter image.
pub fn compare_images(
    a: &mut dyn MediaImage,
    b: &mut dyn MediaImage,
    options: &CompareOptions,
    abort: &AbortFlag,
    progress: &mut dyn Progress,
) -> Result<CompareReport> {
    let first = ImageSnapshot::capture(a);
    let second = ImageSnapshot::capture(b);
    let least = first.sectors.min(second.sectors);
    let batch = options.batch_sectors.max(1) as u64;

    let mut report = CompareReport {
        images_differ: false,
        metadata_differences: metadata_differences(&first, &second),
        sector_differences: Vec::new(),
        skipped_sectors: Vec::new(),
        sectors_compared: 0,
        interrupted: false,
        first,
        second,
    };

    progress.start("comparing sectors", least);
    let mut lba = 0u64;
    while lba < least {
        if abort.is_aborted() {
            warn!(sector = lba, "comparison interrupted");
            report.interrupted = true;
            break;
        }
        let limit = least.min(lba + batch);
        let end = uniform_run_end(&*a, lba, limit).min(uniform_run_end(&*b, lba, limit));
        let count = (end - lba) as u32;

        let (read_a, read_b) = rayon::join(
            || a.read_sectors(lba, count),
            || b.read_sectors(lba, count),
        );
        let size_a = sector_size(&*a, lba, false) as usize;
        let size_b = sector_size(&*b, lba, false) as usize;
        match (read_a, read_b) {
            (Ok(data_a), Ok(data_b))
                if data_a.len() == size_a * count as usize
                    && data_b.len() == size_b * count as usize =>
            {
                let pairs = data_a.chunks_exact(size_a).zip(data_b.chunks_exact(size_b));
                for (sector, (x, y)) in (lba..end).zip(pairs) {
                    if let Some(kind) = classify(x, y) {
                        report.sector_differences.push(SectorDifference { sector, kind });
                    }
                }
            }
            (read_a, read_b) => {
                debug!(
                    lba,
                    count,
                    first_ok = read_a.is_ok(),
                    second_ok = read_b.is_ok(),
                    "batch read failed, retrying per sector"
                );
                compare_singly(a, b, lba, end, &mut report);
            }
        }

        report.sectors_compared += end - lba;
        lba = end;
        progress.advance(lba);
    }
    progress.finish();

    report.images_differ =
        !report.metadata_differences.is_empty() || !report.sector_differences.is_empty();
    info!(
        compared = report.sectors_compared,
        differences = report.sector_differences.len(),
        skipped = report.skipped_sectors.len(),
        differ = report.images_differ,
        "comparison finished"
    );
    Ok(report)
}

fn compare_singly(
    a: &mut dyn MediaImage,
    b: &mut dyn MediaImage,
    start: u64,
    end: u64,
    report: &mut CompareReport,
) {
    for sector in start..end {
        match (a.read_sector(sector), b.read_sector(sector)) {
            (Ok(x), Ok(y)) => {
                if let Some(kind) = classify(&x, &y) {
                    report.sector_differences.push(SectorDifference { sector, kind });
                }
            }
            (x, y) => {
                let error = x.err().or(y.err()).map(|e| e.to_string()).unwrap_or_default();
                debug!(sector, %error, "sector skipped");
                report.skipped_sectors.push(sector);
            }
        }
    }
}

pub struct ReportDisplay<'a> {
    report: &'a CompareReport,
    verbose: bool,
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        if self.verbose {
            let first = report.first.rows();
            let second = report.second.rows();
            let width = first
                .iter()
                .map(|(_, v)| v.len())
                .max()
                .unwrap_or(0)
                .max("First image".len());
            writeln!(f, "{:<22} {:<width$} Second image", "Field", "First image")?;
            for ((label, x), (_, y)) in first.iter().zip(&second) {
                let marker = if x != y { '*' } else { ' ' };
                writeln!(f, "{label:<22} {x:<width$} {y}{marker}")?;
            }
            writeln!(f)?;
        } else {
            for d in &report.metadata_differences {
                writeln!(f, "{} differ ({} vs {})", d.field, d.a, d.b)?;
            }
        }

        for d in &report.sector_differences {
            match d.kind {
                DifferenceKind::Content => writeln!(f, "Sector {} is different", d.sector)?,
                DifferenceKind::Size { len_a, len_b } => writeln!(
                    f,
                    "Sector {} has the same content but different size ({len_a} vs {len_b} bytes)",
                    d.sector
                )?,
            }
        }
        if !report.skipped_sectors.is_empty() {
            writeln!(
                f,
                "{} sectors could not be read and were skipped",
                report.skipped_sectors.len()
            )?;
        }
        if report.interrupted {
            writeln!(
                f,
                "Comparison interrupted after {} sectors",
                report.sectors_compared
            )?;
        }
        if report.images_differ {
            write!(f, "Images differ")
        } else {
            write!(f, "Images do not differ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(b"abc", b"abc"), None);
        assert_eq!(classify(b"abc", b"abd"), Some(DifferenceKind::Content));
        assert_eq!(classify(b"abx", b"abcd"), Some(DifferenceKind::Content));
        assert_eq!(
            classify(b"abc", b"abcd"),
            Some(DifferenceKind::Size { len_a: 3, len_b: 4 })
        );
    }

    #[test]
    fn test_default_batch() {
        assert_eq!(CompareOptions::default().batch_sectors, 256);
    }
}
