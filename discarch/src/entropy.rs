//! Shannon entropy and duplicate-sector analysis.

use std::collections::HashSet;

use mediaimage::MediaImage;
use rayon::prelude::*;
use sha1::{Digest as _, Sha1};
use tracing::{debug, info, warn};

use crate::abort::AbortFlag;
use crate::error::Result;
use crate::extent::uniform_run_end;
use crate::progress::Progress;

/// Bytes counted per parallel histogram task
const HISTOGRAM_SPAN: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntropyOptions {
    /// Count sectors whose content repeats an earlier sector
    pub duplicated_sectors: bool,
    /// One result per track
    pub separated_tracks: bool,
    /// One result over every sector of the image
    pub whole_disc: bool,
    /// Sectors read per batch
    pub batch_sectors: u32,
}

impl Default for EntropyOptions {
    fn default() -> Self {
        EntropyOptions {
            duplicated_sectors: false,
            separated_tracks: true,
            whole_disc: true,
            batch_sectors: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyScope {
    Track(u32),
    WholeDisc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntropyResult {
    pub scope: EntropyScope,
    /// Bits per byte, `0.0..=8.0`
    pub entropy: f64,
    pub sectors: u64,
    /// Present when duplicate detection was requested
    pub unique_sectors: Option<u64>,
}

impl EntropyResult {
    pub fn unique_ratio(&self) -> Option<f64> {
        let unique = self.unique_sectors?;
        if self.sectors == 0 {
            return None;
        }
        Some(unique as f64 / self.sectors as f64)
    }
}

/// Byte-value histogram, mergeable in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram([u64; 256]);

impl Default for Histogram {
    fn default() -> Self {
        Histogram([0; 256])
    }
}

impl Histogram {
    pub fn of(data: &[u8]) -> Self {
        let mut histogram = Histogram::default();
        for &byte in data {
            histogram.0[byte as usize] += 1;
        }
        histogram
    }

    /// Histogram of `data`, counted in parallel spans.
    pub fn par_of(data: &[u8]) -> Self {
        data.par_chunks(HISTOGRAM_SPAN)
            .map(Histogram::of)
            .reduce(Histogram::default, Histogram::merge)
    }

    pub fn merge(mut self, other: Histogram) -> Self {
        for (a, b) in self.0.iter_mut().zip(other.0) {
            *a += b;
        }
        self
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// `-Σ p·log2(p)` over the non-empty buckets.
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        let entropy: f64 = self
            .0
            .iter()
            .filter(|&&count| count > 0)
            .map(|&count| {
                let p = count as f64 / total;
                -p * p.log2()
            })
            .sum();
        if entropy <= 0.0 {
            0.0
        } else {
            entropy.min(8.0)
        }
    }
}

struct Scan {
    histogram: Histogram,
    sectors: u64,
    unique: Option<u64>,
}

/// Histogram and, optionally, unique-sector count of `start..start + count`.
fn scan(
    image: &mut dyn MediaImage,
    start: u64,
    count: u64,
    options: &EntropyOptions,
    abort: &AbortFlag,
    progress: &mut dyn Progress,
) -> Result<Scan> {
    let end = start + count;
    let batch = options.batch_sectors.max(1) as u64;
    let mut histogram = Histogram::default();
    let mut seen: HashSet<[u8; 20]> = HashSet::new();
    let mut duplicates = 0u64;

    let mut lba = start;
    while lba < end {
        abort.check()?;
        let batch_end = uniform_run_end(&*image, lba, end.min(lba + batch));
        let sectors = (batch_end - lba) as u32;
        let data = image.read_sectors(lba, sectors)?;

        histogram = histogram.merge(Histogram::par_of(&data));
        if options.duplicated_sectors {
            let size = image.sector_size_at(lba).max(1) as usize;
            let fingerprints: Vec<[u8; 20]> = data
                .par_chunks(size)
                .map(|sector| {
                    let mut fingerprint = [0u8; 20];
                    fingerprint.copy_from_slice(&Sha1::digest(sector));
                    fingerprint
                })
                .collect();
            for fingerprint in fingerprints {
                if !seen.insert(fingerprint) {
                    duplicates += 1;
                }
            }
        }

        lba = batch_end;
        progress.advance(lba - start);
    }

    Ok(Scan {
        histogram,
        sectors: count,
        unique: options.duplicated_sectors.then(|| count - duplicates),
    })
}

fn result(
    scope: EntropyScope,
    image: &mut dyn MediaImage,
    start: u64,
    count: u64,
    options: &EntropyOptions,
    abort: &AbortFlag,
    progress: &mut dyn Progress,
) -> Result<EntropyResult> {
    let label = match scope {
        EntropyScope::Track(sequence) => format!("entropy of track {sequence}"),
        EntropyScope::WholeDisc => "entropy of whole disc".to_string(),
    };
    progress.start(&label, count);
    let scanned = scan(image, start, count, options, abort, progress);
    progress.finish();
    let scanned = scanned?;

    let result = EntropyResult {
        scope,
        entropy: scanned.histogram.entropy(),
        sectors: scanned.sectors,
        unique_sectors: scanned.unique,
    };
    debug!(?scope, entropy = result.entropy, unique = ?result.unique_sectors, "entropy computed");
    Ok(result)
}

/// Entropy of each track and/or of the whole image.
///
/// The whole-disc result is its own pass over every sector, never a merge
/// of the track results, since tracks need not cover the whole medium.
/// An image without tracks asked for per-track results gets a whole-disc
/// result instead.
pub fn analyze_entropy(
    image: &mut dyn MediaImage,
    options: &EntropyOptions,
    abort: &AbortFlag,
    progress: &mut dyn Progress,
) -> Result<Vec<EntropyResult>> {
    let mut results = Vec::new();
    let mut whole_disc = options.whole_disc;

    if options.separated_tracks {
        let tracks: Vec<(u32, u64, u64)> = image
            .tracks()
            .iter()
            .map(|t| (t.sequence, t.start_sector, t.sector_count()))
            .collect();
        if tracks.is_empty() {
            warn!("image has no tracks, computing whole-disc entropy instead");
            whole_disc = true;
        }
        for (sequence, start, count) in tracks {
            results.push(result(
                EntropyScope::Track(sequence),
                image,
                start,
                count,
                options,
                abort,
                progress,
            )?);
        }
    }

    if whole_disc {
        let sectors = image.sector_count();
        results.push(result(
            EntropyScope::WholeDisc,
            image,
            0,
            sectors,
            options,
            abort,
            progress,
        )?);
    }

    info!(results = results.len(), "entropy analysis finished");
    Ok(results)
}
