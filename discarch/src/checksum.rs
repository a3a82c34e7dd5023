//! Checksums of an image's tracks and/or of all its sectors.

use digests::{Algorithm, DigestSet, MultiDigest, DEFAULT_CHUNK_SIZE};
use mediaimage::MediaImage;
use tracing::{info, warn};

use crate::abort::AbortFlag;
use crate::error::Result;
use crate::extent::{hash_extent, Extent};
use crate::progress::Progress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumOptions {
    pub algorithms: Vec<Algorithm>,
    pub chunk_size: usize,
    /// One digest set per track
    pub separated_tracks: bool,
    /// One digest set over every sector
    pub whole_disc: bool,
}

impl Default for ChecksumOptions {
    fn default() -> Self {
        ChecksumOptions {
            algorithms: Algorithm::ALL.to_vec(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            separated_tracks: true,
            whole_disc: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackChecksum {
    pub sequence: u32,
    pub sectors: u64,
    pub checksums: DigestSet,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChecksumReport {
    pub tracks: Vec<TrackChecksum>,
    pub whole_disc: Option<DigestSet>,
}

/// Hash the user data of each track and/or of the whole image with one
/// worker pool. An image without tracks gets a whole-disc result instead
/// of per-track ones.
pub fn checksum_image(
    image: &mut dyn MediaImage,
    options: &ChecksumOptions,
    abort: &AbortFlag,
    progress: &mut dyn Progress,
) -> Result<ChecksumReport> {
    let mut pool = MultiDigest::new(&options.algorithms)?;
    let mut report = ChecksumReport::default();
    let mut whole_disc = options.whole_disc;

    if options.separated_tracks {
        let tracks: Vec<(u32, u64, u64)> = image
            .tracks()
            .iter()
            .map(|t| (t.sequence, t.start_sector, t.sector_count()))
            .collect();
        if tracks.is_empty() {
            warn!("image has no tracks, computing whole-disc checksums instead");
            whole_disc = true;
        }
        for (sequence, start, count) in tracks {
            let extent = Extent::Sectors {
                start,
                count,
                long: false,
            };
            let checksums = hash_extent(&mut pool, image, extent, options.chunk_size, abort, progress)?;
            report.tracks.push(TrackChecksum {
                sequence,
                sectors: count,
                checksums,
            });
        }
    }

    if whole_disc {
        let extent = Extent::Sectors {
            start: 0,
            count: image.sector_count(),
            long: false,
        };
        report.whole_disc = Some(hash_extent(
            &mut pool,
            image,
            extent,
            options.chunk_size,
            abort,
            progress,
        )?);
    }

    info!(
        tracks = report.tracks.len(),
        whole_disc = report.whole_disc.is_some(),
        algorithms = options.algorithms.len(),
        "checksums computed"
    );
    Ok(report)
}
