//! Byte views of an image that the checksum engine can chunk.

use std::fmt;
use std::io;

use digests::{ChunkSource, DigestSet, MultiDigest, StreamChunker};
use mediaimage::{ImageError, MediaImage, Track, SUBCHANNEL_SIZE};

use crate::abort::AbortFlag;
use crate::error::Result;
use crate::progress::Progress;

/// Upper bound on sectors requested from the image in one call
const MAX_SECTORS_PER_READ: u64 = 4096;

/// A contiguous range of an image processed as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Bytes of the image's data file(s), in order
    WholeImage,
    /// Sectors `start..start + count`, as user data or as stored (`long`)
    Sectors { start: u64, count: u64, long: bool },
    /// Subchannel bytes of every sector of a track
    Subchannel { track: u32 },
}

impl Extent {
    /// Stored sectors of `track`
    pub fn track(track: &Track) -> Self {
        Extent::Sectors {
            start: track.start_sector,
            count: track.sector_count(),
            long: true,
        }
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::WholeImage => f.write_str("whole image"),
            Extent::Sectors { start, count, long } => {
                write!(f, "sectors {}..{}", start, start + count)?;
                if *long {
                    f.write_str(" (raw)")?;
                }
                Ok(())
            }
            Extent::Subchannel { track } => write!(f, "track {track} subchannel"),
        }
    }
}

/// End (exclusive, capped at `limit`) of the run of equally sized sectors
/// that contains `lba`. Track boundaries are the only places sizes change.
pub(crate) fn uniform_run_end(image: &dyn MediaImage, lba: u64, limit: u64) -> u64 {
    match image.track_at(lba) {
        Some(track) => limit.min(track.end_sector + 1),
        None => image
            .tracks()
            .iter()
            .map(|t| t.start_sector)
            .filter(|&start| start > lba)
            .min()
            .unwrap_or(limit)
            .min(limit),
    }
}

pub(crate) fn sector_size(image: &dyn MediaImage, lba: u64, long: bool) -> u32 {
    if long {
        image.long_sector_size_at(lba)
    } else {
        image.sector_size_at(lba)
    }
}

#[derive(Debug, Clone, Copy)]
struct Run {
    lba: u64,
    count: u64,
    unit: u64,
    byte_start: u64,
}

impl Run {
    fn byte_end(&self) -> u64 {
        self.byte_start + self.count * self.unit
    }
}

#[derive(Debug, Clone, Copy)]
enum ReadKind {
    User,
    Long,
    Subchannel(u32),
}

/// [`ChunkSource`] over one [`Extent`] of an open image.
pub struct ExtentSource<'a> {
    image: &'a mut dyn MediaImage,
    read: Option<ReadKind>,
    runs: Vec<Run>,
    len: u64,
    abort: AbortFlag,
}

impl<'a> ExtentSource<'a> {
    pub fn new(image: &'a mut dyn MediaImage, extent: Extent, abort: AbortFlag) -> Result<Self> {
        let (read, runs) = match extent {
            Extent::WholeImage => (None, Vec::new()),
            Extent::Sectors { start, count, long } => {
                let sectors = image.sector_count();
                if start.checked_add(count).map_or(true, |end| end > sectors) {
                    return Err(ImageError::SectorOutOfRange {
                        lba: start,
                        count,
                        sectors,
                    }
                    .into());
                }
                let kind = if long { ReadKind::Long } else { ReadKind::User };
                (Some(kind), sector_runs(&*image, start, count, long))
            }
            Extent::Subchannel { track } => {
                let t = image
                    .tracks()
                    .iter()
                    .find(|t| t.sequence == track)
                    .ok_or(ImageError::NoSuchTrack(track))?;
                if !t.has_subchannel {
                    return Err(ImageError::NoSubchannel(track).into());
                }
                let run = Run {
                    lba: t.start_sector,
                    count: t.sector_count(),
                    unit: SUBCHANNEL_SIZE as u64,
                    byte_start: 0,
                };
                (Some(ReadKind::Subchannel(track)), vec![run])
            }
        };

        let len = match read {
            None => image.image_size(),
            Some(_) => runs.last().map_or(0, Run::byte_end),
        };
        Ok(ExtentSource {
            image,
            read,
            runs,
            len,
            abort,
        })
    }

    fn read_run(&mut self, kind: ReadKind, lba: u64, count: u32) -> mediaimage::Result<Vec<u8>> {
        match kind {
            ReadKind::User => self.image.read_sectors(lba, count),
            ReadKind::Long => self.image.read_sectors_long(lba, count),
            ReadKind::Subchannel(track) => self.image.read_subchannel(track, lba, count),
        }
    }
}

fn sector_runs(image: &dyn MediaImage, start: u64, count: u64, long: bool) -> Vec<Run> {
    let end = start + count;
    let mut runs = Vec::new();
    let mut lba = start;
    let mut byte_start = 0;
    while lba < end {
        let run_end = uniform_run_end(image, lba, end);
        let run = Run {
            lba,
            count: run_end - lba,
            unit: sector_size(image, lba, long) as u64,
            byte_start,
        };
        byte_start = run.byte_end();
        runs.push(run);
        lba = run_end;
    }
    runs
}

fn into_io(e: ImageError) -> io::Error {
    match e {
        ImageError::Io(io) => io,
        other => io::Error::other(other),
    }
}

impl ChunkSource for ExtentSource<'_> {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        if self.abort.is_aborted() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "aborted"));
        }
        let Some(kind) = self.read else {
            return self.image.read_bytes(offset, buf).map_err(into_io);
        };

        let mut filled = 0usize;
        while filled < buf.len() {
            let pos = offset + filled as u64;
            let run = *self
                .runs
                .iter()
                .find(|r| pos >= r.byte_start && pos < r.byte_end())
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "read past extent"))?;

            let relative = pos - run.byte_start;
            let first = relative / run.unit;
            let skip = (relative % run.unit) as usize;
            let want = buf.len() - filled;
            let sectors = ((skip + want) as u64)
                .div_ceil(run.unit)
                .min(run.count - first)
                .min(MAX_SECTORS_PER_READ);

            let data = self
                .read_run(kind, run.lba + first, sectors as u32)
                .map_err(into_io)?;
            let take = want.min(data.len().saturating_sub(skip));
            if take == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short sector read"));
            }
            buf[filled..filled + take].copy_from_slice(&data[skip..skip + take]);
            filled += take;
        }
        Ok(())
    }
}

/// Hash one extent with an existing worker pool.
pub fn hash_extent(
    pool: &mut MultiDigest,
    image: &mut dyn MediaImage,
    extent: Extent,
    chunk_size: usize,
    abort: &AbortFlag,
    progress: &mut dyn Progress,
) -> Result<DigestSet> {
    let source = ExtentSource::new(image, extent, abort.clone())?;
    let chunker = StreamChunker::new(source, chunk_size)?;
    progress.start(&extent.to_string(), chunker.total_len());
    let result = pool.run(chunker, |done, _| progress.advance(done));
    progress.finish();
    Ok(result?)
}
