use std::path::Path;
use std::time::Instant;

use anyhow::bail;
use discarch::digests::DigestSet;
use discarch::{checksum_image, AbortFlag, ChecksumOptions};

use crate::open_image;
use crate::progress::{BarProgress, Unit};
use crate::style::*;

fn print_digests(set: &DigestSet) {
    for digest in set.iter() {
        kv(digest.algorithm().name(), digest.as_str());
    }
}

pub(crate) fn run(path: &Path, options: ChecksumOptions, abort: &AbortFlag) -> anyhow::Result<()> {
    if options.algorithms.is_empty() {
        bail!("every checksum algorithm is disabled");
    }
    let mut image = open_image(path)?;
    let started = Instant::now();

    header(&format!("Checksums: {}", path.display()));
    let mut progress = BarProgress::new(Unit::Bytes);
    let report = checksum_image(image.as_mut(), &options, abort, &mut progress)?;

    for track in &report.tracks {
        section(&format!(
            "Track {} ({} sectors)",
            track.sequence,
            format_commas(track.sectors)
        ));
        print_digests(&track.checksums);
    }
    if let Some(whole) = &report.whole_disc {
        section("Whole disc");
        print_digests(whole);
    }
    println!();
    kv("Elapsed", &format_duration(started.elapsed()));
    println!();
    Ok(())
}
