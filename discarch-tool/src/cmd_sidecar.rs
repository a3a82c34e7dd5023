use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use discarch::{create_sidecar, sidecar_path, AbortFlag, SidecarOptions};

use crate::progress::{BarProgress, Unit};
use crate::style::*;

pub(crate) fn run(image: &Path, chunk_size: usize, abort: &AbortFlag) -> anyhow::Result<()> {
    let options = SidecarOptions {
        chunk_size,
        ..Default::default()
    };
    let started = Instant::now();

    header(&format!("Sidecar: {}", image.display()));
    kv("Output", &sidecar_path(image).display().to_string());
    kv("Algorithms", &options.algorithms.len().to_string());
    kv("Chunk size", &format_size(chunk_size as u64));

    let mut progress = BarProgress::new(Unit::Bytes);
    let written = create_sidecar(image, &options, abort, &mut progress)
        .with_context(|| format!("cannot create sidecar for {}", image.display()))?;

    let size = std::fs::metadata(&written).map(|m| m.len()).unwrap_or(0);
    println!();
    kv_highlight("Written", &written.display().to_string());
    kv("Sidecar size", &format_size(size));
    kv("Elapsed", &format_duration(started.elapsed()));
    println!();
    Ok(())
}
