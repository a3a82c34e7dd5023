use std::path::Path;

use discarch::volumes::FilesystemInfo;
use discarch::{analyze_layout, Volume};

use crate::open_image;
use crate::style::*;

fn print_filesystem(fs: &FilesystemInfo, depth: usize, last: bool) {
    let name = fs.volume_name.as_deref().unwrap_or("");
    tree_line(
        last,
        depth,
        &format!("{GREEN}{BOLD}{}{RESET} {name}", fs.type_name),
    );
    let pad = "    ".repeat(depth + 1);
    if let Some(serial) = &fs.serial {
        println!("  {pad}{DIM}Serial{RESET}        {serial}");
    }
    let free = fs
        .free_clusters
        .map(|f| format!(", {} free", format_commas(f)))
        .unwrap_or_default();
    println!(
        "  {pad}{DIM}Clusters{RESET}      {} x {}{free}",
        format_commas(fs.clusters),
        format_size(fs.cluster_size as u64)
    );
    for (key, value) in &fs.fields {
        println!("  {pad}{DIM}{key:<13}{RESET} {value}");
    }
}

fn print_volumes(volumes: &[Volume]) {
    for (i, volume) in volumes.iter().enumerate() {
        let last = i + 1 == volumes.len();
        let depth = match &volume.partition {
            Some(p) => {
                let name = p.name.as_deref().unwrap_or("");
                let boot = if p.bootable { " [boot]" } else { "" };
                tree_line(
                    last,
                    0,
                    &format!(
                        "{BOLD}#{}{RESET} {} {DIM}sectors {}..{}{RESET} {name}{boot}",
                        p.sequence,
                        p.type_name,
                        p.start_sector,
                        p.end_sector()
                    ),
                );
                1
            }
            None => 0,
        };
        if volume.filesystems.is_empty() && volume.partition.is_none() {
            tree_line(last, 0, &format!("{DIM}no filesystem recognised{RESET}"));
        }
        for (j, fs) in volume.filesystems.iter().enumerate() {
            print_filesystem(fs, depth, j + 1 == volume.filesystems.len());
        }
    }
}

pub(crate) fn run(path: &Path) -> anyhow::Result<()> {
    let mut image = open_image(path)?;
    let info = image.info().clone();

    header(&format!("Image: {}", path.display()));
    section("Image");
    kv("Format", image.format_name());
    kv("Media type", info.media_type.name());
    kv("Sectors", &format_commas(info.sectors));
    kv("Sector size", &info.sector_size.to_string());
    kv("Size", &format_size(info.image_size));
    kv_opt("Title", info.media_title.as_deref());
    kv_opt("Serial", info.media_serial.as_deref());
    kv_opt("Creator", info.creator.as_deref());
    if !info.readable_tags.is_empty() {
        let tags: Vec<&str> = info.readable_tags.iter().map(|t| t.name()).collect();
        kv("Media tags", &tags.join(", "));
    }

    let layout = analyze_layout(image.as_mut());
    if let Some(scheme) = layout.partitions.first().map(|p| p.scheme) {
        kv_highlight(
            "Partition table",
            &format!("{} ({} partitions)", scheme.name(), layout.partitions.len()),
        );
    }

    for area in &layout.areas {
        match area.track {
            Some(sequence) => section(&format!("Track {sequence}")),
            None => section("Device"),
        }
        print_volumes(&area.volumes);
    }
    if layout.areas.is_empty() {
        println!("  {DIM}no data tracks{RESET}");
    }
    println!();
    Ok(())
}
