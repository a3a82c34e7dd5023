use discarch::digests::Algorithm;
use discarch::Registry;

use crate::style::*;

pub(crate) fn run() {
    let registry = Registry::global();

    header("Supported formats");

    section("Image formats");
    let formats = registry.formats();
    for (i, format) in formats.iter().enumerate() {
        let extensions = format.extensions().join(", ");
        tree_line(
            i + 1 == formats.len(),
            0,
            &format!("{BOLD}{}{RESET} {DIM}{extensions}{RESET}", format.name()),
        );
    }

    section("Partition schemes");
    let schemes = registry.partition_schemes();
    for (i, scheme) in schemes.iter().enumerate() {
        tree_line(i + 1 == schemes.len(), 0, scheme.name());
    }

    section("Filesystems");
    let filesystems = registry.filesystems();
    for (i, fs) in filesystems.iter().enumerate() {
        tree_line(i + 1 == filesystems.len(), 0, fs.name());
    }

    section("Checksum algorithms");
    let names: Vec<&str> = Algorithm::ALL.iter().map(|a| a.name()).collect();
    kv("Available", &names.join(", "));
    println!();
}
