use std::path::Path;

use discarch::{analyze_entropy, AbortFlag, EntropyOptions, EntropyScope};

use crate::open_image;
use crate::progress::{BarProgress, Unit};
use crate::style::*;

pub(crate) fn run(path: &Path, options: EntropyOptions, abort: &AbortFlag) -> anyhow::Result<()> {
    let mut image = open_image(path)?;

    header(&format!("Entropy: {}", path.display()));
    let mut progress = BarProgress::new(Unit::Sectors);
    let results = analyze_entropy(image.as_mut(), &options, abort, &mut progress)?;

    section("Results");
    for result in &results {
        let scope = match result.scope {
            EntropyScope::Track(sequence) => format!("Track {sequence}"),
            EntropyScope::WholeDisc => "Whole disc".to_string(),
        };
        kv(
            &scope,
            &format!(
                "{} {:.4} bits/byte over {} sectors",
                entropy_bar(result.entropy),
                result.entropy,
                format_commas(result.sectors)
            ),
        );
        if let (Some(unique), Some(ratio)) = (result.unique_sectors, result.unique_ratio()) {
            kv(
                "  Unique sectors",
                &format!("{} ({:.2}%)", format_commas(unique), ratio * 100.0),
            );
        }
    }
    println!();
    Ok(())
}
