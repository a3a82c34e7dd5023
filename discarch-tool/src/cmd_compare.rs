use std::path::Path;

use discarch::{compare_images, AbortFlag, CompareOptions, Error};

use crate::open_image;
use crate::progress::{BarProgress, Unit};
use crate::style::*;

pub(crate) fn run(first: &Path, second: &Path, verbose: bool, abort: &AbortFlag) -> anyhow::Result<()> {
    let mut a = open_image(first)?;
    let mut b = open_image(second)?;

    header("Image comparison");
    kv("First image", &first.display().to_string());
    kv("Second image", &second.display().to_string());
    println!();

    let mut progress = BarProgress::new(Unit::Sectors);
    let report = compare_images(
        a.as_mut(),
        b.as_mut(),
        &CompareOptions::default(),
        abort,
        &mut progress,
    )?;

    println!("{}", report.display(verbose));
    println!();
    let verdict = if report.images_differ {
        format!("{YELLOW}{BOLD}differ{RESET}")
    } else {
        format!("{GREEN}{BOLD}identical{RESET}")
    };
    kv("Sectors compared", &format_commas(report.sectors_compared));
    kv("Verdict", &verdict);
    println!();

    if report.interrupted {
        return Err(Error::Aborted.into());
    }
    Ok(())
}
