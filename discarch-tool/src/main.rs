//! discarch — disc and disk image verification
//!
//! # Usage
//!
//! ```text
//! discarch create-sidecar <image>                     Write <image>.sidecar.xml
//! discarch compare <image1> <image2>                  Sector-by-sector comparison
//! discarch entropy <image> [-d] [-p BOOL] [-w BOOL]   Entropy and duplicate sectors
//! discarch checksum <image> [--md5 BOOL ...]          Checksums of tracks / whole disc
//! discarch analyze <image>                            Partitions and filesystems
//! discarch formats                                    Everything that can be recognised
//! ```

mod cmd_analyze;
mod cmd_checksum;
mod cmd_compare;
mod cmd_entropy;
mod cmd_formats;
mod cmd_sidecar;
mod exit;
mod logging;
mod progress;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use discarch::digests::{Algorithm, DEFAULT_CHUNK_SIZE};
use discarch::mediaimage::MediaImage;
use discarch::{AbortFlag, Registry};

use exit::ErrorNumber;
use style::{DIM, RED, RESET};

#[derive(Parser, Debug)]
#[command(name = "discarch")]
#[command(author, version, about = "Disc and disk image verification", long_about = None)]
pub(crate) struct Cli {
    /// Show progress details
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Show debug output and error causes
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Hash and describe an image into <image>.sidecar.xml
    CreateSidecar {
        image: PathBuf,

        /// Bytes read per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Compare two images sector by sector
    Compare { image1: PathBuf, image2: PathBuf },

    /// Entropy of tracks and/or the whole disc
    Entropy {
        image: PathBuf,

        /// Count sectors that repeat earlier ones
        #[arg(short, long, default_value_t = false, action = ArgAction::Set,
              num_args = 0..=1, default_missing_value = "true")]
        duplicated_sectors: bool,

        /// One result per track
        #[arg(short = 'p', long, default_value_t = true, action = ArgAction::Set,
              num_args = 0..=1, default_missing_value = "true")]
        separated_tracks: bool,

        /// One result over the whole disc
        #[arg(short, long, default_value_t = true, action = ArgAction::Set,
              num_args = 0..=1, default_missing_value = "true")]
        whole_disc: bool,
    },

    /// Checksums of tracks and/or the whole disc
    Checksum {
        image: PathBuf,

        #[command(flatten)]
        algorithms: AlgorithmFlags,

        /// One digest set per track
        #[arg(short = 'p', long, default_value_t = true, action = ArgAction::Set,
              num_args = 0..=1, default_missing_value = "true")]
        separated_tracks: bool,

        /// One digest set over the whole disc
        #[arg(short, long, default_value_t = true, action = ArgAction::Set,
              num_args = 0..=1, default_missing_value = "true")]
        whole_disc: bool,

        /// Bytes read per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Identify partitions and filesystems
    Analyze { image: PathBuf },

    /// List supported image formats, partition schemes and filesystems
    Formats,
}

/// One switch per algorithm; all on unless turned off.
#[derive(Args, Debug, Clone)]
pub(crate) struct AlgorithmFlags {
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    adler32: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    crc16: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    crc32: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    crc64: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    md5: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    ripemd160: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    sha1: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    sha256: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    sha384: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    sha512: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    spamsum: bool,
}

impl AlgorithmFlags {
    /// Enabled algorithms, in canonical order
    pub(crate) fn selected(&self) -> Vec<Algorithm> {
        let enabled = [
            self.adler32,
            self.crc16,
            self.crc32,
            self.crc64,
            self.md5,
            self.ripemd160,
            self.sha1,
            self.sha256,
            self.sha384,
            self.sha512,
            self.spamsum,
        ];
        Algorithm::ALL
            .into_iter()
            .zip(enabled)
            .filter_map(|(algorithm, on)| on.then_some(algorithm))
            .collect()
    }
}

/// Open an image with the first format that recognises it.
pub(crate) fn open_image(path: &std::path::Path) -> anyhow::Result<Box<dyn MediaImage>> {
    let image = Registry::global()
        .open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    tracing::info!(format = image.format_name(), path = %path.display(), "image opened");
    Ok(image)
}

fn run(cli: Cli, abort: AbortFlag) -> anyhow::Result<()> {
    match cli.command {
        Command::CreateSidecar { image, chunk_size } => {
            cmd_sidecar::run(&image, chunk_size, &abort)
        }
        Command::Compare { image1, image2 } => {
            cmd_compare::run(&image1, &image2, cli.verbose, &abort)
        }
        Command::Entropy {
            image,
            duplicated_sectors,
            separated_tracks,
            whole_disc,
        } => cmd_entropy::run(
            &image,
            discarch::EntropyOptions {
                duplicated_sectors,
                separated_tracks,
                whole_disc,
                ..Default::default()
            },
            &abort,
        ),
        Command::Checksum {
            image,
            algorithms,
            separated_tracks,
            whole_disc,
            chunk_size,
        } => cmd_checksum::run(
            &image,
            discarch::ChecksumOptions {
                algorithms: algorithms.selected(),
                chunk_size,
                separated_tracks,
                whole_disc,
            },
            &abort,
        ),
        Command::Analyze { image } => cmd_analyze::run(&image),
        Command::Formats => {
            cmd_formats::run();
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ErrorNumber::of_usage(&e).into();
        }
    };
    let debug = cli.debug;
    logging::init_logging(cli.verbose, debug);

    let abort = AbortFlag::new();
    let handler_flag = abort.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.abort()) {
        tracing::warn!(error = %e, "cannot install Ctrl+C handler");
    }

    match run(cli, abort) {
        Ok(()) => ErrorNumber::NoError.into(),
        Err(e) => {
            eprintln!("{RED}error:{RESET} {e}");
            if debug {
                for cause in e.chain().skip(1) {
                    eprintln!("  {DIM}caused by:{RESET} {cause}");
                }
            }
            ErrorNumber::of(&e).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_takes_two_positionals() {
        let cli = Cli::try_parse_from(["discarch", "compare", "a.iso", "b.iso"]).unwrap();
        match cli.command {
            Command::Compare { image1, image2 } => {
                assert_eq!(image1, PathBuf::from("a.iso"));
                assert_eq!(image2, PathBuf::from("b.iso"));
            }
            other => panic!("unexpected {other:?}"),
        }
        let missing = Cli::try_parse_from(["discarch", "compare", "a.iso"]).unwrap_err();
        assert_eq!(ErrorNumber::of_usage(&missing), ErrorNumber::MissingArgument);
        let extra = Cli::try_parse_from(["discarch", "compare", "a", "b", "c"]).unwrap_err();
        assert_eq!(
            ErrorNumber::of_usage(&extra),
            ErrorNumber::UnexpectedArgumentCount
        );
    }

    #[test]
    fn test_entropy_flag_defaults() {
        let cli = Cli::try_parse_from(["discarch", "entropy", "d.iso", "-d", "--whole-disc", "false"])
            .unwrap();
        match cli.command {
            Command::Entropy {
                duplicated_sectors,
                separated_tracks,
                whole_disc,
                ..
            } => {
                assert!(duplicated_sectors);
                assert!(separated_tracks);
                assert!(!whole_disc);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_algorithm_flags() {
        let cli = Cli::try_parse_from([
            "discarch", "checksum", "d.img", "--spamsum", "false", "--adler32", "false",
        ])
        .unwrap();
        let Command::Checksum { algorithms, .. } = cli.command else {
            panic!("not a checksum command");
        };
        let selected = algorithms.selected();
        assert_eq!(selected.len(), Algorithm::ALL.len() - 2);
        assert_eq!(selected[0], Algorithm::Crc16);
        assert!(!selected.contains(&Algorithm::SpamSum));
    }

    #[test]
    fn test_help_is_reported() {
        let help = Cli::try_parse_from(["discarch", "--help"]).unwrap_err();
        assert_eq!(ErrorNumber::of_usage(&help), ErrorNumber::HelpRequested);
    }
}
