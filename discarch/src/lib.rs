//! Disc and disk image verification
//!
//! Builds checksum sidecars, compares two images sector by sector and
//! measures entropy, over any image [`mediaimage`] can open.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use discarch::{create_sidecar, AbortFlag, NoProgress, SidecarOptions};
//!
//! let written = create_sidecar(
//!     Path::new("disc.cue"),
//!     &SidecarOptions::default(),
//!     &AbortFlag::new(),
//!     &mut NoProgress,
//! )
//! .unwrap();
//! println!("sidecar at {}", written.display());
//! ```

pub mod abort;
pub mod analyze;
pub mod checksum;
pub mod compare;
pub mod entropy;
pub mod error;
pub mod extent;
pub mod progress;
pub mod registry;
pub mod sidecar;

pub use abort::AbortFlag;
pub use analyze::{analyze_layout, volumes_in, Area, Layout, Volume};
pub use checksum::{checksum_image, ChecksumOptions, ChecksumReport, TrackChecksum};
pub use compare::{
    classify, compare_images, CompareOptions, CompareReport, DifferenceKind, ImageSnapshot,
    MetadataDifference, SectorDifference,
};
pub use entropy::{analyze_entropy, EntropyOptions, EntropyResult, EntropyScope, Histogram};
pub use error::{Error, Result};
pub use extent::{hash_extent, Extent, ExtentSource};
pub use progress::{NoProgress, Progress};
pub use registry::Registry;
pub use sidecar::{create_sidecar, sidecar_path, Sidecar, SidecarBuilder, SidecarOptions};

// Re-export underlying crates
pub use digests;
pub use mediaimage;
pub use volumes;
