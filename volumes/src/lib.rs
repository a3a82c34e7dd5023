//! Partition and filesystem identification
//!
//! Works over any [`mediaimage::MediaImage`]: partition tables are probed
//! in a fixed order (GPT before MBR, so a protective MBR never hides the
//! real table) and each partition, or the whole device when there are
//! none, is then offered to every known filesystem.
//!
//! # Example
//!
//! ```no_run
//! use mediaimage::FormatRegistry;
//! use volumes::{identify_filesystems, identify_partitions, Region};
//!
//! let mut image = FormatRegistry::global().open("disk.img").unwrap();
//! let partitions = identify_partitions(image.as_mut());
//! let regions: Vec<Region> = if partitions.is_empty() {
//!     vec![Region::whole(image.as_ref())]
//! } else {
//!     partitions.iter().map(|p| p.region()).collect()
//! };
//! for region in regions {
//!     for fs in identify_filesystems(image.as_mut(), region) {
//!         println!("{} at sector {}: {:?}", fs.type_name, region.start_sector, fs.volume_name);
//!     }
//! }
//! ```

pub mod error;
pub mod filesystem;
pub mod partition;
pub mod region;

pub use error::{Result, VolumeError};
pub use filesystem::{identify_filesystems, FilesystemInfo, FilesystemKind};
pub use partition::{identify_partitions, partitions_in, Partition, PartitionScheme};
pub use region::Region;
