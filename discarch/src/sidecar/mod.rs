//! Metadata sidecars: checksums and structural description of an image,
//! written as XML next to it.

mod builder;
pub mod model;
pub mod tags;
pub mod xml;

pub use builder::{create_sidecar, sidecar_path, SidecarBuilder, SidecarOptions};
pub use model::{ImageNode, MediaNode, Sidecar, TagNode, TrackNode};
