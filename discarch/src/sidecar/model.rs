use chrono::{DateTime, Utc};
use digests::DigestSet;
use mediaimage::{MediaTagKind, MediaType, TrackKind};

use crate::analyze::Volume;

/// Everything recorded about one image.
#[derive(Debug, Clone)]
pub struct Sidecar {
    pub image: ImageNode,
    pub media: MediaNode,
}

/// The image file(s) as stored.
#[derive(Debug, Clone)]
pub struct ImageNode {
    pub file_name: String,
    pub format: String,
    pub size: u64,
    pub checksums: DigestSet,
    pub application: Option<String>,
    pub application_version: Option<String>,
    pub creator: Option<String>,
    pub comments: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub modification_time: Option<DateTime<Utc>>,
}

/// The medium the image was taken from.
#[derive(Debug, Clone)]
pub struct MediaNode {
    pub media_type: MediaType,
    pub sectors: u64,
    pub sector_size: u32,
    pub title: Option<String>,
    pub serial: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub drive_manufacturer: Option<String>,
    pub drive_model: Option<String>,
    pub drive_serial: Option<String>,
    pub copy_protection: Option<String>,
    pub sessions: u32,
    pub tags: Vec<TagNode>,
    /// Empty for block media
    pub tracks: Vec<TrackNode>,
    /// Volumes of the whole device; block media only
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone)]
pub struct TagNode {
    pub kind: MediaTagKind,
    pub size: usize,
    pub checksums: DigestSet,
    /// Decoded fields, empty when the tag could not be interpreted
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct TrackNode {
    pub sequence: u32,
    pub session: u32,
    pub kind: TrackKind,
    pub start_sector: u64,
    pub end_sector: u64,
    pub pregap: u64,
    pub raw_sector_size: u32,
    pub sector_size: u32,
    /// Bytes covered by `checksums`
    pub size: u64,
    pub checksums: DigestSet,
    pub subchannel: Option<DigestSet>,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub volumes: Vec<Volume>,
}
