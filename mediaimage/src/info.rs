use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Physical medium the image was dumped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaType {
    #[default]
    Unknown,
    CdDa,
    CdRom,
    CdRomXa,
    CdPlus,
    CdR,
    CdRw,
    DvdRom,
    DvdR,
    DvdRw,
    DvdPlusR,
    DvdPlusRw,
    DvdRam,
    BdRom,
    /// 5.25" single-sided, 8 sectors per track (160 KiB)
    Dos525Ss,
    /// 5.25" double-sided, 9 sectors per track (360 KiB)
    Dos525Ds,
    /// 5.25" high density (1.2 MiB)
    Dos525Hd,
    /// 3.5" double density (720 KiB)
    Dos35Dd,
    /// 3.5" high density (1.44 MiB)
    Dos35Hd,
    /// 3.5" extra density (2.88 MiB)
    Dos35Ed,
    GenericHdd,
}

impl MediaType {
    pub fn is_optical(self) -> bool {
        matches!(
            self,
            MediaType::CdDa
                | MediaType::CdRom
                | MediaType::CdRomXa
                | MediaType::CdPlus
                | MediaType::CdR
                | MediaType::CdRw
                | MediaType::DvdRom
                | MediaType::DvdR
                | MediaType::DvdRw
                | MediaType::DvdPlusR
                | MediaType::DvdPlusRw
                | MediaType::DvdRam
                | MediaType::BdRom
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            MediaType::Unknown => "Unknown",
            MediaType::CdDa => "CD-DA",
            MediaType::CdRom => "CD-ROM",
            MediaType::CdRomXa => "CD-ROM XA",
            MediaType::CdPlus => "CD+",
            MediaType::CdR => "CD-R",
            MediaType::CdRw => "CD-RW",
            MediaType::DvdRom => "DVD-ROM",
            MediaType::DvdR => "DVD-R",
            MediaType::DvdRw => "DVD-RW",
            MediaType::DvdPlusR => "DVD+R",
            MediaType::DvdPlusRw => "DVD+RW",
            MediaType::DvdRam => "DVD-RAM",
            MediaType::BdRom => "BD-ROM",
            MediaType::Dos525Ss => "5.25\" SS floppy",
            MediaType::Dos525Ds => "5.25\" DS floppy",
            MediaType::Dos525Hd => "5.25\" HD floppy",
            MediaType::Dos35Dd => "3.5\" DD floppy",
            MediaType::Dos35Hd => "3.5\" HD floppy",
            MediaType::Dos35Ed => "3.5\" ED floppy",
            MediaType::GenericHdd => "Hard disk",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Disk-level structures that can be stored alongside the sector data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaTagKind {
    /// CD Absolute Time In Pregroove
    CdAtip,
    /// CD Program Memory Area
    CdPma,
    /// DVD Burst Cutting Area
    DvdBca,
    /// DVD Physical Format Information
    DvdPfi,
    /// DVD Disc Manufacturing Information
    DvdDmi,
    /// DVD Copyright Management Information
    DvdCmi,
}

impl MediaTagKind {
    pub const ALL: [MediaTagKind; 6] = [
        MediaTagKind::CdAtip,
        MediaTagKind::CdPma,
        MediaTagKind::DvdBca,
        MediaTagKind::DvdPfi,
        MediaTagKind::DvdDmi,
        MediaTagKind::DvdCmi,
    ];

    /// File extension of the companion file holding this tag
    pub fn extension(self) -> &'static str {
        match self {
            MediaTagKind::CdAtip => "atip",
            MediaTagKind::CdPma => "pma",
            MediaTagKind::DvdBca => "bca",
            MediaTagKind::DvdPfi => "pfi",
            MediaTagKind::DvdDmi => "dmi",
            MediaTagKind::DvdCmi => "cmi",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MediaTagKind::CdAtip => "ATIP",
            MediaTagKind::CdPma => "PMA",
            MediaTagKind::DvdBca => "BCA",
            MediaTagKind::DvdPfi => "PFI",
            MediaTagKind::DvdDmi => "DMI",
            MediaTagKind::DvdCmi => "CMI",
        }
    }
}

impl fmt::Display for MediaTagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    /// Mode 1, 2048 bytes of user data
    Mode1,
    /// Mode 2 formless, 2336 bytes of user data
    Mode2,
}

impl TrackKind {
    pub fn user_data_size(self) -> u32 {
        match self {
            TrackKind::Audio => 2352,
            TrackKind::Mode1 => 2048,
            TrackKind::Mode2 => 2336,
        }
    }

    pub fn is_data(self) -> bool {
        !matches!(self, TrackKind::Audio)
    }

    pub fn name(self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Mode1 => "mode1",
            TrackKind::Mode2 => "mode2",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One logical track. Sector numbers are absolute and `end_sector` is
/// inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub sequence: u32,
    pub session: u32,
    pub kind: TrackKind,
    pub start_sector: u64,
    pub end_sector: u64,
    /// Sectors between INDEX 00 and INDEX 01, plus any PREGAP
    pub pregap: u64,
    /// Bytes of each sector as stored in the data file
    pub raw_sector_size: u32,
    pub file: PathBuf,
    /// Byte offset of `start_sector` inside `file`
    pub file_offset: u64,
    pub has_subchannel: bool,
    pub title: Option<String>,
    pub performer: Option<String>,
}

impl Track {
    pub fn sector_count(&self) -> u64 {
        self.end_sector + 1 - self.start_sector
    }

    pub fn contains(&self, lba: u64) -> bool {
        lba >= self.start_sector && lba <= self.end_sector
    }

    /// Size of a user-data sector
    pub fn sector_size(&self) -> u32 {
        self.kind.user_data_size().min(self.raw_sector_size)
    }

    /// Offset of user data inside a stored sector (skips sync and header)
    pub fn user_data_offset(&self) -> u32 {
        if self.kind.is_data() && self.raw_sector_size == 2352 {
            16
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub sequence: u32,
    pub start_track: u32,
    pub end_track: u32,
    pub start_sector: u64,
    pub end_sector: u64,
}

/// Metadata of an opened image.
#[derive(Debug, Clone, Default)]
pub struct ImageInfo {
    pub sectors: u64,
    /// Largest user-data sector size in the image
    pub sector_size: u32,
    /// Total bytes of the data file(s)
    pub image_size: u64,
    pub media_type: MediaType,
    pub creation_time: Option<DateTime<Utc>>,
    pub modification_time: Option<DateTime<Utc>>,
    pub application: Option<String>,
    pub application_version: Option<String>,
    pub creator: Option<String>,
    pub comments: Option<String>,
    pub media_title: Option<String>,
    /// Media catalog number or serial
    pub media_serial: Option<String>,
    pub media_manufacturer: Option<String>,
    pub media_model: Option<String>,
    pub drive_manufacturer: Option<String>,
    pub drive_model: Option<String>,
    pub drive_serial: Option<String>,
    pub readable_tags: Vec<MediaTagKind>,
    /// Tracks divide the media. Block images leave this to partition probing.
    pub has_partitions: bool,
    pub has_sessions: bool,
    pub sessions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(kind: TrackKind, raw: u32) -> Track {
        Track {
            sequence: 1,
            session: 1,
            kind,
            start_sector: 10,
            end_sector: 19,
            pregap: 0,
            raw_sector_size: raw,
            file: PathBuf::from("a.bin"),
            file_offset: 0,
            has_subchannel: false,
            title: None,
            performer: None,
        }
    }

    #[test]
    fn test_track_geometry() {
        let t = track(TrackKind::Mode1, 2352);
        assert_eq!(t.sector_count(), 10);
        assert!(t.contains(10) && t.contains(19) && !t.contains(20));
        assert_eq!(t.sector_size(), 2048);
        assert_eq!(t.user_data_offset(), 16);

        let cooked = track(TrackKind::Mode1, 2048);
        assert_eq!(cooked.user_data_offset(), 0);
        assert_eq!(track(TrackKind::Audio, 2352).sector_size(), 2352);
        assert_eq!(track(TrackKind::Mode2, 2336).sector_size(), 2336);
    }

    #[test]
    fn test_optical_classification() {
        assert!(MediaType::DvdPlusRw.is_optical());
        assert!(!MediaType::Dos35Hd.is_optical());
        assert_eq!(MediaTagKind::DvdPfi.extension(), "pfi");
        assert_eq!(MediaTagKind::CdAtip.to_string(), "ATIP");
    }
}
