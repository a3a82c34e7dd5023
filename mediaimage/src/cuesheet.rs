//! CUE sheets describing one or more BIN data files.
//!
//! Sector numbering is absolute across all files: the first sector of each
//! FILE follows the last sector of the previous one. The first track of a
//! file starts at the file's first sector; later tracks start at their
//! INDEX 00 when present, otherwise at INDEX 01.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ImageError, Result};
use crate::info::{ImageInfo, MediaType, Session, Track, TrackKind};
use crate::{check_sector_range, file_times, read_exact_at, MediaImage, SUBCHANNEL_SIZE};

const FRAMES_PER_SECOND: u64 = 75;
const SECONDS_PER_MINUTE: u64 = 60;

/// Largest CUE sheet worth parsing while probing
const MAX_CUE_SIZE: u64 = 1024 * 1024;

/// One TRACK entry as written in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueTrack {
    pub number: u32,
    pub session: u32,
    pub kind: TrackKind,
    pub raw_sector_size: u32,
    /// INDEX 00, frames from the start of the file
    pub index0: Option<u64>,
    /// INDEX 01, frames from the start of the file
    pub index1: Option<u64>,
    /// PREGAP not stored in the file
    pub pregap: u64,
    pub title: Option<String>,
    pub performer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueFile {
    pub name: String,
    pub tracks: Vec<CueTrack>,
}

/// Parsed CUE sheet, independent of the files it names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueSheet {
    pub catalog: Option<String>,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub comment: Option<String>,
    pub files: Vec<CueFile>,
}

/// Split a line into words, keeping double-quoted strings together.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Parse `mm:ss:ff` into frames.
fn parse_msf(s: &str) -> Option<u64> {
    let mut parts = s.split(':');
    let m: u64 = parts.next()?.parse().ok()?;
    let sec: u64 = parts.next()?.parse().ok()?;
    let f: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || sec >= SECONDS_PER_MINUTE || f >= FRAMES_PER_SECOND {
        return None;
    }
    Some((m * SECONDS_PER_MINUTE + sec) * FRAMES_PER_SECOND + f)
}

fn parse_mode(mode: &str) -> Option<(TrackKind, u32)> {
    match mode.to_ascii_uppercase().as_str() {
        "AUDIO" => Some((TrackKind::Audio, 2352)),
        "MODE1/2048" => Some((TrackKind::Mode1, 2048)),
        "MODE1/2352" => Some((TrackKind::Mode1, 2352)),
        "MODE2/2336" => Some((TrackKind::Mode2, 2336)),
        "MODE2/2352" => Some((TrackKind::Mode2, 2352)),
        _ => None,
    }
}

fn syntax(line: usize, message: impl Into<String>) -> ImageError {
    ImageError::CueSyntax {
        line,
        message: message.into(),
    }
}

fn argument(tokens: &[String], n: usize, line: usize) -> Result<&str> {
    tokens
        .get(n)
        .map(String::as_str)
        .ok_or_else(|| syntax(line, format!("{} needs an argument", tokens[0])))
}

impl CueSheet {
    pub fn parse(text: &str) -> Result<Self> {
        let mut sheet = CueSheet::default();
        let mut session = 1u32;

        for (i, raw_line) in text.lines().enumerate() {
            let line_no = i + 1;
            let tokens = tokenize(raw_line.trim_start_matches('\u{feff}'));
            let Some(keyword) = tokens.first() else {
                continue;
            };
            let arg = |n: usize| argument(&tokens, n, line_no);

            match keyword.to_ascii_uppercase().as_str() {
                "FILE" => {
                    sheet.files.push(CueFile {
                        name: arg(1)?.to_string(),
                        tracks: Vec::new(),
                    });
                }
                "TRACK" => {
                    let number: u32 = arg(1)?
                        .parse()
                        .map_err(|_| syntax(line_no, "bad track number"))?;
                    let mode = arg(2)?;
                    let (kind, raw_sector_size) = parse_mode(mode)
                        .ok_or_else(|| syntax(line_no, format!("unsupported track mode {mode}")))?;
                    let file = sheet
                        .files
                        .last_mut()
                        .ok_or_else(|| syntax(line_no, "TRACK before FILE"))?;
                    file.tracks.push(CueTrack {
                        number,
                        session,
                        kind,
                        raw_sector_size,
                        index0: None,
                        index1: None,
                        pregap: 0,
                        title: None,
                        performer: None,
                    });
                }
                "INDEX" => {
                    let index: u32 = arg(1)?
                        .parse()
                        .map_err(|_| syntax(line_no, "bad index number"))?;
                    let frames =
                        parse_msf(arg(2)?).ok_or_else(|| syntax(line_no, "bad MSF position"))?;
                    let track = sheet
                        .files
                        .last_mut()
                        .and_then(|f| f.tracks.last_mut())
                        .ok_or_else(|| syntax(line_no, "INDEX before TRACK"))?;
                    match index {
                        0 => track.index0 = Some(frames),
                        1 => track.index1 = Some(frames),
                        _ => {}
                    }
                }
                "PREGAP" => {
                    let frames =
                        parse_msf(arg(1)?).ok_or_else(|| syntax(line_no, "bad MSF position"))?;
                    let track = sheet
                        .files
                        .last_mut()
                        .and_then(|f| f.tracks.last_mut())
                        .ok_or_else(|| syntax(line_no, "PREGAP before TRACK"))?;
                    track.pregap = frames;
                }
                "CATALOG" => sheet.catalog = Some(arg(1)?.to_string()),
                "TITLE" | "PERFORMER" => {
                    let value = arg(1)?.to_string();
                    let is_title = keyword.eq_ignore_ascii_case("TITLE");
                    match sheet.files.last_mut().and_then(|f| f.tracks.last_mut()) {
                        Some(track) if is_title => track.title = Some(value),
                        Some(track) => track.performer = Some(value),
                        None if is_title => sheet.title = Some(value),
                        None => sheet.performer = Some(value),
                    }
                }
                "REM" => match tokens.get(1).map(|t| t.to_ascii_uppercase()).as_deref() {
                    Some("SESSION") => {
                        session = arg(2)?
                            .parse()
                            .map_err(|_| syntax(line_no, "bad session number"))?;
                    }
                    Some("COMMENT") => sheet.comment = Some(tokens[2..].join(" ")),
                    _ => {}
                },
                "FLAGS" | "ISRC" | "SONGWRITER" | "CDTEXTFILE" | "POSTGAP" => {}
                other => return Err(syntax(line_no, format!("unknown keyword {other}"))),
            }
        }

        if sheet.files.iter().all(|f| f.tracks.is_empty()) {
            return Err(syntax(0, "no tracks"));
        }
        for file in &sheet.files {
            for track in &file.tracks {
                if track.index1.is_none() {
                    return Err(syntax(0, format!("track {} has no INDEX 01", track.number)));
                }
            }
        }

        Ok(sheet)
    }

    /// Lay tracks out over absolute sectors given each data file's length.
    pub fn layout(&self, file_lengths: &[u64], base_dir: &Path) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut file_base = 0u64;

        for (file, &file_len) in self.files.iter().zip(file_lengths) {
            let path = base_dir.join(&file.name);
            let mut offset = 0u64;

            for (i, t) in file.tracks.iter().enumerate() {
                let index1 = t.index1.unwrap_or(0);
                let start = if i == 0 { 0 } else { t.index0.unwrap_or(index1) };

                let end = match file.tracks.get(i + 1) {
                    Some(next) => {
                        let next_index1 = next.index1.unwrap_or(0);
                        next.index0.unwrap_or(next_index1)
                    }
                    None => {
                        let remaining = file_len.saturating_sub(offset);
                        start + remaining / t.raw_sector_size as u64
                    }
                };
                if end <= start {
                    return Err(ImageError::InvalidSize {
                        size: file_len,
                        sector_size: t.raw_sector_size,
                    });
                }

                tracks.push(Track {
                    sequence: t.number,
                    session: t.session,
                    kind: t.kind,
                    start_sector: file_base + start,
                    end_sector: file_base + end - 1,
                    pregap: index1.saturating_sub(start) + t.pregap,
                    raw_sector_size: t.raw_sector_size,
                    file: path.clone(),
                    file_offset: offset,
                    has_subchannel: false,
                    title: t.title.clone(),
                    performer: t.performer.clone(),
                });

                offset += (end - start) * t.raw_sector_size as u64;
            }

            if let Some(last) = tracks.last() {
                file_base = last.end_sector + 1;
            }
        }

        Ok(tracks)
    }
}

fn sessions_of(tracks: &[Track]) -> Vec<Session> {
    let mut sessions: Vec<Session> = Vec::new();
    for track in tracks {
        match sessions.last_mut() {
            Some(s) if s.sequence == track.session => {
                s.end_track = track.sequence;
                s.end_sector = track.end_sector;
            }
            _ => sessions.push(Session {
                sequence: track.session,
                start_track: track.sequence,
                end_track: track.sequence,
                start_sector: track.start_sector,
                end_sector: track.end_sector,
            }),
        }
    }
    sessions
}

fn media_type_of(tracks: &[Track], sessions: usize) -> MediaType {
    let audio = tracks.iter().filter(|t| t.kind == TrackKind::Audio).count();
    let mode2 = tracks.iter().any(|t| t.kind == TrackKind::Mode2);
    if audio == tracks.len() {
        MediaType::CdDa
    } else if audio > 0 && sessions > 1 {
        MediaType::CdPlus
    } else if mode2 {
        MediaType::CdRomXa
    } else {
        MediaType::CdRom
    }
}

struct DataFile {
    path: PathBuf,
    file: File,
    len: u64,
}

/// An image described by a CUE sheet.
pub struct CueImage {
    files: Vec<DataFile>,
    /// Index into `files` for each track
    track_files: Vec<usize>,
    tracks: Vec<Track>,
    sessions: Vec<Session>,
    subchannel: Option<File>,
    info: ImageInfo,
}

impl CueImage {
    /// Check whether `path` is a parseable `.cue` file.
    pub fn identify(path: &Path) -> bool {
        let is_cue = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("cue"))
            .unwrap_or(false);
        if !is_cue {
            return false;
        }
        match fs::metadata(path) {
            Ok(m) if m.is_file() && m.len() <= MAX_CUE_SIZE => {}
            _ => return false,
        }
        fs::read(path)
            .map(|bytes| CueSheet::parse(&String::from_utf8_lossy(&bytes)).is_ok())
            .unwrap_or(false)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let cue_path = path.as_ref();
        let text = String::from_utf8_lossy(&fs::read(cue_path)?).into_owned();
        let sheet = CueSheet::parse(&text)?;
        let base_dir = cue_path.parent().unwrap_or_else(|| Path::new("."));

        let mut files = Vec::with_capacity(sheet.files.len());
        for entry in &sheet.files {
            let path = base_dir.join(&entry.name);
            if !path.is_file() {
                return Err(ImageError::MissingDataFile(path));
            }
            let file = File::open(&path)?;
            let len = file.metadata()?.len();
            files.push(DataFile { path, file, len });
        }

        let lengths: Vec<u64> = files.iter().map(|f| f.len).collect();
        let mut tracks = sheet.layout(&lengths, base_dir)?;
        let track_files = tracks
            .iter()
            .map(|t| files.iter().position(|f| f.path == t.file).unwrap_or(0))
            .collect();
        let sectors = tracks.last().map(|t| t.end_sector + 1).unwrap_or(0);

        let sub_path = cue_path.with_extension("sub");
        let subchannel = match File::open(&sub_path) {
            Ok(f) => {
                if f.metadata()?.len() >= sectors * SUBCHANNEL_SIZE as u64 {
                    Some(f)
                } else {
                    warn!(path = %sub_path.display(), "subchannel file too short, ignoring");
                    None
                }
            }
            Err(_) => None,
        };
        if subchannel.is_some() {
            for track in &mut tracks {
                track.has_subchannel = true;
            }
        }

        let sessions = sessions_of(&tracks);
        let meta = fs::metadata(cue_path)?;
        let (creation_time, modification_time) = file_times(&meta);

        let info = ImageInfo {
            sectors,
            sector_size: tracks.iter().map(Track::sector_size).max().unwrap_or(2048),
            image_size: lengths.iter().sum(),
            media_type: media_type_of(&tracks, sessions.len()),
            creation_time,
            modification_time,
            creator: sheet.performer.clone(),
            comments: sheet.comment.clone(),
            media_title: sheet.title.clone(),
            media_serial: sheet.catalog.clone(),
            has_partitions: !tracks.is_empty(),
            has_sessions: true,
            sessions: sessions.len() as u32,
            ..ImageInfo::default()
        };

        debug!(
            path = %cue_path.display(),
            files = files.len(),
            tracks = tracks.len(),
            sessions = sessions.len(),
            sectors,
            "opened CUE image"
        );

        Ok(CueImage {
            files,
            track_files,
            tracks,
            sessions,
            subchannel,
            info,
        })
    }

    fn read(&mut self, lba: u64, count: u32, long: bool) -> Result<Vec<u8>> {
        check_sector_range(lba, count as u64, self.info.sectors)?;

        let mut out = Vec::new();
        let mut lba = lba;
        let mut remaining = count as u64;

        while remaining > 0 {
            let idx = self
                .tracks
                .iter()
                .position(|t| t.contains(lba))
                .ok_or(ImageError::SectorOutOfRange {
                    lba,
                    count: remaining,
                    sectors: self.info.sectors,
                })?;
            let track = &self.tracks[idx];
            let n = remaining.min(track.end_sector - lba + 1);
            let raw = track.raw_sector_size as usize;
            let user = track.sector_size() as usize;
            let skip = track.user_data_offset() as usize;
            let offset = track.file_offset + (lba - track.start_sector) * raw as u64;

            let mut buf = vec![0u8; n as usize * raw];
            let data_file = &mut self.files[self.track_files[idx]];
            read_exact_at(&mut data_file.file, offset, &mut buf)?;

            if long || raw == user {
                out.extend_from_slice(&buf);
            } else {
                for sector in buf.chunks_exact(raw) {
                    out.extend_from_slice(&sector[skip..skip + user]);
                }
            }

            lba += n;
            remaining -= n;
        }

        Ok(out)
    }
}

impl MediaImage for CueImage {
    fn format_name(&self) -> &'static str {
        "CUE sheet"
    }

    fn info(&self) -> &ImageInfo {
        &self.info
    }

    fn read_sectors(&mut self, lba: u64, count: u32) -> Result<Vec<u8>> {
        self.read(lba, count, false)
    }

    fn read_sectors_long(&mut self, lba: u64, count: u32) -> Result<Vec<u8>> {
        self.read(lba, count, true)
    }

    fn read_bytes(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let size = self.info.image_size;
        let len = buf.len() as u64;
        if offset.checked_add(len).map_or(true, |end| end > size) {
            return Err(ImageError::ByteOutOfRange { offset, len, size });
        }

        let mut file_start = 0u64;
        let mut written = 0usize;
        for data_file in &mut self.files {
            let file_end = file_start + data_file.len;
            let pos = offset + written as u64;
            if written < buf.len() && pos < file_end {
                let take = ((file_end - pos) as usize).min(buf.len() - written);
                read_exact_at(
                    &mut data_file.file,
                    pos - file_start,
                    &mut buf[written..written + take],
                )?;
                written += take;
            }
            file_start = file_end;
        }
        Ok(())
    }

    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    fn read_subchannel(&mut self, track: u32, lba: u64, count: u32) -> Result<Vec<u8>> {
        let t = self
            .tracks
            .iter()
            .find(|t| t.sequence == track)
            .ok_or(ImageError::NoSuchTrack(track))?;
        if count > 0 && (!t.contains(lba) || !t.contains(lba + count as u64 - 1)) {
            return Err(ImageError::SectorOutOfRange {
                lba,
                count: count as u64,
                sectors: self.info.sectors,
            });
        }
        let sub = self
            .subchannel
            .as_mut()
            .ok_or(ImageError::NoSubchannel(track))?;
        let mut buf = vec![0u8; count as usize * SUBCHANNEL_SIZE as usize];
        read_exact_at(sub, lba * SUBCHANNEL_SIZE as u64, &mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MIXED: &str = r#"
CATALOG 0123456789012
PERFORMER "Some Artist"
TITLE "Mixed Disc"
FILE "data.bin" BINARY
  TRACK 01 MODE1/2352
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    TITLE "Song"
    INDEX 00 00:00:10
    INDEX 01 00:00:12
FILE "audio 2.bin" BINARY
  TRACK 03 AUDIO
    PREGAP 00:02:00
    INDEX 01 00:00:00
"#;

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"FILE "my disc.bin" BINARY"#),
            vec!["FILE", "my disc.bin", "BINARY"]
        );
        assert_eq!(tokenize("   "), Vec::<String>::new());
    }

    #[test]
    fn test_parse_msf() {
        assert_eq!(parse_msf("00:00:00"), Some(0));
        assert_eq!(parse_msf("00:02:00"), Some(150));
        assert_eq!(parse_msf("01:00:74"), Some(4574));
        assert_eq!(parse_msf("00:60:00"), None);
        assert_eq!(parse_msf("00:00"), None);
    }

    #[test]
    fn test_parse_sheet() {
        let sheet = CueSheet::parse(MIXED).unwrap();
        assert_eq!(sheet.catalog.as_deref(), Some("0123456789012"));
        assert_eq!(sheet.title.as_deref(), Some("Mixed Disc"));
        assert_eq!(sheet.files.len(), 2);
        assert_eq!(sheet.files[1].name, "audio 2.bin");
        let t2 = &sheet.files[0].tracks[1];
        assert_eq!(t2.kind, TrackKind::Audio);
        assert_eq!(t2.index0, Some(10));
        assert_eq!(t2.title.as_deref(), Some("Song"));
        assert_eq!(sheet.files[1].tracks[0].pregap, 150);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            CueSheet::parse("TRACK 01 AUDIO\n"),
            Err(ImageError::CueSyntax { line: 1, .. })
        ));
        assert!(CueSheet::parse("FILE a.bin BINARY\n  TRACK 01 MODE3/1234\n").is_err());
        assert!(CueSheet::parse("FILE a.bin BINARY\n  TRACK 01 AUDIO\n").is_err());
        assert!(CueSheet::parse("REM just a comment\n").is_err());
    }

    #[test]
    fn test_layout_across_files() {
        let sheet = CueSheet::parse(MIXED).unwrap();
        // 10 data sectors + 20 audio sectors, then 30 audio sectors
        let lengths = [10 * 2352 + 20 * 2352, 30 * 2352];
        let tracks = sheet.layout(&lengths, Path::new("/discs")).unwrap();
        assert_eq!(tracks.len(), 3);

        assert_eq!((tracks[0].start_sector, tracks[0].end_sector), (0, 9));
        assert_eq!((tracks[1].start_sector, tracks[1].end_sector), (10, 29));
        assert_eq!(tracks[1].pregap, 2);
        assert_eq!(tracks[1].file_offset, 10 * 2352);
        assert_eq!((tracks[2].start_sector, tracks[2].end_sector), (30, 59));
        assert_eq!(tracks[2].file_offset, 0);
        assert_eq!(tracks[2].pregap, 150);
        assert_eq!(tracks[2].file, Path::new("/discs/audio 2.bin"));
    }

    fn raw_mode1_sector(lba: u32) -> Vec<u8> {
        let mut sector = vec![0u8; 2352];
        sector[..12].copy_from_slice(&[0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0]);
        sector[15] = 1;
        for b in &mut sector[16..2064] {
            *b = lba as u8;
        }
        sector
    }

    #[test]
    fn test_open_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = File::create(dir.path().join("data.bin")).unwrap();
        for lba in 0..10 {
            data.write_all(&raw_mode1_sector(lba)).unwrap();
        }
        data.write_all(&vec![0xAA; 20 * 2352]).unwrap();
        File::create(dir.path().join("audio 2.bin"))
            .unwrap()
            .write_all(&vec![0xBB; 30 * 2352])
            .unwrap();
        let cue = dir.path().join("disc.cue");
        fs::write(&cue, MIXED).unwrap();

        assert!(CueImage::identify(&cue));
        let mut image = CueImage::open(&cue).unwrap();
        assert_eq!(image.sector_count(), 60);
        assert_eq!(image.sector_size(), 2352);
        assert_eq!(image.info().media_type, MediaType::CdRom);
        assert!(image.info().has_partitions);
        assert_eq!(image.info().media_serial.as_deref(), Some("0123456789012"));
        assert_eq!(image.image_size(), 60 * 2352);

        let user = image.read_sector(3).unwrap();
        assert_eq!(user, vec![3u8; 2048]);
        let long = image.read_sector_long(3).unwrap();
        assert_eq!(long.len(), 2352);
        assert_eq!(&long[16..2064], &user[..]);

        // Crosses from the data track into the audio track
        let mixed = image.read_sectors(9, 2).unwrap();
        assert_eq!(mixed.len(), 2048 + 2352);
        assert!(mixed[2048..].iter().all(|&b| b == 0xAA));

        // Crosses from the first file into the second
        let mut buf = vec![0u8; 4];
        image.read_bytes(30 * 2352 - 2, &mut buf).unwrap();
        assert_eq!(buf, vec![0xAA, 0xAA, 0xBB, 0xBB]);

        assert!(matches!(
            image.read_subchannel(1, 0, 1),
            Err(ImageError::NoSubchannel(1))
        ));
    }

    #[test]
    fn test_subchannel_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.bin"), vec![0u8; 4 * 2352]).unwrap();
        fs::write(
            dir.path().join("a.cue"),
            "FILE \"a.bin\" BINARY\n  TRACK 01 AUDIO\n    INDEX 01 00:00:00\n",
        )
        .unwrap();
        let sub: Vec<u8> = (0..4 * 96).map(|i| (i / 96) as u8).collect();
        fs::write(dir.path().join("a.sub"), &sub).unwrap();

        let mut image = CueImage::open(dir.path().join("a.cue")).unwrap();
        assert!(image.tracks()[0].has_subchannel);
        assert_eq!(image.info().media_type, MediaType::CdDa);
        let q = image.read_subchannel(1, 2, 2).unwrap();
        assert_eq!(q.len(), 192);
        assert_eq!(q[0], 2);
        assert_eq!(q[191], 3);
        assert!(image.read_subchannel(1, 3, 2).is_err());
        assert!(matches!(
            image.read_subchannel(9, 0, 1),
            Err(ImageError::NoSuchTrack(9))
        ));
    }

    #[test]
    fn test_missing_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let cue = dir.path().join("x.cue");
        fs::write(&cue, "FILE \"gone.bin\" BINARY\n  TRACK 01 AUDIO\n    INDEX 01 00:00:00\n")
            .unwrap();
        assert!(matches!(
            CueImage::open(&cue),
            Err(ImageError::MissingDataFile(_))
        ));
    }
}
