use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use digests::{Algorithm, MultiDigest, StreamChunker, DEFAULT_CHUNK_SIZE};
use mediaimage::MediaImage;
use tracing::{debug, info, warn};
use volumes::{identify_partitions, Region};

use super::model::{ImageNode, MediaNode, Sidecar, TagNode, TrackNode};
use super::{tags, xml};
use crate::abort::AbortFlag;
use crate::analyze::volumes_in;
use crate::error::{Error, Result};
use crate::extent::{hash_extent, Extent};
use crate::progress::Progress;
use crate::registry::Registry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarOptions {
    pub algorithms: Vec<Algorithm>,
    pub chunk_size: usize,
}

impl Default for SidecarOptions {
    fn default() -> Self {
        SidecarOptions {
            algorithms: Algorithm::ALL.to_vec(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Builds [`Sidecar`]s, hashing every extent with one worker pool.
pub struct SidecarBuilder {
    pool: MultiDigest,
    chunk_size: usize,
}

impl SidecarBuilder {
    pub fn new(options: &SidecarOptions) -> Result<Self> {
        Ok(SidecarBuilder {
            pool: MultiDigest::new(&options.algorithms)?,
            chunk_size: options.chunk_size,
        })
    }

    /// Hash and describe `image`, opened from `path`.
    ///
    /// Read and engine errors abort the build. Tags that cannot be read or
    /// decoded and probes that fail are left out.
    pub fn build(
        &mut self,
        image: &mut dyn MediaImage,
        path: &Path,
        abort: &AbortFlag,
        progress: &mut dyn Progress,
    ) -> Result<Sidecar> {
        let checksums = hash_extent(
            &mut self.pool,
            image,
            Extent::WholeImage,
            self.chunk_size,
            abort,
            progress,
        )?;

        let info = image.info().clone();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let image_node = ImageNode {
            file_name,
            format: image.format_name().to_string(),
            size: image.image_size(),
            checksums,
            application: info.application.clone(),
            application_version: info.application_version.clone(),
            creator: info.creator.clone(),
            comments: info.comments.clone(),
            creation_time: info.creation_time,
            modification_time: info.modification_time,
        };

        let mut media = MediaNode {
            media_type: info.media_type,
            sectors: info.sectors,
            sector_size: info.sector_size,
            title: info.media_title.clone(),
            serial: info.media_serial.clone(),
            manufacturer: info.media_manufacturer.clone(),
            model: info.media_model.clone(),
            drive_manufacturer: info.drive_manufacturer.clone(),
            drive_model: info.drive_model.clone(),
            drive_serial: info.drive_serial.clone(),
            copy_protection: None,
            sessions: info.sessions,
            tags: Vec::new(),
            tracks: Vec::new(),
            volumes: Vec::new(),
        };

        self.add_tags(image, &info.readable_tags, &mut media, abort)?;

        let partitions = identify_partitions(image);
        let tracks = image.tracks().to_vec();
        if tracks.is_empty() {
            let whole = Region::whole(image);
            media.volumes = volumes_in(image, &partitions, whole);
        }
        for track in &tracks {
            abort.check()?;
            let checksums = hash_extent(
                &mut self.pool,
                image,
                Extent::track(track),
                self.chunk_size,
                abort,
                progress,
            )?;
            let subchannel = if track.has_subchannel {
                Some(hash_extent(
                    &mut self.pool,
                    image,
                    Extent::Subchannel {
                        track: track.sequence,
                    },
                    self.chunk_size,
                    abort,
                    progress,
                )?)
            } else {
                None
            };
            let volumes = if track.kind.is_data() {
                volumes_in(
                    image,
                    &partitions,
                    Region::new(track.start_sector, track.sector_count()),
                )
            } else {
                Vec::new()
            };

            media.tracks.push(TrackNode {
                sequence: track.sequence,
                session: track.session,
                kind: track.kind,
                start_sector: track.start_sector,
                end_sector: track.end_sector,
                pregap: track.pregap,
                raw_sector_size: track.raw_sector_size,
                sector_size: track.sector_size(),
                size: track.sector_count() * track.raw_sector_size as u64,
                checksums,
                subchannel,
                title: track.title.clone(),
                performer: track.performer.clone(),
                volumes,
            });
        }

        info!(
            tracks = media.tracks.len(),
            tags = media.tags.len(),
            media_type = %media.media_type,
            "sidecar built"
        );
        Ok(Sidecar {
            image: image_node,
            media,
        })
    }

    fn add_tags(
        &mut self,
        image: &mut dyn MediaImage,
        readable: &[mediaimage::MediaTagKind],
        media: &mut MediaNode,
        abort: &AbortFlag,
    ) -> Result<()> {
        for &kind in readable {
            abort.check()?;
            let data = match image.read_disk_tag(kind) {
                Ok(data) => data,
                Err(e) => {
                    warn!(tag = kind.name(), error = %e, "cannot read media tag, skipping");
                    continue;
                }
            };
            let chunker = StreamChunker::new(&data[..], self.chunk_size)?;
            let checksums = self.pool.run(chunker, |_, _| {})?;

            let fields = match tags::decode(kind, &data) {
                Some(decoded) => {
                    if let Some(media_type) = decoded.media_type {
                        debug!(tag = kind.name(), %media_type, "media type refined");
                        media.media_type = media_type;
                    }
                    if decoded.copy_protection.is_some() {
                        media.copy_protection = decoded.copy_protection;
                    }
                    decoded.fields
                }
                None => {
                    debug!(tag = kind.name(), len = data.len(), "tag not decoded");
                    Vec::new()
                }
            };
            media.tags.push(TagNode {
                kind,
                size: data.len(),
                checksums,
                fields,
            });
        }
        Ok(())
    }
}

/// `<input>.sidecar.xml`, next to the input.
pub fn sidecar_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".sidecar.xml");
    PathBuf::from(name)
}

/// Open `input`, build its sidecar and write it next to the input.
///
/// Refuses to overwrite: an existing output is reported before any work.
pub fn create_sidecar(
    input: &Path,
    options: &SidecarOptions,
    abort: &AbortFlag,
    progress: &mut dyn Progress,
) -> Result<PathBuf> {
    let output = sidecar_path(input);
    if output.exists() {
        return Err(Error::OutputExists(output));
    }

    let mut image = Registry::global().open(input)?;
    debug!(format = image.format_name(), path = %input.display(), "image opened");
    let sidecar = SidecarBuilder::new(options)?.build(image.as_mut(), input, abort, progress)?;
    let document = xml::to_xml(&sidecar)?;

    let mut file = match OpenOptions::new().write(true).create_new(true).open(&output) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(Error::OutputExists(output)),
        Err(e) => return Err(e.into()),
    };
    file.write_all(&document)?;
    info!(path = %output.display(), bytes = document.len(), "sidecar written");
    Ok(output)
}
