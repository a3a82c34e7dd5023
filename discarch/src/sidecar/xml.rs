//! Sidecar serialization.
//!
//! ```text
//! <Sidecar version="1">
//!   <Image name=".." format=".." size="..">   checksums, metadata
//!   <Media type=".." sectors=".." sectorSize="..">
//!     <Tag/>*  <Track/>*  <Partition/>* | <FileSystem/>*
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use digests::DigestSet;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use volumes::FilesystemInfo;

use super::model::{Sidecar, TagNode, TrackNode};
use crate::analyze::Volume;
use crate::error::{Error, Result};

const SCHEMA_VERSION: &str = "1";

fn xml_error(e: impl Into<quick_xml::Error>) -> Error {
    Error::Xml(e.into())
}

struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(xml_error)
    }

    fn start(&mut self, name: &str, attrs: &[(&str, String)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attrs.iter().map(|(k, v)| (*k, v.as_str())));
        self.event(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, String)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attrs.iter().map(|(k, v)| (*k, v.as_str())));
        self.event(Event::Empty(element))
    }

    fn text(&mut self, name: &str, attrs: &[(&str, String)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn optional(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(v) if !v.is_empty() => self.text(name, &[], v),
            _ => Ok(()),
        }
    }

    fn time(&mut self, name: &str, value: Option<DateTime<Utc>>) -> Result<()> {
        match value {
            Some(t) => self.text(name, &[], &t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            None => Ok(()),
        }
    }

    fn checksums(&mut self, set: &DigestSet) -> Result<()> {
        self.start("Checksums", &[])?;
        for digest in set.iter() {
            self.text("Checksum", &[("type", digest.algorithm().key().to_string())], digest.as_str())?;
        }
        self.end("Checksums")
    }

    fn fields(&mut self, fields: &[(String, String)]) -> Result<()> {
        for (name, value) in fields {
            self.text("Field", &[("name", name.clone())], value)?;
        }
        Ok(())
    }

    fn tag(&mut self, tag: &TagNode) -> Result<()> {
        self.start(
            "Tag",
            &[("type", tag.kind.name().to_string()), ("size", tag.size.to_string())],
        )?;
        self.checksums(&tag.checksums)?;
        self.fields(&tag.fields)?;
        self.end("Tag")
    }

    fn track(&mut self, track: &TrackNode) -> Result<()> {
        self.start(
            "Track",
            &[
                ("sequence", track.sequence.to_string()),
                ("session", track.session.to_string()),
                ("type", track.kind.name().to_string()),
                ("start", track.start_sector.to_string()),
                ("end", track.end_sector.to_string()),
                ("pregap", track.pregap.to_string()),
                ("rawSectorSize", track.raw_sector_size.to_string()),
                ("sectorSize", track.sector_size.to_string()),
                ("size", track.size.to_string()),
            ],
        )?;
        self.optional("Title", track.title.as_deref())?;
        self.optional("Performer", track.performer.as_deref())?;
        self.checksums(&track.checksums)?;
        if let Some(subchannel) = &track.subchannel {
            self.start("Subchannel", &[])?;
            self.checksums(subchannel)?;
            self.end("Subchannel")?;
        }
        self.volumes(&track.volumes)?;
        self.end("Track")
    }

    fn volumes(&mut self, volumes: &[Volume]) -> Result<()> {
        for volume in volumes {
            match &volume.partition {
                Some(p) => {
                    let mut attrs = vec![
                        ("sequence", p.sequence.to_string()),
                        ("scheme", p.scheme.name().to_string()),
                        ("type", p.type_name.clone()),
                        ("typeId", p.type_id.clone()),
                        ("start", p.start_sector.to_string()),
                        ("sectors", p.sectors.to_string()),
                    ];
                    if p.bootable {
                        attrs.push(("bootable", "true".to_string()));
                    }
                    self.start("Partition", &attrs)?;
                    self.optional("Name", p.name.as_deref())?;
                    for fs in &volume.filesystems {
                        self.filesystem(fs)?;
                    }
                    self.end("Partition")?;
                }
                None => {
                    for fs in &volume.filesystems {
                        self.filesystem(fs)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn filesystem(&mut self, fs: &FilesystemInfo) -> Result<()> {
        let mut attrs = vec![
            ("type", fs.type_name.clone()),
            ("clusterSize", fs.cluster_size.to_string()),
            ("clusters", fs.clusters.to_string()),
        ];
        if let Some(free) = fs.free_clusters {
            attrs.push(("freeClusters", free.to_string()));
        }
        if fs.volume_name.is_none() && fs.serial.is_none() && fs.fields.is_empty() {
            return self.empty("FileSystem", &attrs);
        }
        self.start("FileSystem", &attrs)?;
        self.optional("VolumeName", fs.volume_name.as_deref())?;
        self.optional("Serial", fs.serial.as_deref())?;
        self.fields(&fs.fields)?;
        self.end("FileSystem")
    }
}

/// Serialize `sidecar` as an indented UTF-8 XML document.
pub fn to_xml(sidecar: &Sidecar) -> Result<Vec<u8>> {
    let mut out = XmlOut {
        writer: Writer::new_with_indent(Vec::new(), b' ', 2),
    };
    out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    out.start("Sidecar", &[("version", SCHEMA_VERSION.to_string())])?;

    let image = &sidecar.image;
    out.start(
        "Image",
        &[
            ("name", image.file_name.clone()),
            ("format", image.format.clone()),
            ("size", image.size.to_string()),
        ],
    )?;
    out.checksums(&image.checksums)?;
    out.optional("Application", image.application.as_deref())?;
    out.optional("ApplicationVersion", image.application_version.as_deref())?;
    out.optional("Creator", image.creator.as_deref())?;
    out.optional("Comments", image.comments.as_deref())?;
    out.time("CreationTime", image.creation_time)?;
    out.time("ModificationTime", image.modification_time)?;
    out.end("Image")?;

    let media = &sidecar.media;
    out.start(
        "Media",
        &[
            ("type", media.media_type.name().to_string()),
            ("sectors", media.sectors.to_string()),
            ("sectorSize", media.sector_size.to_string()),
            ("sessions", media.sessions.to_string()),
        ],
    )?;
    out.optional("Title", media.title.as_deref())?;
    out.optional("Serial", media.serial.as_deref())?;
    out.optional("Manufacturer", media.manufacturer.as_deref())?;
    out.optional("Model", media.model.as_deref())?;
    out.optional("DriveManufacturer", media.drive_manufacturer.as_deref())?;
    out.optional("DriveModel", media.drive_model.as_deref())?;
    out.optional("DriveSerial", media.drive_serial.as_deref())?;
    out.optional("CopyProtection", media.copy_protection.as_deref())?;
    for tag in &media.tags {
        out.tag(tag)?;
    }
    for track in &media.tracks {
        out.track(track)?;
    }
    out.volumes(&media.volumes)?;
    out.end("Media")?;

    out.end("Sidecar")?;
    let mut document = out.writer.into_inner();
    document.push(b'\n');
    Ok(document)
}
