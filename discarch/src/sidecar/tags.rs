//! Decoders for disk-level media tags.
//!
//! Tags are stored as the drive returned them: a 4-byte response header
//! (big-endian data length, two reserved bytes) followed by the structure.
//! Decoding is table driven; a tag without a decoder, or one whose bytes
//! do not parse, is reported without interpretation.

use byteorder::{BigEndian, ByteOrder};
use mediaimage::{MediaTagKind, MediaType};

const HEADER: usize = 4;

/// Interpretation of one tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedTag {
    pub fields: Vec<(String, String)>,
    /// More precise medium than the image format could tell
    pub media_type: Option<MediaType>,
    pub copy_protection: Option<String>,
}

impl DecodedTag {
    fn field(&mut self, name: &str, value: impl ToString) {
        self.fields.push((name.to_string(), value.to_string()));
    }
}

type Decoder = fn(&[u8]) -> Option<DecodedTag>;

const DECODERS: &[(MediaTagKind, Decoder)] = &[
    (MediaTagKind::CdAtip, decode_atip),
    (MediaTagKind::CdPma, decode_pma),
    (MediaTagKind::DvdBca, decode_bca),
    (MediaTagKind::DvdPfi, decode_pfi),
    (MediaTagKind::DvdDmi, decode_dmi),
    (MediaTagKind::DvdCmi, decode_cmi),
];

/// Decode `data` as a tag of `kind`; `None` when unsupported or malformed.
pub fn decode(kind: MediaTagKind, data: &[u8]) -> Option<DecodedTag> {
    let (_, decoder) = DECODERS.iter().find(|(k, _)| *k == kind)?;
    decoder(data)
}

fn msf(bytes: &[u8]) -> String {
    format!("{:02}:{:02}:{:02}", bytes[0], bytes[1], bytes[2])
}

fn msf_to_lba(bytes: &[u8]) -> i64 {
    (bytes[0] as i64 * 60 + bytes[1] as i64) * 75 + bytes[2] as i64 - 150
}

fn decode_atip(data: &[u8]) -> Option<DecodedTag> {
    if data.len() < HEADER + 12 {
        return None;
    }
    let d = &data[HEADER..];
    let mut tag = DecodedTag::default();

    let rewritable = d[2] & 0x40 != 0;
    tag.media_type = Some(if rewritable {
        MediaType::CdRw
    } else {
        MediaType::CdR
    });
    tag.field("Disc type", if rewritable { "CD-RW" } else { "CD-R" });
    tag.field("Disc sub-type", (d[2] >> 3) & 0x07);
    tag.field("Indicative target writing power", d[0] >> 4);
    tag.field("Reference speed", d[0] & 0x07);
    tag.field("Unrestricted use", d[1] & 0x40 != 0);
    tag.field("Lead-in start", msf(&d[4..7]));
    tag.field("Last lead-out start", msf(&d[8..11]));
    let capacity = msf_to_lba(&d[8..11]);
    if capacity > 0 {
        tag.field("Capacity sectors", capacity);
    }
    Some(tag)
}

fn decode_pma(data: &[u8]) -> Option<DecodedTag> {
    if data.len() < HEADER {
        return None;
    }
    let mut tag = DecodedTag::default();
    tag.field("Entries", (data.len() - HEADER) / 11);
    Some(tag)
}

fn decode_bca(data: &[u8]) -> Option<DecodedTag> {
    if data.len() <= HEADER {
        return None;
    }
    let mut tag = DecodedTag::default();
    tag.field("Length", data.len() - HEADER);
    Some(tag)
}

fn book_type(kind: u8) -> (&'static str, Option<MediaType>) {
    match kind {
        0 => ("DVD-ROM", Some(MediaType::DvdRom)),
        1 => ("DVD-RAM", Some(MediaType::DvdRam)),
        2 => ("DVD-R", Some(MediaType::DvdR)),
        3 => ("DVD-RW", Some(MediaType::DvdRw)),
        4 => ("HD DVD-ROM", None),
        5 => ("HD DVD-RAM", None),
        6 => ("HD DVD-R", None),
        9 => ("DVD+RW", Some(MediaType::DvdPlusRw)),
        10 => ("DVD+R", Some(MediaType::DvdPlusR)),
        13 => ("DVD+RW DL", Some(MediaType::DvdPlusRw)),
        14 => ("DVD+R DL", Some(MediaType::DvdPlusR)),
        _ => ("Unknown", None),
    }
}

fn decode_pfi(data: &[u8]) -> Option<DecodedTag> {
    if data.len() < HEADER + 17 {
        return None;
    }
    let d = &data[HEADER..];
    let mut tag = DecodedTag::default();

    let (book, media_type) = book_type(d[0] >> 4);
    tag.media_type = media_type;
    tag.field("Book type", book);
    tag.field("Part version", d[0] & 0x0F);
    tag.field(
        "Disc size",
        match d[1] >> 4 {
            0 => "120 mm",
            1 => "80 mm",
            _ => "Unknown",
        },
    );
    tag.field(
        "Maximum rate",
        match d[1] & 0x0F {
            0 => "2.52 Mbit/s",
            1 => "5.04 Mbit/s",
            2 => "10.08 Mbit/s",
            3 => "20.16 Mbit/s",
            _ => "Not specified",
        },
    );
    tag.field("Layers", ((d[2] >> 5) & 0x03) + 1);
    tag.field(
        "Track path",
        if d[2] & 0x10 != 0 { "Opposite" } else { "Parallel" },
    );

    let start = BigEndian::read_u32(&d[4..8]) & 0x00FF_FFFF;
    let end = BigEndian::read_u32(&d[8..12]) & 0x00FF_FFFF;
    tag.field("Data area start", format!("0x{start:06X}"));
    tag.field("Data area end", format!("0x{end:06X}"));
    if end >= start {
        tag.field("Data area sectors", end - start + 1);
    }
    Some(tag)
}

fn decode_dmi(data: &[u8]) -> Option<DecodedTag> {
    if data.len() <= HEADER {
        return None;
    }
    let mut tag = DecodedTag::default();
    tag.field("Length", data.len() - HEADER);
    Some(tag)
}

fn decode_cmi(data: &[u8]) -> Option<DecodedTag> {
    if data.len() < HEADER + 2 {
        return None;
    }
    let d = &data[HEADER..];
    let mut tag = DecodedTag::default();

    let scheme = match d[0] {
        0x00 => None,
        0x01 => Some("CSS/CPPM"),
        0x02 => Some("CPRM"),
        0x03 => Some("AACS"),
        _ => Some("Unknown"),
    };
    tag.field("Copy protection", scheme.unwrap_or("None"));
    if let Some(scheme) = scheme {
        tag.copy_protection = Some(scheme.to_string());
        // A set bit blocks playback in that region
        let regions: Vec<String> = (1..=8u8)
            .filter(|r| d[1] & (1 << (r - 1)) == 0)
            .map(|r| r.to_string())
            .collect();
        tag.field("Playable regions", regions.join(","));
    }
    Some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_header(body: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER];
        BigEndian::write_u16(&mut data[0..2], (body.len() + 2) as u16);
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_atip_rewritable() {
        let mut body = [0u8; 24];
        body[0] = 0x50;
        body[2] = 0x80 | 0x40;
        body[4..7].copy_from_slice(&[97, 26, 41]);
        body[8..11].copy_from_slice(&[79, 59, 74]);
        let tag = decode(MediaTagKind::CdAtip, &with_header(&body)).unwrap();
        assert_eq!(tag.media_type, Some(MediaType::CdRw));
        assert!(tag
            .fields
            .contains(&("Lead-in start".to_string(), "97:26:41".to_string())));
        assert!(tag
            .fields
            .contains(&("Capacity sectors".to_string(), "359849".to_string())));
    }

    #[test]
    fn test_pfi_dvd_plus_r() {
        let mut body = [0u8; 2048];
        body[0] = 0xA1;
        body[1] = 0x02;
        BigEndian::write_u32(&mut body[4..8], 0x0003_0000);
        BigEndian::write_u32(&mut body[8..12], 0x0026_053F);
        let tag = decode(MediaTagKind::DvdPfi, &with_header(&body)).unwrap();
        assert_eq!(tag.media_type, Some(MediaType::DvdPlusR));
        assert!(tag
            .fields
            .contains(&("Data area sectors".to_string(), "2295104".to_string())));
    }

    #[test]
    fn test_cmi_css_regions() {
        let tag = decode(MediaTagKind::DvdCmi, &with_header(&[0x01, 0xFE, 0, 0])).unwrap();
        assert_eq!(tag.copy_protection.as_deref(), Some("CSS/CPPM"));
        assert!(tag
            .fields
            .contains(&("Playable regions".to_string(), "1".to_string())));

        let open = decode(MediaTagKind::DvdCmi, &with_header(&[0x00, 0x00, 0, 0])).unwrap();
        assert_eq!(open.copy_protection, None);
    }

    #[test]
    fn test_truncated_tags_are_not_decoded() {
        assert!(decode(MediaTagKind::CdAtip, &[0, 2, 0, 0, 1]).is_none());
        assert!(decode(MediaTagKind::DvdPfi, &[0; 8]).is_none());
        assert!(decode(MediaTagKind::DvdBca, &[0; 4]).is_none());
    }
}
