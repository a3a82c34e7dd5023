//! Partition and filesystem layout of an image.

use mediaimage::MediaImage;
use tracing::debug;
use volumes::{identify_filesystems, identify_partitions, partitions_in, FilesystemInfo, Partition, Region};

/// A partition, or an unpartitioned range, and what it holds.
#[derive(Debug, Clone)]
pub struct Volume {
    pub partition: Option<Partition>,
    pub region: Region,
    pub filesystems: Vec<FilesystemInfo>,
}

/// Volumes inside `range`: one per partition that lies within it, or the
/// range itself when no partition does.
pub fn volumes_in(image: &mut dyn MediaImage, partitions: &[Partition], range: Region) -> Vec<Volume> {
    let inside = partitions_in(partitions, range);
    if inside.is_empty() {
        let filesystems = identify_filesystems(image, range);
        return vec![Volume {
            partition: None,
            region: range,
            filesystems,
        }];
    }

    inside
        .into_iter()
        .map(|partition| {
            let region = partition.region();
            let filesystems = identify_filesystems(image, region);
            Volume {
                partition: Some(partition),
                region,
                filesystems,
            }
        })
        .collect()
}

/// Volumes of one track, or of the whole device.
#[derive(Debug, Clone)]
pub struct Area {
    pub track: Option<u32>,
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub partitions: Vec<Partition>,
    pub areas: Vec<Area>,
}

impl Layout {
    pub fn filesystem_count(&self) -> usize {
        self.areas
            .iter()
            .flat_map(|a| &a.volumes)
            .map(|v| v.filesystems.len())
            .sum()
    }
}

/// Identify partitions, then filesystems on every data track (optical
/// media) or on the whole device (block media).
pub fn analyze_layout(image: &mut dyn MediaImage) -> Layout {
    let partitions = identify_partitions(image);
    let tracks = image.tracks().to_vec();

    let areas = if tracks.is_empty() {
        let whole = Region::whole(image);
        vec![Area {
            track: None,
            volumes: volumes_in(image, &partitions, whole),
        }]
    } else {
        tracks
            .iter()
            .filter(|t| {
                if !t.kind.is_data() {
                    debug!(track = t.sequence, "skipping audio track");
                }
                t.kind.is_data()
            })
            .map(|t| Area {
                track: Some(t.sequence),
                volumes: volumes_in(image, &partitions, Region::new(t.start_sector, t.sector_count())),
            })
            .collect()
    };

    let layout = Layout { partitions, areas };
    debug!(
        partitions = layout.partitions.len(),
        filesystems = layout.filesystem_count(),
        "layout analyzed"
    );
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaimage::RawImage;
    use std::fs;

    #[test]
    fn test_unpartitioned_image_is_one_volume() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.img");
        fs::write(&path, vec![0u8; 64 * 512]).unwrap();
        let mut image = RawImage::open(&path).unwrap();

        let layout = analyze_layout(&mut image);
        assert!(layout.partitions.is_empty());
        assert_eq!(layout.areas.len(), 1);
        assert_eq!(layout.areas[0].track, None);
        let volume = &layout.areas[0].volumes[0];
        assert!(volume.partition.is_none());
        assert_eq!(volume.region, Region::new(0, 64));
        assert_eq!(layout.filesystem_count(), 0);
    }

    #[test]
    fn test_mbr_partitions_become_volumes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        let mut data = vec![0u8; 256 * 512];
        for (slot, (start, sectors)) in [(16u32, 64u32), (96, 128)].into_iter().enumerate() {
            let entry = 446 + slot * 16;
            data[entry + 4] = 0x83;
            data[entry + 8..entry + 12].copy_from_slice(&start.to_le_bytes());
            data[entry + 12..entry + 16].copy_from_slice(&sectors.to_le_bytes());
        }
        data[510] = 0x55;
        data[511] = 0xAA;
        fs::write(&path, data).unwrap();
        let mut image = RawImage::open(&path).unwrap();

        let layout = analyze_layout(&mut image);
        assert_eq!(layout.partitions.len(), 2);
        let volumes = &layout.areas[0].volumes;
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[1].region, Region::new(96, 128));
    }
}
