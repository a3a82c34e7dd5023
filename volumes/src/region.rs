use mediaimage::MediaImage;

use crate::error::{Result, VolumeError};

/// A contiguous sector range of an image, addressed by byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start_sector: u64,
    pub sectors: u64,
}

impl Region {
    pub fn new(start_sector: u64, sectors: u64) -> Self {
        Region {
            start_sector,
            sectors,
        }
    }

    /// The whole image
    pub fn whole(image: &dyn MediaImage) -> Self {
        Region::new(0, image.sector_count())
    }

    pub fn end_sector(&self) -> u64 {
        self.start_sector + self.sectors
    }

    /// Size in bytes, using the sector size at the region's start
    pub fn byte_len(&self, image: &dyn MediaImage) -> u64 {
        self.sectors * image.sector_size_at(self.start_sector) as u64
    }

    /// Read `len` bytes starting `offset` bytes into the region.
    pub fn read(&self, image: &mut dyn MediaImage, offset: u64, len: usize) -> Result<Vec<u8>> {
        let out_of_region = VolumeError::OutOfRegion {
            offset,
            len: len as u64,
        };
        if len == 0 {
            return Ok(Vec::new());
        }

        let sector_size = image.sector_size_at(self.start_sector) as u64;
        let first = offset / sector_size;
        let last = (offset + len as u64 - 1) / sector_size;
        if last >= self.sectors {
            return Err(out_of_region);
        }

        let count = u32::try_from(last - first + 1).map_err(|_| out_of_region)?;
        let data = image.read_sectors(self.start_sector + first, count)?;
        let skip = (offset % sector_size) as usize;
        data.get(skip..skip + len)
            .map(<[u8]>::to_vec)
            .ok_or(VolumeError::OutOfRegion {
                offset,
                len: len as u64,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemImage;

    #[test]
    fn test_read_spans_sectors() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 256) as u8).collect();
        let mut image = MemImage::new(data.clone(), 512);
        let region = Region::new(2, 4);
        let bytes = region.read(&mut image, 500, 30).unwrap();
        assert_eq!(bytes, &data[1524..1554]);
        assert_eq!(region.byte_len(&image), 2048);
    }

    #[test]
    fn test_read_outside_region() {
        let mut image = MemImage::new(vec![0u8; 4096], 512);
        let region = Region::new(0, 2);
        assert!(region.read(&mut image, 1000, 30).is_err());
        assert!(region.read(&mut image, 1000, 24).is_ok());
    }
}
