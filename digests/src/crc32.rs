//! CRC-32 (ISO-HDLC / zlib polynomial) backed by `crc32fast`.

use crate::algorithm::{Algorithm, Digest};
use crate::engine::RunningHash;

#[derive(Default)]
pub(crate) struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl RunningHash for Crc32 {
    const ALGORITHM: Algorithm = Algorithm::Crc32;

    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finish(&mut self) -> Digest {
        let value = std::mem::take(&mut self.hasher).finalize();
        Digest::from_bytes(Self::ALGORITHM, value.to_be_bytes().to_vec())
    }

    fn reset(&mut self) {
        self.hasher.reset();
    }
}

/// Calculate CRC32 checksum of a buffer in one call
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::digest_one;

    #[test]
    fn test_crc32_known_value() {
        // "123456789" has well-known CRC32 value
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
        assert_eq!(
            digest_one(Algorithm::Crc32, b"123456789").unwrap().as_str(),
            "cbf43926"
        );
    }

    #[test]
    fn test_crc32_empty() {
        assert_eq!(digest_one(Algorithm::Crc32, b"").unwrap().as_str(), "00000000");
    }
}
