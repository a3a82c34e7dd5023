//! Adler-32 (RFC 1950), as used by zlib streams.

use crate::algorithm::{Algorithm, Digest};
use crate::engine::RunningHash;

#[derive(Default)]
pub(crate) struct Adler32 {
    inner: adler2::Adler32,
}

impl RunningHash for Adler32 {
    const ALGORITHM: Algorithm = Algorithm::Adler32;

    fn update(&mut self, data: &[u8]) {
        self.inner.write_slice(data);
    }

    fn finish(&mut self) -> Digest {
        let value = self.inner.checksum();
        Digest::from_bytes(Self::ALGORITHM, value.to_be_bytes().to_vec())
    }

    fn reset(&mut self) {
        self.inner = adler2::Adler32::new();
    }
}
