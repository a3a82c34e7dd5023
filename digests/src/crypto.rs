//! Cryptographic hashes from the RustCrypto family.

use sha2::Digest as _;

use crate::algorithm::{Algorithm, Digest};
use crate::engine::RunningHash;

/// Adapter from a RustCrypto hasher to [`RunningHash`].
#[derive(Default)]
pub(crate) struct Crypto<D, const A: u8> {
    hasher: D,
}

macro_rules! crypto_hash {
    ($name:ident, $hasher:ty, $algorithm:expr, $tag:expr) => {
        pub(crate) type $name = Crypto<$hasher, $tag>;

        impl RunningHash for Crypto<$hasher, $tag> {
            const ALGORITHM: Algorithm = $algorithm;

            fn update(&mut self, data: &[u8]) {
                self.hasher.update(data);
            }

            fn finish(&mut self) -> Digest {
                let out = std::mem::take(&mut self.hasher).finalize();
                Digest::from_bytes(Self::ALGORITHM, out.to_vec())
            }

            fn reset(&mut self) {
                self.hasher = <$hasher>::default();
            }
        }
    };
}

crypto_hash!(Md5, md5::Md5, Algorithm::Md5, 0);
crypto_hash!(Ripemd160, ripemd::Ripemd160, Algorithm::Ripemd160, 1);
crypto_hash!(Sha1, sha1::Sha1, Algorithm::Sha1, 2);
crypto_hash!(Sha256, sha2::Sha256, Algorithm::Sha256, 3);
crypto_hash!(Sha384, sha2::Sha384, Algorithm::Sha384, 4);
crypto_hash!(Sha512, sha2::Sha512, Algorithm::Sha512, 5);
