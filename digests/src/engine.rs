//! Uniform incremental contract over every checksum algorithm.
//!
//! Each algorithm only implements [`RunningHash`]; the [`Engine`] wrapper
//! enforces the `init → update* → finalize` lifecycle so misuse fails fast
//! instead of producing a digest over the wrong bytes.

use crate::algorithm::{Algorithm, Digest};
use crate::error::{DigestError, Result};
use crate::{adler32, crc16, crc32, crc64, crypto, spamsum};

/// One checksum algorithm with exclusively owned running state.
pub trait ChecksumEngine: Send {
    fn algorithm(&self) -> Algorithm;

    /// Return to the initial state, discarding anything folded so far.
    fn reset(&mut self);

    /// Fold `data` into the running state. Order-sensitive.
    fn update(&mut self, data: &[u8]) -> Result<()>;

    /// Produce the digest. Further `update`/`finalize` calls fail until
    /// [`reset`](ChecksumEngine::reset).
    fn finalize(&mut self) -> Result<Digest>;
}

/// Algorithm-specific running state.
pub(crate) trait RunningHash: Send {
    const ALGORITHM: Algorithm;

    fn update(&mut self, data: &[u8]);

    /// Consume the state into a digest. Called at most once per cycle.
    fn finish(&mut self) -> Digest;

    fn reset(&mut self);
}

/// Lifecycle guard around a [`RunningHash`].
pub(crate) struct Engine<H> {
    state: H,
    finalized: bool,
}

impl<H: RunningHash + Default> Engine<H> {
    pub(crate) fn new() -> Self {
        Engine {
            state: H::default(),
            finalized: false,
        }
    }
}

impl<H: RunningHash> ChecksumEngine for Engine<H> {
    fn algorithm(&self) -> Algorithm {
        H::ALGORITHM
    }

    fn reset(&mut self) {
        self.state.reset();
        self.finalized = false;
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        if self.finalized {
            return Err(DigestError::InvalidState {
                algorithm: H::ALGORITHM,
                reason: "update after finalize",
            });
        }
        self.state.update(data);
        Ok(())
    }

    fn finalize(&mut self) -> Result<Digest> {
        if self.finalized {
            return Err(DigestError::InvalidState {
                algorithm: H::ALGORITHM,
                reason: "finalize called twice",
            });
        }
        self.finalized = true;
        Ok(self.state.finish())
    }
}

impl Algorithm {
    /// Create a fresh engine for this algorithm.
    pub fn engine(self) -> Box<dyn ChecksumEngine> {
        match self {
            Algorithm::Adler32 => Box::new(Engine::<adler32::Adler32>::new()),
            Algorithm::Crc16 => Box::new(Engine::<crc16::Crc16>::new()),
            Algorithm::Crc32 => Box::new(Engine::<crc32::Crc32>::new()),
            Algorithm::Crc64 => Box::new(Engine::<crc64::Crc64>::new()),
            Algorithm::Md5 => Box::new(Engine::<crypto::Md5>::new()),
            Algorithm::Ripemd160 => Box::new(Engine::<crypto::Ripemd160>::new()),
            Algorithm::Sha1 => Box::new(Engine::<crypto::Sha1>::new()),
            Algorithm::Sha256 => Box::new(Engine::<crypto::Sha256>::new()),
            Algorithm::Sha384 => Box::new(Engine::<crypto::Sha384>::new()),
            Algorithm::Sha512 => Box::new(Engine::<crypto::Sha512>::new()),
            Algorithm::SpamSum => Box::new(Engine::<spamsum::SpamSum>::new()),
        }
    }
}

/// Digest `data` with a single algorithm in one call.
pub fn digest_one(algorithm: Algorithm, data: &[u8]) -> Result<Digest> {
    let mut engine = algorithm.engine();
    engine.update(data)?;
    engine.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_after_finalize_fails() {
        let mut engine = Algorithm::Md5.engine();
        engine.update(b"abc").unwrap();
        engine.finalize().unwrap();
        let err = engine.update(b"more").unwrap_err();
        assert!(matches!(
            err,
            DigestError::InvalidState { algorithm: Algorithm::Md5, .. }
        ));
    }

    #[test]
    fn test_double_finalize_fails() {
        let mut engine = Algorithm::Crc64.engine();
        engine.finalize().unwrap();
        assert!(engine.finalize().is_err());
    }

    #[test]
    fn test_reset_makes_engine_reusable() {
        let mut engine = Algorithm::Sha256.engine();
        engine.update(b"garbage").unwrap();
        engine.finalize().unwrap();
        engine.reset();
        engine.update(b"abc").unwrap();
        let digest = engine.finalize().unwrap();
        assert_eq!(
            digest.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_reset_discards_partial_state() {
        let mut engine = Algorithm::Crc32.engine();
        engine.update(b"partial").unwrap();
        engine.reset();
        engine.update(b"123456789").unwrap();
        assert_eq!(engine.finalize().unwrap().as_str(), "cbf43926");
    }

    #[test]
    fn test_every_algorithm_has_an_engine() {
        for algorithm in Algorithm::ALL {
            let engine = algorithm.engine();
            assert_eq!(engine.algorithm(), algorithm);
        }
    }

    #[test]
    fn test_split_updates_match_single_update() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 7 + 3) as u8).collect();
        for algorithm in Algorithm::ALL {
            let whole = digest_one(algorithm, &data).unwrap();
            let mut engine = algorithm.engine();
            for piece in data.chunks(333) {
                engine.update(piece).unwrap();
            }
            assert_eq!(engine.finalize().unwrap(), whole, "{algorithm}");
        }
    }
}
