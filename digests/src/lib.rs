//! Streaming multi-algorithm checksums for media images
//!
//! Computes many independent digests over one ordered byte stream, reading
//! it once in fixed-size chunks and handing every chunk to one long-lived
//! worker per algorithm.
//!
//! # Algorithms
//!
//! - Adler-32
//! - CRC16 (CRC-16/ARC), CRC32 (ISO-HDLC), CRC64 (CRC-64/XZ)
//! - MD5, RIPEMD-160, SHA-1, SHA-256, SHA-384, SHA-512
//! - SpamSum fuzzy hash (ssdeep-compatible)
//!
//! # Example
//!
//! ```
//! use digests::{Algorithm, MultiDigest, StreamChunker};
//!
//! # fn main() -> digests::Result<()> {
//! let mut pool = MultiDigest::new(&[Algorithm::Crc32, Algorithm::Sha256])?;
//!
//! let data: &[u8] = b"123456789";
//! let set = pool.run(StreamChunker::new(data, 4)?, |_, _| {})?;
//! assert_eq!(set.get(Algorithm::Crc32).unwrap().as_str(), "cbf43926");
//!
//! // The same pool can hash the next extent
//! let set = pool.run(StreamChunker::new(&b"abc"[..], 4)?, |_, _| {})?;
//! assert_eq!(set.len(), 2);
//! # Ok(())
//! # }
//! ```

mod adler32;
mod crc16;
mod crc32;
mod crc64;
mod crypto;
mod spamsum;

pub mod aggregate;
pub mod algorithm;
pub mod chunker;
pub mod engine;
pub mod error;

pub use aggregate::{MultiDigest, RunState};
pub use algorithm::{Algorithm, Digest, DigestSet};
pub use chunker::{Chunk, ChunkSource, ReaderSource, StreamChunker, DEFAULT_CHUNK_SIZE};
pub use crc32::crc32;
pub use engine::{digest_one, ChecksumEngine};
pub use error::{DigestError, Result};

/// Hash an in-memory buffer with `algorithms` using the default chunk size.
pub fn digest_bytes(data: &[u8], algorithms: &[Algorithm]) -> Result<DigestSet> {
    digest_source(data, DEFAULT_CHUNK_SIZE, algorithms)
}

/// Hash any chunk source with a fresh pool.
pub fn digest_source<S: ChunkSource>(
    source: S,
    chunk_size: usize,
    algorithms: &[Algorithm],
) -> Result<DigestSet> {
    let chunker = StreamChunker::new(source, chunk_size)?;
    let mut pool = MultiDigest::new(algorithms)?;
    pool.run(chunker, |_, _| {})
}
