use std::fmt;
use std::str::FromStr;

use crate::error::{DigestError, Result};

/// Checksum and hash algorithms computed over media extents.
///
/// The declaration order is the canonical order used when no explicit order
/// is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    Adler32,
    Crc16,
    Crc32,
    Crc64,
    Md5,
    Ripemd160,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    /// Context-triggered piecewise (fuzzy) hash
    SpamSum,
}

impl Algorithm {
    pub const ALL: [Algorithm; 11] = [
        Algorithm::Adler32,
        Algorithm::Crc16,
        Algorithm::Crc32,
        Algorithm::Crc64,
        Algorithm::Md5,
        Algorithm::Ripemd160,
        Algorithm::Sha1,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
        Algorithm::SpamSum,
    ];

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Adler32 => "Adler-32",
            Algorithm::Crc16 => "CRC16",
            Algorithm::Crc32 => "CRC32",
            Algorithm::Crc64 => "CRC64",
            Algorithm::Md5 => "MD5",
            Algorithm::Ripemd160 => "RIPEMD-160",
            Algorithm::Sha1 => "SHA-1",
            Algorithm::Sha256 => "SHA-256",
            Algorithm::Sha384 => "SHA-384",
            Algorithm::Sha512 => "SHA-512",
            Algorithm::SpamSum => "SpamSum",
        }
    }

    /// Lowercase identifier used in sidecars and on the command line
    pub fn key(self) -> &'static str {
        match self {
            Algorithm::Adler32 => "adler32",
            Algorithm::Crc16 => "crc16",
            Algorithm::Crc32 => "crc32",
            Algorithm::Crc64 => "crc64",
            Algorithm::Md5 => "md5",
            Algorithm::Ripemd160 => "ripemd160",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
            Algorithm::SpamSum => "spamsum",
        }
    }

    /// Output size in bytes, `None` for variable-length signatures
    pub fn output_size(self) -> Option<usize> {
        match self {
            Algorithm::Adler32 | Algorithm::Crc32 => Some(4),
            Algorithm::Crc16 => Some(2),
            Algorithm::Crc64 => Some(8),
            Algorithm::Md5 => Some(16),
            Algorithm::Ripemd160 | Algorithm::Sha1 => Some(20),
            Algorithm::Sha256 => Some(32),
            Algorithm::Sha384 => Some(48),
            Algorithm::Sha512 => Some(64),
            Algorithm::SpamSum => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .flat_map(|c| c.to_lowercase())
            .collect();
        Algorithm::ALL
            .into_iter()
            .find(|a| a.key() == wanted)
            .ok_or_else(|| format!("unknown algorithm: {s}"))
    }
}

/// A finalized checksum or hash value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    algorithm: Algorithm,
    bytes: Vec<u8>,
    text: String,
}

impl Digest {
    /// Build a digest from raw output bytes, encoded as lowercase hex.
    pub fn from_bytes(algorithm: Algorithm, bytes: Vec<u8>) -> Self {
        let text = hex::encode(&bytes);
        Digest {
            algorithm,
            bytes,
            text,
        }
    }

    /// Build a digest whose canonical form is a text signature.
    pub fn from_text(algorithm: Algorithm, text: String) -> Self {
        Digest {
            algorithm,
            bytes: text.as_bytes().to_vec(),
            text,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Textual encoding (lowercase hex, or the signature for SpamSum)
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// All digests computed over one extent, in insertion order.
///
/// Keys are unique. Once built, a set is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestSet {
    entries: Vec<Digest>,
}

impl DigestSet {
    /// Assemble a set, rejecting duplicate algorithms.
    pub fn from_digests(digests: Vec<Digest>) -> Result<Self> {
        for (i, d) in digests.iter().enumerate() {
            if digests[..i].iter().any(|p| p.algorithm == d.algorithm) {
                return Err(DigestError::DuplicateAlgorithm(d.algorithm));
            }
        }
        Ok(DigestSet { entries: digests })
    }

    pub fn get(&self, algorithm: Algorithm) -> Option<&Digest> {
        self.entries.iter().find(|d| d.algorithm == algorithm)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Digest> {
        self.entries.iter()
    }

    pub fn algorithms(&self) -> impl Iterator<Item = Algorithm> + '_ {
        self.entries.iter().map(|d| d.algorithm)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a DigestSet {
    type Item = &'a Digest;
    type IntoIter = std::slice::Iter<'a, Digest>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm_names() {
        assert_eq!("md5".parse::<Algorithm>().unwrap(), Algorithm::Md5);
        assert_eq!("SHA-256".parse::<Algorithm>().unwrap(), Algorithm::Sha256);
        assert_eq!("RIPEMD160".parse::<Algorithm>().unwrap(), Algorithm::Ripemd160);
        assert_eq!("Adler-32".parse::<Algorithm>().unwrap(), Algorithm::Adler32);
        assert!("whirlpool".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_digest_hex_encoding() {
        let d = Digest::from_bytes(Algorithm::Crc32, vec![0xCB, 0xF4, 0x39, 0x26]);
        assert_eq!(d.as_str(), "cbf43926");
        assert_eq!(d.to_string(), "cbf43926");
    }

    #[test]
    fn test_digest_set_rejects_duplicates() {
        let a = Digest::from_bytes(Algorithm::Crc32, vec![0; 4]);
        let b = Digest::from_bytes(Algorithm::Crc32, vec![1; 4]);
        let err = DigestSet::from_digests(vec![a, b]).unwrap_err();
        assert!(matches!(err, DigestError::DuplicateAlgorithm(Algorithm::Crc32)));
    }

    #[test]
    fn test_digest_set_keeps_insertion_order() {
        let set = DigestSet::from_digests(vec![
            Digest::from_bytes(Algorithm::Sha1, vec![0; 20]),
            Digest::from_bytes(Algorithm::Adler32, vec![0; 4]),
        ])
        .unwrap();
        let order: Vec<_> = set.algorithms().collect();
        assert_eq!(order, vec![Algorithm::Sha1, Algorithm::Adler32]);
        assert!(set.get(Algorithm::Md5).is_none());
    }

    #[test]
    fn test_output_sizes() {
        assert_eq!(Algorithm::Sha512.output_size(), Some(64));
        assert_eq!(Algorithm::SpamSum.output_size(), None);
    }
}
