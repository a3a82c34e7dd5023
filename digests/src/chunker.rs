//! Fixed-size, ordered chunking of a finite byte source.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use crate::error::{DigestError, Result};

/// Default chunk size: 1 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// A finite, randomly addressable byte source.
pub trait ChunkSource {
    /// Total number of bytes in the source
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `buf` entirely with the bytes starting at `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;
}

impl ChunkSource for &[u8] {
    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "offset out of range"))?;
        let end = start
            .checked_add(buf.len())
            .filter(|&end| end <= <[u8]>::len(self))
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "read past end"))?;
        buf.copy_from_slice(&self[start..end]);
        Ok(())
    }
}

/// Any `Read + Seek` stream, sized once at construction.
pub struct ReaderSource<R> {
    reader: R,
    len: u64,
}

impl<R: Read + Seek> ReaderSource<R> {
    pub fn new(mut reader: R) -> io::Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(ReaderSource { reader, len })
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> ChunkSource for ReaderSource<R> {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(buf)
    }
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_at(offset, buf)
    }
}

/// One step of a chunked stream. The buffer is shared read-only.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub offset: u64,
    pub data: Arc<[u8]>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Forward-only sequence of chunks covering a source exactly once.
///
/// Every chunk is `chunk_size` bytes except the last, which holds the
/// remainder. An empty source yields nothing. After a read error the error
/// is yielded once and the sequence ends.
pub struct StreamChunker<S> {
    source: S,
    chunk_size: usize,
    offset: u64,
    len: u64,
    failed: bool,
}

impl<S: ChunkSource> StreamChunker<S> {
    pub fn new(source: S, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(DigestError::ZeroChunkSize);
        }
        let len = source.len();
        Ok(StreamChunker {
            source,
            chunk_size,
            offset: 0,
            len,
            failed: false,
        })
    }

    pub fn total_len(&self) -> u64 {
        self.len
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks the full sequence contains
    pub fn chunk_count(&self) -> u64 {
        self.len.div_ceil(self.chunk_size as u64)
    }
}

impl<S: ChunkSource> Iterator for StreamChunker<S> {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.len {
            return None;
        }

        let remaining = self.len - self.offset;
        let size = remaining.min(self.chunk_size as u64) as usize;
        let mut buf = vec![0u8; size];

        match self.source.read_at(self.offset, &mut buf) {
            Ok(()) => {
                let chunk = Chunk {
                    offset: self.offset,
                    data: Arc::from(buf),
                };
                self.offset += size as u64;
                Some(Ok(chunk))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sizes<S: ChunkSource>(chunker: StreamChunker<S>) -> Vec<usize> {
        chunker.map(|c| c.unwrap().len()).collect()
    }

    #[test]
    fn test_empty_source_yields_nothing() {
        let data: &[u8] = &[];
        let chunker = StreamChunker::new(data, 16).unwrap();
        assert_eq!(chunker.chunk_count(), 0);
        assert!(sizes(chunker).is_empty());
    }

    #[test]
    fn test_exact_multiple_has_no_short_tail() {
        let data = vec![7u8; 64];
        let chunker = StreamChunker::new(data.as_slice(), 64).unwrap();
        assert_eq!(sizes(chunker), vec![64]);
    }

    #[test]
    fn test_one_past_multiple_has_one_byte_tail() {
        let data = vec![7u8; 65];
        let chunker = StreamChunker::new(data.as_slice(), 64).unwrap();
        assert_eq!(sizes(chunker), vec![64, 1]);
    }

    #[test]
    fn test_offsets_are_contiguous() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let chunker = StreamChunker::new(data.as_slice(), 300).unwrap();
        let mut expected = 0u64;
        let mut joined = Vec::new();
        for chunk in chunker {
            let chunk = chunk.unwrap();
            assert_eq!(chunk.offset, expected);
            expected += chunk.len() as u64;
            joined.extend_from_slice(&chunk.data);
        }
        assert_eq!(joined, data);
    }

    #[test]
    fn test_reader_source() {
        let cursor = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let source = ReaderSource::new(cursor).unwrap();
        assert_eq!(source.len(), 5);
        let chunker = StreamChunker::new(source, 2).unwrap();
        assert_eq!(sizes(chunker), vec![2, 2, 1]);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let data: &[u8] = b"abc";
        assert!(matches!(
            StreamChunker::new(data, 0),
            Err(DigestError::ZeroChunkSize)
        ));
    }

    struct FailingSource;

    impl ChunkSource for FailingSource {
        fn len(&self) -> u64 {
            100
        }

        fn read_at(&mut self, offset: u64, _buf: &mut [u8]) -> io::Result<()> {
            if offset >= 50 {
                Err(io::Error::other("bad sector"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_read_error_ends_sequence() {
        let mut chunker = StreamChunker::new(FailingSource, 50).unwrap();
        assert!(chunker.next().unwrap().is_ok());
        assert!(chunker.next().unwrap().is_err());
        assert!(chunker.next().is_none());
    }
}
