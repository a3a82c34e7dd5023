use thiserror::Error;

#[derive(Error, Debug)]
pub enum VolumeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] mediaimage::ImageError),

    #[error("invalid {structure} signature")]
    InvalidSignature { structure: &'static str },

    #[error("{structure} checksum mismatch: stored 0x{stored:08X}, computed 0x{computed:08X}")]
    ChecksumMismatch {
        structure: &'static str,
        stored: u64,
        computed: u64,
    },

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("read of {len} bytes at {offset} falls outside the region")]
    OutOfRegion { offset: u64, len: u64 },
}

pub type Result<T> = std::result::Result<T, VolumeError>;
