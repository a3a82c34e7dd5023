use std::path::PathBuf;

use digests::DigestError;
use mediaimage::ImageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image format of {} not recognized", .0.display())]
    FormatUnrecognized(PathBuf),

    #[error("cannot open {}: {source}", path.display())]
    CannotOpenSource {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("image error: {0}")]
    Image(#[from] ImageError),

    #[error("volume error: {0}")]
    Volume(#[from] volumes::VolumeError),

    /// A checksum engine or its worker failed
    #[error("checksum failure: {0}")]
    AlgorithmFault(DigestError),

    #[error("output {} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("operation aborted")]
    Aborted,
}

impl From<DigestError> for Error {
    fn from(e: DigestError) -> Self {
        match e {
            DigestError::Io(io) if io.kind() == std::io::ErrorKind::Interrupted => Error::Aborted,
            DigestError::Io(io) => Error::Io(io),
            other => Error::AlgorithmFault(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
