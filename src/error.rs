use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the session, the image loader and report export.
#[derive(Debug, Error)]
pub enum Error {
    /// Only PNG and JPEG images can be marked.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A mark referenced a color key missing from the registry.
    #[error("unknown color: {0}")]
    UnknownColor(String),

    #[error("report serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("report is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid options file: {0}")]
    Options(#[from] toml::de::Error),

    #[error("failed to write options: {0}")]
    OptionsWrite(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Failure while handing a finished report to its destination.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
