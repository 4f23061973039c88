//! # Error Types
//!
//! Recoverable failures of the world core. Geometry, generation and raycasting are
//! total and have no error type; only decoding, persistence and configuration can fail.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while decoding a packed chunk or volume.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The text is not valid standard base64.
    #[error("packed data is not valid base64: {0}")]
    Base64(String),

    /// The decoded byte length matches none of the known encodings.
    #[error("unrecognized packed length {len} for a volume of {volume} voxels")]
    UnrecognizedLength {
        /// Decoded byte length.
        len: usize,
        /// Number of voxels the caller expected.
        volume: usize,
    },

    /// A legacy volume whose dimensions are not whole chunks.
    #[error("legacy volume {width}x{height} does not tile into chunks")]
    InvalidDimensions {
        /// Horizontal edge length.
        width: usize,
        /// Vertical extent.
        height: usize,
    },
}

/// Errors raised by world storage backends.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed.
    #[error("storage i/o failed for {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The stored record is not valid JSON for any known layout.
    #[error("malformed world record: {0}")]
    Json(#[from] serde_json::Error),

    /// A chunk or legacy volume inside the record failed to decode.
    #[error("failed to decode world data: {0}")]
    Codec(#[from] CodecError),
}

/// Errors raised while loading engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its accepted range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
