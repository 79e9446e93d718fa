use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort an export after it has started.
///
/// Conditions that only drop a single entity (an unusable image, a material
/// without a principled node, an ignored object type) are logged instead.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("scene contains invalid mesh data")]
    InvalidScene,
    #[error("failed to create output file {0}")]
    CreateOutput(PathBuf),
    #[error("header serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read image file {path}: {source}")]
    ImageRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("image file {path} changed size while exporting: planned {expected} bytes, read {actual}")]
    ImageSizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

/// Failures decoding a CRTS file.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("file is too short for the header length prefix")]
    MissingLengthPrefix,
    #[error("header length {declared} exceeds the {available} bytes available")]
    HeaderTruncated { declared: u64, available: usize },
    #[error("invalid header JSON: {0}")]
    HeaderJson(#[from] serde_json::Error),
    #[error("buffer view {0} does not exist")]
    ViewOutOfRange(usize),
    #[error("buffer view {view} spans {start}..{end}, past the {payload} byte payload")]
    ViewPastPayload {
        view: usize,
        start: u64,
        end: u64,
        payload: usize,
    },
    #[error("buffer view {view} has type {actual:?}, expected {expected:?}")]
    ViewType {
        view: usize,
        expected: crate::export::header::ViewType,
        actual: crate::export::header::ViewType,
    },
    #[error("buffer view {view} length {length} is not a multiple of {element_size}")]
    ViewLength {
        view: usize,
        length: u64,
        element_size: u64,
    },
    #[error("mesh {0} does not exist")]
    MeshOutOfRange(usize),
}
