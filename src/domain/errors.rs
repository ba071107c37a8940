//! Errors surfaced by the preprocessor and the upload flow.

use std::error::Error;
use thiserror::Error;

/// Error type returned across port boundaries.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Preprocessing failures. Messages are stable and safe to show to users;
/// the engine or probe error is kept as `source` for logs.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Could not read video metadata")]
    MetadataRead(#[source] BoxError),
    #[error("Video processor could not be started")]
    EngineLoad(#[source] BoxError),
    #[error("Video processing failed")]
    Transcode(#[source] BoxError),
}

/// Failures from the upload operation itself.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload request failed: {0}")]
    Transport(#[source] BoxError),
    #[error("Upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Upload response contained neither url nor path")]
    MissingLocation,
}
