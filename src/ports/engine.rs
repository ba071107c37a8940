use crate::domain::errors::BoxError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// A transcoding engine with its own private file namespace.
///
/// Names passed to the file operations are plain file names inside that
/// namespace, and `exec` arguments refer to files by those names.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Store `data` under `name`, replacing any previous entry
    async fn write_file(&self, name: &str, data: Bytes) -> Result<(), BoxError>;

    async fn read_file(&self, name: &str) -> Result<Bytes, BoxError>;

    /// Remove `name`. Removing a missing entry is not an error.
    async fn delete_file(&self, name: &str) -> Result<(), BoxError>;

    /// Run one transcode. Progress is sent as a fraction in `0.0..=1.0`;
    /// the sender is dropped when the run finishes.
    async fn exec(&self, args: &[String], progress: UnboundedSender<f64>) -> Result<(), BoxError>;
}

/// Creates engine instances. Called again after a failed load.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn TranscodeEngine>, BoxError>;
}
