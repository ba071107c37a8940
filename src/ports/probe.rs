use crate::domain::errors::BoxError;
use crate::domain::media::MediaBlob;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of `file` in seconds, read from its container metadata.
    async fn probe_seconds(&self, file: &MediaBlob) -> Result<f64, BoxError>;
}
