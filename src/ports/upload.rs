use crate::domain::errors::UploadError;
use crate::domain::media::MediaBlob;
use crate::domain::upload::{UploadRequest, UploadResponse};
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadPort: Send + Sync {
    /// Send `file` to the backend with the given processing flags.
    async fn upload(
        &self,
        file: MediaBlob,
        request: &UploadRequest,
    ) -> Result<UploadResponse, UploadError>;
}
