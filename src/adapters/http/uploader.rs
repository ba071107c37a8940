use crate::domain::errors::UploadError;
use crate::domain::media::MediaBlob;
use crate::domain::upload::{UploadRequest, UploadResponse};
use crate::ports::upload::UploadPort;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::time::Duration;
use tracing::{debug, info};

/// Posts files as multipart forms to the backend upload endpoint.
#[derive(Clone, Debug)]
pub struct HttpUploader {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(Client::new(), endpoint, token)
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Transport(e.into()))?;
        Ok(Self::with_client(client, endpoint, token))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl UploadPort for HttpUploader {
    async fn upload(
        &self,
        file: MediaBlob,
        request: &UploadRequest,
    ) -> Result<UploadResponse, UploadError> {
        let size = file.size();
        let part = Part::stream_with_length(Body::from(file.data().clone()), size)
            .file_name(file.name().to_string())
            .mime_str(file.mime())
            .map_err(|e| UploadError::Transport(e.into()))?;

        let mut form = Form::new();
        for (name, value) in request.form_fields() {
            form = form.text(name, value);
        }
        let form = form.part("file", part);

        debug!(endpoint = %self.endpoint, file = file.name(), size, ?request, "Uploading");

        let mut builder = self.client.post(&self.endpoint).multipart(form);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Transport(e.into()))?;

        match body.location() {
            Some(location) => {
                info!(file = file.name(), location, "Upload stored");
                Ok(body)
            }
            None => Err(UploadError::MissingLocation),
        }
    }
}
