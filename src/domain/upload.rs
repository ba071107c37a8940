//! What the backend upload endpoint receives and returns.

use serde::{Deserialize, Serialize};

/// Processing flags sent alongside the file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub category: String,
    pub is_video: bool,
    pub is_document: bool,
    pub trim_video: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_duration: Option<u32>,
}

impl UploadRequest {
    /// A video upload the server should store as-is.
    pub fn video(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            is_video: true,
            is_document: false,
            trim_video: false,
            trim_duration: None,
        }
    }

    /// Asks the server to keep only the first `seconds` of the video.
    pub fn with_server_trim(mut self, seconds: u32) -> Self {
        self.trim_video = true;
        self.trim_duration = Some(seconds);
        self
    }

    /// Multipart text fields, in the order the backend documents them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("category", self.category.clone()),
            ("isVideo", self.is_video.to_string()),
            ("isDocument", self.is_document.to_string()),
            ("trimVideo", self.trim_video.to_string()),
        ];
        if let Some(duration) = self.trim_duration {
            fields.push(("trimDuration", duration.to_string()));
        }
        fields
    }
}

/// Backend reply. At least one of the two locations is present on success.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl UploadResponse {
    pub fn location(&self) -> Option<&str> {
        self.url.as_deref().or(self.path.as_deref())
    }
}
