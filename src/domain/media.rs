//! In-memory media files handed around by the preprocessor.

use bytes::Bytes;
use std::path::Path;

/// Declared type of every file the preprocessor produces.
pub const MP4_MIME: &str = "video/mp4";

/// Container extensions kept as-is when a file is staged for the engine.
const KNOWN_VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "webm", "mkv", "avi", "ogv", "3gp", "flv", "wmv", "mpeg", "mpg", "ts",
];

/// An immutable named byte buffer with a declared MIME type.
///
/// Cloning shares the underlying buffer, so the bytes a caller hands in are
/// never copied or modified by the preprocessor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaBlob {
    name: String,
    mime: String,
    data: Bytes,
}

impl MediaBlob {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// Reads a file from disk, guessing the MIME type from its extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime = guess_mime(&name);
        Ok(Self::new(name, mime, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Size in mebibytes, the unit upload limits are expressed in.
    pub fn size_mb(&self) -> f64 {
        self.size() as f64 / (1024.0 * 1024.0)
    }

    /// Extension to stage this file under inside the engine.
    pub fn staging_extension(&self) -> &str {
        staging_extension(&self.name)
    }

    /// Builds a `video/mp4` blob named after this one with `suffix` appended.
    pub fn derive_mp4(&self, suffix: &str, data: impl Into<Bytes>) -> MediaBlob {
        MediaBlob::new(derived_name(&self.name, suffix), MP4_MIME, data)
    }
}

/// `holiday.mov` + `-trimmed` gives `holiday-trimmed.mp4`.
pub fn derived_name(original: &str, suffix: &str) -> String {
    format!("{}{}.mp4", file_stem(original), suffix)
}

fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

pub fn staging_extension(name: &str) -> &str {
    let ext = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx + 1..],
        _ => return "mp4",
    };
    KNOWN_VIDEO_EXTENSIONS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(ext))
        .copied()
        .unwrap_or("mp4")
}

pub fn guess_mime(name: &str) -> &'static str {
    match staging_extension(name) {
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "ogv" => "video/ogg",
        "3gp" => "video/3gpp",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        "mpeg" | "mpg" => "video/mpeg",
        "ts" => "video/mp2t",
        _ => MP4_MIME,
    }
}
