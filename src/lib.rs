//! Preroll - Video preprocessing ahead of upload
//!
//! Hexagonal Architecture:
//! - domain/: Pure values and rules (media blobs, sizes, transcode arguments, upload flags)
//! - ports/: Trait definitions (transcoding engine, duration probe, upload)
//! - adapters/: Concrete implementations (ffmpeg, libav, HTTP)
//! - application/: Services built on the ports (shared engine, preprocessor, upload flow)
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::preprocessor::MediaPreprocessor;
pub use application::video_upload::{TrimPath, TrimPolicy, UploadOutcome, VideoUploadService};
pub use config::PrerollConfig;
pub use domain::errors::{PreprocessError, UploadError};
pub use domain::media::MediaBlob;
pub use domain::size::format_size;
