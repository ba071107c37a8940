//! Transcoding engine backed by the `ffmpeg` executable.

pub mod engine;
pub mod progress;

pub use engine::{FfmpegEngine, FfmpegLoader};
