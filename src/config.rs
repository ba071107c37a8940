//! Configuration loaded from the environment (and `.env`).

use crate::domain::transcode::{CompressSettings, TrimSettings};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct PrerollConfig {
    /// ffmpeg executable used as the transcoding engine
    pub ffmpeg_path: PathBuf,
    /// Parent directory for engine workspaces and probe scratch files
    pub work_dir: Option<PathBuf>,
    /// Longest video accepted without trimming, in seconds
    pub max_duration_secs: u32,
    /// Largest file accepted without compression, in MiB
    pub max_size_mb: f64,
    /// Whether uploads are trimmed before being sent
    pub auto_trim: bool,
    /// Backend endpoint receiving multipart uploads
    pub upload_endpoint: String,
    /// Bearer token for the upload endpoint
    pub upload_token: Option<String>,
    /// Request timeout for uploads, in seconds
    pub upload_timeout_secs: u64,
    pub trim: TrimSettings,
    pub compress: CompressSettings,
}

impl Default for PrerollConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            work_dir: None,
            max_duration_secs: 5,
            max_size_mb: 5.0,
            auto_trim: true,
            upload_endpoint: String::from("http://127.0.0.1:3000/api/upload"),
            upload_token: None,
            upload_timeout_secs: 300,
            trim: TrimSettings::default(),
            compress: CompressSettings::default(),
        }
    }
}

impl PrerollConfig {
    /// Load configuration from environment variables.
    /// Missing or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            ffmpeg_path: lookup("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            work_dir: lookup("PREROLL_WORK_DIR").map(PathBuf::from),
            max_duration_secs: parse_or(&lookup, "PREROLL_MAX_DURATION_SECS", defaults.max_duration_secs),
            max_size_mb: parse_or(&lookup, "PREROLL_MAX_SIZE_MB", defaults.max_size_mb),
            auto_trim: lookup("PREROLL_AUTO_TRIM")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.auto_trim),
            upload_endpoint: lookup("UPLOAD_ENDPOINT").unwrap_or(defaults.upload_endpoint),
            upload_token: lookup("UPLOAD_TOKEN").filter(|t| !t.is_empty()),
            upload_timeout_secs: parse_or(&lookup, "UPLOAD_TIMEOUT_SECS", defaults.upload_timeout_secs),
            trim: TrimSettings {
                crf: parse_or(&lookup, "PREROLL_TRIM_CRF", defaults.trim.crf),
                preset: lookup("PREROLL_TRIM_PRESET").unwrap_or(defaults.trim.preset),
                audio_bitrate: lookup("PREROLL_TRIM_AUDIO_BITRATE")
                    .unwrap_or(defaults.trim.audio_bitrate),
            },
            compress: CompressSettings {
                crf: parse_or(&lookup, "PREROLL_COMPRESS_CRF", defaults.compress.crf),
                preset: lookup("PREROLL_COMPRESS_PRESET").unwrap_or(defaults.compress.preset),
                max_width: parse_or(&lookup, "PREROLL_COMPRESS_MAX_WIDTH", defaults.compress.max_width),
                audio_bitrate: lookup("PREROLL_COMPRESS_AUDIO_BITRATE")
                    .unwrap_or(defaults.compress.audio_bitrate),
            },
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
