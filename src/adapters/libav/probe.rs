use crate::domain::errors::BoxError;
use crate::domain::media::MediaBlob;
use crate::ports::probe::DurationProbe;
use async_trait::async_trait;
use ffmpeg_next as ffmpeg;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::debug;

/// Units of `format::context::Input::duration`.
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Reads the container duration with libavformat.
///
/// The bytes are staged in a scratch file that is removed as soon as the
/// metadata has been read.
#[derive(Clone, Debug, Default)]
pub struct LibavProbe {
    scratch_dir: Option<PathBuf>,
}

impl LibavProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl DurationProbe for LibavProbe {
    async fn probe_seconds(&self, file: &MediaBlob) -> Result<f64, BoxError> {
        let suffix = format!(".{}", file.staging_extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix("probe-").suffix(&suffix);
        let scratch = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        tokio::fs::write(scratch.path(), file.data().clone()).await?;

        let path = scratch.path().to_path_buf();
        let seconds = task::spawn_blocking(move || read_duration(&path)).await??;
        debug!(file = file.name(), seconds, "Probed duration");

        // removes the scratch file
        drop(scratch);
        Ok(seconds)
    }
}

fn read_duration(path: &Path) -> Result<f64, BoxError> {
    ffmpeg::init()?;
    let context = ffmpeg::format::input(&path)?;

    let duration = context.duration();
    if duration > 0 {
        return Ok(duration as f64 / AV_TIME_BASE);
    }

    // Some containers only carry a per-stream duration
    let stream = context
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or(ffmpeg::Error::StreamNotFound)?;
    let time_base = stream.time_base();
    if stream.duration() > 0 && time_base.denominator() != 0 {
        return Ok(stream.duration() as f64 * f64::from(time_base));
    }

    Err("container does not declare a duration".into())
}
