//! Trimming and compression of videos before they are uploaded.

use crate::application::engine::SharedEngine;
use crate::domain::errors::{BoxError, PreprocessError};
use crate::domain::media::MediaBlob;
use crate::domain::progress::{ProgressFn, ProgressTracker};
use crate::domain::transcode::{
    compress_args, input_name, trim_args, CompressSettings, TrimSettings, OUTPUT_NAME,
};
use crate::ports::engine::{EngineLoader, TranscodeEngine};
use crate::ports::probe::DurationProbe;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const TRIMMED_SUFFIX: &str = "-trimmed";
const COMPRESSED_SUFFIX: &str = "-compressed";

pub struct MediaPreprocessor<P, L> {
    probe: P,
    engine: SharedEngine<L>,
    trim_settings: TrimSettings,
    compress_settings: CompressSettings,
}

impl<P, L> MediaPreprocessor<P, L>
where
    P: DurationProbe,
    L: EngineLoader,
{
    pub fn new(probe: P, loader: L) -> Self {
        Self {
            probe,
            engine: SharedEngine::new(loader),
            trim_settings: TrimSettings::default(),
            compress_settings: CompressSettings::default(),
        }
    }

    pub fn with_trim_settings(mut self, settings: TrimSettings) -> Self {
        self.trim_settings = settings;
        self
    }

    pub fn with_compress_settings(mut self, settings: CompressSettings) -> Self {
        self.compress_settings = settings;
        self
    }

    pub fn engine_ready(&self) -> bool {
        self.engine.is_ready()
    }

    /// Duration of `file` rounded to whole seconds.
    pub async fn probe_duration(&self, file: &MediaBlob) -> Result<u64, PreprocessError> {
        let seconds = self
            .probe
            .probe_seconds(file)
            .await
            .map_err(PreprocessError::MetadataRead)?;

        if !seconds.is_finite() || seconds < 0.0 {
            return Err(PreprocessError::MetadataRead(
                format!("invalid duration {}", seconds).into(),
            ));
        }
        Ok(seconds.round() as u64)
    }

    /// Whether `file` runs longer than `max_duration_seconds`.
    ///
    /// A file whose duration can not be read is reported as not needing a
    /// trim, so it is never held back from upload.
    pub async fn needs_trim(&self, file: &MediaBlob, max_duration_seconds: u32) -> bool {
        match self.probe_duration(file).await {
            Ok(duration) => {
                let needed = duration > u64::from(max_duration_seconds);
                debug!(
                    file = file.name(),
                    duration,
                    max_duration_seconds,
                    needed,
                    "Checked video duration"
                );
                needed
            }
            Err(e) => {
                warn!(
                    file = file.name(),
                    error = ?e,
                    "Could not probe duration, assuming no trim is needed"
                );
                false
            }
        }
    }

    /// Keeps the first `duration_seconds` of `file` as a new MP4.
    pub async fn trim(
        &self,
        file: &MediaBlob,
        duration_seconds: u32,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<MediaBlob, PreprocessError> {
        info!(file = file.name(), duration_seconds, "Trimming video");
        let settings = &self.trim_settings;
        self.process(file, TRIMMED_SUFFIX, on_progress, |input| {
            trim_args(input, duration_seconds, settings)
        })
        .await
    }

    /// Re-encodes `file` at a capped resolution and higher compression.
    pub async fn compress(
        &self,
        file: &MediaBlob,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<MediaBlob, PreprocessError> {
        info!(file = file.name(), size = file.size(), "Compressing video");
        let settings = &self.compress_settings;
        self.process(file, COMPRESSED_SUFFIX, on_progress, |input| {
            compress_args(input, settings)
        })
        .await
    }

    /// Compresses `file` only when it is larger than `max_size_mb`.
    ///
    /// Files within the limit come back untouched without loading the engine.
    /// A compression that does not shrink the file also returns the original.
    pub async fn auto_compress_if_needed(
        &self,
        file: MediaBlob,
        max_size_mb: f64,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<MediaBlob, PreprocessError> {
        if file.size_mb() <= max_size_mb {
            return Ok(file);
        }

        let compressed = self.compress(&file, on_progress).await?;
        if compressed.size() > file.size() {
            info!(
                file = file.name(),
                original = file.size(),
                compressed = compressed.size(),
                "Compression grew the file, keeping the original"
            );
            return Ok(file);
        }
        Ok(compressed)
    }

    async fn process<F>(
        &self,
        file: &MediaBlob,
        suffix: &str,
        on_progress: Option<ProgressFn<'_>>,
        build_args: F,
    ) -> Result<MediaBlob, PreprocessError>
    where
        F: FnOnce(&str) -> Vec<String>,
    {
        let engine = self.engine.acquire().await.map_err(|e| {
            warn!(error = %e, "Transcoding engine failed to load");
            PreprocessError::EngineLoad(e)
        })?;

        let input = input_name(file.staging_extension());
        let args = build_args(&input);
        debug!(?args, "Running transcode");

        let result = run_transcode(&*engine, file, &input, &args, on_progress).await;

        for name in [input.as_str(), OUTPUT_NAME] {
            if let Err(e) = engine.delete_file(name).await {
                warn!(name, error = %e, "Failed to remove engine file");
            }
        }

        let data = result.map_err(|e| {
            warn!(file = file.name(), error = %e, "Transcode failed");
            PreprocessError::Transcode(e)
        })?;
        Ok(file.derive_mp4(suffix, data))
    }
}

async fn run_transcode(
    engine: &dyn TranscodeEngine,
    file: &MediaBlob,
    input: &str,
    args: &[String],
    on_progress: Option<ProgressFn<'_>>,
) -> Result<Bytes, BoxError> {
    engine.write_file(input, file.data().clone()).await?;

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let forward = async {
        let mut tracker = ProgressTracker::new();
        while let Some(fraction) = receiver.recv().await {
            if let (Some(report), Some(percent)) = (on_progress, tracker.advance(fraction)) {
                report(percent);
            }
        }
    };

    let (result, ()) = tokio::join!(engine.exec(args, sender), forward);
    result?;

    engine.read_file(OUTPUT_NAME).await
}
