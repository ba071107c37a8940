//! Decides how a video reaches the backend: as-is, trimmed locally, or with
//! a request for the server to trim it.

use crate::application::preprocessor::MediaPreprocessor;
use crate::domain::errors::UploadError;
use crate::domain::media::MediaBlob;
use crate::domain::progress::ProgressFn;
use crate::domain::upload::{UploadRequest, UploadResponse};
use crate::ports::engine::EngineLoader;
use crate::ports::probe::DurationProbe;
use crate::ports::upload::UploadPort;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrimPolicy {
    pub auto_trim: bool,
    pub max_duration_seconds: u32,
}

/// Which branch an upload took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrimPath {
    /// Auto-trim was switched off.
    Disabled,
    /// The video was already short enough, or its length could not be read.
    NotNeeded,
    /// Trimmed locally before upload.
    Client,
    /// Local trimming failed, the server was asked to trim the original.
    ServerFallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadOutcome {
    pub path: TrimPath,
    pub file_name: String,
    pub file_size: u64,
    pub response: UploadResponse,
}

pub struct VideoUploadService<P, L, U> {
    preprocessor: MediaPreprocessor<P, L>,
    uploader: U,
}

impl<P, L, U> VideoUploadService<P, L, U>
where
    P: DurationProbe,
    L: EngineLoader,
    U: UploadPort,
{
    pub fn new(preprocessor: MediaPreprocessor<P, L>, uploader: U) -> Self {
        Self {
            preprocessor,
            uploader,
        }
    }

    pub fn preprocessor(&self) -> &MediaPreprocessor<P, L> {
        &self.preprocessor
    }

    /// Uploads `file` under `category`, trimming it first when `policy` asks.
    ///
    /// A failed local trim never drops the upload: the original goes up with
    /// the server-side trim flag instead.
    pub async fn upload_video(
        &self,
        file: MediaBlob,
        category: &str,
        policy: TrimPolicy,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<UploadOutcome, UploadError> {
        let request = UploadRequest::video(category);

        if !policy.auto_trim {
            return self.send(file, request, TrimPath::Disabled).await;
        }

        let max = policy.max_duration_seconds;
        if !self.preprocessor.needs_trim(&file, max).await {
            return self.send(file, request, TrimPath::NotNeeded).await;
        }

        match self.preprocessor.trim(&file, max, on_progress).await {
            Ok(trimmed) => self.send(trimmed, request, TrimPath::Client).await,
            Err(e) => {
                warn!(
                    file = file.name(),
                    error = %e,
                    "Local trim failed, asking the server to trim"
                );
                if let Some(report) = on_progress {
                    report(0);
                }
                self.send(file, request.with_server_trim(max), TrimPath::ServerFallback)
                    .await
            }
        }
    }

    async fn send(
        &self,
        file: MediaBlob,
        request: UploadRequest,
        path: TrimPath,
    ) -> Result<UploadOutcome, UploadError> {
        let file_name = file.name().to_string();
        let file_size = file.size();
        info!(file = %file_name, size = file_size, ?path, "Uploading video");

        let response = self.uploader.upload(file, &request).await?;
        Ok(UploadOutcome {
            path,
            file_name,
            file_size,
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::BoxError;
    use crate::ports::engine::{MockEngineLoader, MockTranscodeEngine, TranscodeEngine};
    use crate::ports::probe::MockDurationProbe;
    use crate::ports::upload::MockUploadPort;
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};

    const MAX: u32 = 5;

    fn clip() -> MediaBlob {
        MediaBlob::new("sports-day.mov", "video/quicktime", vec![3u8; 32])
    }

    fn probe_returning(seconds: f64) -> MockDurationProbe {
        let mut probe = MockDurationProbe::new();
        probe.expect_probe_seconds().returning(move |_| Ok(seconds));
        probe
    }

    fn trimming_engine() -> Result<Arc<dyn TranscodeEngine>, BoxError> {
        let mut engine = MockTranscodeEngine::new();
        engine.expect_write_file().returning(|_, _| Ok(()));
        engine.expect_exec().returning(|_, progress| {
            let _ = progress.send(1.0);
            Ok(())
        });
        engine
            .expect_read_file()
            .returning(|_| Ok(Bytes::from_static(b"short")));
        engine.expect_delete_file().returning(|_| Ok(()));
        Ok(Arc::new(engine))
    }

    fn uploader_expecting(
        name: &'static str,
        trim_video: bool,
        trim_duration: Option<u32>,
    ) -> MockUploadPort {
        let mut uploader = MockUploadPort::new();
        uploader
            .expect_upload()
            .withf(move |file, request| {
                file.name() == name
                    && request.category == "hero-slider"
                    && request.is_video
                    && request.trim_video == trim_video
                    && request.trim_duration == trim_duration
            })
            .times(1)
            .returning(|file, _| {
                Ok(UploadResponse {
                    url: Some(format!("https://cdn.example/{}", file.name())),
                    path: None,
                })
            });
        uploader
    }

    #[tokio::test]
    async fn test_disabled_uploads_original_without_probing() {
        let mut probe = MockDurationProbe::new();
        probe.expect_probe_seconds().never();
        let mut loader = MockEngineLoader::new();
        loader.expect_load().never();

        let service = VideoUploadService::new(
            MediaPreprocessor::new(probe, loader),
            uploader_expecting("sports-day.mov", false, None),
        );
        let policy = TrimPolicy {
            auto_trim: false,
            max_duration_seconds: MAX,
        };

        let outcome = service
            .upload_video(clip(), "hero-slider", policy, None)
            .await
            .unwrap();
        assert_eq!(outcome.path, TrimPath::Disabled);
        assert_eq!(outcome.file_size, 32);
    }

    #[tokio::test]
    async fn test_short_video_is_not_trimmed() {
        let mut loader = MockEngineLoader::new();
        loader.expect_load().never();
        let service = VideoUploadService::new(
            MediaPreprocessor::new(probe_returning(4.0), loader),
            uploader_expecting("sports-day.mov", false, None),
        );
        let policy = TrimPolicy {
            auto_trim: true,
            max_duration_seconds: MAX,
        };

        let outcome = service
            .upload_video(clip(), "hero-slider", policy, None)
            .await
            .unwrap();
        assert_eq!(outcome.path, TrimPath::NotNeeded);
    }

    #[tokio::test]
    async fn test_long_video_is_trimmed_locally() {
        let mut loader = MockEngineLoader::new();
        loader.expect_load().times(1).returning(trimming_engine);
        let service = VideoUploadService::new(
            MediaPreprocessor::new(probe_returning(10.0), loader),
            uploader_expecting("sports-day-trimmed.mp4", false, None),
        );
        let policy = TrimPolicy {
            auto_trim: true,
            max_duration_seconds: MAX,
        };

        let outcome = service
            .upload_video(clip(), "hero-slider", policy, None)
            .await
            .unwrap();
        assert_eq!(outcome.path, TrimPath::Client);
        assert_eq!(outcome.file_name, "sports-day-trimmed.mp4");
        assert_eq!(outcome.file_size, 5);
        assert_eq!(
            outcome.response.location(),
            Some("https://cdn.example/sports-day-trimmed.mp4")
        );
    }

    #[tokio::test]
    async fn test_engine_failure_falls_back_to_server_trim() {
        let mut loader = MockEngineLoader::new();
        loader
            .expect_load()
            .times(1)
            .returning(|| Err("wasm core unavailable".into()));
        let service = VideoUploadService::new(
            MediaPreprocessor::new(probe_returning(10.0), loader),
            uploader_expecting("sports-day.mov", true, Some(MAX)),
        );
        let policy = TrimPolicy {
            auto_trim: true,
            max_duration_seconds: MAX,
        };

        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = reported.clone();
        let report = move |p: u8| sink.lock().unwrap().push(p);

        let outcome = service
            .upload_video(clip(), "hero-slider", policy, Some(&report))
            .await
            .unwrap();
        assert_eq!(outcome.path, TrimPath::ServerFallback);
        assert_eq!(outcome.file_name, "sports-day.mov");
        assert_eq!(*reported.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_unreadable_duration_uploads_untouched() {
        let mut probe = MockDurationProbe::new();
        probe
            .expect_probe_seconds()
            .returning(|_| Err("Invalid data found when processing input".into()));
        let mut loader = MockEngineLoader::new();
        loader.expect_load().never();
        let service = VideoUploadService::new(
            MediaPreprocessor::new(probe, loader),
            uploader_expecting("sports-day.mov", false, None),
        );
        let policy = TrimPolicy {
            auto_trim: true,
            max_duration_seconds: MAX,
        };

        let outcome = service
            .upload_video(clip(), "hero-slider", policy, None)
            .await
            .unwrap();
        assert_eq!(outcome.path, TrimPath::NotNeeded);
    }

    #[tokio::test]
    async fn test_upload_errors_propagate() {
        let mut uploader = MockUploadPort::new();
        uploader.expect_upload().returning(|_, _| {
            Err(UploadError::Rejected {
                status: 500,
                body: "boom".to_string(),
            })
        });
        let mut loader = MockEngineLoader::new();
        loader.expect_load().never();
        let service = VideoUploadService::new(
            MediaPreprocessor::new(probe_returning(1.0), loader),
            uploader,
        );
        let policy = TrimPolicy {
            auto_trim: false,
            max_duration_seconds: MAX,
        };

        let err = service
            .upload_video(clip(), "hero-slider", policy, None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected { status: 500, .. }));
    }
}
