use super::progress::{is_progress_line, ProgressParser};
use crate::domain::errors::BoxError;
use crate::ports::engine::{EngineLoader, TranscodeEngine};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tracing::{debug, info};

/// Lines of ffmpeg diagnostics kept for error reports.
const STDERR_TAIL: usize = 12;

/// Flags every run gets ahead of the caller's arguments.
const BASE_ARGS: &[&str] = &["-hide_banner", "-y", "-nostats", "-progress", "pipe:2"];

/// Runs the `ffmpeg` executable against files in a private directory.
///
/// The directory is removed when the engine is dropped.
pub struct FfmpegEngine {
    binary: PathBuf,
    workspace: TempDir,
}

#[derive(Debug, Error)]
#[error("ffmpeg exited with {status}{}", describe_tail(.tail))]
pub struct FfmpegFailed {
    status: ExitStatus,
    tail: Vec<String>,
}

fn describe_tail(tail: &[String]) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!(": {}", tail.join(" | "))
    }
}

impl FfmpegEngine {
    pub fn new(binary: impl Into<PathBuf>, workspace: TempDir) -> Self {
        Self {
            binary: binary.into(),
            workspace,
        }
    }

    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, BoxError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.workspace.path().join(name)),
            _ => Err(format!("invalid engine file name {:?}", name).into()),
        }
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn write_file(&self, name: &str, data: Bytes) -> Result<(), BoxError> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Bytes, BoxError> {
        let path = self.resolve(name)?;
        Ok(Bytes::from(tokio::fs::read(&path).await?))
    }

    async fn delete_file(&self, name: &str) -> Result<(), BoxError> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exec(&self, args: &[String], progress: UnboundedSender<f64>) -> Result<(), BoxError> {
        debug!(binary = %self.binary.display(), ?args, "Spawning ffmpeg");

        let mut child = Command::new(&self.binary)
            .current_dir(self.workspace.path())
            .args(BASE_ARGS)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child.stderr.take().ok_or("ffmpeg stderr was not captured")?;
        let mut lines = FramedRead::new(stderr, AnyDelimiterCodec::new(b"\r\n".to_vec(), Vec::new()));
        let mut parser = ProgressParser::new(args);
        let mut tail = VecDeque::with_capacity(STDERR_TAIL);

        while let Some(chunk) = lines.next().await {
            let chunk = chunk?;
            let line = String::from_utf8_lossy(&chunk);
            if line.trim().is_empty() {
                continue;
            }
            if let Some(fraction) = parser.feed(&line) {
                // receiver gone just means nobody is watching
                let _ = progress.send(fraction);
            }
            if !is_progress_line(&line) {
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line.trim().to_string());
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(Box::new(FfmpegFailed {
                status,
                tail: tail.into_iter().collect(),
            }));
        }

        let _ = progress.send(1.0);
        Ok(())
    }
}

/// Checks that ffmpeg can run and prepares a fresh private directory.
#[derive(Clone, Debug)]
pub struct FfmpegLoader {
    binary: PathBuf,
    work_root: Option<PathBuf>,
}

impl FfmpegLoader {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            work_root: None,
        }
    }

    /// Create engine directories under `root` instead of the system temp dir.
    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }
}

#[async_trait]
impl EngineLoader for FfmpegLoader {
    async fn load(&self) -> Result<Arc<dyn TranscodeEngine>, BoxError> {
        let output = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("could not run {}: {}", self.binary.display(), e))?;

        if !output.status.success() {
            return Err(format!(
                "{} -version exited with {}",
                self.binary.display(),
                output.status
            )
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout.lines().next().unwrap_or("unknown version");

        let mut builder = tempfile::Builder::new();
        builder.prefix("preroll-");
        let workspace = match &self.work_root {
            Some(root) => {
                tokio::fs::create_dir_all(root).await?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        info!(version, workspace = %workspace.path().display(), "Loaded ffmpeg");
        Ok(Arc::new(FfmpegEngine::new(self.binary.clone(), workspace)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn engine() -> FfmpegEngine {
        FfmpegEngine::new("ffmpeg", tempfile::tempdir().unwrap())
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let engine = engine();
        engine
            .write_file("input.mp4", Bytes::from_static(b"data"))
            .await
            .unwrap();
        assert!(engine.workspace().join("input.mp4").exists());
        assert_eq!(engine.read_file("input.mp4").await.unwrap().as_ref(), b"data");

        engine.delete_file("input.mp4").await.unwrap();
        assert!(!engine.workspace().join("input.mp4").exists());
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        assert!(engine().delete_file("output.mp4").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_names_outside_workspace() {
        let engine = engine();
        for name in ["../escape.mp4", "/etc/passwd", "dir/file.mp4", "", ".."] {
            assert!(
                engine.write_file(name, Bytes::new()).await.is_err(),
                "accepted {:?}",
                name
            );
        }
    }

    #[tokio::test]
    async fn test_missing_binary_fails_exec() {
        let engine = FfmpegEngine::new("/nonexistent/ffmpeg", tempfile::tempdir().unwrap());
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(engine.exec(&["-version".to_string()], tx).await.is_err());
    }

    #[tokio::test]
    async fn test_loader_reports_missing_binary() {
        let loader = FfmpegLoader::new("/nonexistent/ffmpeg");
        let err = loader.load().await.err().unwrap();
        assert!(err.to_string().contains("could not run /nonexistent/ffmpeg"));
    }

    #[test]
    fn test_failure_message_includes_tail() {
        use std::os::unix::process::ExitStatusExt;
        let err = FfmpegFailed {
            status: ExitStatus::from_raw(256),
            tail: vec!["input.mp4: Invalid data found when processing input".to_string()],
        };
        let message = err.to_string();
        assert!(message.starts_with("ffmpeg exited with"));
        assert!(message.ends_with("input.mp4: Invalid data found when processing input"));
    }

    #[test]
    fn test_failure_message_without_tail() {
        use std::os::unix::process::ExitStatusExt;
        let err = FfmpegFailed {
            status: ExitStatus::from_raw(256),
            tail: Vec::new(),
        };
        assert_eq!(err.to_string(), "ffmpeg exited with exit status: 1");
    }
}
