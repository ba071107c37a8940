//! Runs against a real ffmpeg build with libx264 on PATH.

use crate::adapters::ffmpeg::FfmpegLoader;
use crate::adapters::libav::LibavProbe;
use crate::application::preprocessor::MediaPreprocessor;
use crate::domain::media::MediaBlob;
use std::path::Path;
use std::sync::Mutex;
use tempfile::tempdir;
use tokio::process::Command;

async fn generate_clip(dir: &Path, seconds: u32) -> MediaBlob {
    let path = dir.join("assembly.mp4");
    let source = format!("testsrc=duration={}:size=320x240:rate=25", seconds);
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-y", "-f", "lavfi", "-i", &source, "-c:v", "libx264"])
        .arg(&path)
        .status()
        .await
        .expect("Failed to run ffmpeg");
    assert!(status.success(), "ffmpeg could not generate the test clip");
    MediaBlob::from_path(&path).await.unwrap()
}

#[tokio::test]
#[ignore]
async fn test_functional_trim_real_file() {
    let dir = tempdir().unwrap();
    let clip = generate_clip(dir.path(), 8).await;
    let preprocessor = MediaPreprocessor::new(LibavProbe::new(), FfmpegLoader::new("ffmpeg"));

    assert_eq!(preprocessor.probe_duration(&clip).await.unwrap(), 8);
    assert!(preprocessor.needs_trim(&clip, 5).await);

    let seen = Mutex::new(Vec::new());
    let report = |p: u8| seen.lock().unwrap().push(p);
    let trimmed = preprocessor.trim(&clip, 5, Some(&report)).await.unwrap();

    assert_eq!(trimmed.name(), "assembly-trimmed.mp4");
    assert_eq!(trimmed.mime(), "video/mp4");
    // one keyframe of slack
    let duration = preprocessor.probe_duration(&trimmed).await.unwrap();
    assert!(duration <= 6, "trimmed clip runs {}s", duration);
    assert!(!preprocessor.needs_trim(&trimmed, 6).await);
    assert_eq!(seen.lock().unwrap().last(), Some(&100));
}

#[tokio::test]
#[ignore]
async fn test_functional_short_clip_needs_no_trim() {
    let dir = tempdir().unwrap();
    let clip = generate_clip(dir.path(), 3).await;
    let preprocessor = MediaPreprocessor::new(LibavProbe::new(), FfmpegLoader::new("ffmpeg"));

    assert_eq!(preprocessor.probe_duration(&clip).await.unwrap(), 3);
    assert!(!preprocessor.needs_trim(&clip, 5).await);
    assert!(!preprocessor.engine_ready());
}
