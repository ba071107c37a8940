//! Preroll CLI - Inspect, trim, compress and upload videos
//!
//! Wires up:
//! - ffmpeg transcoding engine and libav duration probe
//! - HTTP upload adapter pointed at the admin backend
//! - The same trim/fallback policy the admin forms use

use bytes::Bytes;
use clap::{Parser, Subcommand};
use preroll::adapters::{ffmpeg::FfmpegLoader, http::HttpUploader, libav::LibavProbe};
use preroll::{format_size, MediaBlob, MediaPreprocessor, PrerollConfig, TrimPolicy, VideoUploadService};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "preroll", about = "Prepare videos for upload to the school site")]
struct Cli {
    /// ffmpeg executable to use as the transcoding engine
    #[arg(long, env = "FFMPEG_PATH", global = true)]
    ffmpeg: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a video's duration and size
    Probe {
        file: PathBuf,
        /// Also report whether it exceeds this many seconds
        #[arg(long)]
        max_duration: Option<u32>,
    },
    /// Keep only the first seconds of a video
    Trim {
        file: PathBuf,
        #[arg(long)]
        seconds: Option<u32>,
        /// Where to write the result (defaults next to the input)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Compress a video if it is larger than the size limit
    Compress {
        file: PathBuf,
        #[arg(long)]
        max_size_mb: Option<f64>,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Upload a video, trimming it first unless disabled
    Upload {
        file: PathBuf,
        /// Destination category, e.g. hero-slider
        #[arg(long, default_value = "videos")]
        category: String,
        #[arg(long)]
        max_duration: Option<u32>,
        /// Upload the file exactly as given
        #[arg(long)]
        no_trim: bool,
        #[arg(long, env = "UPLOAD_ENDPOINT")]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = PrerollConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Some(ffmpeg) = cli.ffmpeg {
        config.ffmpeg_path = ffmpeg;
    }

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "preroll failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, mut config: PrerollConfig) -> CliResult {
    match command {
        Command::Probe { file, max_duration } => {
            let preprocessor = build_preprocessor(&config);
            let blob = MediaBlob::from_path(&file).await?;
            let seconds = preprocessor.probe_duration(&blob).await?;
            println!("{}: {}s, {}", blob.name(), seconds, format_size(blob.size()));
            if let Some(max) = max_duration {
                let verdict = if seconds > u64::from(max) { "needs trim" } else { "ok" };
                println!("limit {}s: {}", max, verdict);
            }
            Ok(())
        }
        Command::Trim {
            file,
            seconds,
            output,
        } => {
            let preprocessor = build_preprocessor(&config);
            let blob = MediaBlob::from_path(&file).await?;
            let seconds = seconds.unwrap_or(config.max_duration_secs);
            let trimmed = preprocessor.trim(&blob, seconds, Some(&print_progress)).await?;
            finish_progress();
            save(&file, output, &trimmed).await
        }
        Command::Compress {
            file,
            max_size_mb,
            output,
        } => {
            let preprocessor = build_preprocessor(&config);
            let blob = MediaBlob::from_path(&file).await?;
            let before = blob.size();
            let original = blob.data().clone();
            let limit = max_size_mb.unwrap_or(config.max_size_mb);
            let result = preprocessor
                .auto_compress_if_needed(blob, limit, Some(&print_progress))
                .await?;
            finish_progress();
            if same_buffer(&original, result.data()) {
                println!("{} left unchanged ({})", result.name(), format_size(before));
                return Ok(());
            }
            println!("{} -> {}", format_size(before), format_size(result.size()));
            save(&file, output, &result).await
        }
        Command::Upload {
            file,
            category,
            max_duration,
            no_trim,
            endpoint,
        } => {
            if let Some(endpoint) = endpoint {
                config.upload_endpoint = endpoint;
            }
            let uploader = HttpUploader::with_timeout(
                config.upload_endpoint.clone(),
                config.upload_token.clone(),
                Duration::from_secs(config.upload_timeout_secs),
            )?;
            let service = VideoUploadService::new(build_preprocessor(&config), uploader);
            let policy = TrimPolicy {
                auto_trim: config.auto_trim && !no_trim,
                max_duration_seconds: max_duration.unwrap_or(config.max_duration_secs),
            };

            let blob = MediaBlob::from_path(&file).await?;
            let outcome = service
                .upload_video(blob, &category, policy, Some(&print_progress))
                .await?;
            finish_progress();
            println!(
                "{} ({}) uploaded via {:?}: {}",
                outcome.file_name,
                format_size(outcome.file_size),
                outcome.path,
                outcome.response.location().unwrap_or("-")
            );
            Ok(())
        }
    }
}

fn build_preprocessor(config: &PrerollConfig) -> MediaPreprocessor<LibavProbe, FfmpegLoader> {
    let mut loader = FfmpegLoader::new(config.ffmpeg_path.clone());
    let mut probe = LibavProbe::new();
    if let Some(dir) = &config.work_dir {
        loader = loader.with_work_root(dir);
        probe = probe.with_scratch_dir(dir);
    }
    MediaPreprocessor::new(probe, loader)
        .with_trim_settings(config.trim.clone())
        .with_compress_settings(config.compress.clone())
}

fn print_progress(percent: u8) {
    eprint!("\rprocessing: {:>3}%", percent);
    let _ = std::io::stderr().flush();
}

fn finish_progress() {
    eprintln!();
}

/// True when `result` is the input handed back rather than a new encode.
fn same_buffer(original: &Bytes, result: &Bytes) -> bool {
    original.as_ptr() == result.as_ptr() && original.len() == result.len()
}

async fn save(input: &Path, output: Option<PathBuf>, blob: &MediaBlob) -> CliResult {
    let target = output.unwrap_or_else(|| input.with_file_name(blob.name()));
    tokio::fs::write(&target, blob.data()).await?;
    println!("wrote {} ({})", target.display(), format_size(blob.size()));
    Ok(())
}
