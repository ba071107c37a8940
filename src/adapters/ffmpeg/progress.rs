//! Parses `ffmpeg -progress` output into completion fractions.

use regex::Regex;
use std::sync::OnceLock;

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Duration: (\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid regex"))
}

fn out_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // out_time_ms is in microseconds too
    RE.get_or_init(|| Regex::new(r"^out_time_(?:us|ms)=(\d+)$").expect("valid regex"))
}

/// Keys ffmpeg writes to the progress stream.
const PROGRESS_KEYS: &[&str] = &[
    "frame=", "fps=", "stream_", "bitrate=", "total_size=", "out_time", "dup_frames=",
    "drop_frames=", "speed=", "progress=",
];

/// Reads stderr lines of an ffmpeg run started with `-progress pipe:2`.
///
/// The total length is the input duration, capped by any `-t` limit.
#[derive(Debug)]
pub struct ProgressParser {
    limit: Option<f64>,
    input_duration: Option<f64>,
}

impl ProgressParser {
    pub fn new(args: &[String]) -> Self {
        let limit = args
            .windows(2)
            .find(|w| w[0] == "-t")
            .and_then(|w| w[1].parse::<f64>().ok())
            .filter(|t| *t > 0.0);
        Self {
            limit,
            input_duration: None,
        }
    }

    fn total(&self) -> Option<f64> {
        match (self.input_duration, self.limit) {
            (Some(d), Some(l)) => Some(d.min(l)),
            (d, l) => d.or(l),
        }
    }

    /// Fraction complete after `line`, if the line carries progress.
    pub fn feed(&mut self, line: &str) -> Option<f64> {
        let line = line.trim();

        if self.input_duration.is_none() {
            if let Some(caps) = duration_re().captures(line) {
                let hours: f64 = caps[1].parse().ok()?;
                let minutes: f64 = caps[2].parse().ok()?;
                let seconds: f64 = caps[3].parse().ok()?;
                self.input_duration = Some(hours * 3600.0 + minutes * 60.0 + seconds);
                return None;
            }
        }

        if line == "progress=end" {
            return Some(1.0);
        }

        let caps = out_time_re().captures(line)?;
        let micros: f64 = caps[1].parse().ok()?;
        let total = self.total().filter(|t| *t > 0.0)?;
        Some((micros / 1_000_000.0 / total).min(1.0))
    }
}

/// Whether `line` belongs to the machine-readable progress stream.
pub fn is_progress_line(line: &str) -> bool {
    let line = line.trim_start();
    PROGRESS_KEYS.iter().any(|key| line.starts_with(key))
}
