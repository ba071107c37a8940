//! Argument lists for the two transcodes the preprocessor runs.
//!
//! Both produce H.264/AAC MP4 with the moov atom at the front so the upload
//! can start playing before it is fully downloaded.

/// Name the engine writes its result under.
pub const OUTPUT_NAME: &str = "output.mp4";

/// Encoder settings for trimming. Tuned for speed over size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrimSettings {
    pub crf: u8,
    pub preset: String,
    pub audio_bitrate: String,
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            crf: 28,
            preset: "ultrafast".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

/// Encoder settings for size reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressSettings {
    pub crf: u8,
    pub preset: String,
    pub max_width: u32,
    pub audio_bitrate: String,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            crf: 32,
            preset: "ultrafast".to_string(),
            max_width: 1280,
            audio_bitrate: "96k".to_string(),
        }
    }
}

/// Staging name for an input with the given extension.
pub fn input_name(extension: &str) -> String {
    format!("input.{}", extension)
}

/// Keep the first `duration_seconds` of `input` and re-encode it.
pub fn trim_args(input: &str, duration_seconds: u32, settings: &TrimSettings) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        input.to_string(),
        "-ss".to_string(),
        "0".to_string(),
        "-t".to_string(),
        duration_seconds.to_string(),
    ];
    args.extend(video_args(&settings.preset, settings.crf));
    args.extend(audio_args(&settings.audio_bitrate));
    args.extend(faststart_args());
    args
}

/// Re-encode `input` with a width cap and heavier compression.
pub fn compress_args(input: &str, settings: &CompressSettings) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        input.to_string(),
        "-vf".to_string(),
        // -2 keeps the height even, which libx264 requires
        format!("scale='min({},iw)':-2", settings.max_width),
    ];
    args.extend(video_args(&settings.preset, settings.crf));
    args.extend(audio_args(&settings.audio_bitrate));
    args.extend(faststart_args());
    args
}

fn video_args(preset: &str, crf: u8) -> [String; 6] {
    [
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        preset.to_string(),
        "-crf".to_string(),
        crf.to_string(),
    ]
}

fn audio_args(bitrate: &str) -> [String; 4] {
    [
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        bitrate.to_string(),
    ]
}

fn faststart_args() -> [String; 3] {
    [
        "-movflags".to_string(),
        "+faststart".to_string(),
        OUTPUT_NAME.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_args() {
        let args = trim_args("input.mov", 5, &TrimSettings::default());
        assert_eq!(
            args,
            vec![
                "-i", "input.mov", "-ss", "0", "-t", "5", "-c:v", "libx264", "-preset",
                "ultrafast", "-crf", "28", "-c:a", "aac", "-b:a", "128k", "-movflags",
                "+faststart", "output.mp4",
            ]
        );
    }

    #[test]
    fn test_compress_args_caps_width() {
        let settings = CompressSettings {
            max_width: 854,
            ..CompressSettings::default()
        };
        let args = compress_args("input.mp4", &settings);
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "scale='min(854,iw)':-2");
        assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "32"));
        assert!(args.windows(2).any(|w| w[0] == "-b:a" && w[1] == "96k"));
        assert_eq!(args.last().unwrap(), OUTPUT_NAME);
    }

    #[test]
    fn test_compress_is_heavier_than_trim() {
        let trim = TrimSettings::default();
        let compress = CompressSettings::default();
        assert!(compress.crf > trim.crf);
    }

    #[test]
    fn test_input_name() {
        assert_eq!(input_name("webm"), "input.webm");
    }
}
