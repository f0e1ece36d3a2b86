//! Media probing via ffprobe.
//!
//! A successful download is only Downloaded once we can read its video
//! stream; anything ffprobe cannot make sense of is not a trailer.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::error::ProbeError;

/// Video properties extracted from a media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedMedia {
    pub width: u32,
    pub height: u32,
    pub duration_secs: u32,
}

/// Extracts video properties from a file on disk.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbedMedia, ProbeError>;
}

/// ffprobe-backed media probe.
pub struct FfprobeProbe {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe", 30)
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> Result<ProbedMedia, ProbeError> {
        debug!(path = %path.display(), "Probing media file");

        let output = timeout(
            self.timeout,
            Command::new(&self.ffprobe_path)
                .args([
                    "-v",
                    "error",
                    "-print_format",
                    "json",
                    "-show_format",
                    "-show_streams",
                ])
                .arg(path)
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .map_err(|_| ProbeError::Timeout)??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Failed(
                stderr.chars().take(200).collect::<String>(),
            ));
        }

        let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProbeError::Parse(e.to_string()))?;

        parse_probe_output(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    duration: Option<String>,
}

fn parse_probe_output(output: FfprobeOutput) -> Result<ProbedMedia, ProbeError> {
    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or(ProbeError::NoVideoStream)?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(ProbeError::NoVideoStream),
    };

    // Container-level duration is more reliable; stream duration is the
    // fallback for formats that only report per-stream.
    let duration_str = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .ok_or_else(|| ProbeError::Parse("no duration reported".to_string()))?;

    let duration_secs = duration_str
        .parse::<f64>()
        .map_err(|e| ProbeError::Parse(format!("bad duration '{}': {}", duration_str, e)))?
        .round() as u32;

    Ok(ProbedMedia {
        width,
        height,
        duration_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "streams": [
                {"codec_type": "audio"},
                {"codec_type": "video", "width": 1920, "height": 1080, "duration": "89.5"}
            ],
            "format": {"duration": "90.04"}
        }"#;
        let parsed: FfprobeOutput = serde_json::from_str(json).unwrap();
        let media = parse_probe_output(parsed).unwrap();

        assert_eq!(media.width, 1920);
        assert_eq!(media.height, 1080);
        // Format-level duration wins over the stream's.
        assert_eq!(media.duration_secs, 90);
    }

    #[test]
    fn test_parse_falls_back_to_stream_duration() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 1280, "height": 720, "duration": "95.0"}]
        }"#;
        let parsed: FfprobeOutput = serde_json::from_str(json).unwrap();
        let media = parse_probe_output(parsed).unwrap();
        assert_eq!(media.duration_secs, 95);
    }

    #[test]
    fn test_parse_requires_video_stream() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "10"}}"#;
        let parsed: FfprobeOutput = serde_json::from_str(json).unwrap();
        assert!(matches!(
            parse_probe_output(parsed),
            Err(ProbeError::NoVideoStream)
        ));
    }

    #[test]
    fn test_parse_rejects_zero_dimensions() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 0, "height": 0}],
            "format": {"duration": "10"}
        }"#;
        let parsed: FfprobeOutput = serde_json::from_str(json).unwrap();
        assert!(matches!(
            parse_probe_output(parsed),
            Err(ProbeError::NoVideoStream)
        ));
    }

    #[test]
    fn test_parse_requires_duration() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 480}]}"#;
        let parsed: FfprobeOutput = serde_json::from_str(json).unwrap();
        assert!(matches!(parse_probe_output(parsed), Err(ProbeError::Parse(_))));
    }
}
