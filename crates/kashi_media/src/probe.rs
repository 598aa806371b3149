// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media metadata probing via the `ffprobe` CLI.
//!
//! Probing is a best-effort boundary: when `ffprobe` is missing or fails,
//! the `*_source_for` constructors fall back to default metadata instead of
//! failing the caller. Downstream validation then reports the defaults as
//! invalid where it matters (e.g. a zero duration).

use crate::source::{AudioSource, VideoSource};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

/// Metadata extracted from a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Audio sample rate in Hz (0 when no audio stream)
    pub sample_rate: u32,
    /// Audio channel count (0 when no audio stream)
    pub channels: u32,
    /// Video frame rate (0 when no video stream)
    pub fps: f64,
    /// Video frame size (0x0 when no video stream)
    pub resolution: (u32, u32),
    /// Codec short name of the primary stream
    pub codec: String,
}

/// Error probing a media file.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// ffprobe could not be spawned
    #[error("ffprobe unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    /// ffprobe ran but reported a failure
    #[error("ffprobe failed: {0}")]
    Failed(String),

    /// ffprobe output could not be parsed
    #[error("unreadable ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

/// Probe a media file for its stream metadata.
pub fn probe_media(path: &Path) -> Result<MediaInfo, ProbeError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::Failed(
            stderr.lines().last().unwrap_or("unknown error").to_string(),
        ));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let mut info = MediaInfo {
        duration,
        sample_rate: 0,
        channels: 0,
        fps: 0.0,
        resolution: (0, 0),
        codec: String::new(),
    };

    for stream in &parsed.streams {
        match stream.codec_type.as_deref() {
            Some("audio") => {
                info.sample_rate = stream
                    .sample_rate
                    .as_deref()
                    .and_then(|r| r.parse().ok())
                    .unwrap_or(0);
                info.channels = stream.channels.unwrap_or(0);
                if info.codec.is_empty() {
                    info.codec = stream.codec_name.clone().unwrap_or_default();
                }
            }
            Some("video") => {
                info.resolution = (stream.width.unwrap_or(0), stream.height.unwrap_or(0));
                info.fps = stream
                    .avg_frame_rate
                    .as_deref()
                    .and_then(parse_frame_rate)
                    .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
                    .unwrap_or(0.0);
                // A video stream's codec describes the file better than audio's
                info.codec = stream.codec_name.clone().unwrap_or_default();
            }
            _ => {}
        }
    }

    Ok(info)
}

/// Parse an ffprobe rational frame rate such as "30000/1001".
fn parse_frame_rate(raw: &str) -> Option<f64> {
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => raw.parse().ok(),
    }
}

/// Build an [`AudioSource`] for a path, probing metadata when possible.
///
/// Falls back to default metadata (zero duration, 44.1kHz stereo) when
/// probing fails; validation of the returned source surfaces the gap.
pub fn audio_source_for(path: &Path) -> AudioSource {
    let format = extension_of(path);
    match probe_media(path) {
        Ok(info) => AudioSource {
            path: path.to_path_buf(),
            duration: info.duration,
            sample_rate: if info.sample_rate > 0 { info.sample_rate } else { 44_100 },
            channels: if info.channels > 0 { info.channels } else { 2 },
            format: if info.codec.is_empty() { format } else { info.codec },
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "audio probe failed, using defaults");
            AudioSource {
                path: path.to_path_buf(),
                duration: 0.0,
                sample_rate: 44_100,
                channels: 2,
                format,
            }
        }
    }
}

/// Build a [`VideoSource`] for a path, probing metadata when possible.
pub fn video_source_for(path: &Path) -> VideoSource {
    match probe_media(path) {
        Ok(info) => VideoSource {
            path: path.to_path_buf(),
            duration: info.duration,
            fps: info.fps,
            resolution: info.resolution,
            codec: info.codec,
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "video probe failed, using defaults");
            VideoSource {
                path: path.to_path_buf(),
                duration: 0.0,
                fps: 0.0,
                resolution: (0, 0),
                codec: String::new(),
            }
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
