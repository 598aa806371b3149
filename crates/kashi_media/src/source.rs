// SPDX-License-Identifier: MIT OR Apache-2.0
//! Audio and video source descriptions.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of a structural validation pass.
///
/// Errors make the subject unusable; warnings are advisory and never block
/// an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Hard errors; any entry makes the subject invalid
    pub errors: Vec<String>,
    /// Advisory findings that do not prevent operation
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// True when no errors were recorded
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record a hard error
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Record an advisory warning
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold another report into this one, prefixing each entry
    pub fn absorb(&mut self, prefix: &str, other: ValidationReport) {
        self.errors
            .extend(other.errors.into_iter().map(|e| format!("{prefix}: {e}")));
        self.warnings
            .extend(other.warnings.into_iter().map(|w| format!("{prefix}: {w}")));
    }
}

/// An audio file with the metadata the timeline needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSource {
    /// Path to the audio file
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    /// Source sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u32,
    /// Container/codec short name (e.g. "wav", "mp3")
    pub format: String,
}

const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "aac", "flac", "ogg"];

impl AudioSource {
    /// Validate the source description.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        check_path(&mut report, &self.path, "audio", &AUDIO_EXTENSIONS);

        if self.duration <= 0.0 {
            report.error("audio duration must be positive");
        }
        if self.sample_rate == 0 {
            report.error("sample rate must be positive");
        } else if self.sample_rate < 8_000 {
            report.warn("low sample rate detected (<8kHz)");
        }
        if self.channels == 0 {
            report.error("channel count must be positive");
        } else if self.channels > 8 {
            report.warn("high channel count detected (>8)");
        }

        report
    }
}

/// A video file with the metadata the timeline needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Path to the video file
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    /// Frames per second
    pub fps: f64,
    /// Frame size as (width, height)
    pub resolution: (u32, u32),
    /// Codec short name (e.g. "h264")
    pub codec: String,
}

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];

impl VideoSource {
    /// Validate the source description.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        check_path(&mut report, &self.path, "video", &VIDEO_EXTENSIONS);

        if self.duration <= 0.0 {
            report.error("video duration must be positive");
        }
        if self.fps <= 0.0 {
            report.error("video fps must be positive");
        } else if self.fps > 120.0 {
            report.warn("very high fps detected (>120)");
        }
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            report.error("resolution dimensions must be positive");
        }
        if self.codec.is_empty() {
            report.warn("no codec information available");
        }

        report
    }
}

fn check_path(report: &mut ValidationReport, path: &Path, kind: &str, known: &[&str]) {
    if path.as_os_str().is_empty() {
        report.error(format!("{kind} path cannot be empty"));
    } else if !path.exists() {
        report.error(format!("{kind} file does not exist: {}", path.display()));
    } else {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !known.contains(&ext.as_str()) {
            report.warn(format!("{kind} format .{ext} may not be supported"));
        }
    }
}
