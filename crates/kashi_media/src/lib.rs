// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media support for the Kashi timeline engine.
//!
//! This crate provides the boundary between the timeline engine and the
//! media files it synchronizes against:
//! - Audio/video source descriptions with structural validation
//! - Metadata probing via the `ffprobe` CLI, degrading to defaults when the
//!   tool is unavailable
//! - Waveform generation and caching for timing visualization, with an
//!   ffmpeg decode path and a synthetic fallback
//!
//! Nothing here touches a rendering or playback API; the crate only
//! describes media and summarizes audio amplitude.

pub mod probe;
pub mod source;
pub mod waveform;

pub use probe::{audio_source_for, probe_media, video_source_for, MediaInfo, ProbeError};
pub use source::{AudioSource, ValidationReport, VideoSource};
pub use waveform::{CacheInfo, WaveformCache, WaveformData, WaveformError};
