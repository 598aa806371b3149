// SPDX-License-Identifier: MIT OR Apache-2.0
//! Audio waveform generation and caching for timeline visualization.
//!
//! Waveforms are produced on demand and cached by
//! `(path, resolution, channel, modification time)`. A cache hit returns a
//! clone of the same [`Arc`], so callers may compare identity to skip
//! redundant redraws. Entries are immutable once produced; `segment`,
//! `resample`, and `peaks` always return new buffers.
//!
//! Decoding shells out to the ffmpeg CLI and pipes raw mono f32 samples.
//! When ffmpeg is unavailable or fails, generation degrades to a synthetic
//! waveform with a plausible envelope and frequency structure so the host
//! UI still has something to draw.

use crate::source::AudioSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

/// Fixed-resolution amplitude summary of an audio signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformData {
    /// Amplitude values normalized to [-1, 1]
    pub samples: Vec<f32>,
    /// Samples per second of the waveform itself (`resolution / duration`)
    pub sample_rate: f64,
    /// Total duration in seconds
    pub duration: f64,
    /// Waveform channel count (always 1; source channels are mixed down)
    pub channels: u32,
    /// Number of samples in the waveform array
    pub resolution: usize,
}

/// Error generating a waveform.
#[derive(Debug, thiserror::Error)]
pub enum WaveformError {
    /// The audio source failed its own validation
    #[error("invalid audio source: {0}")]
    InvalidSource(String),

    /// A zero resolution cannot describe a waveform
    #[error("waveform resolution must be positive")]
    ZeroResolution,
}

/// Cache statistics for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInfo {
    /// Number of cached waveforms
    pub entries: usize,
    /// Total sample count across all cached waveforms
    pub total_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    resolution: usize,
    channel: Option<u32>,
    mtime_ns: u128,
}

impl CacheKey {
    fn for_source(source: &AudioSource, resolution: usize, channel: Option<u32>) -> Self {
        Self {
            path: source.path.clone(),
            resolution,
            channel,
            mtime_ns: modification_time(&source.path),
        }
    }
}

/// Generates and caches waveform data for audio sources.
///
/// Owned by a timeline instance, never process-global, so independent
/// timelines cannot cross-contaminate.
#[derive(Debug)]
pub struct WaveformCache {
    entries: HashMap<CacheKey, Arc<WaveformData>>,
    decoder_available: bool,
}

impl WaveformCache {
    /// Create a cache, probing once for an ffmpeg decoder.
    pub fn new() -> Self {
        let decoder_available = ffmpeg_available();
        if !decoder_available {
            tracing::warn!("ffmpeg not available, waveforms will be synthetic");
        }
        Self {
            entries: HashMap::new(),
            decoder_available,
        }
    }

    /// Create a cache that always uses the synthetic generator.
    ///
    /// Useful for headless environments and tests.
    pub fn without_decoder() -> Self {
        Self {
            entries: HashMap::new(),
            decoder_available: false,
        }
    }

    /// True when an ffmpeg decoder was found at construction time.
    pub fn decoder_available(&self) -> bool {
        self.decoder_available
    }

    /// Produce (or fetch from cache) a waveform for an audio source.
    ///
    /// Identical `(path, resolution, channel)` with an unchanged file
    /// modification time returns the same shared allocation.
    pub fn generate(
        &mut self,
        source: &AudioSource,
        resolution: usize,
        channel: Option<u32>,
    ) -> Result<Arc<WaveformData>, WaveformError> {
        let report = source.validate();
        if !report.is_valid() {
            return Err(WaveformError::InvalidSource(report.errors.join("; ")));
        }
        if resolution == 0 {
            return Err(WaveformError::ZeroResolution);
        }

        let key = CacheKey::for_source(source, resolution, channel);
        if let Some(hit) = self.entries.get(&key) {
            tracing::debug!(path = %source.path.display(), resolution, "waveform cache hit");
            return Ok(Arc::clone(hit));
        }

        let samples = if self.decoder_available {
            self.decode_and_downsample(source, resolution, channel)
        } else {
            None
        };
        let samples = samples.unwrap_or_else(|| {
            tracing::warn!(
                path = %source.path.display(),
                "waveform decode unavailable, generating synthetic waveform"
            );
            synthetic_waveform(source.duration, resolution)
        });

        let data = Arc::new(WaveformData {
            samples,
            sample_rate: resolution as f64 / source.duration,
            duration: source.duration,
            channels: 1,
            resolution,
        });
        self.entries.insert(key, Arc::clone(&data));
        Ok(data)
    }

    /// Slice a waveform between two times, clamped to valid bounds.
    pub fn segment(&self, data: &WaveformData, start_time: f64, end_time: f64) -> Vec<f32> {
        let len = data.samples.len() as i64;
        let start = ((start_time * data.sample_rate).round() as i64).clamp(0, len);
        let end = ((end_time * data.sample_rate).round() as i64).clamp(start, len);
        data.samples[start as usize..end as usize].to_vec()
    }

    /// Resample a waveform to a different resolution by linear interpolation.
    pub fn resample(&self, data: &WaveformData, new_resolution: usize) -> WaveformData {
        if new_resolution == data.resolution {
            return data.clone();
        }

        let len = data.samples.len();
        let samples = if len == 0 {
            vec![0.0; new_resolution]
        } else if len == 1 || new_resolution == 1 {
            vec![data.samples[0]; new_resolution]
        } else {
            (0..new_resolution)
                .map(|i| {
                    let pos = i as f64 * (len - 1) as f64 / (new_resolution - 1) as f64;
                    let lo = pos.floor() as usize;
                    let hi = (lo + 1).min(len - 1);
                    let frac = pos - lo as f64;
                    (f64::from(data.samples[lo]) * (1.0 - frac)
                        + f64::from(data.samples[hi]) * frac) as f32
                })
                .collect()
        };

        WaveformData {
            samples,
            sample_rate: new_resolution as f64 / data.duration,
            duration: data.duration,
            channels: data.channels,
            resolution: new_resolution,
        }
    }

    /// Partition samples into `num_peaks` chunks and return one
    /// `(min, max)` pair per chunk. Empty chunks yield `(0.0, 0.0)`.
    pub fn peaks(&self, data: &WaveformData, num_peaks: usize) -> Vec<(f32, f32)> {
        if num_peaks == 0 {
            return Vec::new();
        }
        let len = data.samples.len();
        let per_peak = len / num_peaks;
        (0..num_peaks)
            .map(|i| {
                let start = (i * per_peak).min(len);
                let end = (start + per_peak).min(len);
                let chunk = &data.samples[start..end];
                if chunk.is_empty() {
                    (0.0, 0.0)
                } else {
                    chunk
                        .iter()
                        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), s| {
                            (lo.min(*s), hi.max(*s))
                        })
                }
            })
            .collect()
    }

    /// Drop every cached waveform.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Count cached entries and their total sample footprint.
    pub fn cache_info(&self) -> CacheInfo {
        CacheInfo {
            entries: self.entries.len(),
            total_samples: self.entries.values().map(|d| d.samples.len()).sum(),
        }
    }

    fn decode_and_downsample(
        &self,
        source: &AudioSource,
        resolution: usize,
        channel: Option<u32>,
    ) -> Option<Vec<f32>> {
        let raw = decode_mono_f32(source, channel)?;
        let mut wave = downsample(&raw, resolution);
        peak_normalize(&mut wave);
        Some(wave)
    }
}

impl Default for WaveformCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipe raw mono f32le samples out of ffmpeg.
fn decode_mono_f32(source: &AudioSource, channel: Option<u32>) -> Option<Vec<f32>> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i")
        .arg(&source.path)
        .args(["-vn", "-acodec", "pcm_f32le", "-ar", "44100"]);
    match channel {
        Some(ch) if source.channels > 1 => {
            cmd.args(["-af", &format!("pan=mono|c0=c{ch}")]);
        }
        _ => {
            cmd.args(["-ac", "1"]);
        }
    }
    cmd.args(["-f", "f32le", "pipe:1"]);

    let output = match cmd.output() {
        Ok(out) => out,
        Err(err) => {
            tracing::warn!(%err, "ffmpeg spawn failed");
            return None;
        }
    };
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(
            path = %source.path.display(),
            error = stderr.lines().last().unwrap_or(""),
            "ffmpeg decode failed"
        );
        return None;
    }

    let samples: Vec<f32> = output
        .stdout
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]).clamp(-1.0, 1.0))
        .collect();
    if samples.is_empty() {
        None
    } else {
        Some(samples)
    }
}

/// Reduce decoded samples to one amplitude per output point: RMS magnitude
/// signed by the chunk mean. Sources shorter than the resolution are
/// zero-padded instead.
fn downsample(samples: &[f32], resolution: usize) -> Vec<f32> {
    if samples.len() <= resolution {
        let mut wave = vec![0.0; resolution];
        wave[..samples.len()].copy_from_slice(samples);
        return wave;
    }

    let per_point = samples.len() / resolution;
    (0..resolution)
        .map(|i| {
            let start = i * per_point;
            let end = (start + per_point).min(samples.len());
            let chunk = &samples[start..end];
            let inv_len = 1.0 / chunk.len() as f64;
            let mean_square = chunk
                .iter()
                .map(|s| f64::from(*s) * f64::from(*s))
                .sum::<f64>()
                * inv_len;
            let mean = chunk.iter().map(|s| f64::from(*s)).sum::<f64>() * inv_len;
            let rms = mean_square.sqrt();
            // rms is zero for silent chunks, so the sign of a zero mean is moot
            (rms * mean.signum()) as f32
        })
        .collect()
}

/// Scale so the maximum absolute amplitude is 1.0; silence stays silent.
fn peak_normalize(wave: &mut [f32]) {
    let max = wave.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if max > 0.0 {
        for s in wave.iter_mut() {
            *s /= max;
        }
    }
}

const SYNTHETIC_COMPONENTS: [(f64, f64); 4] =
    [(220.0, 0.4), (440.0, 0.3), (880.0, 0.2), (1760.0, 0.1)];

/// Build a plausible stand-in waveform: a weighted sum of four musical
/// partials under a fade-in/out envelope, lightly jittered and smoothed.
/// The jitter source is seeded from the resolution, keeping the output
/// reproducible for a given request.
fn synthetic_waveform(duration: f64, resolution: usize) -> Vec<f32> {
    let time_per_sample = duration / resolution as f64;
    let fade = (duration * 0.1).min(2.0);
    let mut jitter = XorShift::new(resolution as u64);

    let mut wave: Vec<f64> = (0..resolution)
        .map(|i| {
            let t = i as f64 * time_per_sample;
            let mut sample = 0.0;
            for (freq, amp) in SYNTHETIC_COMPONENTS {
                sample += amp * (TAU * freq * t).sin();
            }
            let envelope = if fade > 0.0 && t < fade {
                t / fade
            } else if fade > 0.0 && t > duration - fade {
                (duration - t) / fade
            } else {
                1.0
            };
            (sample * envelope + jitter.amplitude()) * 0.7
        })
        .collect();

    // 3-tap box smoothing over the interior, sequential in place
    for i in 1..resolution.saturating_sub(1) {
        wave[i] = 0.25 * wave[i - 1] + 0.5 * wave[i] + 0.25 * wave[i + 1];
    }

    let mut out: Vec<f32> = wave.into_iter().map(|v| v as f32).collect();
    peak_normalize(&mut out);
    out
}

/// Minimal xorshift generator for synthetic jitter. Not a statistics-grade
/// source; it only has to roughen the fake waveform a little.
struct XorShift(u64);

impl XorShift {
    fn new(seed: u64) -> Self {
        Self(seed | 1)
    }

    /// Uniform jitter in [-0.05, 0.05].
    fn amplitude(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        let unit = (self.0 >> 11) as f64 / (1u64 << 53) as f64;
        (unit - 0.5) * 0.1
    }
}

fn modification_time(path: &Path) -> u128 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos())
}

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}
