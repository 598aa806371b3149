// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline: playback state, track management, and waveform access.

use crate::error::ValidationError;
use crate::keyframe::{InterpolationMode, Keyframe, Properties};
use crate::ops;
use crate::track::Track;
use indexmap::IndexMap;
use kashi_media::{AudioSource, ValidationReport, VideoSource, WaveformCache, WaveformData};
use std::sync::Arc;

/// Waveform resolution used when the caller does not pick one.
pub const DEFAULT_WAVEFORM_RESOLUTION: usize = 1000;

const MIN_PLAYBACK_SPEED: f64 = 0.1;
const MAX_PLAYBACK_SPEED: f64 = 10.0;

/// Coarse playback state, derived rather than stored.
///
/// A playhead parked at the start of the window reads as `Stopped`; parked
/// anywhere else it reads as `Paused`. There is no way to be "stopped" in
/// the middle of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not playing, playhead at the window start
    #[default]
    Stopped,
    /// Not playing, playhead mid-window
    Paused,
    /// Advancing with `update`
    Playing,
}

/// The authoring timeline: media sources, tracks, and a playhead.
///
/// All mutation is synchronous and single-threaded; the host drives
/// [`Timeline::update`] from its frame loop and queries properties per
/// track afterwards.
#[derive(Debug)]
pub struct Timeline {
    video: Option<VideoSource>,
    audio: Option<AudioSource>,
    tracks: IndexMap<String, Track>,
    current_time: f64,
    playback_speed: f64,
    playing: bool,
    start_time: f64,
    end_time: f64,
    waveform: WaveformCache,
}

impl Timeline {
    /// Create an empty timeline with a zero-length window.
    pub fn new() -> Self {
        Self {
            video: None,
            audio: None,
            tracks: IndexMap::new(),
            current_time: 0.0,
            playback_speed: 1.0,
            playing: false,
            start_time: 0.0,
            end_time: 0.0,
            waveform: WaveformCache::new(),
        }
    }

    /// Create a timeline sized to a video, with an optional audio source.
    pub fn with_video(video: VideoSource, audio: Option<AudioSource>) -> Self {
        let mut timeline = Self::new();
        timeline.end_time = video.duration;
        timeline.video = Some(video);
        timeline.audio = audio;
        timeline
    }

    /// Attach (or replace) the video source, resize the window to its
    /// duration, and re-clamp the playhead.
    pub fn set_video(&mut self, video: VideoSource) {
        self.end_time = video.duration;
        self.video = Some(video);
        self.current_time = self.clamp_time(self.current_time);
    }

    /// Attach (or replace) the audio source.
    pub fn set_audio(&mut self, audio: AudioSource) {
        self.audio = Some(audio);
    }

    /// The attached video source, if any.
    pub fn video(&self) -> Option<&VideoSource> {
        self.video.as_ref()
    }

    /// The attached audio source, if any.
    pub fn audio(&self) -> Option<&AudioSource> {
        self.audio.as_ref()
    }

    fn clamp_time(&self, time: f64) -> f64 {
        time.clamp(self.start_time, self.end_time.max(self.start_time))
    }

    /// Current derived playback state.
    pub fn state(&self) -> PlaybackState {
        if self.playing {
            PlaybackState::Playing
        } else if self.current_time == self.start_time {
            PlaybackState::Stopped
        } else {
            PlaybackState::Paused
        }
    }

    /// Begin advancing the playhead on `update` calls.
    pub fn play(&mut self) {
        self.playing = true;
        tracing::debug!(time = self.current_time, "playback started");
    }

    /// Stop advancing, keeping the playhead where it is.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Stop advancing and rewind the playhead to the window start.
    pub fn stop(&mut self) {
        self.playing = false;
        self.current_time = self.start_time;
    }

    /// Move the playhead, clamped to the window. Idempotent.
    pub fn seek(&mut self, time: f64) {
        self.current_time = self.clamp_time(time);
    }

    /// Advance the playhead by wall-clock `dt` seconds scaled by the
    /// playback speed. Reaching the window end pauses playback with the
    /// playhead clamped exactly to the end.
    pub fn update(&mut self, dt: f64) {
        if !self.playing {
            return;
        }
        let next = self.current_time + dt * self.playback_speed;
        if next >= self.end_time {
            self.current_time = self.end_time;
            self.playing = false;
            tracing::debug!(time = self.current_time, "playback reached the end");
        } else {
            self.current_time = self.clamp_time(next);
        }
    }

    /// Set the playback speed, clamped to 0.1..=10.0.
    pub fn set_playback_speed(&mut self, speed: f64) {
        self.playback_speed = speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED);
    }

    /// Current playhead position in seconds.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Whether the playhead advances on `update`.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current playback speed multiplier.
    pub fn playback_speed(&self) -> f64 {
        self.playback_speed
    }

    /// Start of the playback window in seconds.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// End of the playback window in seconds.
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Window length in seconds.
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Set the playback window, re-clamping the playhead into it.
    pub fn set_window(&mut self, start: f64, end: f64) -> Result<(), ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidBounds { start, end });
        }
        self.start_time = start;
        self.end_time = end;
        self.current_time = self.clamp_time(self.current_time);
        Ok(())
    }

    /// Add a track. A track with the same id is replaced.
    pub fn add_track(&mut self, track: Track) {
        tracing::debug!(id = %track.id, "track added");
        self.tracks.insert(track.id.clone(), track);
    }

    /// Remove a track by id, returning it when present.
    pub fn remove_track(&mut self, id: &str) -> Option<Track> {
        self.tracks.swap_remove(id)
    }

    /// Look up a track by id.
    pub fn get_track(&self, id: &str) -> Option<&Track> {
        self.tracks.get(id)
    }

    /// All tracks, in insertion order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Number of tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Add a keyframe to a track.
    ///
    /// Soft-fails with `false` when the track is unknown or the time falls
    /// outside its window.
    pub fn add_keyframe(
        &mut self,
        track_id: &str,
        time: f64,
        properties: Properties,
        mode: InterpolationMode,
    ) -> bool {
        let Some(track) = self.tracks.get_mut(track_id) else {
            tracing::warn!(track_id, "add_keyframe on unknown track");
            return false;
        };
        if !track.contains(time) {
            tracing::warn!(track_id, time, "keyframe time outside the track window");
            return false;
        }
        let keyframe = match ops::create_keyframe(time, properties, mode) {
            Ok(kf) => kf,
            Err(err) => {
                tracing::warn!(track_id, %err, "keyframe rejected");
                return false;
            }
        };
        track.insert_keyframe(keyframe);
        true
    }

    /// Remove a keyframe within `tolerance` of `time` from a track;
    /// `false` when nothing matched or the track is unknown.
    pub fn remove_keyframe(&mut self, track_id: &str, time: f64, tolerance: f64) -> bool {
        match self.tracks.get_mut(track_id) {
            Some(track) => track.remove_keyframe(time, tolerance),
            None => false,
        }
    }

    /// Keyframes within `tolerance` of `time` on a track; empty when the
    /// track is unknown.
    pub fn keyframes_at(&self, track_id: &str, time: f64, tolerance: f64) -> Vec<&Keyframe> {
        self.tracks
            .get(track_id)
            .map(|track| track.keyframes_at(time, tolerance))
            .unwrap_or_default()
    }

    /// Interpolated property values for one track at `time`.
    pub fn interpolate_properties(&self, track_id: &str, time: f64) -> Properties {
        self.tracks
            .get(track_id)
            .map(|track| track.properties_at(time))
            .unwrap_or_default()
    }

    /// Insert copies of `keyframes` into a track, shifted by `offset`.
    ///
    /// Copies landing outside the track window are dropped. Returns `false`
    /// only when the track is unknown.
    pub fn paste_keyframes(&mut self, track_id: &str, keyframes: &[Keyframe], offset: f64) -> bool {
        let Some(track) = self.tracks.get_mut(track_id) else {
            tracing::warn!(track_id, "paste_keyframes on unknown track");
            return false;
        };
        let mut pasted = 0usize;
        for keyframe in ops::offset_keyframes(keyframes, offset) {
            if track.contains(keyframe.time) {
                track.insert_keyframe(keyframe);
                pasted += 1;
            }
        }
        tracing::debug!(track_id, pasted, total = keyframes.len(), "keyframes pasted");
        true
    }

    /// Tracks whose window contains `time`, with their interpolated
    /// properties, in insertion order.
    pub fn active_tracks_at(&self, time: f64) -> Vec<(&str, Properties)> {
        self.tracks
            .values()
            .filter(|track| track.contains(time))
            .map(|track| (track.id.as_str(), track.properties_at(time)))
            .collect()
    }

    /// Video frame index at `time`; 0 when no video is attached.
    pub fn frame_from_time(&self, time: f64) -> u64 {
        match &self.video {
            Some(video) if video.fps > 0.0 => (time.max(0.0) * video.fps).floor() as u64,
            _ => 0,
        }
    }

    /// Time at the start of a video frame; 0.0 when no video is attached.
    pub fn time_from_frame(&self, frame: u64) -> f64 {
        match &self.video {
            Some(video) if video.fps > 0.0 => frame as f64 / video.fps,
            _ => 0.0,
        }
    }

    /// Waveform for the attached audio, generated or fetched from cache.
    ///
    /// `None` when no audio is attached or generation fails; failures are
    /// logged, never surfaced, since a missing waveform only degrades the
    /// display.
    pub fn waveform(&mut self, resolution: usize, channel: Option<u32>) -> Option<Arc<WaveformData>> {
        let source = self.audio.as_ref()?;
        match self.waveform.generate(source, resolution, channel) {
            Ok(data) => Some(data),
            Err(err) => {
                tracing::warn!(%err, "waveform generation failed");
                None
            }
        }
    }

    /// Waveform slice between two times at the given resolution.
    pub fn waveform_segment(&mut self, start_time: f64, end_time: f64, resolution: usize) -> Vec<f32> {
        match self.waveform(resolution, None) {
            Some(data) => self.waveform.segment(&data, start_time, end_time),
            None => Vec::new(),
        }
    }

    /// Per-chunk `(min, max)` pairs at the default resolution.
    pub fn waveform_peaks(&mut self, num_peaks: usize) -> Vec<(f32, f32)> {
        match self.waveform(DEFAULT_WAVEFORM_RESOLUTION, None) {
            Some(data) => self.waveform.peaks(&data, num_peaks),
            None => Vec::new(),
        }
    }

    /// Replace the waveform cache; lets a host share a pre-warmed cache or
    /// force the synthetic generator.
    pub fn set_waveform_cache(&mut self, cache: WaveformCache) {
        self.waveform = cache;
    }

    /// The waveform cache, for introspection.
    pub fn waveform_cache(&self) -> &WaveformCache {
        &self.waveform
    }

    /// Validate the timeline, its sources, and every track.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        match &self.video {
            Some(video) => report.absorb("video", video.validate()),
            None => report.warn("no video source attached"),
        }
        if let Some(audio) = &self.audio {
            report.absorb("audio", audio.validate());
        }
        if self.end_time < self.start_time {
            report.error("timeline end time precedes its start time");
        }
        for track in self.tracks.values() {
            report.absorb(&format!("track {}", track.id), track.validate());
        }
        report
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::DEFAULT_TIME_TOLERANCE;
    use crate::value::PropertyValue;
    use std::path::PathBuf;

    fn video() -> VideoSource {
        VideoSource {
            path: PathBuf::from("performance.mp4"),
            duration: 10.0,
            fps: 30.0,
            resolution: (1920, 1080),
            codec: "h264".into(),
        }
    }

    fn timeline() -> Timeline {
        let mut tl = Timeline::with_video(video(), None);
        tl.set_waveform_cache(WaveformCache::without_decoder());
        tl
    }

    fn props(opacity: f64) -> Properties {
        let mut p = Properties::new();
        p.insert("opacity".into(), PropertyValue::Float(opacity));
        p
    }

    #[test]
    fn window_comes_from_the_video() {
        let tl = timeline();
        assert_eq!(tl.duration(), 10.0);
        assert_eq!(tl.end_time(), 10.0);
    }

    #[test]
    fn replacing_the_video_resizes_and_reclamps() {
        let mut tl = timeline();
        tl.seek(9.0);
        let mut shorter = video();
        shorter.duration = 4.0;
        tl.set_video(shorter);
        assert_eq!(tl.end_time(), 4.0);
        assert_eq!(tl.current_time(), 4.0);
    }

    #[test]
    fn missing_video_is_a_warning() {
        let mut tl = Timeline::new();
        tl.set_waveform_cache(WaveformCache::without_decoder());
        let report = tl.validate();
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.contains("video")));
    }

    #[test]
    fn state_is_derived_from_playhead_and_flag() {
        let mut tl = timeline();
        assert_eq!(tl.state(), PlaybackState::Stopped);
        tl.play();
        assert_eq!(tl.state(), PlaybackState::Playing);
        tl.update(2.0);
        tl.pause();
        assert_eq!(tl.state(), PlaybackState::Paused);
        tl.stop();
        assert_eq!(tl.state(), PlaybackState::Stopped);
        assert_eq!(tl.current_time(), 0.0);
        // Pausing at the exact start reads as stopped
        tl.play();
        tl.pause();
        assert_eq!(tl.state(), PlaybackState::Stopped);
    }

    #[test]
    fn seek_clamps_and_is_idempotent() {
        let mut tl = timeline();
        tl.seek(4.5);
        assert_eq!(tl.current_time(), 4.5);
        tl.seek(4.5);
        assert_eq!(tl.current_time(), 4.5);
        tl.seek(-3.0);
        assert_eq!(tl.current_time(), 0.0);
        tl.seek(99.0);
        assert_eq!(tl.current_time(), 10.0);
    }

    #[test]
    fn update_scales_by_speed_and_pauses_at_the_end() {
        let mut tl = timeline();
        tl.set_playback_speed(2.0);
        tl.play();
        tl.update(1.0);
        assert_eq!(tl.current_time(), 2.0);
        tl.update(100.0);
        assert_eq!(tl.current_time(), 10.0);
        assert!(!tl.is_playing());
        assert_eq!(tl.state(), PlaybackState::Paused);
        // Further updates are inert while paused
        tl.update(1.0);
        assert_eq!(tl.current_time(), 10.0);
    }

    #[test]
    fn playback_speed_is_clamped() {
        let mut tl = timeline();
        tl.set_playback_speed(0.0);
        assert_eq!(tl.playback_speed(), 0.1);
        tl.set_playback_speed(1000.0);
        assert_eq!(tl.playback_speed(), 10.0);
    }

    #[test]
    fn set_window_validates_and_reclamps() {
        let mut tl = timeline();
        tl.seek(8.0);
        assert!(tl.set_window(1.0, 5.0).is_ok());
        assert_eq!(tl.current_time(), 5.0);
        assert!(matches!(
            tl.set_window(5.0, 5.0),
            Err(ValidationError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn same_id_track_is_replaced() {
        let mut tl = timeline();
        tl.add_track(Track::new("vocals", 0.0, 4.0).unwrap());
        tl.add_track(Track::new("vocals", 0.0, 8.0).unwrap());
        assert_eq!(tl.track_count(), 1);
        assert_eq!(tl.get_track("vocals").unwrap().end_time, 8.0);
        assert!(tl.remove_track("vocals").is_some());
        assert!(tl.remove_track("vocals").is_none());
    }

    #[test]
    fn keyframe_edits_soft_fail() {
        let mut tl = timeline();
        tl.add_track(Track::new("vocals", 0.0, 5.0).unwrap());

        assert!(!tl.add_keyframe("missing", 1.0, props(0.5), InterpolationMode::Linear));
        // Outside the track window
        assert!(!tl.add_keyframe("vocals", 7.0, props(0.5), InterpolationMode::Linear));
        // Empty property set
        assert!(!tl.add_keyframe("vocals", 1.0, Properties::new(), InterpolationMode::Linear));
        assert!(tl.add_keyframe("vocals", 1.0, props(0.5), InterpolationMode::Linear));

        assert!(!tl.remove_keyframe("missing", 1.0, DEFAULT_TIME_TOLERANCE));
        assert!(!tl.remove_keyframe("vocals", 3.0, DEFAULT_TIME_TOLERANCE));
        assert!(tl.remove_keyframe("vocals", 1.0, DEFAULT_TIME_TOLERANCE));
    }

    #[test]
    fn fade_in_scenario_interpolates_as_authored() {
        let mut tl = timeline();
        tl.add_track(Track::new("line_1", 0.0, 10.0).unwrap());
        assert!(tl.add_keyframe("line_1", 1.0, props(0.0), InterpolationMode::Linear));
        assert!(tl.add_keyframe("line_1", 3.0, props(1.0), InterpolationMode::Linear));

        let mid = tl.interpolate_properties("line_1", 2.0);
        assert_eq!(mid["opacity"], PropertyValue::Float(0.5));
        // Before the first keyframe its value holds
        let before = tl.interpolate_properties("line_1", 0.5);
        assert_eq!(before["opacity"], PropertyValue::Float(0.0));
        // After the last keyframe its value holds
        let after = tl.interpolate_properties("line_1", 5.0);
        assert_eq!(after["opacity"], PropertyValue::Float(1.0));
        // Unknown tracks yield nothing
        assert!(tl.interpolate_properties("missing", 2.0).is_empty());
    }

    #[test]
    fn keyframes_at_respects_the_tolerance() {
        let mut tl = timeline();
        tl.add_track(Track::new("line_1", 0.0, 10.0).unwrap());
        tl.add_keyframe("line_1", 2.0, props(0.5), InterpolationMode::Linear);
        assert_eq!(tl.keyframes_at("line_1", 2.0005, DEFAULT_TIME_TOLERANCE).len(), 1);
        assert!(tl.keyframes_at("line_1", 2.5, DEFAULT_TIME_TOLERANCE).is_empty());
        assert_eq!(tl.keyframes_at("line_1", 2.5, 1.0).len(), 1);
        assert!(tl.keyframes_at("missing", 2.0, DEFAULT_TIME_TOLERANCE).is_empty());
    }

    #[test]
    fn paste_drops_out_of_window_copies() {
        let mut tl = timeline();
        tl.add_track(Track::new("a", 0.0, 10.0).unwrap());
        tl.add_track(Track::new("b", 0.0, 3.0).unwrap());
        tl.add_keyframe("a", 1.0, props(0.1), InterpolationMode::Linear);
        tl.add_keyframe("a", 2.0, props(0.2), InterpolationMode::Linear);

        let copied = ops::copy_keyframes(tl.get_track("a").unwrap().keyframes());
        assert!(tl.paste_keyframes("b", &copied, 1.5));
        // 1.0+1.5 = 2.5 fits, 2.0+1.5 = 3.5 does not
        assert_eq!(tl.get_track("b").unwrap().keyframes().len(), 1);
        assert_eq!(tl.get_track("b").unwrap().keyframes()[0].time, 2.5);

        assert!(!tl.paste_keyframes("missing", &copied, 0.0));
    }

    #[test]
    fn active_tracks_respect_windows_and_order() {
        let mut tl = timeline();
        tl.add_track(Track::new("intro", 0.0, 2.0).unwrap());
        tl.add_track(Track::new("verse", 1.0, 6.0).unwrap());
        tl.add_keyframe("verse", 2.0, props(0.8), InterpolationMode::Linear);

        let active = tl.active_tracks_at(1.5);
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].0, "intro");
        assert_eq!(active[1].0, "verse");
        assert_eq!(active[1].1["opacity"], PropertyValue::Float(0.8));

        let active = tl.active_tracks_at(5.0);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0, "verse");
    }

    #[test]
    fn frame_and_time_conversions() {
        let tl = timeline();
        assert_eq!(tl.frame_from_time(1.0), 30);
        assert_eq!(tl.frame_from_time(0.999), 29);
        assert_eq!(tl.frame_from_time(-1.0), 0);
        assert_eq!(tl.time_from_frame(30), 1.0);

        let empty = Timeline::new();
        assert_eq!(empty.frame_from_time(5.0), 0);
        assert_eq!(empty.time_from_frame(5), 0.0);
    }

    #[test]
    fn waveform_requires_audio() {
        let mut tl = timeline();
        assert!(tl.waveform(100, None).is_none());
        assert!(tl.waveform_segment(0.0, 5.0, 100).is_empty());
        assert!(tl.waveform_peaks(10).is_empty());
    }

    #[test]
    fn waveform_flows_through_the_cache() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::with_suffix(".wav").unwrap();
        file.write_all(b"placeholder").unwrap();

        let mut tl = timeline();
        tl.set_audio(AudioSource {
            path: file.path().to_path_buf(),
            duration: 10.0,
            sample_rate: 44_100,
            channels: 2,
            format: "wav".into(),
        });

        let first = tl.waveform(200, None).unwrap();
        let second = tl.waveform(200, None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.resolution, 200);

        let segment = tl.waveform_segment(0.0, 5.0, DEFAULT_WAVEFORM_RESOLUTION);
        assert_eq!(segment.len(), DEFAULT_WAVEFORM_RESOLUTION / 2);
        let peaks = tl.waveform_peaks(10);
        assert_eq!(peaks.len(), 10);
    }

    #[test]
    fn validate_rolls_up_sources_and_tracks() {
        let mut tl = timeline();
        tl.add_track(Track::new("line_1", 0.0, 5.0).unwrap());
        let report = tl.validate();
        // The video file does not exist on disk
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.starts_with("video:")));
    }

    #[test]
    fn end_to_end_fade_authoring_flow() {
        let mut tl = timeline();
        tl.add_track(Track::new("chorus", 0.0, 10.0).unwrap());
        tl.add_keyframe("chorus", 1.0, props(0.0), InterpolationMode::Linear);
        tl.add_keyframe("chorus", 3.0, props(1.0), InterpolationMode::Linear);

        tl.play();
        tl.update(2.0);
        assert_eq!(tl.current_time(), 2.0);
        let now = tl.interpolate_properties("chorus", tl.current_time());
        assert_eq!(now["opacity"], PropertyValue::Float(0.5));
        assert_eq!(tl.frame_from_time(tl.current_time()), 60);

        tl.update(100.0);
        assert_eq!(tl.state(), PlaybackState::Paused);
        assert_eq!(tl.current_time(), 10.0);
        tl.stop();
        assert_eq!(tl.state(), PlaybackState::Stopped);
    }
}
