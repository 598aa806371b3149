// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tracks: named, time-windowed keyframe containers.

use crate::easing::Easing;
use crate::error::ValidationError;
use crate::keyframe::{Keyframe, Properties};
use crate::ops;
use kashi_media::ValidationReport;
use serde::{Deserialize, Serialize};

/// Time tolerance used when matching keyframes by time, in seconds.
pub const DEFAULT_TIME_TOLERANCE: f64 = 0.001;

/// A named animation lane holding keyframes sorted by time.
///
/// The keyframe vector is private so the sort order is an invariant:
/// every mutation goes through [`Track::insert_keyframe`] or
/// [`Track::remove_keyframe`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier, unique within a timeline
    pub id: String,
    keyframes: Vec<Keyframe>,
    /// Start of the active window, in seconds
    pub start_time: f64,
    /// End of the active window, in seconds
    pub end_time: f64,
}

impl Track {
    /// Create an empty track spanning `start_time..end_time`.
    pub fn new(
        id: impl Into<String>,
        start_time: f64,
        end_time: f64,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyTrackId);
        }
        if end_time <= start_time {
            return Err(ValidationError::InvalidBounds {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            id,
            keyframes: Vec::new(),
            start_time,
            end_time,
        })
    }

    /// Keyframes in ascending time order.
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Whether `time` falls within the track's active window.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    /// Insert a keyframe, keeping the vector sorted.
    ///
    /// A keyframe at exactly the same time is replaced, so repeated writes
    /// to one instant behave as an update rather than a pile-up.
    pub fn insert_keyframe(&mut self, keyframe: Keyframe) {
        if let Some(existing) = self.keyframes.iter_mut().find(|k| k.time == keyframe.time) {
            *existing = keyframe;
            return;
        }
        let index = self
            .keyframes
            .partition_point(|k| k.time <= keyframe.time);
        self.keyframes.insert(index, keyframe);
    }

    /// Remove the first keyframe within `tolerance` of `time`.
    ///
    /// Returns `false` when nothing matched.
    pub fn remove_keyframe(&mut self, time: f64, tolerance: f64) -> bool {
        match self
            .keyframes
            .iter()
            .position(|k| (k.time - time).abs() <= tolerance)
        {
            Some(index) => {
                self.keyframes.remove(index);
                true
            }
            None => false,
        }
    }

    /// All keyframes within `tolerance` of `time`.
    pub fn keyframes_at(&self, time: f64, tolerance: f64) -> Vec<&Keyframe> {
        self.keyframes
            .iter()
            .filter(|k| (k.time - time).abs() <= tolerance)
            .collect()
    }

    /// Nearest keyframes at or before and strictly after `time`.
    fn surrounding(&self, time: f64) -> (Option<&Keyframe>, Option<&Keyframe>) {
        let split = self.keyframes.partition_point(|k| k.time <= time);
        let prev = split.checked_sub(1).map(|i| &self.keyframes[i]);
        let next = self.keyframes.get(split);
        (prev, next)
    }

    /// Property values at `time`, interpolated from surrounding keyframes.
    ///
    /// Before the first keyframe and after the last, the nearest keyframe's
    /// properties hold. An empty track yields an empty set.
    pub fn properties_at(&self, time: f64) -> Properties {
        match self.surrounding(time) {
            (None, None) => Properties::new(),
            (Some(prev), None) => prev.properties.clone(),
            (None, Some(next)) => next.properties.clone(),
            (Some(prev), Some(next)) => {
                let t = (time - prev.time) / (next.time - prev.time);
                ops::interpolate_between(prev, next, t, Easing::Linear)
            }
        }
    }

    /// Check the track and its keyframes for structural problems.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.id.trim().is_empty() {
            report.error("track id cannot be empty");
        }
        if self.end_time <= self.start_time {
            report.error("track end time must be greater than start time");
        }
        for (i, keyframe) in self.keyframes.iter().enumerate() {
            report.absorb(&format!("keyframe {i}"), keyframe.validate());
            if !self.contains(keyframe.time) {
                report.warn(format!(
                    "keyframe {i} at {:.3}s lies outside the track window",
                    keyframe.time
                ));
            }
        }
        for pair in self.keyframes.windows(2) {
            if (pair[1].time - pair[0].time).abs() <= DEFAULT_TIME_TOLERANCE {
                report.warn(format!(
                    "keyframes at {:.3}s and {:.3}s are closer than the time tolerance",
                    pair[0].time, pair[1].time
                ));
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PropertyValue;

    fn kf(time: f64, opacity: f64) -> Keyframe {
        let mut props = Properties::new();
        props.insert("opacity".into(), PropertyValue::Float(opacity));
        Keyframe::new(time, props)
    }

    fn track() -> Track {
        Track::new("lyric_line_1", 0.0, 10.0).unwrap()
    }

    #[test]
    fn construction_validates_id_and_window() {
        assert!(matches!(
            Track::new("  ", 0.0, 1.0),
            Err(ValidationError::EmptyTrackId)
        ));
        assert!(matches!(
            Track::new("t", 5.0, 5.0),
            Err(ValidationError::InvalidBounds { .. })
        ));
        assert!(Track::new("t", 1.0, 2.0).is_ok());
    }

    #[test]
    fn inserts_stay_sorted() {
        let mut t = track();
        t.insert_keyframe(kf(5.0, 0.5));
        t.insert_keyframe(kf(1.0, 0.1));
        t.insert_keyframe(kf(3.0, 0.3));
        let times: Vec<f64> = t.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn exact_time_insert_replaces() {
        let mut t = track();
        t.insert_keyframe(kf(2.0, 0.2));
        t.insert_keyframe(kf(2.0, 0.8));
        assert_eq!(t.keyframes().len(), 1);
        assert_eq!(
            t.keyframes()[0].properties["opacity"],
            PropertyValue::Float(0.8)
        );
    }

    #[test]
    fn removal_respects_tolerance() {
        let mut t = track();
        t.insert_keyframe(kf(2.0, 0.2));
        assert!(!t.remove_keyframe(2.5, DEFAULT_TIME_TOLERANCE));
        assert!(t.remove_keyframe(2.0005, DEFAULT_TIME_TOLERANCE));
        assert!(t.keyframes().is_empty());
    }

    #[test]
    fn keyframes_at_matches_within_tolerance() {
        let mut t = track();
        t.insert_keyframe(kf(2.0, 0.2));
        t.insert_keyframe(kf(4.0, 0.4));
        assert_eq!(t.keyframes_at(2.0004, DEFAULT_TIME_TOLERANCE).len(), 1);
        assert!(t.keyframes_at(3.0, DEFAULT_TIME_TOLERANCE).is_empty());
    }

    #[test]
    fn properties_hold_outside_the_keyframe_span() {
        let mut t = track();
        t.insert_keyframe(kf(2.0, 0.2));
        t.insert_keyframe(kf(4.0, 0.8));
        assert_eq!(t.properties_at(0.5)["opacity"], PropertyValue::Float(0.2));
        assert_eq!(t.properties_at(9.0)["opacity"], PropertyValue::Float(0.8));
    }

    #[test]
    fn properties_interpolate_between_keyframes() {
        let mut t = track();
        t.insert_keyframe(kf(2.0, 0.0));
        t.insert_keyframe(kf(4.0, 1.0));
        assert_eq!(t.properties_at(3.0)["opacity"], PropertyValue::Float(0.5));
        // Exactly on a keyframe returns its value verbatim
        assert_eq!(t.properties_at(4.0)["opacity"], PropertyValue::Float(1.0));
    }

    #[test]
    fn empty_track_yields_no_properties() {
        assert!(track().properties_at(5.0).is_empty());
    }

    #[test]
    fn validation_flags_out_of_window_and_crowded_keyframes() {
        let mut t = track();
        t.insert_keyframe(kf(11.0, 1.0));
        t.insert_keyframe(kf(3.0, 0.3));
        t.insert_keyframe(kf(3.0005, 0.4));
        let report = t.validate();
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
    }
}
