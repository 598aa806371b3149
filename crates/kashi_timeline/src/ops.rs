// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe operations: creation, copying, retiming, and interpolation.
//!
//! Every function here is value-semantic: inputs are never mutated and the
//! results are new keyframes. The only mutable keyframe storage in the
//! engine is a track's sorted vector, edited through the timeline.

use crate::easing::{cubic_bezier, Easing};
use crate::error::ValidationError;
use crate::keyframe::{InterpolationMode, Keyframe, Properties};

/// Control points used for [`InterpolationMode::Bezier`] blends.
const BEZIER_CONTROL: (f64, f64) = (0.25, 0.75);

/// Create a keyframe, rejecting malformed input.
pub fn create_keyframe(
    time: f64,
    properties: Properties,
    mode: InterpolationMode,
) -> Result<Keyframe, ValidationError> {
    if time < 0.0 {
        return Err(ValidationError::NegativeTime(time));
    }
    if properties.is_empty() {
        return Err(ValidationError::EmptyProperties);
    }
    Ok(Keyframe {
        time,
        properties,
        interpolation: mode,
    })
}

/// Interpolate the property union of two keyframes at blend factor `t`.
///
/// `t` is clamped to [0, 1], reshaped by `easing`, then by the *second*
/// keyframe's interpolation mode: `Step` collapses everything below 1.0 to
/// 0.0, `Bezier` passes the eased value through [`cubic_bezier`]. Keys
/// present on only one side pass through unchanged. Coincident keyframe
/// times return the second keyframe's properties verbatim.
pub fn interpolate_between(
    first: &Keyframe,
    second: &Keyframe,
    t: f64,
    easing: Easing,
) -> Properties {
    if first.time == second.time {
        return second.properties.clone();
    }

    let t = t.clamp(0.0, 1.0);
    let mut eased = easing.apply(t);
    match second.interpolation {
        InterpolationMode::Linear => {}
        InterpolationMode::Step => eased = if eased < 1.0 { 0.0 } else { 1.0 },
        InterpolationMode::Bezier => {
            eased = cubic_bezier(eased, BEZIER_CONTROL.0, BEZIER_CONTROL.1);
        }
    }

    let mut result = Properties::with_capacity(first.properties.len().max(second.properties.len()));
    for (key, v1) in &first.properties {
        let value = match second.properties.get(key) {
            Some(v2) => v1.interpolate(v2, eased),
            None => v1.clone(),
        };
        result.insert(key.clone(), value);
    }
    for (key, v2) in &second.properties {
        if !first.properties.contains_key(key) {
            result.insert(key.clone(), v2.clone());
        }
    }
    result
}

/// Deep-copy keyframes; mutating the copies never affects the sources.
pub fn copy_keyframes(keyframes: &[Keyframe]) -> Vec<Keyframe> {
    keyframes.to_vec()
}

/// Copies with `delta` added to each time, floored at zero.
pub fn offset_keyframes(keyframes: &[Keyframe], delta: f64) -> Vec<Keyframe> {
    keyframes
        .iter()
        .map(|kf| {
            let mut kf = kf.clone();
            kf.time = (kf.time + delta).max(0.0);
            kf
        })
        .collect()
}

/// Copies with times scaled by `factor` around `pivot`, floored at zero.
pub fn scale_keyframes(
    keyframes: &[Keyframe],
    factor: f64,
    pivot: f64,
) -> Result<Vec<Keyframe>, ValidationError> {
    if factor <= 0.0 {
        return Err(ValidationError::NonPositiveScale(factor));
    }
    Ok(keyframes
        .iter()
        .map(|kf| {
            let mut kf = kf.clone();
            kf.time = (pivot + (kf.time - pivot) * factor).max(0.0);
            kf
        })
        .collect())
}

/// Keyframes within the inclusive range; swapped endpoints are reordered.
pub fn find_in_range(keyframes: &[Keyframe], start: f64, end: f64) -> Vec<&Keyframe> {
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    keyframes
        .iter()
        .filter(|kf| kf.time >= start && kf.time <= end)
        .collect()
}

/// Earliest and latest keyframe times, or `(0.0, 0.0)` when empty.
pub fn bounds(keyframes: &[Keyframe]) -> (f64, f64) {
    let mut iter = keyframes.iter();
    let Some(first) = iter.next() else {
        return (0.0, 0.0);
    };
    iter.fold((first.time, first.time), |(lo, hi), kf| {
        (lo.min(kf.time), hi.max(kf.time))
    })
}

/// Stable ascending sort by time.
pub fn sort_keyframes(keyframes: &[Keyframe]) -> Vec<Keyframe> {
    let mut sorted = keyframes.to_vec();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
    sorted
}

/// Merge keyframes closer together than `tolerance`, keeping the later
/// entry's properties within each merge cluster (last write wins).
pub fn remove_duplicates(keyframes: &[Keyframe], tolerance: f64) -> Vec<Keyframe> {
    let sorted = sort_keyframes(keyframes);
    let mut unique: Vec<Keyframe> = Vec::with_capacity(sorted.len());
    for kf in sorted {
        match unique.last_mut() {
            Some(last) if kf.time - last.time <= tolerance => *last = kf,
            _ => unique.push(kf),
        }
    }
    unique
}
