// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions.

use crate::value::PropertyValue;
use indexmap::IndexMap;
use kashi_media::ValidationReport;
use serde::{Deserialize, Serialize};

/// Named property values carried by a keyframe.
pub type Properties = IndexMap<String, PropertyValue>;

/// Interpolation mode between a keyframe and its predecessor.
///
/// The tag lives on the *later* of the two keyframes being blended and
/// reshapes the blend factor before property interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterpolationMode {
    /// Pass the (eased) blend factor through unchanged
    #[default]
    Linear,
    /// Hold the earlier keyframe's values until the exact end of the span
    Step,
    /// Reshape through a cubic bezier with fixed control points
    Bezier,
}

/// A time-stamped bundle of property target values.
///
/// Keyframes are value-like: duplicating one across tracks copies it, and
/// the operations in [`crate::ops`] always return new keyframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds, non-negative
    pub time: f64,
    /// Property values reached at `time`
    pub properties: Properties,
    /// How to blend from the previous keyframe into this one
    pub interpolation: InterpolationMode,
}

impl Keyframe {
    /// Create a keyframe with linear interpolation.
    pub fn new(time: f64, properties: Properties) -> Self {
        Self {
            time,
            properties,
            interpolation: InterpolationMode::Linear,
        }
    }

    /// Set the interpolation mode.
    pub fn with_interpolation(mut self, mode: InterpolationMode) -> Self {
        self.interpolation = mode;
        self
    }

    /// Check structural invariants.
    ///
    /// A negative time is an error; an empty property set is only a
    /// warning, since a placeholder keyframe is still usable.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.time < 0.0 {
            report.error("keyframe time cannot be negative");
        }
        if self.properties.is_empty() {
            report.warn("keyframe has no properties");
        }
        report
    }
}
