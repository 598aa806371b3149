// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for timeline operations.

use thiserror::Error;

/// Malformed input to a constructor or parameter-bearing operation.
///
/// Raised synchronously at the offending call; operations that merely miss
/// a target (unknown track id, no keyframe within tolerance) soft-fail with
/// a `bool`/`Option` instead, so an interactive host is never interrupted
/// by a routine "not found".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Keyframe time below zero
    #[error("keyframe time cannot be negative (got {0})")]
    NegativeTime(f64),

    /// Keyframe created without any properties
    #[error("keyframe must have at least one property")]
    EmptyProperties,

    /// Time scale factor of zero or less
    #[error("time scale factor must be positive (got {0})")]
    NonPositiveScale(f64),

    /// Track window with end at or before start
    #[error("track end time must be greater than start time (start {start}, end {end})")]
    InvalidBounds {
        /// Requested window start
        start: f64,
        /// Requested window end
        end: f64,
    },

    /// Track id empty or whitespace
    #[error("track id cannot be empty")]
    EmptyTrackId,
}
