// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe-driven timeline engine for karaoke authoring.
//!
//! This crate is the temporal core of the authoring tool:
//! - Typed property values with shape-dispatched interpolation
//! - An easing curve library
//! - Keyframes, keyframe operations, and time-bounded tracks
//! - A playback state machine synchronized to a video frame rate
//! - On-demand audio waveform queries backed by [`kashi_media`]
//!
//! ## Architecture
//!
//! The timeline owns the tracks and the waveform cache; everything else is
//! value-like. Keyframe operations return new keyframes, and the only
//! mutable keyframe storage is each track's sorted vector, edited through
//! the timeline's `add_keyframe`/`remove_keyframe`.

pub mod easing;
pub mod error;
pub mod keyframe;
pub mod ops;
pub mod timeline;
pub mod track;
pub mod value;

pub use easing::{cubic_bezier, Easing};
pub use error::ValidationError;
pub use keyframe::{InterpolationMode, Keyframe, Properties};
pub use timeline::{PlaybackState, Timeline, DEFAULT_WAVEFORM_RESOLUTION};
pub use track::{Track, DEFAULT_TIME_TOLERANCE};
pub use value::PropertyValue;

pub use kashi_media::{
    AudioSource, ValidationReport, VideoSource, WaveformCache, WaveformData,
};
