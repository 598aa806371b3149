// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property values and shape-dispatched interpolation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A keyframeable property value.
///
/// The closed set of shapes the engine animates: scalars, ordered tuples
/// (colors, positions), and nested maps. `Int` and `Float` are distinct so
/// integer properties survive interpolation and serialization as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Real number
    Float(f64),
    /// Integer; interpolation rounds to the nearest integer
    Int(i64),
    /// Boolean; interpolated stepwise
    Bool(bool),
    /// Text; interpolated stepwise
    Text(String),
    /// Ordered fixed-length tuple of mixed values (e.g. an RGBA color)
    Tuple(Vec<PropertyValue>),
    /// Nested mapping of named values
    Map(IndexMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Blend toward `other` by factor `t`.
    ///
    /// Dispatch order: numeric, equal-length tuple (element-wise), map
    /// (recursive over the key union), then stepwise for booleans, text,
    /// and any mismatched pair. Exactly `t == 0` returns `self` verbatim
    /// and exactly `t == 1` returns `other` verbatim, making keyframe
    /// endpoints exact; any other factor blends, and factors outside [0, 1]
    /// extrapolate (easing curves such as elastic deliberately overshoot).
    pub fn interpolate(&self, other: &PropertyValue, t: f64) -> PropertyValue {
        if t == 0.0 {
            return self.clone();
        }
        if t == 1.0 {
            return other.clone();
        }

        use PropertyValue::{Float, Int, Map, Tuple};
        match (self, other) {
            // Delta in f64: the i64 difference can overflow for extremes
            (Int(a), Int(b)) => Int((*a as f64 + (*b as f64 - *a as f64) * t).round() as i64),
            (Float(a), Float(b)) => Float(a + (b - a) * t),
            (Int(a), Float(b)) => Float(*a as f64 + (b - *a as f64) * t),
            (Float(a), Int(b)) => Float(a + (*b as f64 - a) * t),
            (Tuple(a), Tuple(b)) if a.len() == b.len() => Tuple(
                a.iter()
                    .zip(b.iter())
                    .map(|(va, vb)| va.interpolate(vb, t))
                    .collect(),
            ),
            (Map(a), Map(b)) => {
                let mut merged = IndexMap::with_capacity(a.len().max(b.len()));
                for (key, va) in a {
                    let value = match b.get(key) {
                        Some(vb) => va.interpolate(vb, t),
                        None => va.clone(),
                    };
                    merged.insert(key.clone(), value);
                }
                for (key, vb) in b {
                    if !a.contains_key(key) {
                        merged.insert(key.clone(), vb.clone());
                    }
                }
                Map(merged)
            }
            _ => self.step(other, t),
        }
    }

    /// Stepwise blend: `other` from the halfway point on.
    fn step(&self, other: &PropertyValue, t: f64) -> PropertyValue {
        if t >= 0.5 {
            other.clone()
        } else {
            self.clone()
        }
    }

    /// Numeric view of this value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer view of this value, if it is an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean view of this value, if it is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of this value, if it is `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}
