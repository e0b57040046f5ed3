//! Error types for array baking.
//!
//! Every variant is detected before the host performs any destructive
//! mutation, so a failed bake leaves the scene untouched.

use serde::{Deserialize, Serialize};

use crate::math::FrameIndex;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum BakeError {
    /// No active/target object was designated by the host.
    #[error("no source object selected")]
    MissingSource,

    /// The source carries no array-style generator.
    #[error("source object '{object}' has no array generator")]
    MissingGenerator { object: String },

    /// Instance count below one.
    #[error("array count must be at least 1 (got {count})")]
    InvalidCount { count: i64 },

    /// The array generator has no offset object configured.
    #[error("array generator on '{object}' has no offset object set")]
    MissingOffset { object: String },

    /// Base transform could not be inverted at some frame.
    #[error("base transform is not invertible at frame {frame} (determinant {determinant:e})")]
    DegenerateTransform {
        frame: FrameIndex,
        determinant: f64,
    },

    /// Frame range with start after end.
    #[error("frame range [{start}, {end}] is empty")]
    EmptyRange { start: FrameIndex, end: FrameIndex },

    /// A pre-sampled transform table does not span the requested frames.
    #[error("{table} samples do not cover frames [{start}, {end}]")]
    IncompleteSamples {
        table: String,
        start: FrameIndex,
        end: FrameIndex,
    },
}
