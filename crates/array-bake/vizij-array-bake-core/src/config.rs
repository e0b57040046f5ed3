//! Bake configuration.

use serde::{Deserialize, Serialize};

use crate::error::BakeError;
use crate::math::{FrameIndex, FrameRange};
use crate::rotation::RotationPolicy;

/// Relative singularity bound: a base transform is non-invertible when
/// `|det| <= eps * |c0| * |c1| * |c2|` over its basis columns.
pub const DEFAULT_SINGULAR_EPSILON: f64 = 1e-12;

/// Construction-time options for a [`crate::BakingPipeline`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeOptions {
    /// How rotation streams are keyed and filtered.
    pub rotation: RotationPolicy,
    /// Determinant threshold for base transform inversion.
    pub singular_epsilon: f64,
}

impl Default for BakeOptions {
    fn default() -> Self {
        Self {
            rotation: RotationPolicy::default(),
            singular_epsilon: DEFAULT_SINGULAR_EPSILON,
        }
    }
}

impl BakeOptions {
    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_singular_epsilon(mut self, eps: f64) -> Self {
        self.singular_epsilon = eps;
        self
    }

    /// Epsilon actually used; negative or non-finite values fall back to the default.
    pub fn effective_singular_epsilon(&self) -> f64 {
        if self.singular_epsilon.is_finite() && self.singular_epsilon >= 0.0 {
            self.singular_epsilon
        } else {
            DEFAULT_SINGULAR_EPSILON
        }
    }
}

/// Full description of one bake: frame window, instance count and options.
/// Missing JSON fields take the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    /// First frame (inclusive).
    pub frame_start: FrameIndex,
    /// Last frame (inclusive).
    pub frame_end: FrameIndex,
    /// Array instance count as reported by the host; validated to be >= 1.
    pub count: i64,
    pub rotation: RotationPolicy,
    pub singular_epsilon: f64,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            frame_start: 1,
            frame_end: 250,
            count: 2,
            rotation: RotationPolicy::default(),
            singular_epsilon: DEFAULT_SINGULAR_EPSILON,
        }
    }
}

impl BakeConfig {
    pub fn options(&self) -> BakeOptions {
        BakeOptions {
            rotation: self.rotation,
            singular_epsilon: self.singular_epsilon,
        }
    }

    /// Frame window as given (not validated).
    pub fn range(&self) -> FrameRange {
        FrameRange {
            start: self.frame_start,
            end: self.frame_end,
        }
    }

    /// Check count then range; returns the usable count and range.
    pub fn validate(&self) -> Result<(usize, FrameRange), BakeError> {
        let count = validate_count(self.count)?;
        let range = FrameRange::new(self.frame_start, self.frame_end)?;
        Ok((count, range))
    }
}

/// Convert a host-reported count into an instance count (must be >= 1).
pub fn validate_count(count: i64) -> Result<usize, BakeError> {
    if count < 1 {
        return Err(BakeError::InvalidCount { count });
    }
    usize::try_from(count).map_err(|_| BakeError::InvalidCount { count })
}
