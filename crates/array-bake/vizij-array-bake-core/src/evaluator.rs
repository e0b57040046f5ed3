//! World-transform evaluators.
//!
//! An evaluator maps an explicit frame to a world transform. Hosts that can
//! only answer "what is the transform now" step their scene themselves and
//! record the answers into a [`SampledEvaluator`].

use serde::{Deserialize, Serialize};

use crate::error::BakeError;
use crate::math::{AffineTransform, FrameIndex, FrameRange};

/// Pure function of the frame; calling twice with the same frame must agree.
pub trait FrameEvaluator {
    fn evaluate(&self, frame: FrameIndex) -> AffineTransform;
}

impl<F> FrameEvaluator for F
where
    F: Fn(FrameIndex) -> AffineTransform,
{
    #[inline]
    fn evaluate(&self, frame: FrameIndex) -> AffineTransform {
        self(frame)
    }
}

/// Table of pre-evaluated transforms for consecutive frames starting at `start`.
///
/// Frames outside the table hold the nearest stored transform; an empty table
/// evaluates to identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SampledEvaluator {
    pub start: FrameIndex,
    pub frames: Vec<AffineTransform>,
}

impl SampledEvaluator {
    pub fn new(start: FrameIndex, frames: Vec<AffineTransform>) -> Self {
        Self { start, frames }
    }

    /// Record `range` by calling `step` once per frame in ascending order.
    /// `step` may mutate host state (e.g. set the scene's current frame).
    pub fn record<F>(range: FrameRange, mut step: F) -> Self
    where
        F: FnMut(FrameIndex) -> AffineTransform,
    {
        let frames = range.frames().map(&mut step).collect();
        Self {
            start: range.start,
            frames,
        }
    }

    /// Frames covered by the table, if any. `None` for an empty table or one
    /// whose last frame does not fit a `FrameIndex`.
    pub fn range(&self) -> Option<FrameRange> {
        let last = i64::try_from(self.frames.len().checked_sub(1)?).ok()?;
        let end = i64::from(self.start).checked_add(last)?;
        Some(FrameRange {
            start: self.start,
            end: FrameIndex::try_from(end).ok()?,
        })
    }

    /// True when every frame of `range` is stored (no edge holding needed).
    pub fn covers(&self, range: FrameRange) -> bool {
        self.range()
            .is_some_and(|own| own.contains(range.start) && own.contains(range.end))
    }

    /// `IncompleteSamples` naming `table` unless the table covers `range`.
    pub fn require_coverage(&self, table: &str, range: FrameRange) -> Result<(), BakeError> {
        if self.covers(range) {
            return Ok(());
        }
        Err(BakeError::IncompleteSamples {
            table: table.to_string(),
            start: range.start,
            end: range.end,
        })
    }
}

impl FrameEvaluator for SampledEvaluator {
    fn evaluate(&self, frame: FrameIndex) -> AffineTransform {
        let Some(last) = self.frames.len().checked_sub(1) else {
            return AffineTransform::identity();
        };
        let idx = (frame as i64 - self.start as i64).clamp(0, last as i64) as usize;
        self.frames[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_evaluators() {
        let eval = |f: FrameIndex| AffineTransform::from_translation(f as f64, 0.0, 0.0);
        assert_eq!(eval.evaluate(3).translation().x, 3.0);
    }

    #[test]
    fn sampled_holds_edges() {
        let mut calls = Vec::new();
        let sampled = SampledEvaluator::record(FrameRange { start: 10, end: 12 }, |f| {
            calls.push(f);
            AffineTransform::from_translation(f as f64, 0.0, 0.0)
        });
        assert_eq!(calls, vec![10, 11, 12]);
        assert_eq!(sampled.range(), Some(FrameRange { start: 10, end: 12 }));
        assert_eq!(sampled.evaluate(11).translation().x, 11.0);
        assert_eq!(sampled.evaluate(0).translation().x, 10.0);
        assert_eq!(sampled.evaluate(99).translation().x, 12.0);
    }

    #[test]
    fn range_end_that_overflows_is_none() {
        let table = vec![AffineTransform::identity(); 2];
        let sampled = SampledEvaluator::new(FrameIndex::MAX, table);
        assert_eq!(sampled.range(), None);
        assert!(!sampled.covers(FrameRange {
            start: FrameIndex::MAX,
            end: FrameIndex::MAX,
        }));

        let last = SampledEvaluator::new(FrameIndex::MAX, vec![AffineTransform::identity()]);
        assert_eq!(
            last.range(),
            Some(FrameRange {
                start: FrameIndex::MAX,
                end: FrameIndex::MAX,
            })
        );
    }

    #[test]
    fn short_table_fails_coverage() {
        let one = SampledEvaluator::new(1, vec![AffineTransform::identity()]);
        let range = FrameRange { start: 1, end: 5 };
        assert!(!one.covers(range));
        assert_eq!(
            one.require_coverage("base", range),
            Err(BakeError::IncompleteSamples {
                table: "base".into(),
                start: 1,
                end: 5,
            })
        );

        let full = SampledEvaluator::record(FrameRange { start: 0, end: 6 }, |_| {
            AffineTransform::identity()
        });
        assert!(full.require_coverage("base", range).is_ok());
        assert!(!SampledEvaluator::default().covers(range));
    }

    #[test]
    fn empty_table_is_identity() {
        let sampled = SampledEvaluator::default();
        assert_eq!(sampled.range(), None);
        assert_eq!(sampled.evaluate(5), AffineTransform::identity());
    }
}
