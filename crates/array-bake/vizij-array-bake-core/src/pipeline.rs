//! Baking pipeline: frame × instance loop over chain → decompose → rotation filter → sink.
//!
//! The bake is all-or-nothing with respect to errors: every frame is evaluated
//! and chained before the first sample reaches the sink, so a degenerate base
//! transform anywhere in the range aborts with nothing emitted.

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::chain::compute_chain;
use crate::config::{BakeConfig, BakeOptions};
use crate::decompose::decompose;
use crate::error::BakeError;
use crate::evaluator::FrameEvaluator;
use crate::math::{AffineTransform, FrameRange};
use crate::rotation::RotationFilter;
use crate::sink::{SampleSink, TransformSample};

/// Diagnostic summary of one bake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakeSummary {
    pub instances: usize,
    pub range: FrameRange,
    pub frames_processed: usize,
    pub samples_emitted: usize,
    /// Sink requested a stop before the whole range was emitted.
    pub cancelled: bool,
}

impl fmt::Display for BakeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Realized {} instances over frames {}..={} ({} samples)",
            self.instances, self.range.start, self.range.end, self.samples_emitted
        )?;
        if self.cancelled {
            write!(f, "; cancelled after {} frames", self.frames_processed)?;
        }
        Ok(())
    }
}

/// Stateless between runs; per-instance rotation state lives inside `bake`.
#[derive(Clone, Debug, Default)]
pub struct BakingPipeline {
    options: BakeOptions,
}

impl BakingPipeline {
    pub fn new(options: BakeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BakeOptions {
        &self.options
    }

    /// Bake `count` instances over `range`, emitting samples to `sink`.
    ///
    /// Validation runs first: `count == 0` fails with `InvalidCount` before any
    /// evaluator call, then a malformed range fails with `EmptyRange`.
    pub fn bake<B, O, S>(
        &self,
        range: FrameRange,
        base: &B,
        offset: &O,
        count: usize,
        sink: &mut S,
    ) -> Result<BakeSummary, BakeError>
    where
        B: FrameEvaluator + ?Sized,
        O: FrameEvaluator + ?Sized,
        S: SampleSink + ?Sized,
    {
        if count == 0 {
            return Err(BakeError::InvalidCount { count: 0 });
        }
        range.validate()?;

        let chains = self.compute_chains(range, base, offset, count)?;

        let mut rotation = RotationFilter::new(self.options.rotation, count);
        let mut summary = BakeSummary {
            instances: count,
            range,
            frames_processed: 0,
            samples_emitted: 0,
            cancelled: false,
        };

        for (frame, chain) in range.frames().zip(chains) {
            if sink.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            for (instance, world) in chain.iter().enumerate() {
                let mut transform = decompose(world);
                let (q, value) = rotation.apply(instance, transform.rotation);
                transform.rotation = q;
                sink.emit(TransformSample {
                    frame,
                    instance,
                    transform,
                    rotation: value,
                });
                summary.samples_emitted += 1;
            }
            summary.frames_processed += 1;
        }

        info!("{summary}");
        Ok(summary)
    }

    /// Evaluate base/offset for every frame and expand each into its instance
    /// chain. Fails on the first frame whose base is not invertible.
    pub fn compute_chains<B, O>(
        &self,
        range: FrameRange,
        base: &B,
        offset: &O,
        count: usize,
    ) -> Result<Vec<Vec<AffineTransform>>, BakeError>
    where
        B: FrameEvaluator + ?Sized,
        O: FrameEvaluator + ?Sized,
    {
        let eps = self.options.effective_singular_epsilon();
        let mut chains = Vec::with_capacity(range.len());
        for frame in range.frames() {
            let b = base.evaluate(frame);
            let o = offset.evaluate(frame);
            let chain = compute_chain(&b, &o, count, eps, frame).map_err(|e| {
                warn!("array bake aborted: {e}");
                e
            })?;
            chains.push(chain);
        }
        debug!(
            "chained {} frames x {} instances ({:?})",
            chains.len(),
            count,
            self.options.rotation
        );
        Ok(chains)
    }

    /// Validate `cfg` (count, then range) and bake with its options.
    pub fn bake_config<B, O, S>(
        cfg: &BakeConfig,
        base: &B,
        offset: &O,
        sink: &mut S,
    ) -> Result<BakeSummary, BakeError>
    where
        B: FrameEvaluator + ?Sized,
        O: FrameEvaluator + ?Sized,
        S: SampleSink + ?Sized,
    {
        let (count, range) = cfg.validate()?;
        BakingPipeline::new(cfg.options()).bake(range, base, offset, count, sink)
    }
}
