//! Vizij Array Bake Core (engine-agnostic)
//!
//! Realizes an array generator (one base object repeatedly offset by a
//! time-varying delta transform) into explicit per-instance, per-frame
//! transform samples ready for keyframe storage. Rotation streams are filtered
//! per instance so consecutive quaternions never flip hemisphere.
//!
//! Hosts supply world-transform evaluators and a sample sink; everything that
//! touches host objects (duplication, modifier removal, keyframe insertion)
//! stays on the adapter side.

pub mod chain;
pub mod config;
pub mod continuity;
pub mod decompose;
pub mod error;
pub mod evaluator;
pub mod math;
pub mod pipeline;
pub mod rotation;
pub mod sink;
pub mod source;

// Re-exports for consumers (adapters)
pub use chain::compute_chain;
pub use config::{validate_count, BakeConfig, BakeOptions, DEFAULT_SINGULAR_EPSILON};
pub use continuity::{enforce_continuity, ContinuityState, QuaternionContinuityFilter};
pub use decompose::{decompose, DecomposedTransform};
pub use error::BakeError;
pub use evaluator::{FrameEvaluator, SampledEvaluator};
pub use math::{AffineTransform, FrameIndex, FrameRange, InstanceIndex};
pub use pipeline::{BakeSummary, BakingPipeline};
pub use rotation::{RotationFilter, RotationPolicy, RotationValue};
pub use sink::{
    export_baked_json, BakedInstanceTrack, BakedTracks, FnSink, SampleSink, TransformSample,
};
pub use source::{plan_bake, ArrayGenerator, BakePlan, Generator, SourceObject};
