//! Sample output contracts.
//!
//! The pipeline pushes one [`TransformSample`] per (frame, instance) into a
//! [`SampleSink`]. Adapters either forward samples straight to the host's
//! keyframe API or collect them into [`BakedTracks`] first.

use serde::{Deserialize, Serialize};

use crate::decompose::DecomposedTransform;
use crate::math::{FrameIndex, InstanceIndex};
use crate::rotation::{RotationPolicy, RotationValue};

/// One baked (frame, instance) transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformSample {
    pub frame: FrameIndex,
    pub instance: InstanceIndex,
    /// Decomposed world transform; its quaternion is already continuity-filtered
    /// unless the policy is raw `Quaternion`.
    pub transform: DecomposedTransform,
    /// Rotation channel value to key under the bake's policy.
    pub rotation: RotationValue,
}

/// Receiver of baked samples, called in frame order then instance order.
pub trait SampleSink {
    fn emit(&mut self, sample: TransformSample);

    /// Polled between frames. Returning `true` stops the bake; samples already
    /// emitted stay emitted.
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl SampleSink for Vec<TransformSample> {
    #[inline]
    fn emit(&mut self, sample: TransformSample) {
        self.push(sample);
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> SampleSink for FnSink<F>
where
    F: FnMut(TransformSample),
{
    #[inline]
    fn emit(&mut self, sample: TransformSample) {
        (self.0)(sample)
    }
}

/// Channel arrays for one realized instance, ready for keyframe insertion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BakedInstanceTrack {
    pub instance: InstanceIndex,
    pub frames: Vec<FrameIndex>,
    pub location: Vec<[f64; 3]>,
    pub rotation: Vec<RotationValue>,
    pub scale: Vec<[f64; 3]>,
}

impl BakedInstanceTrack {
    fn new(instance: InstanceIndex) -> Self {
        Self {
            instance,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Sink collecting samples into per-instance channel tracks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BakedTracks {
    pub policy: RotationPolicy,
    pub instances: Vec<BakedInstanceTrack>,
}

impl BakedTracks {
    pub fn new(policy: RotationPolicy) -> Self {
        Self {
            policy,
            instances: Vec::new(),
        }
    }

    pub fn instance(&self, instance: InstanceIndex) -> Option<&BakedInstanceTrack> {
        self.instances.get(instance)
    }

    pub fn sample_count(&self) -> usize {
        self.instances.iter().map(BakedInstanceTrack::len).sum()
    }
}

impl SampleSink for BakedTracks {
    fn emit(&mut self, sample: TransformSample) {
        while self.instances.len() <= sample.instance {
            let next = self.instances.len();
            self.instances.push(BakedInstanceTrack::new(next));
        }
        let track = &mut self.instances[sample.instance];
        let t = &sample.transform;
        track.frames.push(sample.frame);
        track
            .location
            .push([t.translation.x, t.translation.y, t.translation.z]);
        track.rotation.push(sample.rotation);
        track.scale.push([t.scale.x, t.scale.y, t.scale.z]);
    }
}

/// Export baked tracks as serde_json::Value (stable schema for FFI/serialization).
pub fn export_baked_json(tracks: &BakedTracks) -> serde_json::Value {
    serde_json::to_value(tracks).unwrap_or(serde_json::Value::Null)
}
