//! Rotation representation policy.
//!
//! One pipeline serves every keying style; the policy picked at construction
//! decides how each instance's rotation stream is post-processed:
//! - `QuaternionContinuous`: quaternion keys with hemisphere continuity (default).
//! - `Quaternion`: quaternion keys exactly as decomposed.
//! - `Euler`: XYZ Euler keys, each frame unwrapped to sit closest to the previous one.

use std::f64::consts::{PI, TAU};

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::continuity::QuaternionContinuityFilter;
use crate::math::InstanceIndex;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    #[default]
    QuaternionContinuous,
    Quaternion,
    Euler,
}

/// Rotation channel value to key for one sample.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RotationValue {
    /// Quaternion (x, y, z, w)
    Quat([f64; 4]),
    /// Euler angles in radians, XYZ order (X applied first)
    Euler([f64; 3]),
}

/// Per-bake rotation post-processing state for all instances.
#[derive(Clone, Debug)]
pub enum RotationFilter {
    Raw,
    Continuous(QuaternionContinuityFilter),
    Euler {
        quats: QuaternionContinuityFilter,
        previous: Vec<Option<Vector3<f64>>>,
    },
}

impl RotationFilter {
    pub fn new(policy: RotationPolicy, count: usize) -> Self {
        match policy {
            RotationPolicy::Quaternion => RotationFilter::Raw,
            RotationPolicy::QuaternionContinuous => {
                RotationFilter::Continuous(QuaternionContinuityFilter::new(count))
            }
            RotationPolicy::Euler => RotationFilter::Euler {
                quats: QuaternionContinuityFilter::new(count),
                previous: vec![None; count],
            },
        }
    }

    pub fn policy(&self) -> RotationPolicy {
        match self {
            RotationFilter::Raw => RotationPolicy::Quaternion,
            RotationFilter::Continuous(_) => RotationPolicy::QuaternionContinuous,
            RotationFilter::Euler { .. } => RotationPolicy::Euler,
        }
    }

    /// Process the next quaternion of `instance` (frames must arrive in order).
    /// Returns the quaternion to store on the sample and the channel value to key.
    pub fn apply(
        &mut self,
        instance: InstanceIndex,
        q: UnitQuaternion<f64>,
    ) -> (UnitQuaternion<f64>, RotationValue) {
        match self {
            RotationFilter::Raw => (q, quat_value(&q)),
            RotationFilter::Continuous(filter) => {
                let q = filter.filter(instance, q);
                (q, quat_value(&q))
            }
            RotationFilter::Euler { quats, previous } => {
                let q = quats.filter(instance, q);
                let (roll, pitch, yaw) = q.euler_angles();
                let raw = Vector3::new(roll, pitch, yaw);
                let e = match previous[instance] {
                    Some(prev) => compatible_euler(&raw, &prev),
                    None => raw,
                };
                previous[instance] = Some(e);
                (q, RotationValue::Euler([e.x, e.y, e.z]))
            }
        }
    }
}

fn quat_value(q: &UnitQuaternion<f64>) -> RotationValue {
    let c = &q.coords;
    RotationValue::Quat([c.x, c.y, c.z, c.w])
}

/// Equivalent XYZ Euler triple closest to `prev`, considering 2π wraps and the
/// flipped form `(x + π, π - y, z + π)`.
pub fn compatible_euler(e: &Vector3<f64>, prev: &Vector3<f64>) -> Vector3<f64> {
    let direct = unwrap_towards(*e, prev);
    let flipped = unwrap_towards(Vector3::new(e.x + PI, PI - e.y, e.z + PI), prev);
    let dist = |v: &Vector3<f64>| (v - prev).abs().sum();
    if dist(&flipped) < dist(&direct) {
        flipped
    } else {
        direct
    }
}

fn unwrap_towards(mut e: Vector3<f64>, prev: &Vector3<f64>) -> Vector3<f64> {
    for i in 0..3 {
        let d = e[i] - prev[i];
        e[i] -= TAU * (d / TAU).round();
    }
    e
}
