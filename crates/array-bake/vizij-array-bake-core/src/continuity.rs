//! Quaternion sign continuity across frames.
//!
//! `q` and `-q` encode the same rotation, but keying a stream whose sign
//! flips between frames makes curve interpolation swing the long way round.
//! Each instance keeps the last emitted quaternion and negates any incoming
//! quaternion that points into the opposite hemisphere.

use nalgebra::UnitQuaternion;

use crate::math::InstanceIndex;

/// Per-instance filter state.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum ContinuityState {
    #[default]
    Uninitialized,
    /// Holds the last emitted quaternion.
    Tracking(UnitQuaternion<f64>),
}

impl ContinuityState {
    /// Feed the next quaternion in frame order; returns the quaternion to emit.
    pub fn advance(&mut self, q: UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        let emitted = match self {
            ContinuityState::Uninitialized => q,
            ContinuityState::Tracking(prev) => {
                if prev.coords.dot(&q.coords) < 0.0 {
                    negate(&q)
                } else {
                    q
                }
            }
        };
        *self = ContinuityState::Tracking(emitted);
        emitted
    }

    pub fn last(&self) -> Option<&UnitQuaternion<f64>> {
        match self {
            ContinuityState::Uninitialized => None,
            ContinuityState::Tracking(q) => Some(q),
        }
    }
}

/// Continuity states for every instance of one bake, indexed by instance.
#[derive(Clone, Debug, Default)]
pub struct QuaternionContinuityFilter {
    states: Vec<ContinuityState>,
}

impl QuaternionContinuityFilter {
    pub fn new(count: usize) -> Self {
        Self {
            states: vec![ContinuityState::Uninitialized; count],
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Filter `q` for `instance`. Panics if `instance` is out of range.
    #[inline]
    pub fn filter(
        &mut self,
        instance: InstanceIndex,
        q: UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        self.states[instance].advance(q)
    }

    pub fn state(&self, instance: InstanceIndex) -> Option<&ContinuityState> {
        self.states.get(instance)
    }
}

/// Apply the continuity rule in place to one instance's frame-ordered stream.
///
/// Used as a post-pass when frames were decomposed out of order or in parallel.
pub fn enforce_continuity(stream: &mut [UnitQuaternion<f64>]) {
    let mut state = ContinuityState::Uninitialized;
    for q in stream.iter_mut() {
        *q = state.advance(*q);
    }
}

#[inline]
pub(crate) fn negate(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::new_unchecked(-q.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Quaternion, Vector3};

    fn quat(w: f64, x: f64, y: f64, z: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::new_normalize(Quaternion::new(w, x, y, z))
    }

    #[test]
    fn first_quaternion_passes_through() {
        let mut s = ContinuityState::default();
        let q = quat(-0.5, 0.5, 0.5, 0.5);
        assert_eq!(s.advance(q), q);
        assert_eq!(s.last(), Some(&q));
    }

    #[test]
    fn opposite_hemisphere_is_negated() {
        let mut s = ContinuityState::default();
        let a = quat(1.0, 0.0, 0.0, 0.1);
        let b = quat(-1.0, 0.0, 0.0, -0.2);
        s.advance(a);
        let out = s.advance(b);
        assert_eq!(out, negate(&b));
        assert!(a.coords.dot(&out.coords) >= 0.0);
        // next comparison uses the emitted (negated) value
        let c = quat(1.0, 0.0, 0.0, 0.3);
        assert_eq!(s.advance(c), c);
    }

    #[test]
    fn same_hemisphere_is_untouched() {
        let mut s = ContinuityState::default();
        let a = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.1);
        let b = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.2);
        s.advance(a);
        assert_eq!(s.advance(b), b);
    }

    #[test]
    fn instances_are_independent() {
        let mut f = QuaternionContinuityFilter::new(2);
        let a = quat(1.0, 0.0, 0.0, 0.0);
        let b = quat(-1.0, 0.0, 0.0, 0.0);
        f.filter(0, a);
        // instance 1 has not seen anything yet, so `b` passes unchanged
        assert_eq!(f.filter(1, b), b);
        assert_eq!(f.filter(0, b), a);
    }

    #[test]
    fn post_pass_matches_streaming() {
        let mut stream: Vec<_> = (0..24)
            .map(|i| {
                let q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), i as f64 * 0.4);
                if i % 3 == 0 {
                    negate(&q)
                } else {
                    q
                }
            })
            .collect();
        let mut streaming = QuaternionContinuityFilter::new(1);
        let expected: Vec<_> = stream.iter().map(|q| streaming.filter(0, *q)).collect();
        enforce_continuity(&mut stream);
        assert_eq!(stream, expected);
        for w in stream.windows(2) {
            assert!(w[0].coords.dot(&w[1].coords) >= 0.0);
        }
    }
}
