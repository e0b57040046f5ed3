//! Transform chaining: one frame's base/offset pair expanded into N instance transforms.
//!
//! `delta = offset ∘ base⁻¹`; instance 0 is the base and instance `i` is
//! `delta ∘ instance(i-1)`. The chain is built incrementally so repeated
//! floating composition matches what an array generator produces.

use crate::error::BakeError;
use crate::math::{AffineTransform, FrameIndex};

/// Delta transform carrying one instance to the next.
pub fn chain_delta(
    base: &AffineTransform,
    offset: &AffineTransform,
    singular_epsilon: f64,
    frame: FrameIndex,
) -> Result<AffineTransform, BakeError> {
    let base_inv = base
        .try_inverse(singular_epsilon)
        .ok_or_else(|| BakeError::DegenerateTransform {
            frame,
            determinant: base.determinant(),
        })?;
    Ok(offset.compose(&base_inv))
}

/// Expand one frame into `count` instance transforms.
///
/// `frame` is only used to label a `DegenerateTransform` error. A `count` of
/// zero is an `InvalidCount` error; no partial chain is ever returned.
pub fn compute_chain(
    base: &AffineTransform,
    offset: &AffineTransform,
    count: usize,
    singular_epsilon: f64,
    frame: FrameIndex,
) -> Result<Vec<AffineTransform>, BakeError> {
    if count == 0 {
        return Err(BakeError::InvalidCount { count: 0 });
    }
    let delta = chain_delta(base, offset, singular_epsilon, frame)?;

    let mut out = Vec::with_capacity(count);
    let mut current = *base;
    out.push(current);
    for _ in 1..count {
        current = delta.compose(&current);
        out.push(current);
    }
    Ok(out)
}
