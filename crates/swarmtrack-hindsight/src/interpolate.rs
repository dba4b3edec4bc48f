//! Ellipse interpolation across tracking gaps.

use swarmtrack_core::{wrap_half_pi, Ellipse};

/// Blend two ellipses for a frame `dt1` frames after `e1` and `dt2` frames before `e2`.
///
/// Position and axes are weighted by `dt2 / (dt1 + dt2)` and
/// `dt1 / (dt1 + dt2)`. The angle moves along the shortest signed rotation
/// from `e1` to `e2` (orientations are equivalent modulo π). When both
/// offsets are zero the result is `e1`. The result carries `e1`'s identity.
pub fn ellipse_interpolate(e1: &Ellipse, e2: &Ellipse, dt1: usize, dt2: usize) -> Ellipse {
    let z = (dt1 + dt2).max(1) as f64;
    let w2 = dt1 as f64 / z;
    let w1 = 1.0 - w2;

    let dangle = wrap_half_pi(e2.angle - e1.angle);
    Ellipse {
        x: w1 * e1.x + w2 * e2.x,
        y: w1 * e1.y + w2 * e2.y,
        major: w1 * e1.major + w2 * e2.major,
        minor: w1 * e1.minor + w2 * e2.minor,
        angle: e1.angle + w2 * dangle,
        id: e1.id,
    }
}
