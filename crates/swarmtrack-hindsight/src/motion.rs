//! Motion models used to extrapolate a target by one frame.

use swarmtrack_core::{wrap_half_pi, Ellipse, Frame, TrackId};

use crate::store::TrackView;

/// Predicts where a target will be one frame after `curr`.
///
/// `prev` is the observation one frame on the other side of `curr`; passing
/// the later frame as `prev` predicts backwards in time.
pub trait MotionPredictor {
    fn predict(&self, prev: Option<&Ellipse>, curr: &Ellipse) -> Ellipse;
}

/// Constant-velocity extrapolation with optional damping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantVelocity {
    /// Fraction of the velocity discarded each step, in `[0, 1]`.
    pub dampen: f64,
}

impl Default for ConstantVelocity {
    fn default() -> Self {
        Self { dampen: 0.0 }
    }
}

impl MotionPredictor for ConstantVelocity {
    fn predict(&self, prev: Option<&Ellipse>, curr: &Ellipse) -> Ellipse {
        let Some(prev) = prev else {
            return *curr;
        };
        let keep = 1.0 - self.dampen;
        let mut pred = *curr;
        pred.set_center(curr.center() + (curr.center() - prev.center()) * keep);
        pred.angle = curr.angle + wrap_half_pi(curr.angle - prev.angle) * keep;
        pred
    }
}

/// Predict `id` one step past `curr_frame`, using `prev_frame` for velocity.
///
/// `None` when `id` has no usable entry at `curr_frame`. A missing or
/// corrupt entry at `prev_frame` degrades to a zero-velocity prediction.
pub fn predict_at<V: TrackView + ?Sized>(
    predictor: &dyn MotionPredictor,
    view: &V,
    prev_frame: Option<Frame>,
    curr_frame: Frame,
    id: TrackId,
) -> Option<Ellipse> {
    let curr = view.entry(curr_frame, id).present()?;
    let prev = prev_frame.and_then(|t| view.entry(t, id).present());
    Some(predictor.predict(prev.as_ref(), &curr))
}

/// Predict `id` into frame `into` from its observations at `into - 1` and `into - 2`.
pub fn predict_forward<V: TrackView + ?Sized>(
    predictor: &dyn MotionPredictor,
    view: &V,
    id: TrackId,
    into: Frame,
) -> Option<Ellipse> {
    let curr = into.checked_sub(1)?;
    predict_at(predictor, view, curr.checked_sub(1), curr, id)
}

/// Predict `id` back into frame `into` from its observations at `into + 1` and `into + 2`.
pub fn predict_backward<V: TrackView + ?Sized>(
    predictor: &dyn MotionPredictor,
    view: &V,
    id: TrackId,
    into: Frame,
) -> Option<Ellipse> {
    predict_at(predictor, view, Some(into + 2), into + 1, id)
}
