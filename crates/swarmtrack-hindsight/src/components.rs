//! Sources of per-frame foreground evidence.

use rayon::prelude::*;
use std::borrow::Cow;
use swarmtrack_core::{Ellipse, ForegroundFrame, Frame};
use tracing::debug;

/// Provides the connected components and foreground weights of a frame.
pub trait ComponentSource {
    fn components(&self, frame: Frame) -> Option<Cow<'_, ForegroundFrame>>;
}

/// No imagery available. Fixers that need pixels decline every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoForeground;

impl ComponentSource for NoForeground {
    fn components(&self, _frame: Frame) -> Option<Cow<'_, ForegroundFrame>> {
        None
    }
}

/// Foreground reconstructed by painting the raw per-frame observations.
///
/// The observations are captured once, before any correction, so later
/// edits to the tracks do not change the evidence.
#[derive(Debug, Clone)]
pub struct RasterizedObservations {
    first_frame: Frame,
    frames: Vec<ForegroundFrame>,
}

impl RasterizedObservations {
    pub fn new(width: u32, height: u32, first_frame: Frame, observations: &[Vec<Ellipse>]) -> Self {
        let frames: Vec<ForegroundFrame> = observations
            .par_iter()
            .map(|ells| ForegroundFrame::rasterize(width, height, ells))
            .collect();
        debug!(frames = frames.len(), width, height, "Rasterized observations");
        Self { first_frame, frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl ComponentSource for RasterizedObservations {
    fn components(&self, frame: Frame) -> Option<Cow<'_, ForegroundFrame>> {
        let i = frame.checked_sub(self.first_frame)?;
        self.frames.get(i).map(Cow::Borrowed)
    }
}

/// Precomputed foreground frames, typically from a background model.
#[derive(Debug, Clone, Default)]
pub struct ForegroundSequence {
    pub first_frame: Frame,
    pub frames: Vec<ForegroundFrame>,
}

impl ComponentSource for ForegroundSequence {
    fn components(&self, frame: Frame) -> Option<Cow<'_, ForegroundFrame>> {
        let i = frame.checked_sub(self.first_frame)?;
        self.frames.get(i).map(Cow::Borrowed)
    }
}
