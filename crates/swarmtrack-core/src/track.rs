//! Identity and frame-index types shared by every tracking layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a tracked video frame. Frames are 0-indexed and contiguous.
pub type Frame = usize;

/// Persistent integer label assigned to a tracked object across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for TrackId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// A frame index extended with the two infinite sentinels used for
/// unknown births (`NegInfinity`) and identities still alive (`PosInfinity`).
///
/// The derived ordering puts `NegInfinity` below every finite frame and
/// `PosInfinity` above every finite frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FrameBound {
    NegInfinity,
    At(Frame),
    PosInfinity,
}

impl FrameBound {
    /// The finite frame, if any.
    #[inline]
    pub fn finite(self) -> Option<Frame> {
        match self {
            FrameBound::At(frame) => Some(frame),
            _ => None,
        }
    }
}

impl From<Frame> for FrameBound {
    fn from(frame: Frame) -> Self {
        FrameBound::At(frame)
    }
}

impl fmt::Display for FrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameBound::NegInfinity => f.write_str("-inf"),
            FrameBound::At(frame) => write!(f, "{frame}"),
            FrameBound::PosInfinity => f.write_str("+inf"),
        }
    }
}
