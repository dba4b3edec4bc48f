//! SwarmTrack Core - Foundation types for multi-target tracking
//!
//! This crate provides the fundamental types used throughout SwarmTrack:
//! - Track identities and frame indices (TrackId, Frame, FrameBound)
//! - Ellipse geometry for per-frame target shape
//! - Foreground evidence (label images and foreground weights)

pub mod error;
pub mod foreground;
pub mod geometry;
pub mod track;

pub use error::{Result, SwarmTrackError};
pub use foreground::{ForegroundFrame, WeightedPixel};
pub use geometry::{wrap_half_pi, Ellipse};
pub use track::{Frame, FrameBound, TrackId};
