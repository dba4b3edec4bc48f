//! SwarmTrack Hindsight - retroactive identity correction.
//!
//! Raw frame-to-frame tracking makes four kinds of identity error: short
//! spurious tracks, targets lost for a few frames and re-found under a new
//! identity, two targets tracked as one blob, and one target tracked as two.
//! A [`Hindsight`] session watches births and deaths of identities as frames
//! are appended and, one frame behind the tracker, rewrites the tracks to
//! undo these errors.

pub mod arena;
pub mod components;
pub mod default_map;
pub mod diagnostics;
mod fixers;
pub mod hindsight;
pub mod interpolate;
pub mod merge_penalty;
pub mod milestones;
pub mod motion;
pub mod overlay;
pub mod params;
pub mod replay;
pub mod splitter;
pub mod store;
pub mod track_file;

pub use arena::{Arena, CircularArena, Unbounded};
pub use components::{ComponentSource, ForegroundSequence, NoForeground, RasterizedObservations};
pub use default_map::DefaultMap;
pub use diagnostics::Diagnostics;
pub use hindsight::{Collaborators, Hindsight};
pub use interpolate::ellipse_interpolate;
pub use merge_penalty::{ForegroundMergePenalty, MergePenalty};
pub use milestones::MilestoneLedger;
pub use motion::{predict_at, predict_backward, predict_forward, ConstantVelocity, MotionPredictor};
pub use overlay::TrackOverlay;
pub use params::HindsightParams;
pub use replay::{replay, IdentityMap};
pub use splitter::{BlobSplitter, GaussianMixtureSplitter};
pub use store::{FrameTracks, InMemoryTrackStore, TrackEntry, TrackStore, TrackView};
pub use track_file::TrackFile;
