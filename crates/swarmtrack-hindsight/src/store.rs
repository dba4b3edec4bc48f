//! Per-frame storage of tracked ellipses.
//!
//! The store is a two-level map `frame -> (identity -> ellipse)`. Frames are
//! contiguous and appended one at a time as the tracker advances.

use std::collections::{BTreeMap, BTreeSet};
use swarmtrack_core::{Ellipse, Frame, Result, SwarmTrackError, TrackId};

/// Identity-to-ellipse assignments for one frame.
pub type FrameTracks = BTreeMap<TrackId, Ellipse>;

/// Result of looking up one identity in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackEntry {
    Present(Ellipse),
    Absent,
    /// An entry exists but holds NaN or infinite geometry.
    Corrupt,
}

impl TrackEntry {
    /// The ellipse, if the entry is usable.
    pub fn present(self) -> Option<Ellipse> {
        match self {
            TrackEntry::Present(ell) => Some(ell),
            _ => None,
        }
    }
}

/// Read access to tracked frames.
pub trait TrackView {
    /// First frame held by the store, `None` when empty.
    fn first_frame_tracked(&self) -> Option<Frame>;

    /// Last frame held by the store, `None` when empty.
    fn last_frame_tracked(&self) -> Option<Frame>;

    /// The ellipse for `id` in `frame`, if any.
    fn get(&self, frame: Frame, id: TrackId) -> Option<Ellipse>;

    /// Identities present in `frame`. Empty outside the tracked range.
    fn ids_at(&self, frame: Frame) -> BTreeSet<TrackId>;

    fn has(&self, frame: Frame, id: TrackId) -> bool {
        self.get(frame, id).is_some()
    }

    /// Number of identities present in `frame`.
    fn frame_len(&self, frame: Frame) -> usize {
        self.ids_at(frame).len()
    }

    /// Typed lookup separating missing entries from unusable ones.
    fn entry(&self, frame: Frame, id: TrackId) -> TrackEntry {
        match self.get(frame, id) {
            Some(ell) if !ell.is_finite() => TrackEntry::Corrupt,
            Some(ell) => TrackEntry::Present(ell),
            None => TrackEntry::Absent,
        }
    }
}

/// Mutable track storage consumed by the hindsight engine.
pub trait TrackStore: TrackView {
    /// Assign `ell` to `id` in `frame`. The stored ellipse carries `id`.
    fn set(&mut self, frame: Frame, id: TrackId, ell: Ellipse);

    /// Remove and return the ellipse for `id` in `frame`.
    fn remove(&mut self, frame: Frame, id: TrackId) -> Option<Ellipse>;

    /// Mark an identity as free for reuse.
    fn recycle_identity(&mut self, id: TrackId);

    /// Append a new frame, keying each ellipse by its own identity field.
    fn push_frame(&mut self, ellipses: Vec<Ellipse>) -> Frame;
}

/// Vector-backed track store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTrackStore {
    first_frame: Frame,
    frames: Vec<FrameTracks>,
    recycled: BTreeSet<TrackId>,
    next_id: u32,
}

impl InMemoryTrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store whose first pushed frame gets index `first_frame`.
    pub fn starting_at(first_frame: Frame) -> Self {
        Self {
            first_frame,
            ..Self::default()
        }
    }

    /// Build a store from consecutive frames of observations.
    pub fn from_frames(first_frame: Frame, frames: Vec<Vec<Ellipse>>) -> Self {
        let mut store = Self::starting_at(first_frame);
        for frame in frames {
            store.push_frame(frame);
        }
        store
    }

    #[inline]
    fn slot(&self, frame: Frame) -> Option<usize> {
        frame
            .checked_sub(self.first_frame)
            .filter(|i| *i < self.frames.len())
    }

    /// Number of stored frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// All assignments of one frame.
    pub fn frame(&self, frame: Frame) -> Result<&FrameTracks> {
        self.slot(frame)
            .map(|i| &self.frames[i])
            .ok_or_else(|| SwarmTrackError::FrameOutOfRange {
                frame,
                first: self.first_frame,
                last: (self.first_frame + self.frames.len()).saturating_sub(1),
            })
    }

    /// Iterate `(frame, assignments)` in frame order.
    pub fn iter_frames(&self) -> impl Iterator<Item = (Frame, &FrameTracks)> {
        let first = self.first_frame;
        self.frames
            .iter()
            .enumerate()
            .map(move |(i, tracks)| (first + i, tracks))
    }

    pub fn is_recycled(&self, id: TrackId) -> bool {
        self.recycled.contains(&id)
    }

    /// Hand out an identity, preferring the lowest recycled one.
    pub fn allocate_id(&mut self) -> TrackId {
        if let Some(id) = self.recycled.pop_first() {
            return id;
        }
        let id = TrackId(self.next_id);
        self.next_id += 1;
        id
    }

    fn note_id(&mut self, id: TrackId) {
        self.recycled.remove(&id);
        self.next_id = self.next_id.max(id.0.saturating_add(1));
    }
}

impl TrackView for InMemoryTrackStore {
    fn first_frame_tracked(&self) -> Option<Frame> {
        (!self.frames.is_empty()).then_some(self.first_frame)
    }

    fn last_frame_tracked(&self) -> Option<Frame> {
        (!self.frames.is_empty()).then(|| self.first_frame + self.frames.len() - 1)
    }

    fn get(&self, frame: Frame, id: TrackId) -> Option<Ellipse> {
        self.slot(frame)
            .and_then(|i| self.frames[i].get(&id))
            .copied()
    }

    fn ids_at(&self, frame: Frame) -> BTreeSet<TrackId> {
        self.slot(frame)
            .map(|i| self.frames[i].keys().copied().collect())
            .unwrap_or_default()
    }

    fn frame_len(&self, frame: Frame) -> usize {
        self.slot(frame).map_or(0, |i| self.frames[i].len())
    }
}

impl TrackStore for InMemoryTrackStore {
    fn set(&mut self, frame: Frame, id: TrackId, ell: Ellipse) {
        if let Some(i) = self.slot(frame) {
            self.frames[i].insert(id, ell.with_id(id));
            self.note_id(id);
        }
    }

    fn remove(&mut self, frame: Frame, id: TrackId) -> Option<Ellipse> {
        let i = self.slot(frame)?;
        self.frames[i].remove(&id)
    }

    fn recycle_identity(&mut self, id: TrackId) {
        self.recycled.insert(id);
    }

    fn push_frame(&mut self, ellipses: Vec<Ellipse>) -> Frame {
        let mut tracks = FrameTracks::new();
        for ell in ellipses {
            self.note_id(ell.id);
            tracks.insert(ell.id, ell);
        }
        self.frames.push(tracks);
        self.first_frame + self.frames.len() - 1
    }
}
