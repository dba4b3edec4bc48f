//! Buffered multi-frame edits over a track store.
//!
//! A `TrackOverlay` records writes without touching the underlying store.
//! Reads see the buffered writes layered over the store. `commit` applies
//! every write at once; dropping the overlay discards them.

use std::collections::{BTreeMap, BTreeSet};
use swarmtrack_core::{Ellipse, Frame, TrackId};

use crate::store::{TrackStore, TrackView};

pub struct TrackOverlay<'a, S: TrackStore + ?Sized> {
    base: &'a mut S,
    /// `None` marks a pending removal.
    writes: BTreeMap<(Frame, TrackId), Option<Ellipse>>,
}

impl<'a, S: TrackStore + ?Sized> TrackOverlay<'a, S> {
    pub fn new(base: &'a mut S) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, frame: Frame, id: TrackId, ell: Ellipse) {
        self.writes.insert((frame, id), Some(ell.with_id(id)));
    }

    pub fn remove(&mut self, frame: Frame, id: TrackId) -> Option<Ellipse> {
        let previous = self.get(frame, id);
        self.writes.insert((frame, id), None);
        previous
    }

    /// Apply every buffered write to the store and return how many there were.
    pub fn commit(self) -> usize {
        let count = self.writes.len();
        for ((frame, id), write) in self.writes {
            match write {
                Some(ell) => self.base.set(frame, id, ell),
                None => {
                    self.base.remove(frame, id);
                }
            }
        }
        count
    }
}

impl<S: TrackStore + ?Sized> TrackView for TrackOverlay<'_, S> {
    fn first_frame_tracked(&self) -> Option<Frame> {
        self.base.first_frame_tracked()
    }

    fn last_frame_tracked(&self) -> Option<Frame> {
        self.base.last_frame_tracked()
    }

    fn get(&self, frame: Frame, id: TrackId) -> Option<Ellipse> {
        match self.writes.get(&(frame, id)) {
            Some(write) => *write,
            None => self.base.get(frame, id),
        }
    }

    fn ids_at(&self, frame: Frame) -> BTreeSet<TrackId> {
        let mut ids = self.base.ids_at(frame);
        for ((_, id), write) in self.writes.range((frame, TrackId(0))..=(frame, TrackId(u32::MAX))) {
            match write {
                Some(_) => ids.insert(*id),
                None => ids.remove(id),
            };
        }
        ids
    }
}
