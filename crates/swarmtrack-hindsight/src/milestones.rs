//! Birth and death bookkeeping for every identity.
//!
//! An identity is *born* at the first frame it appears in and *dies* at the
//! first frame after its last appearance. The ledger keeps both directions
//! of that relation:
//! - frame -> identities born / died there (empty set by default)
//! - identity -> birth frame (`-inf` by default) and death frame (`+inf`)
//!
//! It is advanced one frame at a time by diffing the identities alive in
//! consecutive frames, and patched by the fixers as they rewrite tracks.

use std::collections::BTreeSet;
use swarmtrack_core::{Frame, FrameBound, TrackId};
use tracing::debug;

use crate::default_map::DefaultMap;
use crate::store::TrackView;

#[derive(Debug, Clone)]
pub struct MilestoneLedger {
    births_at: DefaultMap<Frame, BTreeSet<TrackId>>,
    deaths_at: DefaultMap<Frame, BTreeSet<TrackId>>,
    birth_frame: DefaultMap<TrackId, FrameBound>,
    death_frame: DefaultMap<TrackId, FrameBound>,
    /// Next frame `update` will accept.
    next_frame: Option<Frame>,
}

impl Default for MilestoneLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MilestoneLedger {
    pub fn new() -> Self {
        Self {
            births_at: DefaultMap::new(BTreeSet::new()),
            deaths_at: DefaultMap::new(BTreeSet::new()),
            birth_frame: DefaultMap::new(FrameBound::NegInfinity),
            death_frame: DefaultMap::new(FrameBound::PosInfinity),
            next_frame: None,
        }
    }

    /// Build the ledger by replaying every frame already in `view`.
    pub fn from_tracks<V: TrackView + ?Sized>(view: &V) -> Self {
        let mut ledger = Self::new();
        if let Some(last) = view.last_frame_tracked() {
            ledger.update(view, last);
        }
        ledger
    }

    /// Record births and deaths at `frame`.
    ///
    /// Frames already processed and frames outside the tracked range are
    /// ignored. Skipped frames between the last processed one and `frame`
    /// are processed first so the ledger never has holes. Returns `true` if
    /// `frame` was processed.
    pub fn update<V: TrackView + ?Sized>(&mut self, view: &V, frame: Frame) -> bool {
        let (Some(first), Some(last)) = (view.first_frame_tracked(), view.last_frame_tracked())
        else {
            return false;
        };
        if frame < first || frame > last {
            return false;
        }
        let start = self.next_frame.unwrap_or(first).max(first);
        if frame < start {
            return false;
        }
        for t in start..=frame {
            self.diff_frame(view, first, t);
        }
        self.next_frame = Some(frame + 1);
        true
    }

    fn diff_frame<V: TrackView + ?Sized>(&mut self, view: &V, first: Frame, t: Frame) {
        let alive = view.ids_at(t);
        let previous = if t > first {
            view.ids_at(t - 1)
        } else {
            BTreeSet::new()
        };
        let newborns: Vec<TrackId> = alive.difference(&previous).copied().collect();
        let newdeaths: Vec<TrackId> = previous.difference(&alive).copied().collect();
        if !newborns.is_empty() || !newdeaths.is_empty() {
            debug!(frame = t, births = newborns.len(), deaths = newdeaths.len(), "Milestones updated");
        }
        for id in newborns {
            // a reused identity starts a fresh lifetime
            if self.death_frame(id) <= FrameBound::At(t) {
                self.set_death(id, FrameBound::PosInfinity);
            }
            self.set_birth(id, t);
        }
        for id in newdeaths {
            self.set_death(id, t);
        }
    }

    /// Identities born at exactly `frame`.
    pub fn births(&self, frame: Frame) -> &BTreeSet<TrackId> {
        self.births_at.get_or_default(&frame)
    }

    /// Identities that died at exactly `frame`.
    pub fn deaths(&self, frame: Frame) -> &BTreeSet<TrackId> {
        self.deaths_at.get_or_default(&frame)
    }

    pub fn birth_frame(&self, id: TrackId) -> FrameBound {
        *self.birth_frame.get_or_default(&id)
    }

    pub fn death_frame(&self, id: TrackId) -> FrameBound {
        *self.death_frame.get_or_default(&id)
    }

    /// Forget everything recorded about `id`.
    pub fn delete_id(&mut self, id: TrackId) {
        if let Some(FrameBound::At(frame)) = self.birth_frame.remove(&id) {
            Self::discard(&mut self.births_at, frame, id);
        }
        if let Some(FrameBound::At(frame)) = self.death_frame.remove(&id) {
            Self::discard(&mut self.deaths_at, frame, id);
        }
    }

    /// Move `id`'s death to `frame`. An infinite frame marks it alive.
    pub fn set_death(&mut self, id: TrackId, frame: impl Into<FrameBound>) {
        if let Some(FrameBound::At(old)) = self.death_frame.remove(&id) {
            Self::discard(&mut self.deaths_at, old, id);
        }
        if let FrameBound::At(frame) = frame.into() {
            self.deaths_at.get_mut_or_insert(frame).insert(id);
            self.death_frame.insert(id, FrameBound::At(frame));
        }
    }

    /// Move `id`'s birth to `frame`. An infinite frame clears it.
    pub fn set_birth(&mut self, id: TrackId, frame: impl Into<FrameBound>) {
        if let Some(FrameBound::At(old)) = self.birth_frame.remove(&id) {
            Self::discard(&mut self.births_at, old, id);
        }
        if let FrameBound::At(frame) = frame.into() {
            self.births_at.get_mut_or_insert(frame).insert(id);
            self.birth_frame.insert(id, FrameBound::At(frame));
        }
    }

    fn discard(buckets: &mut DefaultMap<Frame, BTreeSet<TrackId>>, frame: Frame, id: TrackId) {
        let now_empty = {
            let bucket = buckets.get_mut_or_insert(frame);
            bucket.remove(&id);
            bucket.is_empty()
        };
        if now_empty {
            buckets.remove(&frame);
        }
    }

    /// Check that both directions of the ledger agree.
    pub fn is_consistent(&self) -> bool {
        let forward_births = self
            .birth_frame
            .iter()
            .all(|(id, b)| b.finite().is_some_and(|f| self.births(f).contains(id)));
        let forward_deaths = self
            .death_frame
            .iter()
            .all(|(id, d)| d.finite().is_some_and(|f| self.deaths(f).contains(id)));
        let backward_births = self
            .births_at
            .iter()
            .all(|(f, ids)| ids.iter().all(|id| self.birth_frame(*id) == FrameBound::At(*f)));
        let backward_deaths = self
            .deaths_at
            .iter()
            .all(|(f, ids)| ids.iter().all(|id| self.death_frame(*id) == FrameBound::At(*f)));
        let ordered = self
            .birth_frame
            .iter()
            .all(|(id, b)| *b <= self.death_frame(*id));
        forward_births && forward_deaths && backward_births && backward_deaths && ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryTrackStore, TrackStore};
    use proptest::prelude::*;
    use swarmtrack_core::Ellipse;

    fn ell(id: u32) -> Ellipse {
        Ellipse::new(10.0 + id as f64, 10.0, 2.0, 1.0, 0.0, TrackId(id))
    }

    fn store_of(frames: &[&[u32]]) -> InMemoryTrackStore {
        InMemoryTrackStore::from_frames(
            0,
            frames
                .iter()
                .map(|ids| ids.iter().map(|id| ell(*id)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_update_records_births_and_deaths() {
        let store = store_of(&[&[1, 2], &[1, 2, 3], &[1, 3], &[3]]);
        let ledger = MilestoneLedger::from_tracks(&store);
        assert_eq!(ledger.births(0).len(), 2);
        assert!(ledger.births(1).contains(&TrackId(3)));
        assert!(ledger.deaths(2).contains(&TrackId(2)));
        assert!(ledger.deaths(3).contains(&TrackId(1)));
        assert_eq!(ledger.birth_frame(TrackId(3)), FrameBound::At(1));
        assert_eq!(ledger.death_frame(TrackId(3)), FrameBound::PosInfinity);
        assert_eq!(ledger.birth_frame(TrackId(99)), FrameBound::NegInfinity);
        assert!(ledger.deaths(50).is_empty());
        assert!(ledger.is_consistent());
    }

    #[test]
    fn test_update_ignores_processed_and_future_frames() {
        let mut store = store_of(&[&[1], &[1, 2]]);
        let mut ledger = MilestoneLedger::from_tracks(&store);
        assert!(!ledger.update(&store, 1));
        assert!(!ledger.update(&store, 5));
        store.push_frame(vec![ell(2)]);
        assert!(ledger.update(&store, 2));
        assert!(ledger.deaths(2).contains(&TrackId(1)));
    }

    #[test]
    fn test_update_catches_up_skipped_frames() {
        let store = store_of(&[&[1], &[1, 2], &[2], &[]]);
        let mut ledger = MilestoneLedger::new();
        assert!(ledger.update(&store, 3));
        assert_eq!(ledger.birth_frame(TrackId(2)), FrameBound::At(1));
        assert_eq!(ledger.death_frame(TrackId(1)), FrameBound::At(2));
        assert_eq!(ledger.death_frame(TrackId(2)), FrameBound::At(3));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = store_of(&[&[1, 2], &[2]]);
        let mut ledger = MilestoneLedger::from_tracks(&store);
        ledger.delete_id(TrackId(1));
        ledger.delete_id(TrackId(1));
        assert!(!ledger.births(0).contains(&TrackId(1)));
        assert!(ledger.deaths(1).is_empty());
        assert_eq!(ledger.birth_frame(TrackId(1)), FrameBound::NegInfinity);
        assert_eq!(ledger.death_frame(TrackId(1)), FrameBound::PosInfinity);
        assert!(ledger.is_consistent());
    }

    #[test]
    fn test_set_death_migrates_bucket() {
        let store = store_of(&[&[1], &[1], &[]]);
        let mut ledger = MilestoneLedger::from_tracks(&store);
        assert!(ledger.deaths(2).contains(&TrackId(1)));
        ledger.set_death(TrackId(1), 7);
        assert!(ledger.deaths(2).is_empty());
        assert!(ledger.deaths(7).contains(&TrackId(1)));
        ledger.set_death(TrackId(1), FrameBound::PosInfinity);
        assert!(ledger.deaths(7).is_empty());
        assert_eq!(ledger.death_frame(TrackId(1)), FrameBound::PosInfinity);
        assert!(ledger.is_consistent());
    }

    #[test]
    fn test_set_birth_migrates_bucket() {
        let mut ledger = MilestoneLedger::new();
        ledger.set_birth(TrackId(4), 3);
        ledger.set_birth(TrackId(4), 1);
        assert!(ledger.births(3).is_empty());
        assert!(ledger.births(1).contains(&TrackId(4)));
        assert_eq!(ledger.birth_frame(TrackId(4)), FrameBound::At(1));
    }

    proptest! {
        #[test]
        fn ledger_stays_consistent(
            presence in prop::collection::vec(prop::collection::btree_set(0u32..6, 0..6), 1..25)
        ) {
            let frames: Vec<Vec<Ellipse>> = presence
                .iter()
                .map(|ids| ids.iter().map(|id| ell(*id)).collect())
                .collect();
            let store = InMemoryTrackStore::from_frames(0, frames);
            let ledger = MilestoneLedger::from_tracks(&store);
            prop_assert!(ledger.is_consistent());
        }

        #[test]
        fn contiguous_lifetimes_are_recorded_exactly(
            lifetimes in prop::collection::vec((0usize..20, 1usize..10), 1..6)
        ) {
            let frames: Vec<Vec<Ellipse>> = (0..30)
                .map(|t| {
                    lifetimes
                        .iter()
                        .enumerate()
                        .filter(|(_, (start, len))| (*start..start + len).contains(&t))
                        .map(|(id, _)| ell(id as u32))
                        .collect()
                })
                .collect();
            let store = InMemoryTrackStore::from_frames(0, frames);
            let ledger = MilestoneLedger::from_tracks(&store);
            for (id, (start, len)) in lifetimes.iter().enumerate() {
                let id = TrackId(id as u32);
                prop_assert_eq!(ledger.birth_frame(id), FrameBound::At(*start));
                prop_assert_eq!(ledger.death_frame(id), FrameBound::At(start + len));
                prop_assert!(ledger.births(*start).contains(&id));
                prop_assert!(ledger.deaths(start + len).contains(&id));
            }
        }
    }
}
