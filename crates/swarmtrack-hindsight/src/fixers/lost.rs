use swarmtrack_core::{Frame, TrackId};
use tracing::{debug, info};

use crate::hindsight::Hindsight;
use crate::interpolate::ellipse_interpolate;
use crate::motion::predict_forward;
use crate::store::TrackStore;

impl<S: TrackStore> Hindsight<S> {
    /// Reconnect `id2`, born at `t2`, to an identity that vanished shortly before.
    ///
    /// `id2` is walked backwards one frame at a time. At every step the
    /// identities that died there are predicted forward and compared with
    /// it; the closest one within `2 * max_jump_split` inherits `id2`'s track
    /// and the gap is filled by interpolation.
    pub fn fix_lost(&mut self, id2: TrackId, t2: Frame) -> bool {
        let Self {
            store,
            milestones,
            params,
            collab,
        } = self;
        let Some(first) = store.first_frame_tracked() else {
            return false;
        };
        let Some(e2) = store.entry(t2, id2).present() else {
            return false;
        };
        let predictor = collab.predictor.as_ref();
        let lower = t2.saturating_sub(params.lost_max_length).max(first + 1);

        let mut curr = e2;
        let mut prev = store.entry(t2 + 1, id2).present();
        let mut best: Option<(f64, TrackId, Frame)> = None;
        for t1 in (lower..t2).rev() {
            let back = predictor.predict(prev.as_ref(), &curr);
            for &id1 in milestones.deaths(t1) {
                if id1 == id2 {
                    continue;
                }
                let Some(ahead) = predict_forward(predictor, &*store, id1, t1) else {
                    continue;
                };
                let d = ahead.dist(&back);
                if best.map_or(true, |(bd, _, _)| d < bd) {
                    best = Some((d, id1, t1));
                }
            }
            prev = Some(curr);
            curr = back;
        }

        let Some((mind, id1, t1)) = best else {
            return false;
        };
        if mind > params.max_jump_split * 2.0 {
            debug!(id = %id2, candidate = %id1, distance = mind, "Lost candidate too far");
            return false;
        }
        let Some(e1) = store.entry(t1 - 1, id1).present() else {
            return false;
        };

        let mut gap = Vec::with_capacity(t2 - t1);
        for t in t1..t2 {
            let ell = ellipse_interpolate(&e1, &e2, t - (t1 - 1), t2 - t);
            if !collab.arena.contains(ell.x, ell.y) {
                debug!(id = %id2, candidate = %id1, frame = t, "Interpolated track leaves the arena");
                return false;
            }
            gap.push((t, ell));
        }
        for (t, ell) in gap {
            store.set(t, id1, ell);
        }
        let mut t = t2;
        while let Some(ell) = store.remove(t, id2) {
            store.set(t, id1, ell);
            t += 1;
        }

        let death2 = milestones.death_frame(id2);
        milestones.set_death(id1, death2);
        milestones.delete_id(id2);
        store.recycle_identity(id2);
        info!(id = %id1, absorbed = %id2, from = t1, to = t2, kind = "lost", "Bridged lost detection");
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::CircularArena;
    use crate::hindsight::Hindsight;
    use crate::params::HindsightParams;
    use crate::store::{InMemoryTrackStore, TrackView};
    use swarmtrack_core::{Ellipse, FrameBound, TrackId};

    fn ell(id: u32, x: f64) -> Ellipse {
        Ellipse::new(x, 30.0, 4.0, 2.0, 0.0, TrackId(id))
    }

    /// Target 1 at `x1` on frames 0..=4, target 2 at `x2` from frame 8 on.
    fn session(x1: f64, x2: f64) -> Hindsight<InMemoryTrackStore> {
        let frames = (0..13)
            .map(|t| match t {
                0..=4 => vec![ell(1, x1)],
                5..=7 => vec![],
                _ => vec![ell(2, x2)],
            })
            .collect();
        let params = HindsightParams {
            max_jump_split: 10.0,
            ..Default::default()
        };
        Hindsight::new(InMemoryTrackStore::from_frames(0, frames), params)
    }

    #[test]
    fn test_bridges_gap() {
        let mut hs = session(20.0, 30.0);
        assert!(hs.fix_lost(TrackId(2), 8));
        let store = hs.store();
        let xs: Vec<f64> = (5..8).map(|t| store.get(t, TrackId(1)).unwrap().x).collect();
        assert_eq!(xs, vec![22.5, 25.0, 27.5]);
        assert!((8..13).all(|t| store.has(t, TrackId(1)) && !store.has(t, TrackId(2))));
        assert_eq!(store.get(12, TrackId(1)).unwrap().id, TrackId(1));
        assert!(store.is_recycled(TrackId(2)));

        let ledger = hs.milestones();
        assert_eq!(ledger.death_frame(TrackId(1)), FrameBound::PosInfinity);
        assert!(ledger.deaths(5).is_empty());
        assert!(ledger.births(8).is_empty());
        assert!(ledger.is_consistent());
    }

    #[test]
    fn test_distance_cap_is_inclusive() {
        let mut at_cap = session(20.0, 40.0);
        assert!(at_cap.fix_lost(TrackId(2), 8));

        let mut past_cap = session(20.0, 40.5);
        assert!(!past_cap.fix_lost(TrackId(2), 8));
        assert!(past_cap.store().has(8, TrackId(2)));
        assert!(!past_cap.store().has(6, TrackId(1)));
    }

    #[test]
    fn test_gap_must_stay_in_arena() {
        let mut hs = session(20.0, 30.0).with_arena(CircularArena {
            cx: 20.0,
            cy: 30.0,
            radius: 4.0,
        });
        assert!(!hs.fix_lost(TrackId(2), 8));
        assert!((5..8).all(|t| hs.store().frame_len(t) == 0));
        assert!(hs.store().has(8, TrackId(2)));
        assert!(hs.milestones().births(8).contains(&TrackId(2)));
    }

    #[test]
    fn test_no_candidate_when_window_is_too_short() {
        let mut hs = session(20.0, 30.0);
        hs.params.lost_max_length = 2;
        assert!(!hs.fix_lost(TrackId(2), 8));
    }
}
