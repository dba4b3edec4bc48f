//! Undoing a merge: two targets that were tracked as one blob for a while.
//!
//! The fixer is handed `id3`, born at `t2`. The hypothesis is that `id3` and
//! some `id2` were tracked together as `id2` on `[t1, t2)`, while the real
//! identity of one of them, `id1`, died at `t1`. The search runs in three
//! stages:
//!
//! 1. every `id2` alive at `t2 - 1` and `t2` close to where `id3` would
//!    have been at `t2 - 1`;
//! 2. splitting `id2`'s blob at `t2 - 1` must explain it well;
//! 3. some `id1` that died at `t1` must predict into `id2`'s blob, and
//!    splitting that blob at `t1` must explain it well too.
//!
//! The cheapest `(id2, id1, t1)` is then committed frame by frame through a
//! [`TrackOverlay`] so a degenerate split anywhere discards every edit.

use swarmtrack_core::{Frame, TrackId};
use tracing::{debug, info, warn};

use super::split_cost;
use crate::hindsight::Hindsight;
use crate::motion::{predict_backward, predict_forward};
use crate::overlay::TrackOverlay;
use crate::store::{TrackEntry, TrackStore, TrackView};

struct MergedCandidate {
    id1: TrackId,
    id2: TrackId,
    t1: Frame,
    cost: f64,
}

impl<S: TrackStore> Hindsight<S> {
    /// Split `id3`, born at `t2`, back out of the target it was merged into.
    pub fn fix_merged(&mut self, id3: TrackId, t2: Frame) -> bool {
        let Some(first) = self.store.first_frame_tracked() else {
            return false;
        };
        if t2 < first + 2 {
            return false;
        }
        let Some(best) = self.merged_candidate(id3, t2, first) else {
            return false;
        };
        let MergedCandidate { id1, id2, t1, cost } = best;

        if !self.recluster(id1, id2, t1, t2) {
            return false;
        }
        self.relabel_after_merge(id1, id2, id3, t2);
        info!(id = %id1, carrier = %id2, absorbed = %id3, from = t1, to = t2, cost, kind = "merged", "Split merged detection");
        true
    }

    /// Run the three search stages and return the cheapest candidate.
    fn merged_candidate(&self, id3: TrackId, t2: Frame, first: Frame) -> Option<MergedCandidate> {
        let store = &self.store;
        let params = &self.params;
        let predictor = self.collab.predictor.as_ref();
        let splitter = self.collab.splitter.as_ref();

        let e3 = store.entry(t2, id3).present()?;
        let pred3 = predict_backward(predictor, store, id3, t2 - 1)?;

        // Stage A
        let mut coarse = Vec::new();
        for id2 in store.ids_at(t2 - 1) {
            if id2 == id3 || !store.has(t2, id2) {
                continue;
            }
            let e2prev = match store.entry(t2 - 1, id2) {
                TrackEntry::Present(ell) => ell,
                TrackEntry::Corrupt => {
                    warn!(frame = t2 - 1, id = %id2, "Corrupt track entry, dropping merged candidate");
                    continue;
                }
                TrackEntry::Absent => continue,
            };
            if e2prev.dist(&pred3) <= params.compute_maxdcenters(&e2prev, &e3) {
                coarse.push((id2, e2prev));
            }
        }
        if coarse.is_empty() {
            return None;
        }

        // Stage B
        let fg = self.collab.components.components(t2 - 1)?;
        let mut refined = Vec::new();
        for (id2, e2prev) in coarse {
            let Some(pred2) = predict_backward(predictor, store, id2, t2 - 1) else {
                continue;
            };
            match split_cost(splitter, &fg, &e2prev, [pred3.with_id(id3), pred2]) {
                Some((cost, _)) if cost <= params.merged_max_distance => refined.push((id2, cost)),
                Some((cost, _)) => debug!(id = %id3, candidate = %id2, cost, "Merged candidate too costly at split-off"),
                None => debug!(id = %id3, candidate = %id2, "Split-off blob could not be split"),
            }
        }

        // Stage C
        let lower = t2.saturating_sub(params.merged_max_length).max(first + 1);
        let mut best: Option<MergedCandidate> = None;
        for (id2, cost_b) in refined {
            for t1 in (lower..t2).rev() {
                if !(t1 - 1..=t2).all(|t| store.entry(t, id2).present().is_some()) {
                    break;
                }
                let deaths = self.milestones.deaths(t1);
                if deaths.is_empty() {
                    continue;
                }
                let Some(fg) = self.collab.components.components(t1) else {
                    continue;
                };
                let Some(e2) = store.entry(t1, id2).present() else {
                    continue;
                };
                let Some(pred2) = predict_forward(predictor, store, id2, t1) else {
                    continue;
                };
                for &id1 in deaths {
                    if id1 == id2 || id1 == id3 {
                        continue;
                    }
                    let Some(pred1) = predict_forward(predictor, store, id1, t1) else {
                        continue;
                    };
                    if pred1.dist(&e2) > params.max_jump {
                        continue;
                    }
                    let Some((cost_c, _)) = split_cost(splitter, &fg, &e2, [pred1, pred2]) else {
                        continue;
                    };
                    if cost_c > params.merged_max_distance {
                        continue;
                    }
                    let cost = cost_b + cost_c;
                    if best.as_ref().map_or(true, |b| cost < b.cost) {
                        best = Some(MergedCandidate { id1, id2, t1, cost });
                    }
                }
            }
        }
        if best.is_none() {
            debug!(id = %id3, frame = t2, "No merged candidate survived");
        }
        best
    }

    /// Split `id2`'s blob into `id1` and `id2` on every frame of `[t1, t2)`.
    ///
    /// All writes go through an overlay; nothing reaches the store unless
    /// every frame splits cleanly.
    fn recluster(&mut self, id1: TrackId, id2: TrackId, t1: Frame, t2: Frame) -> bool {
        let predictor = self.collab.predictor.as_ref();
        let splitter = self.collab.splitter.as_ref();
        let components = self.collab.components.as_ref();
        let mut overlay = TrackOverlay::new(&mut self.store);

        for t in t1..t2 {
            let split = components.components(t).and_then(|fg| {
                let p1 = predict_forward(predictor, &overlay, id1, t)?;
                let p2 = predict_forward(predictor, &overlay, id2, t)?;
                let observed = overlay.entry(t, id2).present()?;
                split_cost(splitter, &fg, &observed, [p1, p2])
            });
            let Some((_, [a1, a2])) = split else {
                debug!(id = %id1, carrier = %id2, frame = t, "Degenerate split, rolling back");
                return false;
            };
            overlay.set(t, id1, a1);
            overlay.set(t, id2, a2);
        }
        overlay.commit();
        true
    }

    /// Decide who continues as what at `t2` and retire `id3`.
    fn relabel_after_merge(&mut self, id1: TrackId, id2: TrackId, id3: TrackId, t2: Frame) {
        let predictor = self.collab.predictor.as_ref();
        let pred1 = predict_forward(predictor, &self.store, id1, t2);
        let pred2 = predict_forward(predictor, &self.store, id2, t2);
        let e2 = self.store.get(t2, id2);
        let e3 = self.store.get(t2, id3);
        let swap = match (pred1, pred2, e2, e3) {
            (Some(p1), Some(p2), Some(e2), Some(e3)) => {
                let keep = p1.dist(&e3) + p2.dist(&e2);
                let crossed = p1.dist(&e2) + p2.dist(&e3);
                crossed < keep
            }
            _ => false,
        };

        let death2 = self.milestones.death_frame(id2);
        let death3 = self.milestones.death_frame(id3);
        if swap {
            let mut t = t2;
            loop {
                let old2 = self.store.remove(t, id2);
                let old3 = self.store.remove(t, id3);
                if old2.is_none() && old3.is_none() {
                    break;
                }
                if let Some(ell) = old2 {
                    self.store.set(t, id1, ell);
                }
                if let Some(ell) = old3 {
                    self.store.set(t, id2, ell);
                }
                t += 1;
            }
            self.milestones.set_death(id1, death2);
            self.milestones.set_death(id2, death3);
        } else {
            let mut t = t2;
            while let Some(ell) = self.store.remove(t, id3) {
                self.store.set(t, id1, ell);
                t += 1;
            }
            self.milestones.set_death(id1, death3);
        }
        self.milestones.delete_id(id3);
        self.store.recycle_identity(id3);
    }
}
