use std::collections::BTreeSet;
use swarmtrack_core::{Ellipse, Frame, FrameBound, TrackId};
use tracing::{debug, info, warn};

use crate::hindsight::Hindsight;
use crate::store::{TrackEntry, TrackStore};

impl<S: TrackStore> Hindsight<S> {
    /// Fold `id1`, which died at `t2`, back into the target it broke off from.
    ///
    /// Candidates are identities still alive at `t2` that were either born
    /// within the last `split_max_length` frames or already alive just
    /// before a recently born `id1`. A candidate must stay close to `id1`
    /// throughout its window, and the cheapest merge penalty under
    /// `split_max_cost` wins. The later-born identity is absorbed into the
    /// earlier-born one.
    pub fn fix_split(&mut self, id1: TrackId, t2: Frame) -> bool {
        let Some(first) = self.store.first_frame_tracked() else {
            return false;
        };
        let Some(b1) = self.milestones.birth_frame(id1).finite() else {
            return false;
        };
        if t2 <= b1 {
            return false;
        }

        let candidates = self.split_candidates(id1, b1, t2, first);
        let mut best: Option<(f64, TrackId, Frame, Vec<(Frame, Ellipse)>)> = None;
        for (id2, t1) in candidates {
            if !self.update_close_centers(id1, id2, t1, t2) {
                continue;
            }
            let Some((cost, merged)) = self.merge_cost(id1, id2, t1, t2) else {
                continue;
            };
            if best.as_ref().map_or(true, |(c, ..)| cost < *c) {
                best = Some((cost, id2, t1, merged));
            }
        }

        let Some((cost, id2, t1, merged)) = best else {
            return false;
        };
        if cost > self.params.split_max_cost {
            debug!(id = %id1, candidate = %id2, cost, "Split merge too costly");
            return false;
        }

        let b2 = self.milestones.birth_frame(id2);
        let (keep, doomed) = if FrameBound::At(b1) < b2 {
            (id1, id2)
        } else {
            (id2, id1)
        };

        for (t, ell) in &merged {
            self.store.remove(*t, id1);
            self.store.remove(*t, id2);
            self.store.set(*t, keep, *ell);
        }
        for t in t1..t2 {
            if self.store.has(t, keep) {
                self.store.remove(t, doomed);
            } else if let Some(ell) = self.store.remove(t, doomed) {
                self.store.set(t, keep, ell);
            }
        }
        let mut t = t2;
        while let Some(ell) = self.store.remove(t, doomed) {
            self.store.set(t, keep, ell);
            t += 1;
        }

        let death = self.milestones.death_frame(id1).max(self.milestones.death_frame(id2));
        self.milestones.set_death(keep, death);
        self.milestones.delete_id(doomed);
        self.store.recycle_identity(doomed);
        info!(id = %keep, absorbed = %doomed, from = t1, to = t2, cost, kind = "split", "Merged split detection");
        true
    }

    /// `(id2, t1)` pairs whose merge window `[t1, t2)` is worth scoring.
    fn split_candidates(&self, id1: TrackId, b1: Frame, t2: Frame, first: Frame) -> BTreeSet<(TrackId, Frame)> {
        let max_len = self.params.split_max_length;
        let mut candidates = BTreeSet::new();

        // born after id1, recently
        for t in b1.max(t2.saturating_sub(max_len))..t2 {
            for &id2 in self.milestones.births(t) {
                if id2 != id1 && self.store.has(t2, id2) {
                    candidates.insert((id2, t));
                }
            }
        }
        // id1 itself is recent: anything alive just before it appeared
        if t2 - b1 <= max_len && b1 > first {
            for id2 in self.store.ids_at(b1 - 1) {
                if id2 != id1 && self.store.has(t2, id2) {
                    candidates.insert((id2, b1 - 1));
                }
            }
        }
        candidates
    }

    /// True if `id1` and `id2` stay within touching distance on every frame of
    /// `[t1, t2)` where both are tracked, and share at least one such frame.
    fn update_close_centers(&self, id1: TrackId, id2: TrackId, t1: Frame, t2: Frame) -> bool {
        let mut shared = 0;
        for t in t1..t2 {
            match (self.store.entry(t, id1), self.store.entry(t, id2)) {
                (TrackEntry::Present(e1), TrackEntry::Present(e2)) => {
                    if e1.dist(&e2) > self.params.compute_maxdcenters(&e1, &e2) {
                        return false;
                    }
                    shared += 1;
                }
                (TrackEntry::Corrupt, _) | (_, TrackEntry::Corrupt) => {
                    warn!(frame = t, id = %id1, candidate = %id2, "Corrupt track entry, dropping split candidate");
                    return false;
                }
                _ => {}
            }
        }
        shared > 0
    }

    /// Worst per-frame merge penalty over the window, with the merged ellipses.
    ///
    /// Gives up as soon as the running maximum passes `split_max_cost`.
    fn merge_cost(&self, id1: TrackId, id2: TrackId, t1: Frame, t2: Frame) -> Option<(f64, Vec<(Frame, Ellipse)>)> {
        let mut worst = 0.0f64;
        let mut merged = Vec::new();
        for t in t1..t2 {
            let (Some(e1), Some(e2)) = (self.store.entry(t, id1).present(), self.store.entry(t, id2).present())
            else {
                continue;
            };
            let fg = self.collab.components.components(t)?;
            let (penalty, ell) = self.collab.merge_penalty.merge_penalty(&e1, &e2, &fg)?;
            worst = worst.max(penalty);
            if worst > self.params.split_max_cost {
                debug!(id = %id1, candidate = %id2, frame = t, cost = worst, "Split merge cost over threshold");
                return Some((worst, merged));
            }
            merged.push((t, ell));
        }
        Some((worst, merged))
    }
}
