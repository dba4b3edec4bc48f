use swarmtrack_core::{Frame, TrackId};
use tracing::{debug, info};

use crate::hindsight::Hindsight;
use crate::store::TrackStore;

impl<S: TrackStore> Hindsight<S> {
    /// Delete `id`, which died at `t2`, if it lived too briefly to be real.
    pub fn fix_spurious(&mut self, id: TrackId, t2: Frame) -> bool {
        let Some(t1) = self.milestones.birth_frame(id).finite() else {
            return false;
        };
        let Some(lifespan) = t2.checked_sub(t1) else {
            return false;
        };
        if lifespan > self.params.spurious_max_length {
            debug!(id = %id, lifespan, "Too long-lived to be spurious");
            return false;
        }

        for t in t1..t2 {
            self.store.remove(t, id);
        }
        self.store.recycle_identity(id);
        self.milestones.delete_id(id);
        info!(id = %id, birth = t1, death = t2, kind = "spurious", "Removed spurious detection");
        true
    }
}
