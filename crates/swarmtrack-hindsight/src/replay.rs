//! Replaying a recorded track file through the hindsight engine.
//!
//! A recorded file carries the identities the raw tracker chose. Once a
//! fixer relabels a target, every later frame of the recording still uses
//! the old label, so replay keeps a translation from recorded identities to
//! corrected ones and applies it to each frame before appending it.

use std::collections::{HashMap, HashSet};
use swarmtrack_core::{Ellipse, TrackId};
use tracing::debug;

use crate::components::RasterizedObservations;
use crate::diagnostics::Diagnostics;
use crate::hindsight::Hindsight;
use crate::params::HindsightParams;
use crate::store::{FrameTracks, InMemoryTrackStore};
use crate::track_file::TrackFile;

/// Translation from recorded identities to corrected ones.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    forward: HashMap<TrackId, TrackId>,
    next_fresh: u32,
}

impl IdentityMap {
    /// Identity map whose fresh identities start above every recorded one.
    pub fn for_frames(frames: &[Vec<Ellipse>]) -> Self {
        let max = frames.iter().flatten().map(|e| e.id.0).max();
        Self {
            forward: HashMap::new(),
            next_fresh: max.map_or(0, |m| m.saturating_add(1)),
        }
    }

    /// The corrected identity currently assigned to `recorded`.
    pub fn get(&self, recorded: TrackId) -> TrackId {
        self.forward.get(&recorded).copied().unwrap_or(recorded)
    }

    /// Relabel one recorded frame.
    ///
    /// A recorded identity that would land on a label already taken by
    /// another target is given a fresh one.
    pub fn translate(&mut self, frame: &[Ellipse]) -> Vec<Ellipse> {
        let mut used = HashSet::new();
        let mut out = Vec::with_capacity(frame.len());
        for ell in frame {
            let mut id = self.get(ell.id);
            let taken = !self.forward.contains_key(&ell.id)
                && self.forward.iter().any(|(raw, target)| *target == id && *raw != ell.id);
            if taken || used.contains(&id) {
                id = TrackId(self.next_fresh);
                self.next_fresh += 1;
                self.forward.insert(ell.id, id);
                debug!(recorded = %ell.id, assigned = %id, "Fresh identity for clashing label");
            }
            used.insert(id);
            out.push(ell.with_id(id));
        }
        out
    }

    /// Learn relabellings by matching `recorded` against the stored frame.
    ///
    /// Fixers move entries between identities without touching their
    /// geometry, so an exact geometric match identifies the new label.
    pub fn observe(&mut self, recorded: &[Ellipse], stored: &FrameTracks) {
        for ell in recorded {
            let current = self.get(ell.id);
            if stored.get(&current).is_some_and(|s| same_shape(s, ell)) {
                continue;
            }
            if let Some(moved) = stored.values().find(|s| same_shape(s, ell)) {
                self.forward.insert(ell.id, moved.id);
            }
        }
    }
}

fn same_shape(a: &Ellipse, b: &Ellipse) -> bool {
    a.x == b.x && a.y == b.y && a.major == b.major && a.minor == b.minor && a.angle == b.angle
}

/// Correct `input` and return the new track file with the session's counters.
///
/// Foreground evidence is rebuilt by rasterising the recorded observations,
/// so it reflects what the tracker originally saw rather than the
/// corrections.
pub fn replay(input: &TrackFile, params: HindsightParams) -> (TrackFile, Diagnostics) {
    let (width, height) = input.canvas_size();
    let components = RasterizedObservations::new(width, height, input.first_frame, &input.frames);
    debug!(width, height, frames = input.frames.len(), "Rebuilt foreground from observations");

    let mut session =
        Hindsight::new(InMemoryTrackStore::starting_at(input.first_frame), params).with_components(components);
    if let Some(arena) = input.arena {
        session = session.with_arena(arena);
    }

    let mut ids = IdentityMap::for_frames(&input.frames);
    let mut diag = Diagnostics::new();
    for recorded in &input.frames {
        let frame = session.append_frame(ids.translate(recorded), &mut diag);
        if let Ok(stored) = session.store().frame(frame) {
            ids.observe(recorded, stored);
        }
    }
    (input.with_store(&session.into_store()), diag)
}
