//! The hindsight session: owns the tracks and corrects them frame by frame.

use swarmtrack_core::{Ellipse, Frame, TrackId};
use tracing::{debug, info};

use crate::arena::{Arena, Unbounded};
use crate::components::{ComponentSource, NoForeground};
use crate::diagnostics::Diagnostics;
use crate::merge_penalty::{ForegroundMergePenalty, MergePenalty};
use crate::milestones::MilestoneLedger;
use crate::motion::{ConstantVelocity, MotionPredictor};
use crate::params::HindsightParams;
use crate::splitter::{BlobSplitter, GaussianMixtureSplitter};
use crate::store::TrackStore;

/// External services the fixers consult.
pub struct Collaborators {
    pub components: Box<dyn ComponentSource>,
    pub splitter: Box<dyn BlobSplitter>,
    pub predictor: Box<dyn MotionPredictor>,
    pub arena: Box<dyn Arena>,
    pub merge_penalty: Box<dyn MergePenalty>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            components: Box::new(NoForeground),
            splitter: Box::new(GaussianMixtureSplitter::default()),
            predictor: Box::new(ConstantVelocity::default()),
            arena: Box::new(Unbounded),
            merge_penalty: Box::new(ForegroundMergePenalty),
        }
    }
}

/// Retroactive identity correction over a growing track store.
///
/// Call [`Hindsight::fix_errors`] once for every newly tracked frame, or let
/// [`Hindsight::append_frame`] push the frame and do it. Corrections always
/// target the frame before the newest one.
pub struct Hindsight<S: TrackStore> {
    pub(crate) store: S,
    pub(crate) milestones: MilestoneLedger,
    pub(crate) params: HindsightParams,
    pub(crate) collab: Collaborators,
}

impl<S: TrackStore> Hindsight<S> {
    /// Start a session over `store`, replaying every frame it already holds.
    pub fn new(store: S, params: HindsightParams) -> Self {
        let milestones = MilestoneLedger::from_tracks(&store);
        debug!(
            first = ?store.first_frame_tracked(),
            last = ?store.last_frame_tracked(),
            "Hindsight session created"
        );
        Self {
            store,
            milestones,
            params,
            collab: Collaborators::default(),
        }
    }

    pub fn with_components(mut self, components: impl ComponentSource + 'static) -> Self {
        self.collab.components = Box::new(components);
        self
    }

    pub fn with_splitter(mut self, splitter: impl BlobSplitter + 'static) -> Self {
        self.collab.splitter = Box::new(splitter);
        self
    }

    pub fn with_predictor(mut self, predictor: impl MotionPredictor + 'static) -> Self {
        self.collab.predictor = Box::new(predictor);
        self
    }

    pub fn with_arena(mut self, arena: impl Arena + 'static) -> Self {
        self.collab.arena = Box::new(arena);
        self
    }

    pub fn with_merge_penalty(mut self, merge_penalty: impl MergePenalty + 'static) -> Self {
        self.collab.merge_penalty = Box::new(merge_penalty);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn milestones(&self) -> &MilestoneLedger {
        &self.milestones
    }

    pub fn params(&self) -> &HindsightParams {
        &self.params
    }

    /// End the session and hand back the corrected tracks.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Append one tracked frame and correct the frame before it.
    pub fn append_frame(&mut self, ellipses: Vec<Ellipse>, diag: &mut Diagnostics) -> Frame {
        let frame = self.store.push_frame(ellipses);
        self.fix_errors(frame, diag);
        frame
    }

    /// Bring the ledger up to `frame` and run every enabled fixer on `frame - 1`.
    ///
    /// Deaths go through the split fixer then the spurious fixer; births go
    /// through the merged fixer then the lost fixer. Each pass sees what the
    /// previous one left behind.
    pub fn fix_errors(&mut self, frame: Frame, diag: &mut Diagnostics) {
        diag.nframes_analyzed += 1;
        self.milestones.update(&self.store, frame);

        let Some(first) = self.store.first_frame_tracked() else {
            return;
        };
        if frame < first + 1 {
            return;
        }
        let t = frame - 1;
        let mut nfixed = 0u64;

        let deaths = self.deaths_at(t);
        diag.ndeaths_nohindsight += deaths.len() as u64;
        if self.params.fix_split {
            for id in deaths {
                if self.milestones.deaths(t).contains(&id) && self.fix_split(id, t) {
                    diag.nsplits_fixed += 1;
                    nfixed += 1;
                }
            }
        }
        if self.params.fix_spurious {
            for id in self.deaths_at(t) {
                if self.fix_spurious(id, t) {
                    diag.nspurious_fixed += 1;
                    nfixed += 1;
                }
            }
        }
        diag.ndeaths_notfixed += self.milestones.deaths(t).len() as u64;

        let births = self.births_at(t);
        diag.nbirths_nohindsight += births.len() as u64;
        if self.params.fix_merged {
            for id in births {
                if self.milestones.births(t).contains(&id) && self.fix_merged(id, t) {
                    diag.nmerged_fixed += 1;
                    nfixed += 1;
                }
            }
        }
        if self.params.fix_lost {
            for id in self.births_at(t) {
                if self.fix_lost(id, t) {
                    diag.nlost_fixed += 1;
                    nfixed += 1;
                }
            }
        }
        diag.nbirths_notfixed += self.milestones.births(t).len() as u64;

        if nfixed > 0 {
            diag.nhindsight_fixed += 1;
            info!(frame = t, fixed = nfixed, "Hindsight corrections applied");
        }
    }

    fn deaths_at(&self, t: Frame) -> Vec<TrackId> {
        self.milestones.deaths(t).iter().copied().collect()
    }

    fn births_at(&self, t: Frame) -> Vec<TrackId> {
        self.milestones.births(t).iter().copied().collect()
    }
}
