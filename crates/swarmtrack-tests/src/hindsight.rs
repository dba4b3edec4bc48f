//! Integration tests for hindsight sessions.
//!
//! Exercises swarmtrack-core geometry and foreground together with the
//! swarmtrack-hindsight orchestrator, frame by frame.

use swarmtrack_core::{Ellipse, FrameBound, TrackId};
use swarmtrack_hindsight::{
    Diagnostics, Hindsight, HindsightParams, InMemoryTrackStore, RasterizedObservations, TrackView,
};

// ── Helpers ────────────────────────────────────────────────────

fn ell(id: u32, x: f64, y: f64) -> Ellipse {
    Ellipse::new(x, y, 4.0, 2.0, 0.0, TrackId(id))
}

/// One target crossing the image, plus a phantom on frame 8 only.
fn single_target_with_phantom() -> Vec<Vec<Ellipse>> {
    (0..20)
        .map(|t| {
            let mut frame = vec![ell(0, 10.0 + 3.0 * t as f64, 30.0)];
            if t == 8 {
                frame.push(ell(1, 70.0, 10.0));
            }
            frame
        })
        .collect()
}

fn run(frames: &[Vec<Ellipse>], params: HindsightParams) -> (Hindsight<InMemoryTrackStore>, Diagnostics) {
    let fg = RasterizedObservations::new(100, 60, 0, frames);
    let mut session = Hindsight::new(InMemoryTrackStore::new(), params).with_components(fg);
    let mut diag = Diagnostics::new();
    for frame in frames {
        session.append_frame(frame.clone(), &mut diag);
    }
    (session, diag)
}

// ── Spurious detections ────────────────────────────────────────

#[test]
fn phantom_is_removed_end_to_end() {
    let (session, diag) = run(&single_target_with_phantom(), HindsightParams::default());
    let store = session.store();

    assert_eq!(diag.nspurious_fixed, 1);
    assert_eq!(diag.nframes_analyzed, 20);
    for t in 0..20 {
        assert_eq!(store.ids_at(t).into_iter().collect::<Vec<_>>(), vec![TrackId(0)], "frame {t}");
    }
    assert!(store.is_recycled(TrackId(1)));
    assert!(session.milestones().is_consistent());
}

#[test]
fn phantom_survives_with_fixer_disabled() {
    let params = HindsightParams {
        fix_spurious: false,
        ..Default::default()
    };
    let (session, diag) = run(&single_target_with_phantom(), params);
    assert_eq!(diag.nspurious_fixed, 0);
    assert!(session.store().has(8, TrackId(1)));
    assert_eq!(session.milestones().death_frame(TrackId(1)), FrameBound::At(9));
    assert_eq!(diag.ndeaths_notfixed, 1);
    assert_eq!(diag.nbirths_notfixed, 2);
}

#[test]
fn long_lived_target_is_not_spurious() {
    let frames: Vec<Vec<Ellipse>> = (0..20)
        .map(|t| {
            let mut frame = vec![ell(0, 10.0, 30.0)];
            if (4..14).contains(&t) {
                frame.push(ell(1, 80.0, 10.0));
            }
            frame
        })
        .collect();
    let (session, diag) = run(&frames, HindsightParams::default());
    assert_eq!(diag.total_fixed(), 0);
    assert!((4..14).all(|t| session.store().has(t, TrackId(1))));
}

// ── Fixer order ────────────────────────────────────────────────

#[test]
fn short_fragment_is_folded_back_before_spurious_removal() {
    // target 1 breaks into halves 1 and 2 on 3..=5; fragment 2 lives 3 frames
    let blob = |id: u32, x: f64, major: f64| Ellipse::new(x, 30.0, major, 3.0, 0.0, TrackId(id));
    let frames: Vec<Vec<Ellipse>> = (0..10)
        .map(|t| match t {
            3..=5 => vec![blob(1, 27.0, 3.0), blob(2, 33.0, 3.0)],
            _ => vec![blob(1, 30.0, 6.0)],
        })
        .collect();
    let (session, diag) = run(&frames, HindsightParams::default());

    assert_eq!(diag.nsplits_fixed, 1);
    assert_eq!(diag.nspurious_fixed, 0);
    for t in 0..10 {
        assert_eq!(session.store().ids_at(t).into_iter().collect::<Vec<_>>(), vec![TrackId(1)], "frame {t}");
    }
    assert!(session.milestones().is_consistent());
}

#[test]
fn merged_newborn_is_reclustered_before_lost_bridging() {
    // targets 1 and 2 tracked as one blob under 2 on 8..=10, then 3 appears
    // where 1 would be
    let blob = |id: u32, x: f64, major: f64| Ellipse::new(x, 30.0, major, 2.0, 0.0, TrackId(id));
    let frames: Vec<Vec<Ellipse>> = (0..13)
        .map(|t| match t {
            0..=7 => vec![blob(1, 40.0, 4.0), blob(2, 50.0, 4.0)],
            8..=10 => vec![blob(2, 45.0, 9.0)],
            _ => vec![blob(2, 50.0, 4.0), blob(3, 40.0, 4.0)],
        })
        .collect();
    let (session, diag) = run(&frames, HindsightParams::default());
    let store = session.store();

    assert_eq!(diag.nmerged_fixed, 1);
    assert_eq!(diag.nlost_fixed, 0);
    assert_eq!(diag.nsplits_fixed, 0);
    for t in 0..13 {
        assert_eq!(store.ids_at(t).into_iter().collect::<Vec<_>>(), vec![TrackId(1), TrackId(2)], "frame {t}");
    }
    for t in 8..=10 {
        assert!(store.get(t, TrackId(1)).is_some_and(|e| e.x < 45.0));
        assert!(store.get(t, TrackId(2)).is_some_and(|e| e.x > 45.0));
    }
    assert!(store.is_recycled(TrackId(3)));
}

// ── Clean scenes ───────────────────────────────────────────────

#[test]
fn well_separated_crowd_is_untouched() {
    let frames: Vec<Vec<Ellipse>> = (0..30)
        .map(|t| {
            (0..4)
                .map(|id| ell(id, 10.0 + t as f64, 8.0 + 14.0 * id as f64))
                .collect()
        })
        .collect();
    let (session, diag) = run(&frames, HindsightParams::default());

    assert_eq!(diag.total_fixed(), 0);
    assert_eq!(diag.nhindsight_fixed, 0);
    assert_eq!(diag.nbirths_nohindsight, 4);
    assert_eq!(diag.ndeaths_nohindsight, 0);
    for (t, frame) in frames.iter().enumerate() {
        for e in frame {
            assert_eq!(session.store().get(t, e.id), Some(*e));
        }
    }
}

#[test]
fn counters_balance() {
    let (_, diag) = run(&single_target_with_phantom(), HindsightParams::default());
    let deaths_fixed = diag.nsplits_fixed + diag.nspurious_fixed;
    let births_fixed = diag.nmerged_fixed + diag.nlost_fixed;
    assert_eq!(diag.ndeaths_nohindsight, diag.ndeaths_notfixed + deaths_fixed);
    assert_eq!(diag.nbirths_nohindsight, diag.nbirths_notfixed + births_fixed);
}
