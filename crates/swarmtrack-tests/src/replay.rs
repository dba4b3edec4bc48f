//! Integration tests for replaying recorded track files.

use std::collections::BTreeSet;
use swarmtrack_core::{Ellipse, TrackId};
use swarmtrack_hindsight::{replay, HindsightParams, TrackFile};

// ── Helpers ────────────────────────────────────────────────────

fn ids(frame: &[Ellipse]) -> BTreeSet<u32> {
    frame.iter().map(|e| e.id.0).collect()
}

/// One target moving right, lost on frames 10..=12 and re-found as identity 2.
fn lost_recording() -> TrackFile {
    let frames = (0..=20)
        .map(|t| {
            let e = |id: u32| Ellipse::new(10.0 + 2.0 * t as f64, 30.0, 4.0, 2.0, 0.0, TrackId(id));
            match t {
                0..=9 => vec![e(1)],
                10..=12 => vec![],
                _ => vec![e(2)],
            }
        })
        .collect();
    TrackFile::new(80, 60, frames)
}

/// One target seen whole, then as two halves, then whole under the second label.
fn split_recording() -> TrackFile {
    let e = |id: u32, x: f64, major: f64| Ellipse::new(x, 30.0, major, 3.0, 0.0, TrackId(id));
    let frames = (0..10)
        .map(|t| match t {
            0..=2 => vec![e(1, 30.0, 6.0)],
            3..=5 => vec![e(1, 27.0, 3.0), e(2, 33.0, 3.0)],
            _ => vec![e(2, 30.0, 6.0)],
        })
        .collect();
    TrackFile::new(64, 60, frames)
}

/// Two targets tracked as one blob on 5..=7, separated again as 2 and 3.
fn merged_recording() -> TrackFile {
    let e = |id: u32, x: f64, major: f64| Ellipse::new(x, 30.0, major, 2.0, 0.0, TrackId(id));
    let frames = (0..13)
        .map(|t| match t {
            0..=4 => vec![e(1, 40.0, 4.0), e(2, 50.0, 4.0)],
            5..=7 => vec![e(2, 45.0, 9.0)],
            _ => vec![e(2, 50.0, 4.0), e(3, 40.0, 4.0)],
        })
        .collect();
    TrackFile::new(100, 60, frames)
}

// ── Lost targets ───────────────────────────────────────────────

#[test]
fn lost_target_is_bridged() {
    let (output, diag) = replay(&lost_recording(), HindsightParams::default());

    assert_eq!(diag.nlost_fixed, 1);
    assert_eq!(output.frames.len(), 21);
    for (t, frame) in output.frames.iter().enumerate() {
        assert_eq!(ids(frame), BTreeSet::from([1]), "frame {t}");
    }
    let gap: Vec<f64> = output.frames[10..=12].iter().map(|f| f[0].x).collect();
    for (x, expected) in gap.iter().zip([30.0, 32.0, 34.0]) {
        assert!((x - expected).abs() < 1e-9, "got {x}, expected {expected}");
    }
}

#[test]
fn lost_fixer_disabled_keeps_both_labels() {
    let params = HindsightParams {
        fix_lost: false,
        ..Default::default()
    };
    let (output, diag) = replay(&lost_recording(), params);
    assert_eq!(diag.nlost_fixed, 0);
    assert!(output.frames[10..=12].iter().all(|f| f.is_empty()));
    assert_eq!(ids(&output.frames[15]), BTreeSet::from([2]));
}

// ── Split detections ───────────────────────────────────────────

#[test]
fn split_target_keeps_one_identity() {
    let (output, diag) = replay(&split_recording(), HindsightParams::default());

    assert_eq!(diag.nsplits_fixed, 1);
    for (t, frame) in output.frames.iter().enumerate() {
        assert_eq!(ids(frame), BTreeSet::from([1]), "frame {t}");
    }
}

// ── Merged targets ─────────────────────────────────────────────

#[test]
fn merged_blob_is_reclustered() {
    let params = HindsightParams {
        fix_split: false,
        spurious_max_length: 2,
        ..Default::default()
    };
    let (output, diag) = replay(&merged_recording(), params);

    assert_eq!(diag.nmerged_fixed, 1);
    for (t, frame) in output.frames.iter().enumerate() {
        assert_eq!(ids(frame), BTreeSet::from([1, 2]), "frame {t}");
    }
    for frame in &output.frames[5..=7] {
        let x = |id: u32| frame.iter().find(|e| e.id.0 == id).map(|e| e.x);
        assert!(x(1).is_some_and(|x| x < 45.0));
        assert!(x(2).is_some_and(|x| x > 45.0));
    }
}

// ── File format ────────────────────────────────────────────────

#[test]
fn replay_through_json() {
    let bytes = lost_recording().to_json().unwrap();
    let input = TrackFile::from_json(&bytes).unwrap();
    let (output, _) = replay(&input, HindsightParams::default());

    let value: serde_json::Value = serde_json::from_slice(&output.to_json().unwrap()).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["width"], 80);
    assert_eq!(value["frames"].as_array().map(Vec::len), Some(21));
    assert!(value.get("arena").is_none());
}

#[test]
fn clean_recording_is_unchanged() {
    let frames = (0..15)
        .map(|t| {
            (0..3)
                .map(|id| Ellipse::new(10.0 + t as f64, 10.0 + 20.0 * id as f64, 4.0, 2.0, 0.0, TrackId(id)))
                .collect()
        })
        .collect();
    let input = TrackFile::new(60, 60, frames);
    let (output, diag) = replay(&input, HindsightParams::default());
    assert_eq!(diag.total_fixed(), 0);
    assert_eq!(output, input);
}
