//! Cost of explaining two ellipses as a single target.

use smallvec::SmallVec;
use swarmtrack_core::{Ellipse, ForegroundFrame};

/// Scores merging two ellipses into one.
///
/// Returns the penalty and the merged ellipse, or `None` when the pair
/// cannot be evaluated against the foreground.
pub trait MergePenalty {
    fn merge_penalty(&self, e1: &Ellipse, e2: &Ellipse, fg: &ForegroundFrame) -> Option<(f64, Ellipse)>;
}

/// Penalises background the merged ellipse would have to cover.
///
/// The merged ellipse is fitted to the weighted pixels of every component
/// under either input. Each pixel inside the merged ellipse that neither
/// input covers and that is not part of those components costs
/// `1 - weight`. Pixels outside the image cost nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForegroundMergePenalty;

impl MergePenalty for ForegroundMergePenalty {
    fn merge_penalty(&self, e1: &Ellipse, e2: &Ellipse, fg: &ForegroundFrame) -> Option<(f64, Ellipse)> {
        let mut labels: SmallVec<[u32; 4]> = SmallVec::new();
        for label in fg.labels_under(e1).into_iter().chain(fg.labels_under(e2)) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        if labels.is_empty() {
            return None;
        }

        let pixels = fg.pixels_in(&labels);
        let merged = Ellipse::from_weighted_points(
            pixels.iter().map(|p| (p.position(), p.weight as f64)),
            e1.id,
        )?;

        let (xs, ys) = fg.clip_box(&merged);
        let mut penalty = 0.0;
        for y in ys {
            for x in xs.clone() {
                let p = glam::DVec2::new(x as f64, y as f64);
                if !merged.contains(p) || e1.contains(p) || e2.contains(p) {
                    continue;
                }
                if labels.contains(&fg.label_at(x, y)) {
                    continue;
                }
                penalty += (1.0 - fg.weight_at(x, y) as f64).max(0.0);
            }
        }
        Some((penalty, merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmtrack_core::TrackId;

    #[test]
    fn test_one_blob_costs_little() {
        // two halves of one elongated target
        let whole = Ellipse::new(30.0, 20.0, 10.0, 4.0, 0.0, TrackId(0));
        let fg = ForegroundFrame::rasterize(64, 40, &[whole]);
        let left = Ellipse::new(25.0, 20.0, 5.0, 4.0, 0.0, TrackId(1));
        let right = Ellipse::new(35.0, 20.0, 5.0, 4.0, 0.0, TrackId(2));
        let (cost, merged) = ForegroundMergePenalty.merge_penalty(&left, &right, &fg).unwrap();
        assert!(cost < 5.0, "cost {cost}");
        assert!((merged.x - 30.0).abs() < 0.5);
        assert_eq!(merged.id, TrackId(1));
    }

    #[test]
    fn test_distant_blobs_cost_more() {
        let a = Ellipse::new(12.0, 20.0, 4.0, 3.0, 0.0, TrackId(1));
        let b = Ellipse::new(50.0, 20.0, 4.0, 3.0, 0.0, TrackId(2));
        let fg = ForegroundFrame::rasterize(64, 40, &[a, b]);
        let (far, _) = ForegroundMergePenalty.merge_penalty(&a, &b, &fg).unwrap();

        let whole = Ellipse::new(30.0, 20.0, 10.0, 4.0, 0.0, TrackId(0));
        let fg_one = ForegroundFrame::rasterize(64, 40, &[whole]);
        let left = Ellipse::new(25.0, 20.0, 5.0, 4.0, 0.0, TrackId(1));
        let right = Ellipse::new(35.0, 20.0, 5.0, 4.0, 0.0, TrackId(2));
        let (near, _) = ForegroundMergePenalty.merge_penalty(&left, &right, &fg_one).unwrap();
        assert!(far > near + 20.0, "far {far} near {near}");
    }

    #[test]
    fn test_oversized_ellipse_scan_is_clipped() {
        let a = Ellipse::new(12.0, 20.0, 4.0, 3.0, 0.0, TrackId(1));
        let fg = ForegroundFrame::rasterize(64, 40, &[a]);
        let huge = Ellipse::new(12.0, 20.0, 1e15, 1e15, 0.0, TrackId(2));
        let (cost, _) = ForegroundMergePenalty.merge_penalty(&a, &huge, &fg).unwrap();
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_background_only_is_none() {
        let fg = ForegroundFrame::rasterize(16, 16, &[]);
        let e = Ellipse::new(8.0, 8.0, 3.0, 2.0, 0.0, TrackId(1));
        assert!(ForegroundMergePenalty.merge_penalty(&e, &e, &fg).is_none());
    }
}
