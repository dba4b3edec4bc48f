//! Foreground evidence for a single frame.
//!
//! A `ForegroundFrame` pairs a connected-component label image with the
//! per-pixel foreground weight it was thresholded from. Label `0` is
//! background; components are numbered from `1`.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::ops::Range;

use crate::geometry::Ellipse;

/// A foreground pixel with its weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPixel {
    pub x: u32,
    pub y: u32,
    pub weight: f32,
}

impl WeightedPixel {
    #[inline]
    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x as f64, self.y as f64)
    }
}

/// Pixel indices spanning `[lo, hi]` along an axis of `len` pixels, clipped to the image.
fn pixel_span(lo: f64, hi: f64, len: u32) -> Range<i64> {
    let start = (lo.floor() as i64).max(0);
    let end = (hi.ceil() as i64).saturating_add(1).min(len as i64);
    start..end.max(start)
}

/// Label image and foreground weights for one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForegroundFrame {
    pub width: u32,
    pub height: u32,
    /// Connected-component label per pixel, row-major.
    pub labels: Vec<u32>,
    /// Foreground weight per pixel, row-major, nominally in `[0, 1]`.
    pub weights: Vec<f32>,
    pub num_components: u32,
}

impl ForegroundFrame {
    /// Label the 8-connected regions whose weight exceeds `threshold`.
    pub fn from_weights(width: u32, height: u32, weights: Vec<f32>, threshold: f32) -> Self {
        let len = (width as usize) * (height as usize);
        debug_assert_eq!(weights.len(), len);
        let mut labels = vec![0u32; len];
        let mut next_label = 0u32;
        let mut queue = VecDeque::new();

        for start in 0..len {
            if labels[start] != 0 || weights[start] <= threshold {
                continue;
            }
            next_label += 1;
            labels[start] = next_label;
            queue.push_back(start);

            // Region growing over the 8-neighbourhood.
            while let Some(idx) = queue.pop_front() {
                let x = (idx % width as usize) as i64;
                let y = (idx / width as usize) as i64;
                for dy in -1..=1i64 {
                    for dx in -1..=1i64 {
                        let nx = x + dx;
                        let ny = y + dy;
                        if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                            continue;
                        }
                        let n = (ny as usize) * width as usize + nx as usize;
                        if labels[n] == 0 && weights[n] > threshold {
                            labels[n] = next_label;
                            queue.push_back(n);
                        }
                    }
                }
            }
        }

        Self {
            width,
            height,
            labels,
            weights,
            num_components: next_label,
        }
    }

    /// Paint each ellipse with full foreground weight and label the result.
    pub fn rasterize(width: u32, height: u32, ellipses: &[Ellipse]) -> Self {
        let mut weights = vec![0.0f32; (width as usize) * (height as usize)];
        for ell in ellipses.iter().filter(|e| e.is_finite()) {
            let (min, max) = ell.bounding_box();
            for y in pixel_span(min.y, max.y, height) {
                for x in pixel_span(min.x, max.x, width) {
                    if ell.contains(DVec2::new(x as f64, y as f64)) {
                        weights[y as usize * width as usize + x as usize] = 1.0;
                    }
                }
            }
        }
        Self::from_weights(width, height, weights, 0.5)
    }

    /// Pixel ranges `(xs, ys)` covering `ell`'s bounding box inside the image.
    pub fn clip_box(&self, ell: &Ellipse) -> (Range<i64>, Range<i64>) {
        let (min, max) = ell.bounding_box();
        (
            pixel_span(min.x, max.x, self.width),
            pixel_span(min.y, max.y, self.height),
        )
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    /// Label at a pixel, `0` outside the image.
    #[inline]
    pub fn label_at(&self, x: i64, y: i64) -> u32 {
        self.index(x, y).map_or(0, |i| self.labels[i])
    }

    /// Foreground weight at a pixel, `0.0` outside the image.
    #[inline]
    pub fn weight_at(&self, x: i64, y: i64) -> f32 {
        self.index(x, y).map_or(0.0, |i| self.weights[i])
    }

    /// Component labels overlapping an ellipse, most-covered first.
    ///
    /// The label under the centre pixel always comes first when present.
    pub fn labels_under(&self, ell: &Ellipse) -> SmallVec<[u32; 4]> {
        let mut counts: SmallVec<[(u32, usize); 4]> = SmallVec::new();
        if !ell.is_finite() {
            return SmallVec::new();
        }
        let (xs, ys) = self.clip_box(ell);
        for y in ys {
            for x in xs.clone() {
                let label = self.label_at(x, y);
                if label == 0 || !ell.contains(DVec2::new(x as f64, y as f64)) {
                    continue;
                }
                match counts.iter_mut().find(|(l, _)| *l == label) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((label, 1)),
                }
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let mut out: SmallVec<[u32; 4]> = counts.into_iter().map(|(l, _)| l).collect();

        let center = self.label_at(ell.x.round() as i64, ell.y.round() as i64);
        if center != 0 {
            out.retain(|l| *l != center);
            out.insert(0, center);
        }
        out
    }

    /// The component that best explains an ellipse, if any.
    pub fn component_for(&self, ell: &Ellipse) -> Option<u32> {
        self.labels_under(ell).first().copied()
    }

    /// All pixels of one component with their weights.
    pub fn component_pixels(&self, label: u32) -> Vec<WeightedPixel> {
        self.pixels_where(|l| l == label)
    }

    /// All pixels belonging to any of the given components.
    pub fn pixels_in(&self, labels: &[u32]) -> Vec<WeightedPixel> {
        self.pixels_where(|l| labels.contains(&l))
    }

    fn pixels_where(&self, keep: impl Fn(u32) -> bool) -> Vec<WeightedPixel> {
        if self.width == 0 {
            return Vec::new();
        }
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l != 0 && keep(**l))
            .map(|(i, _)| WeightedPixel {
                x: (i % self.width as usize) as u32,
                y: (i / self.width as usize) as u32,
                weight: self.weights[i],
            })
            .collect()
    }
}
