//! Splitting one foreground blob into two ellipses.

use glam::{DMat2, DVec2};
use swarmtrack_core::{Ellipse, WeightedPixel};

/// Fits two ellipses to the pixels of one blob.
///
/// `guesses` seed the two components; the returned ellipses are in the same
/// order and carry the guesses' identities. `None` means the split failed.
pub trait BlobSplitter {
    fn split(&self, pixels: &[WeightedPixel], guesses: &[Ellipse; 2]) -> Option<[Ellipse; 2]>;
}

/// Weighted two-component Gaussian mixture fitted by expectation-maximisation.
#[derive(Debug, Clone)]
pub struct GaussianMixtureSplitter {
    pub max_iterations: usize,
    /// Stop once no mean moves further than this (pixels).
    pub tolerance: f64,
    /// A component holding less than this fraction of the total weight has collapsed.
    pub min_component_fraction: f64,
    /// Added to each covariance diagonal to keep it invertible.
    pub covariance_floor: f64,
}

impl Default for GaussianMixtureSplitter {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-3,
            min_component_fraction: 0.05,
            covariance_floor: 0.1,
        }
    }
}

struct Component {
    mean: DVec2,
    cov: DMat2,
    mix: f64,
}

impl Component {
    /// Log of `mix * N(p | mean, cov)` up to the shared `2π` constant.
    fn log_density(&self, inv: &DMat2, log_det: f64, p: DVec2) -> f64 {
        let d = p - self.mean;
        self.mix.ln() - 0.5 * log_det - 0.5 * d.dot(*inv * d)
    }
}

impl GaussianMixtureSplitter {
    fn regularise(&self, cov: DMat2) -> DMat2 {
        cov + DMat2::from_diagonal(DVec2::splat(self.covariance_floor))
    }
}

impl BlobSplitter for GaussianMixtureSplitter {
    fn split(&self, pixels: &[WeightedPixel], guesses: &[Ellipse; 2]) -> Option<[Ellipse; 2]> {
        if pixels.len() < 2 || guesses.iter().any(Ellipse::is_nan) {
            return None;
        }
        let total: f64 = pixels.iter().map(|p| p.weight as f64).sum();
        if total <= 0.0 {
            return None;
        }

        let mut comps = guesses.map(|g| Component {
            mean: g.center(),
            cov: self.regularise(g.covariance()),
            mix: 0.5,
        });
        let mut resp = vec![[0.0f64; 2]; pixels.len()];

        for _ in 0..self.max_iterations {
            // E-step
            if comps.iter().any(|c| c.cov.determinant() <= 0.0) {
                return None;
            }
            let params: Vec<(DMat2, f64)> = comps
                .iter()
                .map(|c| (c.cov.inverse(), c.cov.determinant().ln()))
                .collect();
            for (r, px) in resp.iter_mut().zip(pixels) {
                let p = px.position();
                let l0 = comps[0].log_density(&params[0].0, params[0].1, p);
                let l1 = comps[1].log_density(&params[1].0, params[1].1, p);
                let top = l0.max(l1);
                let e0 = (l0 - top).exp();
                let e1 = (l1 - top).exp();
                let norm = e0 + e1;
                *r = [e0 / norm, e1 / norm];
            }

            // M-step
            let mut shift: f64 = 0.0;
            for (k, comp) in comps.iter_mut().enumerate() {
                let mut wk = 0.0;
                let mut sum = DVec2::ZERO;
                for (r, px) in resp.iter().zip(pixels) {
                    let w = px.weight as f64 * r[k];
                    wk += w;
                    sum += px.position() * w;
                }
                if wk < self.min_component_fraction * total {
                    return None;
                }
                let mean = sum / wk;
                let mut cxx = 0.0;
                let mut cxy = 0.0;
                let mut cyy = 0.0;
                for (r, px) in resp.iter().zip(pixels) {
                    let w = px.weight as f64 * r[k];
                    let d = px.position() - mean;
                    cxx += w * d.x * d.x;
                    cxy += w * d.x * d.y;
                    cyy += w * d.y * d.y;
                }
                let cov = DMat2::from_cols(DVec2::new(cxx, cxy), DVec2::new(cxy, cyy)) * (1.0 / wk);
                shift = shift.max(mean.distance(comp.mean));
                comp.mean = mean;
                comp.cov = self.regularise(cov);
                comp.mix = wk / total;
            }
            if shift < self.tolerance {
                break;
            }
        }

        let a = Ellipse::from_moments(comps[0].mean, comps[0].cov, guesses[0].id)?;
        let b = Ellipse::from_moments(comps[1].mean, comps[1].cov, guesses[1].id)?;
        Some([a, b])
    }
}
