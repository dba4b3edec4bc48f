//! Ellipse geometry for tracked targets.
//!
//! Every tracked target is summarised per frame by an ellipse: centre,
//! semi-axis lengths, orientation and the identity it is assigned to.

use glam::{DMat2, DVec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

use crate::track::TrackId;

/// Wrap an angle difference into `[-π/2, π/2)`.
///
/// Ellipse orientations are only defined modulo π, so this is the signed
/// smallest rotation taking one orientation onto another.
#[inline]
pub fn wrap_half_pi(angle: f64) -> f64 {
    (angle + FRAC_PI_2).rem_euclid(PI) - FRAC_PI_2
}

/// An oriented ellipse labelled with a track identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub x: f64,
    pub y: f64,
    /// Semi-major axis length in pixels.
    pub major: f64,
    /// Semi-minor axis length in pixels.
    pub minor: f64,
    /// Orientation of the major axis in radians.
    pub angle: f64,
    pub id: TrackId,
}

impl Ellipse {
    /// Create a new ellipse.
    #[inline]
    pub const fn new(x: f64, y: f64, major: f64, minor: f64, angle: f64, id: TrackId) -> Self {
        Self {
            x,
            y,
            major,
            minor,
            angle,
            id,
        }
    }

    /// Centre point.
    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn set_center(&mut self, center: DVec2) {
        self.x = center.x;
        self.y = center.y;
    }

    /// Same shape, different identity.
    #[inline]
    pub fn with_id(mut self, id: TrackId) -> Self {
        self.id = id;
        self
    }

    /// Euclidean distance between the two centres.
    #[inline]
    pub fn dist(&self, other: &Ellipse) -> f64 {
        self.center().distance(other.center())
    }

    /// True if any geometric field is NaN.
    pub fn is_nan(&self) -> bool {
        self.x.is_nan()
            || self.y.is_nan()
            || self.major.is_nan()
            || self.minor.is_nan()
            || self.angle.is_nan()
    }

    /// True if every geometric field is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.major.is_finite()
            && self.minor.is_finite()
            && self.angle.is_finite()
    }

    /// NaN fields or a centre at exactly the origin, which is what a
    /// collapsed clustering produces.
    pub fn is_degenerate(&self) -> bool {
        self.is_nan() || (self.x == 0.0 && self.y == 0.0)
    }

    /// Area of the ellipse.
    #[inline]
    pub fn area(&self) -> f64 {
        PI * self.major * self.minor
    }

    /// Check if a point lies inside or on the ellipse boundary.
    pub fn contains(&self, point: DVec2) -> bool {
        if self.major <= 0.0 || self.minor <= 0.0 {
            return false;
        }
        let d = point - self.center();
        let (s, c) = self.angle.sin_cos();
        let u = (d.x * c + d.y * s) / self.major;
        let v = (-d.x * s + d.y * c) / self.minor;
        u * u + v * v <= 1.0
    }

    /// Axis-aligned bounding box as `(min, max)` corners.
    pub fn bounding_box(&self) -> (DVec2, DVec2) {
        let (s, c) = self.angle.sin_cos();
        let half = DVec2::new(
            ((self.major * c).powi(2) + (self.minor * s).powi(2)).sqrt(),
            ((self.major * s).powi(2) + (self.minor * c).powi(2)).sqrt(),
        );
        (self.center() - half, self.center() + half)
    }

    /// Covariance of a uniformly filled ellipse with these axes.
    pub fn covariance(&self) -> DMat2 {
        let (s, c) = self.angle.sin_cos();
        let a = (self.major * 0.5).powi(2);
        let b = (self.minor * 0.5).powi(2);
        let off = c * s * (a - b);
        DMat2::from_cols(
            DVec2::new(c * c * a + s * s * b, off),
            DVec2::new(off, s * s * a + c * c * b),
        )
    }

    /// Ellipse whose uniform fill has the given centre and covariance.
    ///
    /// Returns `None` if the covariance is not positive semi-definite.
    pub fn from_moments(center: DVec2, cov: DMat2, id: TrackId) -> Option<Self> {
        let a = cov.x_axis.x;
        let b = cov.x_axis.y;
        let d = cov.y_axis.y;
        if !(a.is_finite() && b.is_finite() && d.is_finite()) {
            return None;
        }
        let mean = (a + d) * 0.5;
        let radius = (((a - d) * 0.5).powi(2) + b * b).sqrt();
        let lambda_major = mean + radius;
        let lambda_minor = mean - radius;
        if lambda_major <= 0.0 || lambda_minor < -1e-9 {
            return None;
        }
        let angle = 0.5 * (2.0 * b).atan2(a - d);
        Some(Self::new(
            center.x,
            center.y,
            2.0 * lambda_major.sqrt(),
            2.0 * lambda_minor.max(0.0).sqrt(),
            angle,
            id,
        ))
    }

    /// Fit an ellipse to weighted sample points by their first and second moments.
    pub fn from_weighted_points<I>(points: I, id: TrackId) -> Option<Self>
    where
        I: IntoIterator<Item = (DVec2, f64)>,
    {
        let mut total = 0.0;
        let mut sum = DVec2::ZERO;
        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (p, w) in points {
            total += w;
            sum += p * w;
            sxx += w * p.x * p.x;
            sxy += w * p.x * p.y;
            syy += w * p.y * p.y;
        }
        if total <= f64::EPSILON {
            return None;
        }
        let mean = sum / total;
        let cxx = sxx / total - mean.x * mean.x;
        let cxy = sxy / total - mean.x * mean.y;
        let cyy = syy / total - mean.y * mean.y;
        let cov = DMat2::from_cols(DVec2::new(cxx, cxy), DVec2::new(cxy, cyy));
        Self::from_moments(mean, cov, id)
    }
}
