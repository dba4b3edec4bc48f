//! Region of the image where targets can legitimately be.

use serde::{Deserialize, Serialize};

pub trait Arena {
    fn contains(&self, x: f64, y: f64) -> bool;
}

/// Every point is inside.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Arena for Unbounded {
    fn contains(&self, _x: f64, _y: f64) -> bool {
        true
    }
}

/// A circular dish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularArena {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

impl Arena for CircularArena {
    fn contains(&self, x: f64, y: f64) -> bool {
        let dx = x - self.cx;
        let dy = y - self.cy;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}
