//! Thresholds and switches for the hindsight fixers.

use serde::{Deserialize, Serialize};
use std::path::Path;
use swarmtrack_core::{Ellipse, Result, SwarmTrackError};

/// Configuration of the four fixers.
///
/// Lengths are in frames, distances in pixels. Missing JSON fields take
/// their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HindsightParams {
    /// Longest lifespan still treated as a spurious detection.
    pub spurious_max_length: usize,
    /// How far back the lost fixer searches for a matching death.
    pub lost_max_length: usize,
    /// How far back the merged fixer searches for the merge point.
    pub merged_max_length: usize,
    /// Largest clustering cost the merged fixer accepts.
    pub merged_max_distance: f64,
    /// Longest window the split fixer will merge over.
    pub split_max_length: usize,
    /// Largest merge penalty the split fixer accepts.
    pub split_max_cost: f64,
    /// Largest single-frame jump of a target.
    pub max_jump: f64,
    /// Half the largest gap the lost fixer bridges.
    pub max_jump_split: f64,
    /// Scale applied to summed major axes when deciding two targets are close.
    pub max_dcenters_extra: f64,

    pub fix_split: bool,
    pub fix_spurious: bool,
    pub fix_merged: bool,
    pub fix_lost: bool,
}

impl Default for HindsightParams {
    fn default() -> Self {
        Self {
            spurious_max_length: 5,
            lost_max_length: 50,
            merged_max_length: 50,
            merged_max_distance: 20.0,
            split_max_length: 5,
            split_max_cost: 40.0,
            max_jump: 100.0,
            max_jump_split: 50.0,
            max_dcenters_extra: 1.5,
            fix_split: true,
            fix_spurious: true,
            fix_merged: true,
            fix_lost: true,
        }
    }
}

impl HindsightParams {
    /// Parameters with every fixer switched off.
    pub fn disabled() -> Self {
        Self {
            fix_split: false,
            fix_spurious: false,
            fix_merged: false,
            fix_lost: false,
            ..Self::default()
        }
    }

    /// Check every threshold is usable.
    pub fn validate(&self) -> Result<()> {
        let distances = [
            ("merged_max_distance", self.merged_max_distance),
            ("split_max_cost", self.split_max_cost),
            ("max_jump", self.max_jump),
            ("max_jump_split", self.max_jump_split),
        ];
        for (name, value) in distances {
            if value.is_nan() || value < 0.0 {
                return Err(SwarmTrackError::InvalidParameter(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !self.max_dcenters_extra.is_finite() || self.max_dcenters_extra <= 0.0 {
            return Err(SwarmTrackError::InvalidParameter(format!(
                "max_dcenters_extra must be positive, got {}",
                self.max_dcenters_extra
            )));
        }
        Ok(())
    }

    /// Largest centre distance at which two targets count as touching.
    #[inline]
    pub fn compute_maxdcenters(&self, a: &Ellipse, b: &Ellipse) -> f64 {
        self.max_dcenters_extra * (a.major + b.major)
    }

    /// Parse and validate parameters from JSON.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let params: Self = serde_json::from_slice(data)
            .map_err(|e| SwarmTrackError::Serialization(format!("Invalid hindsight parameters: {}", e)))?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| SwarmTrackError::Serialization(format!("Failed to serialize parameters: {}", e)))
    }

    /// Load parameters from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}
