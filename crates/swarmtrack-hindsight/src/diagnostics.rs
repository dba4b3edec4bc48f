//! Counters describing what the hindsight pass saw and fixed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-wide counters. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub nframes_analyzed: u64,
    /// Deaths seen before any fixer ran.
    pub ndeaths_nohindsight: u64,
    /// Births seen before any fixer ran.
    pub nbirths_nohindsight: u64,
    pub nsplits_fixed: u64,
    pub nspurious_fixed: u64,
    pub nmerged_fixed: u64,
    pub nlost_fixed: u64,
    /// Deaths still standing after every fixer ran.
    pub ndeaths_notfixed: u64,
    /// Births still standing after every fixer ran.
    pub nbirths_notfixed: u64,
    /// Frames on which at least one fixer succeeded.
    pub nhindsight_fixed: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total corrections applied across all fixers.
    pub fn total_fixed(&self) -> u64 {
        self.nsplits_fixed + self.nspurious_fixed + self.nmerged_fixed + self.nlost_fixed
    }

    /// Counters as `(name, value)` pairs in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> {
        [
            ("nframes_analyzed", self.nframes_analyzed),
            ("ndeaths_nohindsight", self.ndeaths_nohindsight),
            ("nbirths_nohindsight", self.nbirths_nohindsight),
            ("nsplits_fixed", self.nsplits_fixed),
            ("nspurious_fixed", self.nspurious_fixed),
            ("nmerged_fixed", self.nmerged_fixed),
            ("nlost_fixed", self.nlost_fixed),
            ("ndeaths_notfixed", self.ndeaths_notfixed),
            ("nbirths_notfixed", self.nbirths_notfixed),
            ("nhindsight_fixed", self.nhindsight_fixed),
        ]
        .into_iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{:<20} {}", name, value)?;
        }
        Ok(())
    }
}
