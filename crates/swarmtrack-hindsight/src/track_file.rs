//! Track file persistence with versioning and migration.
//!
//! Tracks are stored as JSON: one list of ellipses per frame, plus the image
//! size needed to rebuild foreground evidence and an optional arena.

use serde::{Deserialize, Serialize};
use std::path::Path;
use swarmtrack_core::{Ellipse, Frame, Result, SwarmTrackError};

use crate::arena::CircularArena;
use crate::store::InMemoryTrackStore;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Versioned track file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFile {
    pub version: u32,
    /// Image width in pixels. `0` means unknown.
    pub width: u32,
    /// Image height in pixels. `0` means unknown.
    pub height: u32,
    /// Index of the first frame.
    #[serde(default)]
    pub first_frame: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arena: Option<CircularArena>,
    pub frames: Vec<Vec<Ellipse>>,
}

impl TrackFile {
    pub fn new(width: u32, height: u32, frames: Vec<Vec<Ellipse>>) -> Self {
        Self {
            version: CURRENT_VERSION,
            width,
            height,
            first_frame: 0,
            arena: None,
            frames,
        }
    }

    /// Snapshot a store's frames, keeping this file's geometry.
    pub fn with_store(&self, store: &InMemoryTrackStore) -> Self {
        Self {
            version: CURRENT_VERSION,
            frames: store
                .iter_frames()
                .map(|(_, tracks)| tracks.values().copied().collect())
                .collect(),
            ..self.clone()
        }
    }

    /// Build a track store from the recorded frames.
    pub fn to_store(&self) -> InMemoryTrackStore {
        InMemoryTrackStore::from_frames(self.first_frame, self.frames.clone())
    }

    /// Image size, falling back to the extent of the tracked ellipses when unknown.
    ///
    /// Ellipses with non-finite geometry do not count towards the extent.
    pub fn canvas_size(&self) -> (u32, u32) {
        if self.width > 0 && self.height > 0 {
            return (self.width, self.height);
        }
        let (mut w, mut h) = (1.0f64, 1.0f64);
        for ell in self.frames.iter().flatten().filter(|e| e.is_finite()) {
            let (_, max) = ell.bounding_box();
            w = w.max(max.x.ceil() + 1.0);
            h = h.max(max.y.ceil() + 1.0);
        }
        (w as u32, h as u32)
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| SwarmTrackError::Serialization(format!("Failed to serialize tracks: {}", e)))
    }

    /// Deserialize from JSON bytes, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| SwarmTrackError::Serialization(format!("Invalid JSON: {}", e)))?;

        let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        if version > CURRENT_VERSION {
            return Err(SwarmTrackError::Serialization(format!(
                "Track file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version)?;
        serde_json::from_value(migrated)
            .map_err(|e| SwarmTrackError::Serialization(format!("Failed to parse tracks: {}", e)))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let data = self.to_json()?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}

/// Apply sequential migrations from `from_version` to `CURRENT_VERSION`.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 was a bare list of frames
                if data.is_array() {
                    data = serde_json::json!({
                        "version": 1,
                        "width": 0,
                        "height": 0,
                        "frames": data,
                    });
                } else if let Some(obj) = data.as_object_mut() {
                    obj.insert("version".to_string(), serde_json::json!(1));
                }
                version = 1;
            }
            _ => {
                return Err(SwarmTrackError::Serialization(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }

    Ok(data)
}
