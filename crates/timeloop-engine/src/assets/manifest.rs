use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Asset manifest mapping logical sprite names to files.
/// Loaded from a JSON file at runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Prefix joined in front of every sprite path.
    #[serde(default)]
    pub base_path: String,
    /// Named sprites: logical name → file.
    #[serde(default)]
    pub sprites: BTreeMap<String, SpriteDescriptor>,
}

/// Describes a single sprite image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteDescriptor {
    /// Path relative to `base_path` (e.g., "player.png").
    pub path: String,
    /// Optional alternate image used while the entity is active
    /// (pressed button, open door).
    #[serde(default)]
    pub active_path: Option<String>,
}

impl AssetManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Full path for a sprite, if the manifest names it.
    pub fn path_of(&self, name: &str) -> Option<String> {
        let desc = self.sprites.get(name)?;
        if self.base_path.is_empty() {
            Some(desc.path.clone())
        } else {
            Some(format!("{}/{}", self.base_path.trim_end_matches('/'), desc.path))
        }
    }
}
