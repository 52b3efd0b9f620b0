use std::collections::{BTreeMap, HashSet};

use crate::assets::manifest::AssetManifest;

/// Opaque index of a loaded sprite, shared with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetHandle(pub u32);

/// Name → handle lookup built from an [`AssetManifest`].
///
/// A missing sprite is not an error: callers draw a flat colour instead.
/// Each missing name is logged once.
#[derive(Debug, Default)]
pub struct AssetCache {
    handles: BTreeMap<String, AssetHandle>,
    warned: HashSet<String>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles follow the manifest's name order, which the host mirrors when
    /// it loads the images.
    pub fn from_manifest(manifest: &AssetManifest) -> Self {
        let handles = manifest
            .sprites
            .keys()
            .enumerate()
            .map(|(i, name)| (name.clone(), AssetHandle(i as u32)))
            .collect();
        Self {
            handles,
            warned: HashSet::new(),
        }
    }

    pub fn resolve(&mut self, name: &str) -> Option<AssetHandle> {
        if let Some(handle) = self.handles.get(name) {
            return Some(*handle);
        }
        if self.warned.insert(name.to_string()) {
            log::warn!("missing sprite '{}', drawing fallback colour", name);
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Names that failed to resolve so far.
    pub fn misses(&self) -> usize {
        self.warned.len()
    }
}
