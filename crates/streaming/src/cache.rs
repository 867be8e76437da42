use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::provider::NodeAssets;
use crate::residency::NodeState;

#[derive(Debug, Clone)]
struct CacheEntry {
    state: NodeState,
    assets: Option<Arc<NodeAssets>>,
    bytes: usize,
    last_used_tick: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    UnknownKey(String),
    InvalidTransition {
        key: String,
        from: NodeState,
        to: NodeState,
    },
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::UnknownKey(key) => write!(f, "unknown cache key: {key}"),
            CacheError::InvalidTransition { key, from, to } => {
                write!(f, "invalid state change for {key}: {from:?} -> {to:?}")
            }
        }
    }
}

impl std::error::Error for CacheError {}

/// Residency of node assets with a soft bound on unused entries.
///
/// Notes on determinism:
/// - Entries are keyed in a `BTreeMap` for stable traversal order.
/// - Eviction is LRU by `last_used_tick`, with a tie-break by key ordering.
#[derive(Debug)]
pub struct AssetCache {
    max_unused: usize,
    tick: u64,
    entries: BTreeMap<String, CacheEntry>,
}

impl AssetCache {
    pub fn new(max_unused: usize) -> Self {
        Self {
            max_unused,
            tick: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn max_unused(&self) -> usize {
        self.max_unused
    }

    pub fn state(&self, key: &str) -> NodeState {
        self.entries
            .get(key)
            .map_or(NodeState::Unknown, |e| e.state)
    }

    /// Record that metadata for `key` exists. No-op for known keys.
    pub fn register(&mut self, key: &str) {
        if self.entries.contains_key(key) {
            return;
        }
        self.tick += 1;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                state: NodeState::MetadataLoaded,
                assets: None,
                bytes: 0,
                last_used_tick: self.tick,
            },
        );
    }

    pub fn begin_loading(&mut self, key: &str) -> Result<(), CacheError> {
        self.transition(key, NodeState::AssetsLoading)
    }

    /// Store loaded assets. Only complete assets make a node cached.
    pub fn mark_cached(&mut self, key: &str, assets: Arc<NodeAssets>) -> Result<(), CacheError> {
        self.transition(key, NodeState::Cached)?;
        self.tick += 1;
        if let Some(entry) = self.entries.get_mut(key) {
            entry.bytes = assets.image.byte_len() + assets.mesh.vertices.len() * 4 + assets.mesh.faces.len() * 4;
            entry.assets = Some(assets);
            entry.last_used_tick = self.tick;
        }
        Ok(())
    }

    /// A failed load leaves the node loadable again with nothing stored.
    pub fn mark_failed(&mut self, key: &str) -> Result<(), CacheError> {
        self.transition(key, NodeState::MetadataLoaded)
    }

    /// Assets of a cached node; marks the entry as recently used.
    pub fn get(&mut self, key: &str) -> Option<Arc<NodeAssets>> {
        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(key)?;
        let assets = entry.assets.clone()?;
        entry.last_used_tick = tick;
        Some(assets)
    }

    pub fn touch(&mut self, key: &str) -> Result<(), CacheError> {
        self.tick += 1;
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| CacheError::UnknownKey(key.to_string()))?;
        entry.last_used_tick = self.tick;
        Ok(())
    }

    pub fn evict(&mut self, key: &str) -> Result<(), CacheError> {
        self.transition(key, NodeState::Evicted)?;
        if let Some(entry) = self.entries.get_mut(key) {
            entry.assets = None;
            entry.bytes = 0;
        }
        Ok(())
    }

    pub fn cached_len(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.state == NodeState::Cached)
            .count()
    }

    pub fn resident_bytes(&self) -> usize {
        self.entries.values().map(|e| e.bytes).sum()
    }

    /// Evict least recently used cached entries outside `keep` until at most
    /// `max_unused` of them remain. Entries in `keep` are never evicted.
    pub fn evict_unused(&mut self, keep: &BTreeSet<String>) -> Vec<String> {
        let mut unused: Vec<(u64, &String)> = self
            .entries
            .iter()
            .filter(|(k, e)| e.state == NodeState::Cached && !keep.contains(*k))
            .map(|(k, e)| (e.last_used_tick, k))
            .collect();
        if unused.len() <= self.max_unused {
            return Vec::new();
        }

        unused.sort();
        let excess = unused.len() - self.max_unused;
        let victims: Vec<String> = unused
            .into_iter()
            .take(excess)
            .map(|(_, k)| k.clone())
            .collect();

        for key in &victims {
            // Victims are cached entries, so the transition is valid.
            let _ = self.evict(key);
        }
        victims
    }

    fn transition(&mut self, key: &str, to: NodeState) -> Result<(), CacheError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| CacheError::UnknownKey(key.to_string()))?;
        if !entry.state.can_transition_to(to) {
            return Err(CacheError::InvalidTransition {
                key: key.to_string(),
                from: entry.state,
                to,
            });
        }
        entry.state = to;
        Ok(())
    }
}
