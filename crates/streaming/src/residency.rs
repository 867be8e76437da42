/// Lifecycle of one node as seen by the service.
///
/// Unknown → MetadataLoaded → AssetsLoading → Cached → Evicted → AssetsLoading
///
/// Metadata is never dropped, so a node does not return to `Unknown` or
/// `MetadataLoaded` once its assets were requested.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeState {
    Unknown,
    MetadataLoaded,
    AssetsLoading,
    Cached,
    Evicted,
}

impl NodeState {
    pub fn can_transition_to(self, next: NodeState) -> bool {
        use NodeState::*;
        matches!(
            (self, next),
            (Unknown, MetadataLoaded)
                | (MetadataLoaded, AssetsLoading)
                | (AssetsLoading, Cached)
                // A failed fetch leaves the node loadable again.
                | (AssetsLoading, MetadataLoaded)
                | (AssetsLoading, Evicted)
                | (Cached, Evicted)
                | (Evicted, AssetsLoading)
        )
    }

    pub fn has_assets(self) -> bool {
        self == NodeState::Cached
    }
}
