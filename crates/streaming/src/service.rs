//! Single owner of the graph and asset cache.
//!
//! All graph state sits behind one mutex that is never held across an await.
//! Backend requests run as spawned tasks shared by every caller asking for the
//! same key, so at most one request per key is in flight and dropping a
//! waiter never cancels the request.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;

use formats::{ImageContract, SpatialImageContract};
use futures_util::FutureExt;
use futures_util::future::{Shared, try_join_all};
use graph::{Graph, GraphError, Node, NodeEdges, NodeFilter};
use parking_lot::Mutex;
use runtime::Metrics;
use tracing::{debug, warn};

use crate::cache::{AssetCache, CacheError};
use crate::cells::cells_around;
use crate::config::ViewerConfig;
use crate::provider::{AssetLoader, BoxFuture, DataProvider, NodeAssets, ProviderError};
use crate::residency::NodeState;

#[derive(Debug, Clone)]
pub enum ServiceError {
    Provider(ProviderError),
    Graph(GraphError),
    Cache(CacheError),
    /// The backend answered but did not return the requested record.
    Missing(String),
}

impl ServiceError {
    /// Transport failures may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Provider(e) if !e.is_not_found())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::Provider(e) => e.is_not_found(),
            ServiceError::Graph(GraphError::UnknownNode(_)) | ServiceError::Missing(_) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Provider(e) => write!(f, "provider error: {e}"),
            ServiceError::Graph(e) => write!(f, "graph error: {e}"),
            ServiceError::Cache(e) => write!(f, "cache error: {e}"),
            ServiceError::Missing(key) => write!(f, "backend returned no record for {key}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Provider(e) => Some(e),
            ServiceError::Graph(e) => Some(e),
            ServiceError::Cache(e) => Some(e),
            ServiceError::Missing(_) => None,
        }
    }
}

impl From<ProviderError> for ServiceError {
    fn from(e: ProviderError) -> Self {
        ServiceError::Provider(e)
    }
}

impl From<GraphError> for ServiceError {
    fn from(e: GraphError) -> Self {
        ServiceError::Graph(e)
    }
}

impl From<CacheError> for ServiceError {
    fn from(e: CacheError) -> Self {
        ServiceError::Cache(e)
    }
}

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, ServiceError>>>;

/// In-flight requests keyed by what they fetch.
struct InFlight<T> {
    fetches: BTreeMap<String, SharedFetch<T>>,
}

impl<T: Clone + Send + Sync + 'static> InFlight<T> {
    fn new() -> Self {
        Self {
            fetches: BTreeMap::new(),
        }
    }

    fn get(&self, key: &str) -> Option<SharedFetch<T>> {
        self.fetches.get(key).cloned()
    }

    /// Spawn `fetch` and register it under every key in `keys`.
    fn start(
        &mut self,
        keys: &[String],
        fetch: impl Future<Output = Result<T, ServiceError>> + Send + 'static,
    ) -> SharedFetch<T> {
        let handle = tokio::spawn(fetch);
        let shared = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(ServiceError::Provider(ProviderError::with_source(
                    "fetch task failed",
                    e,
                ))),
            }
        }
        .boxed()
        .shared();
        for key in keys {
            self.fetches.insert(key.clone(), shared.clone());
        }
        shared
    }

    fn finish(&mut self, keys: &[String]) {
        for key in keys {
            self.fetches.remove(key);
        }
    }
}

struct State {
    graph: Graph,
    cache: AssetCache,
    metrics: Metrics,
    keep: BTreeSet<String>,
    assets: InFlight<Arc<NodeAssets>>,
    cells: InFlight<()>,
    fill: InFlight<()>,
    full: InFlight<()>,
    sequences: InFlight<()>,
}

struct Inner {
    config: ViewerConfig,
    provider: Arc<dyn DataProvider>,
    loader: Arc<dyn AssetLoader>,
    state: Mutex<State>,
}

/// Loads metadata into the graph and assets into the cache on demand.
#[derive(Clone)]
pub struct GraphService {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for GraphService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphService").finish_non_exhaustive()
    }
}

impl GraphService {
    pub fn new(
        config: ViewerConfig,
        provider: Arc<dyn DataProvider>,
        loader: Arc<dyn AssetLoader>,
    ) -> Self {
        let state = State {
            graph: Graph::new(config.graph.clone()),
            cache: AssetCache::new(config.max_unused_nodes),
            metrics: Metrics::new(),
            keep: BTreeSet::new(),
            assets: InFlight::new(),
            cells: InFlight::new(),
            fill: InFlight::new(),
            full: InFlight::new(),
            sequences: InFlight::new(),
        };
        Self {
            inner: Arc::new(Inner {
                config,
                provider,
                loader,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.inner.config
    }

    /// Run `f` against the graph under the state lock.
    pub fn with_graph<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
        f(&self.inner.state.lock().graph)
    }

    pub fn node(&self, key: &str) -> Option<Node> {
        self.with_graph(|g| g.node(key).cloned())
    }

    pub fn edges(&self, key: &str) -> Option<NodeEdges> {
        self.with_graph(|g| g.edges(key).cloned())
    }

    pub fn node_state(&self, key: &str) -> NodeState {
        let state = self.inner.state.lock();
        if !state.graph.has_node(key) {
            return NodeState::Unknown;
        }
        state.cache.state(key)
    }

    pub fn metrics(&self) -> Metrics {
        self.inner.state.lock().metrics.clone()
    }

    pub fn set_user_token(&self, token: Option<String>) {
        self.inner.provider.set_user_token(token);
    }

    /// Replace the edge filter. Edge computations after this call see the new
    /// filter; computed spatial edges are dropped.
    pub fn set_filter(&self, filter: NodeFilter) {
        self.inner.state.lock().graph.set_filter(filter);
    }

    /// Ensure the node exists with spatial metadata.
    pub async fn cache_full(&self, key: &str) -> Result<(), ServiceError> {
        let fetch = {
            let mut state = self.inner.state.lock();
            match state.graph.node(key).map(Node::is_full) {
                Some(true) => return Ok(()),
                Some(false) => self.fill_fetch(&mut state, vec![key.to_string()]),
                None => match state.full.get(key) {
                    Some(shared) => {
                        state.metrics.inc_counter("metadata.coalesced", 1);
                        shared
                    }
                    None => self.start_full(&mut state, key),
                },
            }
        };
        fetch.await?;

        let state = self.inner.state.lock();
        match state.graph.node(key) {
            Some(node) if node.is_full() => Ok(()),
            _ => Err(ServiceError::Missing(key.to_string())),
        }
    }

    /// Ensure the sequence is stored.
    pub async fn cache_sequence(&self, sequence_id: &str) -> Result<(), ServiceError> {
        let fetch = {
            let mut state = self.inner.state.lock();
            if state.graph.has_sequence(sequence_id) {
                return Ok(());
            }
            match state.sequences.get(sequence_id) {
                Some(shared) => {
                    state.metrics.inc_counter("metadata.coalesced", 1);
                    shared
                }
                None => {
                    state.metrics.inc_counter("sequences.fetch", 1);
                    let inner = Arc::clone(&self.inner);
                    let keys = vec![sequence_id.to_string()];
                    let task_keys = keys.clone();
                    state.sequences.start(&keys, async move {
                        let result = inner.provider.get_sequences(&task_keys).await;
                        let mut state = inner.state.lock();
                        state.sequences.finish(&task_keys);
                        let sequences = result.inspect_err(|e| warn!("sequence fetch failed: {e}"))?;
                        state.graph.insert_sequences(&sequences);
                        Ok(())
                    })
                }
            }
        };
        fetch.await?;

        if self.with_graph(|g| g.has_sequence(sequence_id)) {
            Ok(())
        } else {
            Err(ServiceError::Missing(sequence_id.to_string()))
        }
    }

    /// Load every cell around the node and the spatial metadata of every
    /// node in its spatial area.
    pub async fn cache_spatial_area(&self, key: &str) -> Result<(), ServiceError> {
        let cell_fetches = {
            let mut state = self.inner.state.lock();
            let node = state
                .graph
                .node(key)
                .ok_or_else(|| GraphError::UnknownNode(key.to_string()))?;
            let cells = cells_around(
                node.lng_lat(),
                state.graph.config().spatial_area_threshold,
                self.inner.config.cell_zoom,
            );
            let mut fetches = Vec::new();
            for cell in cells {
                let cell_key = cell.key();
                if state.graph.has_cell(&cell_key) {
                    continue;
                }
                let fetch = match state.cells.get(&cell_key) {
                    Some(shared) => {
                        state.metrics.inc_counter("metadata.coalesced", 1);
                        shared
                    }
                    None => self.start_cell(&mut state, cell_key),
                };
                fetches.push(fetch);
            }
            fetches
        };
        try_join_all(cell_fetches).await?;

        let fill_fetches = {
            let mut state = self.inner.state.lock();
            let missing = state.graph.missing_fill(key)?;
            if missing.is_empty() {
                return Ok(());
            }
            state.metrics.record_histogram("fill.batch", missing.len() as i64);

            let mut fetches = Vec::new();
            let mut unclaimed = Vec::new();
            for k in missing {
                match state.fill.get(&k) {
                    Some(shared) => fetches.push(shared),
                    None => unclaimed.push(k),
                }
            }
            if !unclaimed.is_empty() {
                fetches.push(self.fill_fetch(&mut state, unclaimed));
            }
            fetches
        };
        try_join_all(fill_fetches).await?;
        Ok(())
    }

    /// Load everything edge computation needs, then compute the node's edges.
    /// Returns `false` when the node cannot have edges.
    pub async fn cache_edges(&self, key: &str) -> Result<bool, ServiceError> {
        if self.with_graph(|g| g.has_edges(key)) {
            return Ok(true);
        }
        self.cache_full(key).await?;
        let sequence_id = self
            .node(key)
            .map(|n| n.sequence_id().to_string())
            .ok_or_else(|| GraphError::UnknownNode(key.to_string()))?;
        self.cache_sequence(&sequence_id).await?;
        self.cache_spatial_area(key).await?;

        let mut state = self.inner.state.lock();
        let computed = state.graph.compute_edges(key)?;
        if computed {
            state.metrics.inc_counter("edges.computed", 1);
        }
        Ok(computed)
    }

    /// Load the spatial metadata, then the image and mesh of a node.
    /// Concurrent calls for the same key share one fetch; the node becomes
    /// cached only when both assets arrive.
    pub async fn cache_node(&self, key: &str) -> Result<Arc<NodeAssets>, ServiceError> {
        if let Some(assets) = self.inner.state.lock().cache.get(key) {
            return Ok(assets);
        }
        // The mesh url is part of the spatial metadata.
        self.cache_full(key).await?;

        let fetch = {
            let mut state = self.inner.state.lock();
            if let Some(assets) = state.cache.get(key) {
                return Ok(assets);
            }
            match state.assets.get(key) {
                Some(shared) => {
                    state.metrics.inc_counter("assets.coalesced", 1);
                    shared
                }
                None => {
                    let node = state
                        .graph
                        .node(key)
                        .ok_or_else(|| GraphError::UnknownNode(key.to_string()))?;
                    let mesh_url = node.mesh_url().map(str::to_string);
                    state.cache.register(key);
                    state.cache.begin_loading(key)?;
                    state.metrics.inc_counter("assets.fetch", 1);

                    let inner = Arc::clone(&self.inner);
                    let keys = vec![key.to_string()];
                    let task_key = key.to_string();
                    state.assets.start(&keys, async move {
                        let loaded = async {
                            let image = inner.loader.load_image(&task_key).await?;
                            let mesh = inner.loader.load_mesh(&task_key, mesh_url.as_deref()).await?;
                            Ok::<_, ProviderError>(Arc::new(NodeAssets { image, mesh }))
                        }
                        .await;

                        let mut state = inner.state.lock();
                        state.assets.finish(std::slice::from_ref(&task_key));
                        match loaded {
                            Ok(assets) => {
                                state.cache.mark_cached(&task_key, Arc::clone(&assets))?;
                                let cached = state.cache.cached_len() as i64;
                                state.metrics.set_gauge("cache.cached", cached);
                                Ok(assets)
                            }
                            Err(e) => {
                                warn!("asset fetch for {task_key} failed: {e}");
                                state.cache.mark_failed(&task_key)?;
                                Err(e.into())
                            }
                        }
                    })
                }
            }
        };
        fetch.await
    }

    /// Nodes the viewer is showing or animating between. They are never
    /// evicted; other cached nodes are evicted beyond the configured bound.
    pub fn set_trajectory<I, S>(&self, keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.inner.state.lock();
        state.keep = keys.into_iter().map(Into::into).collect();
        for key in state.keep.clone() {
            let _ = state.cache.touch(&key);
        }
        let keep = state.keep.clone();
        let evicted = state.cache.evict_unused(&keep);
        if !evicted.is_empty() {
            debug!("evicted {} cached nodes", evicted.len());
            state.metrics.inc_counter("assets.evicted", evicted.len() as u64);
            let cached = state.cache.cached_len() as i64;
            state.metrics.set_gauge("cache.cached", cached);
        }
        evicted
    }

    fn start_full(&self, state: &mut State, key: &str) -> SharedFetch<()> {
        state.metrics.inc_counter("full.fetch", 1);
        let inner = Arc::clone(&self.inner);
        let keys = vec![key.to_string()];
        let task_keys = keys.clone();
        state.full.start(&keys, async move {
            let result = inner.provider.get_full_images(&task_keys).await;
            let mut state = inner.state.lock();
            state.full.finish(&task_keys);
            let images = result.inspect_err(|e| warn!("full image fetch failed: {e}"))?;
            insert_full(&mut state, &images)
        })
    }

    fn start_cell(&self, state: &mut State, cell_key: String) -> SharedFetch<()> {
        state.metrics.inc_counter("cells.fetch", 1);
        let inner = Arc::clone(&self.inner);
        let keys = vec![cell_key];
        let task_keys = keys.clone();
        state.cells.start(&keys, async move {
            let result = inner.provider.get_core_images(&task_keys[0]).await;
            let mut state = inner.state.lock();
            state.cells.finish(&task_keys);
            let cores = result.inspect_err(|e| warn!("cell {} fetch failed: {e}", task_keys[0]))?;
            state.metrics.record_histogram("cells.batch", cores.len() as i64);
            state.graph.insert_cell(task_keys[0].clone(), &cores);
            for core in &cores {
                state.cache.register(&core.id);
            }
            Ok(())
        })
    }

    fn fill_fetch(&self, state: &mut State, keys: Vec<String>) -> SharedFetch<()> {
        if let [key] = keys.as_slice()
            && let Some(shared) = state.fill.get(key)
        {
            state.metrics.inc_counter("metadata.coalesced", 1);
            return shared;
        }
        state.metrics.inc_counter("fill.fetch", 1);
        let inner = Arc::clone(&self.inner);
        let task_keys = keys.clone();
        state.fill.start(&keys, async move {
            let result = inner.provider.get_fill_images(&task_keys).await;
            let mut state = inner.state.lock();
            state.fill.finish(&task_keys);
            let spatial = result.inspect_err(|e| warn!("fill fetch failed: {e}"))?;
            make_full(&mut state, &spatial)
        })
    }
}

fn insert_full(state: &mut State, images: &[ImageContract]) -> Result<(), ServiceError> {
    state.graph.insert_full(images)?;
    for image in images {
        state.cache.register(&image.id);
    }
    state.metrics.inc_counter("nodes.full", images.len() as u64);
    Ok(())
}

fn make_full(state: &mut State, spatial: &[SpatialImageContract]) -> Result<(), ServiceError> {
    for record in spatial {
        // Records for nodes not in the graph are ignored.
        if state.graph.has_node(&record.id) {
            state.graph.make_full(record)?;
        }
    }
    state.metrics.inc_counter("nodes.full", spatial.len() as u64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{GraphService, ServiceError};
    use crate::config::ViewerConfig;
    use crate::memory::MemoryProvider;
    use crate::residency::NodeState;
    use formats::Dataset;
    use graph::{FilterExpr, NavigationDirection, NodeFilter};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn fixture() -> Dataset {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../tools/assets/demo_dataset.json");
        Dataset::load(path).unwrap()
    }

    fn service(delay: Option<Duration>, max_unused: usize) -> (GraphService, Arc<MemoryProvider>) {
        let config = ViewerConfig {
            max_unused_nodes: max_unused,
            ..ViewerConfig::default()
        };
        let mut provider = MemoryProvider::new(fixture(), config.cell_zoom);
        if let Some(delay) = delay {
            provider = provider.with_delay(delay);
        }
        let provider = Arc::new(provider);
        (
            GraphService::new(config, provider.clone(), provider.clone()),
            provider,
        )
    }

    fn first_key(provider: &MemoryProvider) -> String {
        provider.dataset().sequences[0].image_ids[0].clone()
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_asset_requests_share_one_fetch() {
        let (service, provider) = service(Some(Duration::from_millis(50)), 30);
        let key = first_key(&provider);
        service.cache_full(&key).await.unwrap();

        let (a, b) = tokio::join!(service.cache_node(&key), service.cache_node(&key));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(provider.calls("load_image"), 1);
        assert_eq!(provider.calls("load_mesh"), 1);
        assert_eq!(service.metrics().counter("assets.coalesced"), 1);
        assert_eq!(service.node_state(&key), NodeState::Cached);
        assert_eq!(service.metrics().gauge("cache.cached"), Some(1));

        // Cached assets are served without another fetch.
        service.cache_node(&key).await.unwrap();
        assert_eq!(provider.calls("load_image"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn uncached_key_loads_metadata_then_assets_once() {
        let (service, provider) = service(Some(Duration::from_millis(50)), 30);
        let key = "harbor-1";
        assert_eq!(service.node_state(key), NodeState::Unknown);

        let (a, b) = tokio::join!(service.cache_node(key), service.cache_node(key));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(provider.calls("get_full_images"), 1);
        assert_eq!(provider.calls("load_image"), 1);
        assert_eq!(provider.calls("load_mesh"), 1);
        assert_eq!(service.node_state(key), NodeState::Cached);
    }

    #[tokio::test]
    async fn cache_node_on_a_fresh_service_fetches_metadata() {
        let (service, provider) = service(None, 30);
        let assets = service.cache_node("harbor-1").await.unwrap();

        let node = service.node("harbor-1").unwrap();
        assert!(node.is_full());
        assert!(node.mesh_url().is_some());
        assert!(!assets.mesh.is_empty());
        assert_eq!(provider.calls("get_full_images"), 1);
        assert_eq!(service.node_state("harbor-1"), NodeState::Cached);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_waiter_does_not_cancel_the_fetch() {
        let (service, provider) = service(Some(Duration::from_millis(50)), 30);
        let key = first_key(&provider);
        service.cache_full(&key).await.unwrap();

        let waiter = {
            let service = service.clone();
            let key = key.clone();
            tokio::spawn(async move { service.cache_node(&key).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        waiter.abort();
        assert_eq!(service.node_state(&key), NodeState::AssetsLoading);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(service.node_state(&key), NodeState::Cached);
        service.cache_node(&key).await.unwrap();
        assert_eq!(provider.calls("load_image"), 1);
    }

    #[tokio::test]
    async fn transport_failures_propagate_without_poisoning() {
        let (service, provider) = service(None, 30);
        let key = first_key(&provider);
        service.cache_full(&key).await.unwrap();

        provider.set_offline(true);
        let err = service.cache_node(&key).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(service.node_state(&key), NodeState::MetadataLoaded);

        provider.set_offline(false);
        service.cache_node(&key).await.unwrap();
        assert_eq!(service.node_state(&key), NodeState::Cached);
    }

    #[tokio::test]
    async fn unknown_keys_are_missing() {
        let (service, _) = service(None, 30);
        let err = service.cache_full("no-such-image").await.unwrap_err();
        assert!(matches!(err, ServiceError::Missing(_)));
        assert!(err.is_not_found());
        assert_eq!(service.node_state("no-such-image"), NodeState::Unknown);
        assert!(service.cache_node("no-such-image").await.is_err());
    }

    #[tokio::test]
    async fn edges_load_area_sequence_and_metadata() {
        let (service, provider) = service(None, 30);
        let key = first_key(&provider);
        assert!(service.cache_edges(&key).await.unwrap());

        let edges = service.edges(&key).unwrap();
        assert!(edges.is_complete());
        assert!(edges.find(NavigationDirection::Next).is_some());
        assert_eq!(service.metrics().counter("edges.computed"), 1);
        assert!(provider.calls("get_core_images") >= 1);
        assert_eq!(provider.calls("get_sequences"), 1);
        let cells = service.metrics().histogram("cells.batch").unwrap();
        assert_eq!(cells.count, provider.calls("get_core_images"));
        assert!(cells.max >= 1);

        // A second request is answered from the graph.
        assert!(service.cache_edges(&key).await.unwrap());
        assert_eq!(service.metrics().counter("edges.computed"), 1);
    }

    #[tokio::test]
    async fn filter_change_forces_recomputation() {
        let (service, provider) = service(None, 30);
        let key = first_key(&provider);
        service.cache_edges(&key).await.unwrap();

        let expr = FilterExpr::from_json_str(r#"["==", "id", "nothing"]"#).unwrap();
        service.set_filter(NodeFilter::from_expr(expr));
        assert!(!service.edges(&key).unwrap().is_complete());

        service.cache_edges(&key).await.unwrap();
        let edges = service.edges(&key).unwrap();
        assert!(edges.spatial.as_ref().unwrap().is_empty());
        assert!(edges.find(NavigationDirection::Next).is_some());
    }

    #[tokio::test]
    async fn trajectory_nodes_survive_eviction() {
        let (service, provider) = service(None, 1);
        let keys: Vec<String> = provider
            .dataset()
            .images
            .iter()
            .take(4)
            .map(|i| i.id.clone())
            .collect();
        for key in &keys {
            service.cache_full(key).await.unwrap();
            service.cache_node(key).await.unwrap();
        }

        let evicted = service.set_trajectory(keys[..2].to_vec());
        // Two unused nodes, one allowed: the older one goes.
        assert_eq!(evicted, vec![keys[2].clone()]);
        assert_eq!(service.node_state(&keys[0]), NodeState::Cached);
        assert_eq!(service.node_state(&keys[1]), NodeState::Cached);
        assert_eq!(service.node_state(&keys[2]), NodeState::Evicted);
        assert_eq!(service.metrics().counter("assets.evicted"), 1);

        // Evicted nodes keep their metadata and can be loaded again.
        assert!(service.node(&keys[2]).unwrap().is_full());
        service.cache_node(&keys[2]).await.unwrap();
        assert_eq!(service.node_state(&keys[2]), NodeState::Cached);
    }

    #[tokio::test]
    async fn user_token_reaches_the_provider() {
        let (service, provider) = service(None, 30);
        service.set_user_token(Some("secret".into()));
        assert_eq!(provider.user_token().as_deref(), Some("secret"));
    }
}
