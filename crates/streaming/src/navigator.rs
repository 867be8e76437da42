//! Move-to-key and move-in-direction requests with supersession.
//!
//! Every request takes a new request id. A request whose id is no longer the
//! latest when it would complete resolves with [`NavigationError::Aborted`].
//! Aborting only stops delivery to the caller; shared fetches keep running.

use std::future::Future;
use std::sync::Arc;

use graph::{NavigationDirection, Node};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::service::{GraphService, ServiceError};

#[derive(Debug, Clone)]
pub enum NavigationError {
    /// A newer request replaced this one.
    Aborted { key: Option<String> },
    /// No such image, or no edge in the requested direction.
    NotFound {
        key: String,
        direction: Option<NavigationDirection>,
    },
    Service(ServiceError),
}

impl NavigationError {
    pub fn is_abort(&self) -> bool {
        matches!(self, NavigationError::Aborted { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NavigationError::NotFound { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, NavigationError::Service(e) if e.is_retryable())
    }
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationError::Aborted { key: Some(key) } => {
                write!(f, "navigation to {key} was aborted")
            }
            NavigationError::Aborted { key: None } => write!(f, "navigation was aborted"),
            NavigationError::NotFound {
                key,
                direction: Some(direction),
            } => write!(f, "no {} edge from {key}", direction.as_str()),
            NavigationError::NotFound {
                key,
                direction: None,
            } => write!(f, "image {key} does not exist"),
            NavigationError::Service(e) => write!(f, "navigation failed: {e}"),
        }
    }
}

impl std::error::Error for NavigationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavigationError::Service(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ServiceError> for NavigationError {
    fn from(e: ServiceError) -> Self {
        NavigationError::Service(e)
    }
}

/// Resolves navigation requests to loaded nodes.
#[derive(Clone)]
pub struct Navigator {
    service: GraphService,
    request: Arc<watch::Sender<u64>>,
    current: Arc<Mutex<Option<String>>>,
}

impl Navigator {
    pub fn new(service: GraphService) -> Self {
        let (request, _) = watch::channel(0);
        Self {
            service,
            request: Arc::new(request),
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn service(&self) -> &GraphService {
        &self.service
    }

    pub fn current_key(&self) -> Option<String> {
        self.current.lock().clone()
    }

    /// Supersede any pending request without starting a new one.
    pub fn abort(&self) {
        let id = self.begin();
        debug!("navigation request {id} aborts pending requests");
    }

    /// Load `key` with its assets and make it current.
    pub async fn move_to_key(&self, key: &str) -> Result<Node, NavigationError> {
        let id = self.begin();
        self.navigate(id, key).await
    }

    /// Follow the edge in `direction` from the current node.
    pub async fn move_dir(&self, direction: NavigationDirection) -> Result<Node, NavigationError> {
        let id = self.begin();
        let Some(from) = self.current_key() else {
            return Err(NavigationError::NotFound {
                key: String::new(),
                direction: Some(direction),
            });
        };

        let service = self.service.clone();
        let source = from.clone();
        let target = self
            .abortable(id, None, async move {
                service.cache_edges(&source).await?;
                Ok(service
                    .with_graph(|g| g.edge(&source, direction).map(|e| e.target.clone())))
            })
            .await?;

        match target {
            Some(target) => self.navigate(id, &target).await,
            None => Err(NavigationError::NotFound {
                key: from,
                direction: Some(direction),
            }),
        }
    }

    fn begin(&self) -> u64 {
        let mut id = 0;
        self.request.send_modify(|current| {
            *current += 1;
            id = *current;
        });
        id
    }

    async fn navigate(&self, id: u64, key: &str) -> Result<Node, NavigationError> {
        let service = self.service.clone();
        let target = key.to_string();
        let node = self
            .abortable(id, Some(key), async move {
                service.cache_full(&target).await?;
                service.cache_node(&target).await?;
                service
                    .node(&target)
                    .ok_or_else(|| ServiceError::Missing(target.clone()))
            })
            .await
            .map_err(|e| match e {
                NavigationError::Service(e) if e.is_not_found() => NavigationError::NotFound {
                    key: key.to_string(),
                    direction: None,
                },
                other => other,
            })?;

        // Completion and the id check happen under one lock.
        let mut current = self.current.lock();
        if *self.request.borrow() != id {
            debug!("navigation to {key} superseded after loading");
            return Err(NavigationError::Aborted {
                key: Some(key.to_string()),
            });
        }
        *current = Some(key.to_string());
        Ok(node)
    }

    /// Drive `work` until it finishes or a newer request is made.
    async fn abortable<T>(
        &self,
        id: u64,
        key: Option<&str>,
        work: impl Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, NavigationError> {
        let superseded = superseded(self.request.subscribe(), id);
        tokio::select! {
            biased;
            _ = superseded => {
                debug!("navigation request {id} aborted");
                Err(NavigationError::Aborted { key: key.map(str::to_string) })
            }
            result = work => result.map_err(NavigationError::from),
        }
    }
}

async fn superseded(mut rx: watch::Receiver<u64>, id: u64) {
    loop {
        if *rx.borrow_and_update() != id {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Navigator;
    use crate::config::ViewerConfig;
    use crate::memory::MemoryProvider;
    use crate::residency::NodeState;
    use crate::service::GraphService;
    use formats::Dataset;
    use graph::NavigationDirection;
    use std::sync::Arc;
    use std::time::Duration;

    fn navigator(delay: Option<Duration>) -> (Navigator, Arc<MemoryProvider>) {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../tools/assets/demo_dataset.json");
        let config = ViewerConfig::default();
        let mut provider = MemoryProvider::new(Dataset::load(path).unwrap(), config.cell_zoom);
        if let Some(delay) = delay {
            provider = provider.with_delay(delay);
        }
        let provider = Arc::new(provider);
        let service = GraphService::new(config, provider.clone(), provider.clone());
        (Navigator::new(service), provider)
    }

    fn sequence_keys(provider: &MemoryProvider) -> Vec<String> {
        provider.dataset().sequences[0].image_ids.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn newer_request_aborts_pending_one() {
        let (navigator, provider) = navigator(Some(Duration::from_millis(50)));
        let keys = sequence_keys(&provider);

        let first = {
            let navigator = navigator.clone();
            let key = keys[0].clone();
            tokio::spawn(async move { navigator.move_to_key(&key).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let node = navigator.move_to_key(&keys[1]).await.unwrap();
        assert_eq!(node.key(), keys[1]);

        let err = first.await.unwrap().unwrap_err();
        assert!(err.is_abort());
        assert!(!err.is_retryable());
        assert_eq!(navigator.current_key().as_deref(), Some(keys[1].as_str()));

        // The superseded metadata fetch still completes for other consumers.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(navigator.service().node(&keys[0]).is_some_and(|n| n.is_full()));
        assert_eq!(navigator.service().node_state(&keys[1]), NodeState::Cached);
        assert_eq!(navigator.current_key().as_deref(), Some(keys[1].as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_abort_cancels_delivery() {
        let (navigator, provider) = navigator(Some(Duration::from_millis(50)));
        let key = sequence_keys(&provider)[0].clone();

        let pending = {
            let navigator = navigator.clone();
            let key = key.clone();
            tokio::spawn(async move { navigator.move_to_key(&key).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        navigator.abort();
        assert!(pending.await.unwrap().unwrap_err().is_abort());
        assert_eq!(navigator.current_key(), None);
    }

    #[tokio::test]
    async fn moves_along_edges() {
        let (navigator, provider) = navigator(None);
        let keys = sequence_keys(&provider);

        navigator.move_to_key(&keys[0]).await.unwrap();
        let next = navigator.move_dir(NavigationDirection::Next).await.unwrap();
        assert_eq!(next.key(), keys[1]);
        let back = navigator.move_dir(NavigationDirection::Prev).await.unwrap();
        assert_eq!(back.key(), keys[0]);
    }

    #[tokio::test]
    async fn missing_edges_and_images_are_not_found() {
        let (navigator, provider) = navigator(None);
        let keys = sequence_keys(&provider);

        let err = navigator.move_dir(NavigationDirection::Next).await.unwrap_err();
        assert!(err.is_not_found());

        navigator.move_to_key(&keys[0]).await.unwrap();
        let err = navigator.move_dir(NavigationDirection::Prev).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(navigator.current_key().as_deref(), Some(keys[0].as_str()));

        let err = navigator.move_to_key("no-such-image").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(navigator.current_key().as_deref(), Some(keys[0].as_str()));
    }

    #[tokio::test]
    async fn transport_errors_are_retryable() {
        let (navigator, provider) = navigator(None);
        let key = sequence_keys(&provider)[0].clone();

        provider.set_offline(true);
        let err = navigator.move_to_key(&key).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(!err.is_abort());

        provider.set_offline(false);
        assert_eq!(navigator.move_to_key(&key).await.unwrap().key(), key);
    }
}
