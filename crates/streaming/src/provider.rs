// Methods return boxed futures for dyn-compatibility; implementations must be
// `Send + Sync` for use across async tasks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use formats::{CoreImageContract, ImageContract, MeshData, SequenceContract, SpatialImageContract};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Network, IO or decoding failure. Retrying may succeed.
    Transport,
    /// The backend has no record for the request.
    NotFound,
}

/// Error type for provider and loader operations.
///
/// Cloneable so that every waiter on a shared fetch receives the failure.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl ProviderError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Transport,
            message: message.into(),
            source: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::NotFound,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: ProviderErrorKind::Transport,
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ProviderErrorKind::NotFound
    }
}

/// Image and sequence metadata backend.
pub trait DataProvider: Send + Sync {
    /// Core records of every image inside one cell.
    fn get_core_images<'a>(
        &'a self,
        cell_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CoreImageContract>, ProviderError>>;

    /// Spatial metadata for `keys`.
    fn get_fill_images<'a>(
        &'a self,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<SpatialImageContract>, ProviderError>>;

    /// Complete records for `keys`, used for images not reached through cells.
    fn get_full_images<'a>(
        &'a self,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<ImageContract>, ProviderError>>;

    fn get_sequences<'a>(
        &'a self,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<SequenceContract>, ProviderError>>;

    fn set_user_token(&self, token: Option<String>);
}

/// Decoded image pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBitmap {
    pub width: u32,
    pub height: u32,
    /// RGBA8 rows, top to bottom.
    pub pixels: Vec<u8>,
}

impl ImageBitmap {
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// Everything a node needs before it can be displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAssets {
    pub image: ImageBitmap,
    /// Empty when the image has no reconstruction mesh.
    pub mesh: MeshData,
}

/// Image and mesh backend.
pub trait AssetLoader: Send + Sync {
    fn load_image<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<ImageBitmap, ProviderError>>;

    /// Mesh for `key`; `url` is the mesh location from the spatial metadata.
    fn load_mesh<'a>(
        &'a self,
        key: &'a str,
        url: Option<&'a str>,
    ) -> BoxFuture<'a, Result<MeshData, ProviderError>>;
}
