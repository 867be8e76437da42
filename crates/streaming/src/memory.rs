use std::collections::BTreeMap;
use std::time::Duration;

use formats::{
    CoreImageContract, Dataset, ImageContract, MeshData, SequenceContract, SpatialImageContract,
    decode_mesh, encode_mesh,
};
use foundation::geo::LngLat;
use parking_lot::Mutex;
use runtime::Metrics;

use crate::cells::CellId;
use crate::provider::{AssetLoader, BoxFuture, DataProvider, ImageBitmap, ProviderError};

const THUMBNAIL_MAX: u32 = 64;

/// Serves a [`Dataset`] through the provider and loader interfaces.
///
/// Every call is counted under `provider.<method>` so tests can assert how
/// many backend requests were made. An optional delay makes calls suspend.
pub struct MemoryProvider {
    dataset: Dataset,
    cells: BTreeMap<String, Vec<usize>>,
    meshes: BTreeMap<String, Vec<u8>>,
    delay: Option<Duration>,
    offline: Mutex<bool>,
    token: Mutex<Option<String>>,
    calls: Mutex<Metrics>,
}

impl MemoryProvider {
    pub fn new(dataset: Dataset, cell_zoom: u8) -> Self {
        let mut cells: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, image) in dataset.images.iter().enumerate() {
            let position = image
                .computed_geometry
                .unwrap_or(image.geometry);
            let cell = CellId::containing(LngLat::new(position.lng, position.lat), cell_zoom);
            cells.entry(cell.key()).or_default().push(i);
        }
        let meshes = dataset
            .meshes
            .iter()
            .map(|(k, mesh)| (k.clone(), encode_mesh(mesh)))
            .collect();
        Self {
            dataset,
            cells,
            meshes,
            delay: None,
            offline: Mutex::new(false),
            token: Mutex::new(None),
            calls: Mutex::new(Metrics::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// While offline every call fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }

    pub fn calls(&self, method: &str) -> u64 {
        self.calls.lock().counter(&format!("provider.{method}"))
    }

    pub fn user_token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    async fn enter(&self, method: &str) -> Result<(), ProviderError> {
        self.calls.lock().inc_counter(format!("provider.{method}"), 1);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if *self.offline.lock() {
            return Err(ProviderError::transport(format!("{method}: backend unreachable")));
        }
        Ok(())
    }

    fn images<'a>(&'a self, keys: &'a [String]) -> impl Iterator<Item = &'a ImageContract> + 'a {
        keys.iter().filter_map(|k| self.dataset.image(k))
    }
}

impl DataProvider for MemoryProvider {
    fn get_core_images<'a>(
        &'a self,
        cell_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CoreImageContract>, ProviderError>> {
        Box::pin(async move {
            self.enter("get_core_images").await?;
            Ok(self
                .cells
                .get(cell_id)
                .map(|indices| {
                    indices
                        .iter()
                        .map(|i| self.dataset.images[*i].core())
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    fn get_fill_images<'a>(
        &'a self,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<SpatialImageContract>, ProviderError>> {
        Box::pin(async move {
            self.enter("get_fill_images").await?;
            Ok(self.images(keys).map(ImageContract::spatial).collect())
        })
    }

    fn get_full_images<'a>(
        &'a self,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<ImageContract>, ProviderError>> {
        Box::pin(async move {
            self.enter("get_full_images").await?;
            Ok(self.images(keys).cloned().collect())
        })
    }

    fn get_sequences<'a>(
        &'a self,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<SequenceContract>, ProviderError>> {
        Box::pin(async move {
            self.enter("get_sequences").await?;
            Ok(keys
                .iter()
                .filter_map(|k| self.dataset.sequence(k))
                .cloned()
                .collect())
        })
    }

    fn set_user_token(&self, token: Option<String>) {
        *self.token.lock() = token;
    }
}

impl AssetLoader for MemoryProvider {
    fn load_image<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<ImageBitmap, ProviderError>> {
        Box::pin(async move {
            self.enter("load_image").await?;
            let image = self
                .dataset
                .image(key)
                .ok_or_else(|| ProviderError::not_found(format!("no image {key}")))?;
            Ok(thumbnail(image))
        })
    }

    fn load_mesh<'a>(
        &'a self,
        key: &'a str,
        _url: Option<&'a str>,
    ) -> BoxFuture<'a, Result<MeshData, ProviderError>> {
        Box::pin(async move {
            self.enter("load_mesh").await?;
            match self.meshes.get(key) {
                Some(bytes) => decode_mesh(bytes)
                    .map_err(|e| ProviderError::with_source(format!("bad mesh for {key}"), e)),
                None => Ok(MeshData::default()),
            }
        })
    }
}

/// Flat gray placeholder with the image's aspect ratio.
fn thumbnail(image: &ImageContract) -> ImageBitmap {
    let (w, h) = (image.width.max(1), image.height.max(1));
    let scale = THUMBNAIL_MAX as f64 / w.max(h) as f64;
    let width = ((w as f64 * scale).round() as u32).max(1);
    let height = ((h as f64 * scale).round() as u32).max(1);
    ImageBitmap {
        width,
        height,
        pixels: vec![128; (width * height * 4) as usize],
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryProvider;
    use crate::cells::CellId;
    use crate::provider::{AssetLoader, DataProvider};
    use formats::{Dataset, MeshData};
    use foundation::geo::LngLat;

    fn dataset() -> Dataset {
        Dataset::from_json_str(
            r#"{
                "images": [
                    {"id": "a", "geometry": {"lat": 55.6, "lng": 13.0}, "sequence_id": "s",
                     "captured_at": 0, "compass_angle": 0.0, "width": 640, "height": 480},
                    {"id": "b", "geometry": {"lat": 55.60004, "lng": 13.0}, "sequence_id": "s",
                     "captured_at": 1, "compass_angle": 0.0, "width": 480, "height": 640}
                ],
                "sequences": [{"id": "s", "image_ids": ["a", "b"]}],
                "meshes": {"a": {"vertices": [0.0, 0.0, 5.0, 1.0, 0.0, 5.0, 0.0, 1.0, 5.0], "faces": [0, 1, 2]}}
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn serves_cells_and_metadata() {
        let provider = MemoryProvider::new(dataset(), 17);
        let cell = CellId::containing(LngLat::new(13.0, 55.6), 17).key();
        let cores = provider.get_core_images(&cell).await.unwrap();
        assert!(cores.iter().any(|c| c.id == "a"));
        assert!(provider.get_core_images("0/0/0").await.unwrap().is_empty());

        let keys = vec!["b".to_string(), "missing".to_string()];
        let fill = provider.get_fill_images(&keys).await.unwrap();
        assert_eq!(fill.len(), 1);
        assert_eq!(fill[0].id, "b");
        assert_eq!(provider.get_full_images(&keys).await.unwrap().len(), 1);
        let sequences = provider.get_sequences(&["s".to_string()]).await.unwrap();
        assert_eq!(sequences[0].image_ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(provider.calls("get_fill_images"), 1);
        assert_eq!(provider.calls("get_core_images"), 2);
    }

    #[tokio::test]
    async fn loads_assets_and_reports_failures() {
        let provider = MemoryProvider::new(dataset(), 17);
        let image = provider.load_image("b").await.unwrap();
        assert_eq!((image.width, image.height), (48, 64));
        assert_eq!(image.byte_len(), 48 * 64 * 4);

        let mesh = provider.load_mesh("a", None).await.unwrap();
        assert_eq!(mesh.faces, vec![0, 1, 2]);
        assert_eq!(provider.load_mesh("b", None).await.unwrap(), MeshData::default());
        assert!(provider.load_image("zzz").await.unwrap_err().is_not_found());

        provider.set_offline(true);
        let err = provider.load_image("a").await.unwrap_err();
        assert!(!err.is_not_found());
        provider.set_offline(false);
        assert!(provider.load_image("a").await.is_ok());

        provider.set_user_token(Some("t".into()));
        assert_eq!(provider.user_token().as_deref(), Some("t"));
    }
}
