use foundation::geo::{LngLat, LngLatAlt, geodetic_to_enu};
use foundation::math::Vec3;
use foundation::spatial;
use foundation::time::Timestamp;
use formats::{CoreImageContract, SpatialImageContract};
use geometry::{CameraType, Transform, TransformParams};

use crate::calculator::rotation_from_compass;

/// Dense handle of a node inside one graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Camera and capture metadata of a full node, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialData {
    pub altitude: Option<f64>,
    pub atomic_scale: Option<f64>,
    pub camera_parameters: Vec<f64>,
    pub camera_type: CameraType,
    pub captured_at: Timestamp,
    pub computed_altitude: f64,
    pub compass_angle: f64,
    pub computed_compass_angle: Option<f64>,
    /// Angle-axis world-to-camera rotation.
    pub rotation: Vec3,
    pub creator_id: Option<String>,
    pub exif_orientation: u32,
    pub width: u32,
    pub height: u32,
    pub merge_id: Option<String>,
    pub mesh_url: Option<String>,
    pub quality_score: Option<f64>,
}

impl SpatialData {
    /// Apply the default altitude and derive a rotation from the compass when
    /// the reconstruction did not provide one.
    pub fn from_contract(contract: &SpatialImageContract, default_altitude: f64) -> Self {
        let exif_orientation = contract.exif_orientation.unwrap_or(1);
        let rotation = match contract.computed_rotation {
            Some([x, y, z]) => Vec3::new(x, y, z),
            None => rotation_from_compass(contract.compass_angle, exif_orientation),
        };
        Self {
            altitude: contract.altitude,
            atomic_scale: contract.atomic_scale,
            camera_parameters: contract.camera_parameters.clone().unwrap_or_default(),
            camera_type: CameraType::parse_lossy(contract.camera_type.as_deref()),
            captured_at: Timestamp(contract.captured_at),
            computed_altitude: contract.computed_altitude.unwrap_or(default_altitude),
            compass_angle: contract.compass_angle,
            computed_compass_angle: contract.computed_compass_angle,
            rotation,
            creator_id: contract.creator_id.clone(),
            exif_orientation,
            width: contract.width,
            height: contract.height,
            merge_id: contract.merge_id.clone(),
            mesh_url: contract.mesh_url.clone(),
            quality_score: contract.quality_score,
        }
    }
}

/// An image in the graph. The record outlives asset eviction.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    key: String,
    sequence_id: String,
    original_lng_lat: LngLat,
    computed_lng_lat: Option<LngLat>,
    spatial: Option<SpatialData>,
    translation: Option<Vec3>,
}

impl Node {
    pub(crate) fn from_core(id: NodeId, core: &CoreImageContract) -> Self {
        Self {
            id,
            key: core.id.clone(),
            sequence_id: core.sequence_id.clone(),
            original_lng_lat: LngLat::new(core.geometry.lng, core.geometry.lat),
            computed_lng_lat: core
                .computed_geometry
                .map(|g| LngLat::new(g.lng, g.lat)),
            spatial: None,
            translation: None,
        }
    }

    /// Attach spatial metadata and compute the translation relative to
    /// `reference`.
    pub(crate) fn make_full(&mut self, spatial: SpatialData, reference: LngLatAlt) {
        let position = self.lng_lat().with_alt(spatial.computed_altitude);
        let enu = geodetic_to_enu(position, reference);
        self.translation = Some(-spatial::rotate(enu, spatial.rotation));
        self.spatial = Some(spatial);
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }

    /// Computed position when available, original otherwise.
    pub fn lng_lat(&self) -> LngLat {
        self.computed_lng_lat.unwrap_or(self.original_lng_lat)
    }

    pub fn original_lng_lat(&self) -> LngLat {
        self.original_lng_lat
    }

    pub fn computed_lng_lat(&self) -> Option<LngLat> {
        self.computed_lng_lat
    }

    pub fn is_full(&self) -> bool {
        self.spatial.is_some()
    }

    pub fn spatial(&self) -> Option<&SpatialData> {
        self.spatial.as_ref()
    }

    /// Whether the node belongs to a merged reconstruction component.
    pub fn merged(&self) -> bool {
        self.merge_id().is_some()
    }

    pub fn merge_id(&self) -> Option<&str> {
        self.spatial.as_ref().and_then(|s| s.merge_id.as_deref())
    }

    pub fn creator_id(&self) -> Option<&str> {
        self.spatial.as_ref().and_then(|s| s.creator_id.as_deref())
    }

    pub fn captured_at(&self) -> Option<Timestamp> {
        self.spatial.as_ref().map(|s| s.captured_at)
    }

    pub fn quality_score(&self) -> Option<f64> {
        self.spatial.as_ref().and_then(|s| s.quality_score)
    }

    pub fn camera_type(&self) -> Option<CameraType> {
        self.spatial.as_ref().map(|s| s.camera_type)
    }

    pub fn is_spherical(&self) -> bool {
        self.camera_type().is_some_and(CameraType::is_spherical)
    }

    pub fn rotation(&self) -> Option<Vec3> {
        self.spatial.as_ref().map(|s| s.rotation)
    }

    pub fn computed_altitude(&self) -> Option<f64> {
        self.spatial.as_ref().map(|s| s.computed_altitude)
    }

    pub fn lng_lat_alt(&self) -> Option<LngLatAlt> {
        self.computed_altitude().map(|alt| self.lng_lat().with_alt(alt))
    }

    /// World-to-camera translation relative to the graph reference.
    pub fn translation(&self) -> Option<Vec3> {
        self.translation
    }

    pub fn mesh_url(&self) -> Option<&str> {
        self.spatial.as_ref().and_then(|s| s.mesh_url.as_deref())
    }

    /// Camera model of a full node.
    pub fn transform(&self) -> Option<Transform> {
        let spatial = self.spatial.as_ref()?;
        let translation = self.translation?;
        Some(Transform::new(TransformParams {
            orientation: spatial.exif_orientation,
            width: spatial.width as f64,
            height: spatial.height as f64,
            scale: spatial.atomic_scale.unwrap_or(0.0),
            rotation: spatial.rotation,
            translation,
            camera_type: spatial.camera_type,
            camera_parameters: spatial.camera_parameters.clone(),
            texture_scale: None,
        }))
    }
}
