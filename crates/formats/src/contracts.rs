use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LngLatContract {
    pub lat: f64,
    pub lng: f64,
}

/// Minimal image record returned per spatial cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreImageContract {
    pub id: String,
    pub geometry: LngLatContract,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_geometry: Option<LngLatContract>,
    pub sequence_id: String,
}

/// Camera and capture metadata that makes a node full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialImageContract {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atomic_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_parameters: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_type: Option<String>,
    /// Capture time in epoch milliseconds.
    pub captured_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_compass_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_rotation: Option<[f64; 3]>,
    /// Degrees clockwise from north.
    pub compass_angle: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif_orientation: Option<u32>,
    pub height: u32,
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

/// Complete image record: core and spatial fields in one flat object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContract {
    pub id: String,
    pub geometry: LngLatContract,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_geometry: Option<LngLatContract>,
    pub sequence_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atomic_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_parameters: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_type: Option<String>,
    pub captured_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_compass_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_rotation: Option<[f64; 3]>,
    pub compass_angle: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif_orientation: Option<u32>,
    pub height: u32,
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

impl ImageContract {
    pub fn core(&self) -> CoreImageContract {
        CoreImageContract {
            id: self.id.clone(),
            geometry: self.geometry,
            computed_geometry: self.computed_geometry,
            sequence_id: self.sequence_id.clone(),
        }
    }

    pub fn spatial(&self) -> SpatialImageContract {
        SpatialImageContract {
            id: self.id.clone(),
            altitude: self.altitude,
            atomic_scale: self.atomic_scale,
            camera_parameters: self.camera_parameters.clone(),
            camera_type: self.camera_type.clone(),
            captured_at: self.captured_at,
            computed_altitude: self.computed_altitude,
            computed_compass_angle: self.computed_compass_angle,
            computed_rotation: self.computed_rotation,
            compass_angle: self.compass_angle,
            creator_id: self.creator_id.clone(),
            exif_orientation: self.exif_orientation,
            height: self.height,
            width: self.width,
            merge_id: self.merge_id.clone(),
            mesh_url: self.mesh_url.clone(),
            quality_score: self.quality_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceContract {
    pub id: String,
    /// Image ids in capture order.
    pub image_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::{ImageContract, SequenceContract};
    use pretty_assertions::assert_eq;

    const IMAGE: &str = r#"{
        "id": "img-1",
        "geometry": { "lat": 55.6, "lng": 13.0 },
        "sequence_id": "seq-1",
        "captured_at": 1500000000000,
        "compass_angle": 90.0,
        "computed_rotation": [1.5, 0.0, 0.2],
        "camera_type": "fisheye",
        "camera_parameters": [0.6, -0.1, 0.01],
        "height": 3000,
        "width": 4000,
        "merge_id": "cc-1"
    }"#;

    #[test]
    fn optional_fields_default_to_none() {
        let image: ImageContract = serde_json::from_str(IMAGE).unwrap();
        assert_eq!(image.computed_geometry, None);
        assert_eq!(image.atomic_scale, None);
        assert_eq!(image.exif_orientation, None);
        assert_eq!(image.computed_rotation, Some([1.5, 0.0, 0.2]));
        assert_eq!(image.merge_id.as_deref(), Some("cc-1"));
    }

    #[test]
    fn splits_into_core_and_spatial() {
        let image: ImageContract = serde_json::from_str(IMAGE).unwrap();
        let core = image.core();
        assert_eq!(core.id, "img-1");
        assert_eq!(core.sequence_id, "seq-1");
        assert_eq!(core.geometry.lng, 13.0);

        let spatial = image.spatial();
        assert_eq!(spatial.id, "img-1");
        assert_eq!(spatial.camera_type.as_deref(), Some("fisheye"));
        assert_eq!(spatial.width, 4000);
    }

    #[test]
    fn serialization_omits_missing_fields() {
        let image: ImageContract = serde_json::from_str(IMAGE).unwrap();
        let value = serde_json::to_value(&image).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("mesh_url"));
        assert!(obj.contains_key("merge_id"));

        let sequence: SequenceContract =
            serde_json::from_str(r#"{"id":"s","image_ids":["a","b"]}"#).unwrap();
        assert_eq!(sequence.image_ids, vec!["a".to_string(), "b".to_string()]);
    }
}
