use std::sync::Arc;

use foundation::geo::{LngLatAlt, geodetic_to_enu};
use geometry::{CanvasSize, ViewportCoords};
use graph::{NavigationDirection, Node, NodeFilter};
use parking_lot::Mutex;
use runtime::FrameClock;
use streaming::{GraphService, NavigationError, Navigator, ServiceError};
use tracing::debug;

use crate::animation::{AnimationFrame, AnimationState, TrajectoryImage};
use crate::config::RenderCameraConfig;
use crate::render_camera::RenderCamera;
use crate::render_mode::RenderMode;

struct RenderState {
    animation: AnimationState,
    camera: RenderCamera,
    clock: FrameClock,
}

#[derive(Clone)]
pub struct Viewer {
    navigator: Navigator,
    render: Arc<Mutex<RenderState>>,
    coords: ViewportCoords,
}

impl Viewer {
    pub fn new(service: GraphService, config: &RenderCameraConfig, width: f64, height: f64) -> Self {
        Self {
            navigator: Navigator::new(service),
            render: Arc::new(Mutex::new(RenderState {
                animation: AnimationState::new(config.animation_speed),
                camera: RenderCamera::new(config, width, height),
                clock: FrameClock::default(),
            })),
            coords: ViewportCoords::default(),
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn service(&self) -> &GraphService {
        self.navigator.service()
    }

    /// Navigate to `key` and start the transition to it.
    pub async fn move_to_key(&self, key: &str) -> Result<Node, NavigationError> {
        let node = self.navigator.move_to_key(key).await?;
        self.show(&node)?;
        Ok(node)
    }

    pub async fn move_dir(&self, direction: NavigationDirection) -> Result<Node, NavigationError> {
        let node = self.navigator.move_dir(direction).await?;
        self.show(&node)?;
        Ok(node)
    }

    /// Replace the edge filter; later directional moves use the new edges.
    pub fn set_filter(&self, filter: NodeFilter) {
        self.service().set_filter(filter);
    }

    /// Advance one frame. Returns whether the renderer has to draw.
    pub fn tick(&self) -> bool {
        let mut render = self.render.lock();
        let frame = render.clock.tick();
        let fps = frame.fps();
        render.animation.update(fps);
        let state = render.animation.frame_state();
        render.camera.set_frame(&AnimationFrame {
            id: frame.index,
            fps,
            state,
        })
    }

    pub fn set_size(&self, width: f64, height: f64) {
        self.render.lock().camera.set_size(width, height);
    }

    pub fn set_render_mode(&self, render_mode: RenderMode) {
        self.render.lock().camera.set_render_mode(render_mode);
    }

    pub fn set_zoom(&self, zoom: f64) {
        self.render.lock().animation.set_zoom(zoom);
    }

    pub fn set_speed(&self, coefficient: f64) {
        self.render.lock().animation.set_speed(coefficient);
    }

    pub fn fov_to_zoom(&self, fov: f64) -> f64 {
        self.render.lock().animation.fov_to_zoom(fov)
    }

    pub fn current_key(&self) -> Option<String> {
        self.render
            .lock()
            .animation
            .current()
            .map(|image| image.key.clone())
    }

    pub fn alpha(&self) -> f64 {
        self.render.lock().animation.alpha()
    }

    /// Run `f` against the render camera.
    pub fn with_camera<R>(&self, f: impl FnOnce(&RenderCamera) -> R) -> R {
        f(&self.render.lock().camera)
    }

    /// Canvas pixel of a geodetic point, `None` behind the camera or before
    /// any image is loaded.
    pub fn project(&self, point: LngLatAlt) -> Option<[f64; 2]> {
        let reference = self.service().with_graph(|g| g.reference())?;
        let world = geodetic_to_enu(point, reference);
        let render = self.render.lock();
        let camera = render.camera.perspective();
        if self.coords.world_to_camera(world, camera).z > 0.0 {
            return None;
        }
        let (width, height) = render.camera.size();
        Some(
            self.coords
                .project_to_canvas(world, CanvasSize::new(width, height), camera),
        )
    }

    /// Pixel distances `[top, right, bottom, left]` from the canvas edges to
    /// the current image edges.
    pub fn pixel_distances(&self) -> Option<[f64; 4]> {
        let render = self.render.lock();
        let current = render.animation.current()?;
        let (width, height) = render.camera.size();
        Some(self.coords.get_pixel_distances(
            CanvasSize::new(width, height),
            &current.transform,
            render.camera.perspective(),
        ))
    }

    fn show(&self, node: &Node) -> Result<(), NavigationError> {
        let image = TrajectoryImage::from_node(node)
            .ok_or_else(|| ServiceError::Missing(node.key().to_string()))?;
        let keys = {
            let mut render = self.render.lock();
            render.animation.set(vec![image]);
            render.animation.trajectory_keys()
        };
        debug!("showing {}; trajectory {keys:?}", node.key());
        self.service().set_trajectory(keys);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Viewer;
    use crate::config::RenderCameraConfig;
    use crate::render_mode::RenderMode;
    use formats::Dataset;
    use graph::NavigationDirection;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use streaming::{GraphService, MemoryProvider, NodeState, ViewerConfig};

    fn viewer() -> (Viewer, Arc<MemoryProvider>) {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../tools/assets/demo_dataset.json");
        let config = ViewerConfig::default();
        let provider = Arc::new(MemoryProvider::new(
            Dataset::load(path).unwrap(),
            config.cell_zoom,
        ));
        let service = GraphService::new(config, provider.clone(), provider.clone());
        (
            Viewer::new(service, &RenderCameraConfig::default(), 640.0, 480.0),
            provider,
        )
    }

    #[tokio::test]
    async fn navigation_drives_the_animation() {
        let (viewer, provider) = viewer();
        let keys = provider.dataset().sequences[0].image_ids.clone();

        assert!(viewer.tick());
        viewer.move_to_key(&keys[0]).await.unwrap();
        assert_eq!(viewer.current_key().as_deref(), Some(keys[0].as_str()));
        assert!(viewer.tick());

        viewer.move_dir(NavigationDirection::Next).await.unwrap();
        assert_eq!(viewer.current_key().as_deref(), Some(keys[1].as_str()));
        assert_eq!(viewer.alpha(), 0.0);
        assert_eq!(viewer.service().node_state(&keys[0]), NodeState::Cached);

        let mut frames = 0;
        while viewer.tick() {
            frames += 1;
            assert!(frames < 200, "animation never settled");
        }
        assert!((viewer.alpha() - 1.0).abs() < 1e-6);
        assert!(!viewer.tick());
    }

    #[tokio::test]
    async fn render_settings_request_a_redraw() {
        let (viewer, provider) = viewer();
        let key = provider.dataset().sequences[0].image_ids[0].clone();
        viewer.move_to_key(&key).await.unwrap();
        while viewer.tick() {}

        viewer.set_render_mode(RenderMode::Letterbox);
        assert!(viewer.with_camera(|c| c.changed()));
        assert!(viewer.tick());
        assert!(!viewer.tick());

        viewer.set_size(320.0, 480.0);
        assert!(viewer.tick());
        assert_eq!(viewer.with_camera(|c| c.size()), (320.0, 480.0));
    }

    #[tokio::test]
    async fn projects_points_in_front_of_the_camera() {
        let (viewer, provider) = viewer();
        let key = provider.dataset().sequences[0].image_ids[0].clone();
        assert!(viewer.project(Default::default()).is_none());

        let node = viewer.move_to_key(&key).await.unwrap();
        while viewer.tick() {}

        // A point 10 m along the viewing direction lands inside the canvas.
        let pose = viewer.with_camera(|c| *c.pose());
        let ahead = pose.position + pose.direction().normalize() * 10.0;
        let reference = viewer.service().with_graph(|g| g.reference()).unwrap();
        let target = foundation::geo::enu_to_geodetic(ahead, reference);
        let [x, y] = viewer.project(target).unwrap();
        assert!((x - 320.0).abs() < 1.0 && (y - 240.0).abs() < 1.0, "{x}, {y}");

        let behind = pose.position - pose.direction().normalize() * 10.0;
        assert!(viewer.project(foundation::geo::enu_to_geodetic(behind, reference)).is_none());
        assert!(node.is_full());
        assert!(viewer.pixel_distances().is_some());
    }

    #[tokio::test]
    async fn failed_navigation_keeps_the_current_image() {
        let (viewer, provider) = viewer();
        let keys = provider.dataset().sequences[0].image_ids.clone();
        viewer.move_to_key(&keys[0]).await.unwrap();

        assert!(viewer.move_to_key("missing").await.unwrap_err().is_not_found());
        assert!(viewer.move_dir(NavigationDirection::Prev).await.is_err());
        assert_eq!(viewer.current_key().as_deref(), Some(keys[0].as_str()));
        let fov = viewer.with_camera(|c| c.perspective().fov);
        assert!(viewer.fov_to_zoom(fov).is_finite());
    }
}
