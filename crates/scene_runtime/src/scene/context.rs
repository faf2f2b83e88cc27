//! Scene context and the per-frame pipeline
//!
//! A [`SceneContext`] owns everything one loaded scene needs: the parsed
//! entities, the built graph, cached world transforms and mesh bounds, the
//! animation clock and the camera state. Each call to [`SceneContext::update`]
//! runs one frame:
//!
//! ```text
//! input -> clock / camera mode / user rig
//!       -> animation (when playing)
//!       -> world transforms
//!       -> active camera -> clip_from_world -> frustum
//!       -> render instances (culled unless disabled)
//! ```

use std::path::Path;

use log::{debug, info, trace, warn};

use crate::assets::{AttributeLoader, B72Loader};
use crate::core::config::RuntimeConfig;
use crate::foundation::collections::{NodeId, NodeMap};
use crate::foundation::math::{Mat4, Mat4Ext, Transform};
use crate::input::{FrameInput, InputManager, KeyCode};
use crate::player::{CameraMode, PlaybackClock, UserCameraController};
use crate::scene::animation::Animator;
use crate::scene::culling::{BBox, Frustum};
use crate::scene::document::SceneDocument;
use crate::scene::entities::{Camera, Node, Perspective};
use crate::scene::error::{SceneError, SceneResult};
use crate::scene::graph::{SceneGraph, USER_CAMERA_NAME, USER_CAMERA_PERSPECTIVE};
use crate::scene::render_queue::{vertex_ranges, RenderInstance, VertexRange};
use crate::scene::resolve::{resolve_by_name, resolve_optional};
use crate::scene::transform::{compute_world_transforms, path_local_to_world, path_world_to_local, world_to_local};

/// Everything the renderer needs for one frame
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Animation clock time used for this frame
    pub time: f32,
    /// Camera mode in effect
    pub mode: CameraMode,
    /// Name of the camera viewed through
    pub camera: String,
    /// Projection times the camera's world-to-local
    pub clip_from_world: Mat4,
    /// Visible mesh instances in traversal order
    pub instances: Vec<RenderInstance>,
    /// Instances rejected by the frustum test
    pub culled: usize,
}

#[derive(Debug, Clone)]
enum RigNode {
    /// The synthesized "User-Camera" node inside the graph
    Attached(NodeId),
    /// A free node outside the graph, never rendered
    Detached(Box<Node>),
}

#[derive(Debug, Clone)]
struct UserRig {
    node: RigNode,
    camera: Camera,
}

/// One loaded scene and its per-frame state
#[derive(Debug)]
pub struct SceneContext {
    document: SceneDocument,
    graph: SceneGraph,
    world: NodeMap<Mat4>,
    mesh_bounds: Vec<BBox>,
    vertex_ranges: Vec<VertexRange>,
    mesh_materials: Vec<Option<usize>>,
    animator: Animator,
    clock: PlaybackClock,
    camera_mode: CameraMode,
    scene_cameras: Vec<usize>,
    active_camera: Option<usize>,
    rig: UserRig,
    controller: UserCameraController,
    input: InputManager,
    config: RuntimeConfig,
}

impl SceneContext {
    /// Load a scene file, reading vertex data next to it
    pub fn from_file(path: impl AsRef<Path>, config: RuntimeConfig) -> SceneResult<Self> {
        let path = path.as_ref();
        let document = SceneDocument::from_file(path)?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        let mut loader = B72Loader::new(root);
        Self::load(document, &mut loader, config)
    }

    /// Build the graph and all caches for a parsed document
    pub fn load(
        mut document: SceneDocument,
        loader: &mut dyn AttributeLoader,
        mut config: RuntimeConfig,
    ) -> SceneResult<Self> {
        if let Err(message) = config.validate() {
            warn!("Invalid runtime configuration ({message}); using defaults");
            config = RuntimeConfig::default();
        }

        let graph = SceneGraph::build(&mut document)?;

        let mesh_bounds = document
            .meshes
            .iter()
            .map(|mesh| match loader.positions(mesh) {
                Ok(positions) => BBox::from_points(&positions),
                Err(err) => {
                    warn!("No bounds for mesh '{}': {err}", mesh.name);
                    BBox::empty()
                }
            })
            .collect();

        let mesh_materials = document
            .meshes
            .iter()
            .map(|mesh| {
                let material = resolve_optional(&document.materials, mesh.material.as_deref());
                if let (None, Some(name)) = (material, &mesh.material) {
                    warn!("Mesh '{}' references unknown material '{name}'", mesh.name);
                }
                material
            })
            .collect();

        let animator = Animator::bind(&document.drivers, &document.nodes, &graph, document.animation_duration);
        let clock = PlaybackClock::new(animator.duration(), &config.playback);

        let scene_cameras: Vec<usize> = document
            .cameras
            .iter()
            .enumerate()
            .filter(|(index, camera)| {
                resolve_by_name(&document.cameras, &camera.name) == Some(*index)
                    && graph.camera_path(&camera.name).is_some()
                    && camera.is_valid()
            })
            .map(|(index, _)| index)
            .collect();

        let mut world = NodeMap::new();
        compute_world_transforms(&document.nodes, &graph, &mut world);

        let rig = make_user_rig(&document, &graph, &scene_cameras);

        let mut context = Self {
            vertex_ranges: vertex_ranges(&document.meshes),
            document,
            graph,
            world,
            mesh_bounds,
            mesh_materials,
            animator,
            clock,
            camera_mode: config.camera.mode,
            active_camera: (!scene_cameras.is_empty()).then_some(0),
            scene_cameras,
            rig,
            controller: UserCameraController::from_settings(&config.camera),
            input: InputManager::new(),
            config,
        };

        if let Some(name) = context.config.camera.initial_camera.clone() {
            context.select_scene_camera(&name)?;
        }

        info!(
            "Scene '{}' ready: {} usable cameras, mode {:?}, active camera '{}'",
            context.document.scene.name,
            context.scene_cameras.len(),
            context.camera_mode,
            context.active_camera_name()
        );
        Ok(context)
    }

    /// Parsed entities
    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    /// Built topology
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Cached world matrix of a reachable node
    pub fn world_transform(&self, id: NodeId) -> Option<&Mat4> {
        self.world.get(id)
    }

    /// Cached object-space bounds, one per mesh
    pub fn mesh_bounds(&self) -> &[BBox] {
        &self.mesh_bounds
    }

    /// Animation clock
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Effective configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Input state fed by the host
    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    /// Current camera mode
    pub fn camera_mode(&self) -> CameraMode {
        self.camera_mode
    }

    /// Switch camera mode
    pub fn set_camera_mode(&mut self, mode: CameraMode) {
        if mode != self.camera_mode {
            debug!("Camera mode {:?} -> {:?}", self.camera_mode, mode);
            self.camera_mode = mode;
        }
    }

    /// Flip between PLAY and PAUSE
    pub fn toggle_playback(&mut self) {
        self.clock.toggle();
    }

    /// Names of the usable scene cameras, in declaration order
    pub fn scene_camera_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.scene_cameras
            .iter()
            .map(move |&index| self.document.cameras[index].name.as_str())
    }

    /// Cycle to the next usable scene camera; returns its name
    pub fn next_scene_camera(&mut self) -> Option<&str> {
        let count = self.scene_cameras.len();
        let next = self.active_camera.map_or(0, |current| (current + 1) % count.max(1));
        self.active_camera = (count > 0).then_some(next);
        let name = self.active_scene_camera().map(|camera| camera.name.as_str());
        debug!("Active scene camera: {name:?}");
        name
    }

    /// Make the named scene camera active
    pub fn select_scene_camera(&mut self, name: &str) -> SceneResult<()> {
        let position = self
            .scene_cameras
            .iter()
            .position(|&index| self.document.cameras[index].name == name)
            .ok_or_else(|| SceneError::UnknownCamera(name.to_string()))?;
        self.active_camera = Some(position);
        Ok(())
    }

    /// Name of the camera the next frame will be viewed through
    pub fn active_camera_name(&self) -> &str {
        match (self.camera_mode.uses_user_rig(), self.active_scene_camera()) {
            (false, Some(camera)) => &camera.name,
            _ => &self.rig.camera.name,
        }
    }

    /// Jump the clock and pose every animated node at the new time
    pub fn seek(&mut self, time: f32) {
        self.clock.seek(time);
        self.evaluate_animation();
        compute_world_transforms(&self.document.nodes, &self.graph, &mut self.world);
    }

    /// Restore every animated node to its loaded pose and rewind to 0
    pub fn reset_animation(&mut self) {
        self.animator.reset(&mut self.document.nodes);
        self.clock.seek(0.0);
        compute_world_transforms(&self.document.nodes, &self.graph, &mut self.world);
    }

    /// Run one frame of `dt` seconds
    pub fn update(&mut self, dt: f32) -> FrameOutput {
        let input = self.input.take_frame();
        self.apply_input(&input, dt);

        let time = self.clock.advance(dt);
        if self.clock.is_playing() {
            self.evaluate_animation();
        }

        compute_world_transforms(&self.document.nodes, &self.graph, &mut self.world);

        let (camera, perspective, view) = self.view();
        let aspect = self.config.camera.aspect_override.unwrap_or(perspective.aspect);
        let projection = Mat4::perspective(perspective.vfov, aspect, perspective.near, perspective.far);
        let clip_from_world = projection * view;

        let cull = self.config.culling.enabled && self.camera_mode.culls();
        let (instances, culled) = self.collect_instances(&clip_from_world, cull);
        trace!(
            "Frame at {time:.3}s via '{camera}': {} visible, {culled} culled",
            instances.len()
        );

        FrameOutput {
            time,
            mode: self.camera_mode,
            camera,
            clip_from_world,
            instances,
            culled,
        }
    }

    fn apply_input(&mut self, input: &FrameInput, dt: f32) {
        for key in &input.pressed {
            match key {
                KeyCode::Num1 => self.set_camera_mode(CameraMode::Scene),
                KeyCode::Num2 => self.set_camera_mode(CameraMode::User),
                KeyCode::Num3 => self.set_camera_mode(CameraMode::Debug),
                KeyCode::Space => self.toggle_playback(),
                KeyCode::Tab => {
                    self.next_scene_camera();
                }
                KeyCode::W | KeyCode::A | KeyCode::S | KeyCode::D => {}
            }
        }

        if self.camera_mode.uses_user_rig() {
            let vfov = self.rig.camera.perspective.vfov;
            let node = match &mut self.rig.node {
                RigNode::Attached(id) => &mut self.document.nodes[*id],
                RigNode::Detached(node) => node.as_mut(),
            };
            self.controller.update(node, input, vfov, dt);
        }
    }

    fn evaluate_animation(&mut self) {
        let changed = self
            .animator
            .evaluate(self.clock.time(), &self.document.drivers, &mut self.document.nodes);
        trace!("Animated {changed} channels at {:.3}s", self.clock.time());
    }

    fn active_scene_camera(&self) -> Option<&Camera> {
        self.active_camera
            .and_then(|position| self.scene_cameras.get(position))
            .map(|&index| &self.document.cameras[index])
    }

    fn rig_view(&self) -> Mat4 {
        match &self.rig.node {
            RigNode::Attached(id) => world_to_local(&self.document.nodes, *id),
            RigNode::Detached(node) => node.parent_to_local(),
        }
    }

    /// Camera name, projection and world-to-camera for the current mode
    fn view(&self) -> (String, Perspective, Mat4) {
        if !self.camera_mode.uses_user_rig() {
            if let Some(camera) = self.active_scene_camera() {
                if let Some(path) = self.graph.camera_path(&camera.name) {
                    let view = path_world_to_local(&self.document.nodes, path);
                    return (camera.name.clone(), camera.perspective, view);
                }
            }
            debug!("No usable scene camera; viewing through the user camera");
        }
        (self.rig.camera.name.clone(), self.rig.camera.perspective, self.rig_view())
    }

    fn collect_instances(&self, clip_from_world: &Mat4, cull: bool) -> (Vec<RenderInstance>, usize) {
        let frustum = Frustum::from_matrix(clip_from_world);
        let mut instances = Vec::new();
        let mut culled = 0;

        for &id in &self.graph.traversal {
            let Some(mesh) = self.document.nodes[id].mesh else {
                continue;
            };
            let Some(world_from_local) = self.world.get(id).copied() else {
                continue;
            };
            if cull && frustum.is_outside(&self.mesh_bounds[mesh].transform(&world_from_local)) {
                culled += 1;
                continue;
            }
            instances.push(RenderInstance {
                node: id,
                mesh,
                vertices: self.vertex_ranges[mesh],
                material: self.mesh_materials[mesh],
                world_from_local,
                world_from_local_normal: world_to_local(&self.document.nodes, id).transpose(),
                clip_from_local: clip_from_world * world_from_local,
            });
        }
        (instances, culled)
    }
}

/// The synthesized "User-Camera" when there is one, otherwise a detached node
/// placed where the first usable scene camera is
fn make_user_rig(document: &SceneDocument, graph: &SceneGraph, scene_cameras: &[usize]) -> UserRig {
    if let Some(id) = graph.user_camera {
        if let Some(camera) = document.nodes[id].camera {
            return UserRig {
                node: RigNode::Attached(id),
                camera: document.cameras[camera].clone(),
            };
        }
    }

    let seed = scene_cameras.first().and_then(|&index| {
        let camera = &document.cameras[index];
        graph
            .camera_path(&camera.name)
            .map(|path| (camera.perspective, Transform::from_matrix(path_local_to_world(&document.nodes, path))))
    });
    let (perspective, transform) = seed.unwrap_or_else(|| (USER_CAMERA_PERSPECTIVE, Transform::identity()));

    let node = Node {
        name: USER_CAMERA_NAME.to_string(),
        position: transform.position,
        rotation: transform.rotation,
        scale: transform.scale,
        ..Node::default()
    };
    UserRig {
        node: RigNode::Detached(Box::new(node)),
        camera: Camera {
            name: USER_CAMERA_NAME.to_string(),
            perspective,
        },
    }
}
