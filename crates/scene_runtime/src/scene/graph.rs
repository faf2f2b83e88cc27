//! Scene graph construction
//!
//! Depth-first traversal from the declared roots. Each reachable node gets its
//! parent link and resolved children, mesh and camera references are bound,
//! and the root-to-node path of every camera-bearing node is recorded.
//!
//! The traversal keeps the current path on a stack: meeting a node that is
//! already on the path is a cycle and fails the build. Meeting a node that was
//! finished under another parent keeps the first attachment only, so every
//! node has at most one parent.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use crate::foundation::collections::{NodeArena, NodeId};
use crate::scene::document::SceneDocument;
use crate::scene::entities::{Camera, Mesh, Node, NodeRef, Perspective};
use crate::scene::error::{SceneError, SceneResult};
use crate::scene::resolve::{resolve_node, resolve_optional, warn_duplicates};

/// Name of the camera synthesized for scenes that declare none
pub const USER_CAMERA_NAME: &str = "User-Camera";

/// Projection of the synthesized camera: 16:9, ~119.5 degree vertical fov
pub const USER_CAMERA_PERSPECTIVE: Perspective = Perspective {
    aspect: 1.777_78,
    vfov: 2.085_44,
    near: 0.1,
    far: 1000.0,
};

/// Topology built over the nodes of a [`SceneDocument`]
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    /// Resolved roots in declaration order (including a synthesized camera root)
    pub roots: Vec<NodeId>,
    /// Reachable nodes in depth-first pre-order; parents precede children
    pub traversal: Vec<NodeId>,
    /// Reachable nodes by name; the first declared node wins on duplicates
    pub name_map: HashMap<String, NodeId>,
    /// Root-to-node path of each camera, keyed by camera name
    pub camera_paths: HashMap<String, Vec<NodeId>>,
    /// Node carrying the synthesized "User-Camera", if one was created
    pub user_camera: Option<NodeId>,
    reachable: HashSet<NodeId>,
}

impl SceneGraph {
    /// Build the graph, binding references on the document's nodes.
    ///
    /// When the document declares no camera, a "User-Camera" and its node are
    /// appended to the document and attached as an extra root.
    pub fn build(document: &mut SceneDocument) -> SceneResult<Self> {
        warn_duplicates("node", document.nodes.iter().map(|(_, n)| n.name.as_str()));
        warn_duplicates("mesh", document.meshes.iter().map(|m| m.name.as_str()));
        warn_duplicates("camera", document.cameras.iter().map(|c| c.name.as_str()));

        for id in document.nodes.ids().to_vec() {
            let node = &mut document.nodes[id];
            node.parent = None;
            node.child_ids.clear();
            node.mesh = None;
            node.camera = None;
        }

        let mut builder = Builder::new(
            &mut document.nodes,
            &document.meshes,
            &document.cameras,
            SceneGraph::default(),
        );

        for reference in &document.scene.roots {
            let Some(root) = resolve_node(builder.nodes, reference) else {
                warn!("Scene root {reference:?} does not resolve to a node");
                continue;
            };
            if builder.graph.reachable.contains(&root) {
                debug!("Scene root '{}' already attached, skipping", builder.nodes[root].name);
                continue;
            }
            builder.visit(root)?;
            builder.graph.roots.push(root);
        }

        let mut graph = builder.graph;

        if document.cameras.is_empty() {
            let root = synthesize_user_camera(document, &graph);
            let mut builder = Builder::new(&mut document.nodes, &document.meshes, &document.cameras, graph);
            builder.visit(root)?;
            builder.graph.roots.push(root);
            builder.graph.user_camera = Some(root);
            graph = builder.graph;
        }

        for (id, node) in document.nodes.iter() {
            if graph.reachable.contains(&id) {
                graph.name_map.entry(node.name.clone()).or_insert(id);
            }
        }

        let unreachable = document.nodes.len() - graph.traversal.len();
        if unreachable > 0 {
            debug!("{unreachable} nodes are not reachable from any scene root");
        }
        info!(
            "Built scene graph: {} roots, {} reachable nodes, {} camera paths",
            graph.roots.len(),
            graph.traversal.len(),
            graph.camera_paths.len()
        );

        Ok(graph)
    }

    /// Whether a node is attached under some root
    pub fn is_reachable(&self, id: NodeId) -> bool {
        self.reachable.contains(&id)
    }

    /// Path from a root down to the node carrying the named camera
    pub fn camera_path(&self, camera: &str) -> Option<&[NodeId]> {
        self.camera_paths.get(camera).map(Vec::as_slice)
    }

    /// Reachable node by name
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_map.get(name).copied()
    }
}

struct Builder<'a> {
    nodes: &'a mut NodeArena<Node>,
    meshes: &'a [Mesh],
    cameras: &'a [Camera],
    graph: SceneGraph,
    path: Vec<NodeId>,
    on_path: HashSet<NodeId>,
}

/// A node on the current path and the index of its next child to visit
struct Frame {
    id: NodeId,
    children: Vec<NodeRef>,
    cursor: usize,
}

impl<'a> Builder<'a> {
    fn new(nodes: &'a mut NodeArena<Node>, meshes: &'a [Mesh], cameras: &'a [Camera], graph: SceneGraph) -> Self {
        Self {
            nodes,
            meshes,
            cameras,
            graph,
            path: Vec::new(),
            on_path: HashSet::new(),
        }
    }

    /// Attach the subtree under `root`, walking it with an explicit stack so
    /// hierarchy depth is bounded by memory rather than the call stack
    fn visit(&mut self, root: NodeId) -> SceneResult<()> {
        let mut stack = vec![self.enter(root, None)];

        while let Some(frame) = stack.last_mut() {
            let Some(reference) = frame.children.get(frame.cursor).cloned() else {
                self.leave(frame.id);
                stack.pop();
                continue;
            };
            frame.cursor += 1;
            let parent = frame.id;

            let Some(child) = resolve_node(self.nodes, &reference) else {
                warn!("Node '{}' child {reference:?} does not resolve", self.nodes[parent].name);
                continue;
            };
            if self.on_path.contains(&child) {
                return Err(SceneError::CyclicGraph {
                    node: self.nodes[child].name.clone(),
                });
            }
            if self.graph.reachable.contains(&child) {
                warn!(
                    "Node '{}' is already attached; ignoring extra parent '{}'",
                    self.nodes[child].name, self.nodes[parent].name
                );
                continue;
            }
            self.nodes[parent].child_ids.push(child);
            stack.push(self.enter(child, Some(parent)));
        }
        Ok(())
    }

    /// Link `id` under `parent`, bind its references and push it on the path
    fn enter(&mut self, id: NodeId, parent: Option<NodeId>) -> Frame {
        self.graph.reachable.insert(id);
        self.graph.traversal.push(id);
        self.path.push(id);
        self.on_path.insert(id);

        let children = {
            let node = &mut self.nodes[id];
            node.parent = parent;
            node.mesh = resolve_optional(self.meshes, node.mesh_name.as_deref());
            node.camera = resolve_optional(self.cameras, node.camera_name.as_deref());
            if node.mesh.is_none() {
                if let Some(name) = &node.mesh_name {
                    warn!("Node '{}' references unknown mesh '{name}'", node.name);
                }
            }
            node.children.clone()
        };

        if let Some(camera) = self.nodes[id].camera {
            let name = self.cameras[camera].name.clone();
            if self.graph.camera_paths.contains_key(&name) {
                warn!("Camera '{name}' is attached to several nodes; keeping the first path");
            } else {
                self.graph.camera_paths.insert(name, self.path.clone());
            }
        }

        Frame { id, children, cursor: 0 }
    }

    fn leave(&mut self, id: NodeId) {
        self.path.pop();
        self.on_path.remove(&id);
    }
}

fn synthesize_user_camera(document: &mut SceneDocument, graph: &SceneGraph) -> NodeId {
    document.cameras.push(Camera {
        name: USER_CAMERA_NAME.to_string(),
        perspective: USER_CAMERA_PERSPECTIVE,
    });

    let mut node = Node {
        name: USER_CAMERA_NAME.to_string(),
        camera_name: Some(USER_CAMERA_NAME.to_string()),
        ..Node::default()
    };
    match graph.roots.first() {
        Some(&root) => {
            let anchor = &document.nodes[root];
            node.position = anchor.position * 2.0;
            node.rotation = anchor.rotation;
            node.scale = anchor.scale;
        }
        None => warn!("Scene has no roots; placing {USER_CAMERA_NAME} at the origin"),
    }

    let id = document.nodes.push(node);
    let index = document.nodes.len() - 1;
    document.scene.roots.push(NodeRef::Index(index as i64));
    info!("No cameras declared; synthesized {USER_CAMERA_NAME}");
    id
}
