//! Scene graph nodes shared between this crate and the host scene.
//!
//! Nodes are reference counted so that the host scene graph can own them once
//! attached while the controller keeps handles to the parts it animates. All
//! access happens on the render thread, hence `Rc<RefCell<_>>`.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::data_structures::instance::{Pose, Transform};

pub type NodeRef = Rc<RefCell<Node>>;

#[derive(Debug, Default)]
pub struct Node {
    pub name: String,
    pub visible: bool,
    pub transform: Transform,
    /// Name of the mesh drawn at this node, if any.
    pub mesh: Option<String>,
    pub children: Vec<NodeRef>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: impl Into<String>) -> Self {
        self.mesh = Some(mesh.into());
        self
    }

    pub fn into_ref(self) -> NodeRef {
        Rc::new(RefCell::new(self))
    }

    pub fn add_child(&mut self, child: NodeRef) {
        self.children.push(child);
    }

    /// Copies position, rotation and scale of `pose` onto this node.
    pub fn copy_pose(&mut self, pose: &Pose) {
        self.transform = *pose;
    }
}

/// Depth-first pre-order walk starting at (and including) `root`.
pub fn traverse(root: &NodeRef, visit: &mut dyn FnMut(&NodeRef)) {
    visit(root);
    let children = root.borrow().children.clone();
    for child in children.iter() {
        traverse(child, visit);
    }
}

/**
 * Looks up a node by name.
 *
 * Every node in the tree is visited and the last match wins, so a name that
 * occurs twice resolves to the deepest/rightmost occurrence.
 */
pub fn find(root: &NodeRef, name: &str) -> Option<NodeRef> {
    let mut found = None;
    traverse(root, &mut |node| {
        if node.borrow().name == name {
            found = Some(node.clone());
        }
    });
    found
}

/// World transforms of every node below `root`, keyed by node name.
///
/// `parent` is the world transform `root` hangs off (identity for nodes attached
/// directly to the host scene).
pub fn world_transforms(root: &NodeRef, parent: &Transform) -> HashMap<String, Transform> {
    let mut out = HashMap::new();
    collect_world(root, parent, &mut out);
    out
}

fn collect_world(node: &NodeRef, parent: &Transform, out: &mut HashMap<String, Transform>) {
    let node = node.borrow();
    let world = parent * &node.transform;
    for child in node.children.iter() {
        collect_world(child, &world, out);
    }
    out.insert(node.name.clone(), world);
}

/// Converts a glTF node (and its subtree) into shared scene nodes.
///
/// Every created node is recorded in `by_index` under its glTF index so that
/// animation channels can later address their targets.
pub fn to_scene_node(node: gltf::scene::Node, by_index: &mut HashMap<usize, NodeRef>) -> NodeRef {
    let (translation, rotation, scale) = node.transform().decomposed();
    let transform = Transform {
        position: translation.into(),
        // glTF stores quaternions as [x, y, z, w]
        rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    };
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let mut scene_node = Node::new(name).with_transform(transform);
    if let Some(mesh) = node.mesh() {
        scene_node.mesh = Some(mesh.name().unwrap_or("unknown_mesh").to_string());
    }
    for child in node.children() {
        let child_node = to_scene_node(child, by_index);
        scene_node.add_child(child_node);
    }
    let scene_node = scene_node.into_ref();
    by_index.insert(node.index(), scene_node.clone());
    scene_node
}
