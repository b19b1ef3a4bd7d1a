//! Renderable hierarchy derived from a tree.
//!
//! The scene graph is never the data model: it is rebuilt wholesale from
//! a [`crate::tree::Tree`] and a [`crate::prune::PruneSet`] whenever
//! either changes, and dropped as a whole.

use crate::template::SegmentTemplate;
use crate::types::{BranchIndex, NodeId};
use glam::{Affine3A, Vec3};
use std::sync::Arc;

/// Index of a node inside `SceneGraph::nodes`.
pub type SceneId = usize;

/// Root group every built view hangs from.
pub const SCENE_ROOT: SceneId = 0;

/// What kind of tree element a scene node was built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Segment { branch: BranchIndex, index: usize },
    Leaf { branch: BranchIndex },
}

/// Links a scene node back to the tree element it renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeTag {
    pub id: NodeId,
    pub kind: NodeKind,
}

/// Surface colours as `0xRRGGBB`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Material {
    pub color: u32,
    pub emissive: u32,
}

impl Material {
    pub fn new(color: u32) -> Self {
        Self { color, emissive: 0 }
    }
}

/// Shape attached to a scene node, expressed in the node's local frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Screen-facing point of fixed world size.
    Marker { center: Vec3, size: f32 },
    /// Upright cylinder from `y = 0` to `y = length`.
    Cylinder { radius: f32, length: f32 },
    /// Normalized template mesh scaled per axis, base at the origin.
    Template {
        shape: Arc<SegmentTemplate>,
        scale: Vec3,
    },
    /// Rounded foliage cluster.
    Cluster { center: Vec3, radius: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub parent: Option<SceneId>,
    pub children: Vec<SceneId>,
    pub local: Affine3A,
    pub primitive: Option<Primitive>,
    pub material: Material,
    pub tag: Option<NodeTag>,
}

impl SceneNode {
    pub fn group(local: Affine3A) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            local,
            primitive: None,
            material: Material::default(),
            tag: None,
        }
    }

    pub fn shape(local: Affine3A, primitive: Primitive, material: Material) -> Self {
        Self {
            primitive: Some(primitive),
            material,
            ..Self::group(local)
        }
    }

    pub fn tagged(mut self, tag: NodeTag) -> Self {
        self.tag = Some(tag);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneGraph {
    pub nodes: Vec<SceneNode>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new(Affine3A::IDENTITY)
    }
}

impl SceneGraph {
    /// Creates a graph holding only a root group with the given transform.
    pub fn new(root: Affine3A) -> Self {
        Self {
            nodes: vec![SceneNode::group(root)],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes that carry a primitive.
    pub fn primitive_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.primitive.is_some()).count()
    }

    pub fn add(&mut self, parent: SceneId, mut node: SceneNode) -> SceneId {
        let id = self.nodes.len();
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        id
    }

    pub fn node(&self, id: SceneId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: SceneId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Composes local transforms from the root down to `id`.
    pub fn world_transform(&self, id: SceneId) -> Affine3A {
        let mut m = self.nodes[id].local;
        let mut cur = self.nodes[id].parent;
        while let Some(p) = cur {
            m = self.nodes[p].local * m;
            cur = self.nodes[p].parent;
        }
        m
    }

    /// World transforms of every node, computed in one pass.
    ///
    /// Parents are always pushed before their children, so a forward walk
    /// sees each parent's world transform before it is needed.
    pub fn world_transforms(&self) -> Vec<Affine3A> {
        let mut out: Vec<Affine3A> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let world = match node.parent {
                Some(p) => out[p] * node.local,
                None => node.local,
            };
            out.push(world);
        }
        out
    }

    /// Finds the first node rendering the tree element `id`.
    pub fn find_tagged(&self, id: NodeId) -> Option<SceneId> {
        self.nodes
            .iter()
            .position(|n| n.tag.is_some_and(|t| t.id == id))
    }

    /// Copies the subtree rooted at `id` into a standalone graph.
    ///
    /// The copy's root carries the world transform of `id`, so it renders
    /// in the same place once detached. Emissive highlights are cleared.
    pub fn extract_subtree(&self, id: SceneId) -> SceneGraph {
        let mut out = SceneGraph {
            nodes: Vec::with_capacity(8),
        };
        let mut root = self.nodes[id].clone();
        root.parent = None;
        root.children.clear();
        root.local = self.world_transform(id);
        root.material.emissive = 0;
        out.nodes.push(root);

        let mut stack: Vec<(SceneId, SceneId)> = self.nodes[id]
            .children
            .iter()
            .rev()
            .map(|&c| (c, SCENE_ROOT))
            .collect();
        while let Some((src, dst_parent)) = stack.pop() {
            let mut node = self.nodes[src].clone();
            node.children.clear();
            node.material.emissive = 0;
            let dst = out.add(dst_parent, node);
            stack.extend(self.nodes[src].children.iter().rev().map(|&c| (c, dst)));
        }
        out
    }

    /// Tags in the subtree rooted at `id`, in depth-first order.
    pub fn tags_under(&self, id: SceneId) -> Vec<NodeTag> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.extend(self.nodes[n].tag);
            stack.extend(self.nodes[n].children.iter().rev());
        }
        out
    }
}
