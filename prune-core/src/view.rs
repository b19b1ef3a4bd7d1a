//! Builds a [`SceneGraph`] from a tree and its prune set.
//!
//! Both strategies share one traversal; they only differ in the primitive
//! they emit per element. Segments use a pivot-at-base convention: a
//! segment node sits at the base of its segment and the segment's top is
//! `(0, segment_length, 0)` in that node's frame.

use crate::prune::PruneSet;
use crate::scene::{
    Material, NodeKind, NodeTag, Primitive, SCENE_ROOT, SceneGraph, SceneId, SceneNode,
};
use crate::template::SegmentTemplate;
use crate::tree::{Branch, Rotation, Tree};
use crate::types::BranchIndex;
use glam::{Affine3A, EulerRot, Quat, Vec3};
use std::sync::Arc;

const BARK: u32 = 0x8b4513;
const FOLIAGE: u32 = 0x006400;
const JOINT_MARKER: u32 = 0x4488ff;
const LEAF_MARKER: u32 = 0x00ff00;

/// Geometry of every branch at a given level. Shrinks with depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BranchDims {
    pub length: f32,
    pub segment_length: f32,
    pub radius: f32,
    pub leaf_radius: f32,
}

impl BranchDims {
    pub fn for_level(level: u8) -> Self {
        let level = level as f32;
        let length = 4.0 - level * 0.6;
        Self {
            length,
            segment_length: length / 3.0,
            radius: 0.2 - level * 0.035,
            leaf_radius: 1.5 - level * 0.2,
        }
    }

    /// Top of a segment in its own frame.
    #[inline]
    pub fn top(&self) -> Vec3 {
        Vec3::new(0.0, self.segment_length, 0.0)
    }
}

/// Chooses the primitives emitted for each tree element.
pub trait ViewStrategy {
    /// Called once per visible branch, at its attachment point.
    fn branch_base(&self, _graph: &mut SceneGraph, _attach: SceneId, _dims: &BranchDims) {}

    fn segment(&self, dims: &BranchDims) -> (Primitive, Material);

    fn leaf(&self, dims: &BranchDims) -> (Primitive, Material);
}

/// Point markers at every joint. Cheap, and useful to inspect structure.
#[derive(Clone, Copy, Debug, Default)]
pub struct Skeleton;

impl ViewStrategy for Skeleton {
    fn branch_base(&self, graph: &mut SceneGraph, attach: SceneId, _dims: &BranchDims) {
        graph.add(
            attach,
            SceneNode::shape(
                Affine3A::IDENTITY,
                Primitive::Marker {
                    center: Vec3::ZERO,
                    size: 0.3,
                },
                Material::new(JOINT_MARKER),
            ),
        );
    }

    fn segment(&self, dims: &BranchDims) -> (Primitive, Material) {
        (
            Primitive::Marker {
                center: dims.top(),
                size: 0.3,
            },
            Material::new(JOINT_MARKER),
        )
    }

    fn leaf(&self, _dims: &BranchDims) -> (Primitive, Material) {
        (
            Primitive::Marker {
                center: Vec3::ZERO,
                size: 0.5,
            },
            Material::new(LEAF_MARKER),
        )
    }
}

/// Cylinders (or a template mesh) per segment and a cluster per leaf.
#[derive(Clone, Debug, Default)]
pub struct Solid {
    pub template: Option<Arc<SegmentTemplate>>,
}

impl ViewStrategy for Solid {
    fn segment(&self, dims: &BranchDims) -> (Primitive, Material) {
        let primitive = match &self.template {
            Some(shape) => Primitive::Template {
                shape: Arc::clone(shape),
                scale: Vec3::new(dims.radius * 2.0, dims.segment_length, dims.radius * 2.0),
            },
            None => Primitive::Cylinder {
                radius: dims.radius,
                length: dims.segment_length,
            },
        };
        (primitive, Material::new(BARK))
    }

    fn leaf(&self, dims: &BranchDims) -> (Primitive, Material) {
        (
            Primitive::Cluster {
                center: Vec3::ZERO,
                radius: dims.leaf_radius,
            },
            Material::new(FOLIAGE),
        )
    }
}

/// Builds the whole visible tree under a fresh root group.
pub fn build_view(tree: &Tree, pruned: &PruneSet, strategy: &dyn ViewStrategy) -> SceneGraph {
    let mut graph = SceneGraph::default();
    build_branch(&mut graph, SCENE_ROOT, tree, 0, pruned, strategy);
    log::debug!(
        "built view: {} nodes, {} primitives",
        graph.len(),
        graph.primitive_count()
    );
    graph
}

fn build_branch(
    graph: &mut SceneGraph,
    attach: SceneId,
    tree: &Tree,
    ix: BranchIndex,
    pruned: &PruneSet,
    strategy: &dyn ViewStrategy,
) {
    let branch: &Branch = tree.branch(ix);
    if pruned.contains(branch.id) {
        return;
    }

    let dims = BranchDims::for_level(branch.level);
    strategy.branch_base(graph, attach, &dims);

    let mut current = attach;
    let mut any = false;
    for segment in branch.segments.iter().filter(|s| !pruned.contains(s.id)) {
        let local = if any {
            Affine3A::from_translation(dims.top())
        } else {
            Affine3A::IDENTITY
        };
        let (primitive, material) = strategy.segment(&dims);
        current = graph.add(
            current,
            SceneNode::shape(local, primitive, material).tagged(NodeTag {
                id: segment.id,
                kind: NodeKind::Segment {
                    branch: ix,
                    index: segment.index,
                },
            }),
        );
        any = true;
    }

    // Nothing left to hang a leaf or children from.
    if !any {
        return;
    }

    if let Some(leaf) = branch.leaf.filter(|l| !pruned.contains(l.id)) {
        let (primitive, material) = strategy.leaf(&dims);
        graph.add(
            current,
            SceneNode::shape(Affine3A::from_translation(dims.top()), primitive, material).tagged(
                NodeTag {
                    id: leaf.id,
                    kind: NodeKind::Leaf { branch: ix },
                },
            ),
        );
    }

    for &child in &branch.children {
        let rotation = tree
            .branch(child)
            .rotation
            .unwrap_or(Rotation { x: 0.0, z: 0.0 });
        let pivot = graph.add(
            current,
            SceneNode::group(Affine3A::from_rotation_translation(
                Quat::from_euler(EulerRot::XYZ, rotation.x, 0.0, rotation.z),
                dims.top(),
            )),
        );
        build_branch(graph, pivot, tree, child, pruned, strategy);
    }
}
