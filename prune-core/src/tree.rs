//! Deterministic tree model.
//!
//! A [`Tree`] is generated once from a seed and is immutable afterwards.
//! Branches live in an arena in pre-order; every id (branch, segment,
//! leaf) resolves back to its owner through a [`NodeLocation`] table.

use crate::random::SeededRandom;
use crate::types::{BranchIndex, NodeId, Seed};
use std::f64::consts::PI;

/// Number of segments every branch is split into.
pub const SEGMENTS_PER_BRANCH: usize = 3;
/// Deepest level that is still generated. The trunk is level 0.
pub const MAX_LEVEL: u8 = 5;
/// Branches at this level or deeper carry a leaf cluster.
pub const LEAF_MIN_LEVEL: u8 = 3;

/// Half-width of the rotation range, as a fraction of π.
const ROTATION_SPREAD: f64 = 0.8;

/// Angles (radians) of a child branch around the x and z axes of its pivot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    pub x: f32,
    pub z: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub id: NodeId,
    pub level: u8,
    /// Position along the branch, `0..SEGMENTS_PER_BRANCH`.
    pub index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Leaf {
    pub id: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    pub id: NodeId,
    pub level: u8,
    pub segments: [Segment; SEGMENTS_PER_BRANCH],
    pub leaf: Option<Leaf>,
    pub parent: Option<BranchIndex>,
    pub children: Vec<BranchIndex>,
    /// `None` only for the root.
    pub rotation: Option<Rotation>,
}

/// What a [`NodeId`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeLocation {
    Branch(BranchIndex),
    Segment(BranchIndex, usize),
    Leaf(BranchIndex),
}

impl NodeLocation {
    pub fn branch(self) -> BranchIndex {
        match self {
            NodeLocation::Branch(b) | NodeLocation::Segment(b, _) | NodeLocation::Leaf(b) => b,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    pub seed: Seed,
    pub branches: Vec<Branch>,
    locations: Vec<NodeLocation>,
}

impl Branch {
    /// Ids owned directly by this branch: itself, its segments and its leaf.
    pub fn own_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(self.id)
            .chain(self.segments.iter().map(|s| s.id))
            .chain(self.leaf.map(|l| l.id))
    }
}

impl Tree {
    /// Grows a tree from `seed`.
    ///
    /// Ids are assigned in pre-order: the branch, its three segments, its
    /// leaf (if any), then each child subtree in turn. A child's rotation
    /// is drawn *after* its whole subtree has been generated, x before z.
    pub fn generate(seed: Seed) -> Self {
        let mut tree = Self {
            seed,
            branches: Vec::with_capacity(512),
            locations: Vec::with_capacity(2048),
        };
        let mut random = SeededRandom::new(seed);
        tree.grow(None, 0, &mut random);
        log::debug!(
            "generated tree for seed {seed}: {} branches, {} ids",
            tree.branches.len(),
            tree.locations.len()
        );
        tree
    }

    fn next_id(&mut self, loc: NodeLocation) -> NodeId {
        let id = self.locations.len() as NodeId;
        self.locations.push(loc);
        id
    }

    fn grow(
        &mut self,
        parent: Option<BranchIndex>,
        level: u8,
        random: &mut SeededRandom,
    ) -> Option<BranchIndex> {
        if level > MAX_LEVEL {
            return None;
        }

        let ix = self.branches.len();
        let id = self.next_id(NodeLocation::Branch(ix));
        let segments = std::array::from_fn(|index| Segment {
            id: self.next_id(NodeLocation::Segment(ix, index)),
            level,
            index,
        });
        let leaf = (level >= LEAF_MIN_LEVEL).then(|| Leaf {
            id: self.next_id(NodeLocation::Leaf(ix)),
        });

        self.branches.push(Branch {
            id,
            level,
            segments,
            leaf,
            parent,
            children: Vec::with_capacity(4),
            rotation: None,
        });

        let branch_count = (random.next_f64() * 3.0).floor() as usize + 2;
        for _ in 0..branch_count {
            if let Some(child) = self.grow(Some(ix), level + 1, random) {
                let x = ((random.next_f64() - 0.5) * PI * ROTATION_SPREAD) as f32;
                let z = ((random.next_f64() - 0.5) * PI * ROTATION_SPREAD) as f32;
                self.branches[child].rotation = Some(Rotation { x, z });
                self.branches[ix].children.push(child);
            }
        }

        Some(ix)
    }

    pub fn root(&self) -> &Branch {
        &self.branches[0]
    }

    pub fn branch(&self, ix: BranchIndex) -> &Branch {
        &self.branches[ix]
    }

    /// Resolves an id to the node it names, or `None` if it was never assigned.
    pub fn locate(&self, id: NodeId) -> Option<NodeLocation> {
        self.locations.get(id as usize).copied()
    }

    /// Number of ids handed out, i.e. the final value of the id counter.
    pub fn id_count(&self) -> usize {
        self.locations.len()
    }

    /// Every id in the subtree rooted at `ix`, in pre-order.
    pub fn subtree_ids(&self, ix: BranchIndex) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![ix];
        while let Some(b) = stack.pop() {
            let branch = &self.branches[b];
            out.extend(branch.own_ids());
            stack.extend(branch.children.iter().rev());
        }
        out
    }

    /// Iterates over `(index, branch)` pairs in generation order.
    pub fn iter(&self) -> impl Iterator<Item = (BranchIndex, &Branch)> {
        self.branches.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ROOT_ID;

    #[test]
    fn generation_is_deterministic() {
        for seed in [0, 1, 42, 12345, 99_999, -5, i64::from(u32::MAX)] {
            let a = Tree::generate(seed);
            let b = Tree::generate(seed);
            assert_eq!(a, b, "seed {seed} produced different trees");
        }
    }

    #[test]
    fn negative_seed_grows_its_wrapped_twin() {
        let neg = Tree::generate(-5);
        let wrapped = Tree::generate(4_294_967_291);
        assert_eq!(neg.seed, -5);
        assert_eq!(neg.branches, wrapped.branches);
    }

    #[test]
    fn different_seeds_usually_differ() {
        let a = Tree::generate(1);
        let b = Tree::generate(2);
        assert_ne!(a.branches, b.branches);
    }

    #[test]
    fn root_is_level_zero_with_id_zero_and_no_rotation() {
        let tree = Tree::generate(12345);
        let root = tree.root();
        assert_eq!(root.id, ROOT_ID);
        assert_eq!(root.level, 0);
        assert!(root.rotation.is_none());
        assert!(root.parent.is_none());
    }

    #[test]
    fn seed_12345_has_expected_shape() {
        let tree = Tree::generate(12345);
        for (_, branch) in tree.iter() {
            assert!(branch.level <= MAX_LEVEL);
            if branch.level < MAX_LEVEL {
                assert!(
                    (2..=4).contains(&branch.children.len()),
                    "level {} has {} children",
                    branch.level,
                    branch.children.len()
                );
            } else {
                assert!(branch.children.is_empty());
            }
            assert_eq!(branch.leaf.is_some(), branch.level >= LEAF_MIN_LEVEL);
            if branch.parent.is_some() {
                assert!(branch.rotation.is_some());
            }
        }
        assert!(tree.iter().any(|(_, b)| b.level == MAX_LEVEL));
    }

    #[test]
    fn ids_are_preorder_and_dense() {
        let tree = Tree::generate(777);
        let preorder = tree.subtree_ids(0);
        let expected: Vec<NodeId> = (0..tree.id_count() as NodeId).collect();
        assert_eq!(preorder, expected);

        for (ix, branch) in tree.iter() {
            assert_eq!(tree.locate(branch.id), Some(NodeLocation::Branch(ix)));
            for s in &branch.segments {
                assert_eq!(s.level, branch.level);
                assert_eq!(tree.locate(s.id), Some(NodeLocation::Segment(ix, s.index)));
            }
            if let Some(leaf) = branch.leaf {
                assert_eq!(tree.locate(leaf.id), Some(NodeLocation::Leaf(ix)));
            }
        }
        assert_eq!(tree.locate(tree.id_count() as NodeId), None);
    }

    #[test]
    fn first_draw_decides_root_branch_count() {
        // The first value of the seed-12345 stream is ~0.98 -> 4 children.
        let tree = Tree::generate(12345);
        assert_eq!(tree.root().children.len(), 4);
        // The root's first child is generated immediately after the root's
        // own four ids.
        let first = tree.branch(tree.root().children[0]);
        assert_eq!(first.id, 4);
        assert_eq!(first.segments.map(|s| s.id), [5, 6, 7]);
    }

    #[test]
    fn rotations_stay_within_spread() {
        let tree = Tree::generate(31337);
        let limit = (PI * ROTATION_SPREAD / 2.0) as f32 + 1e-6;
        for (_, branch) in tree.iter().skip(1) {
            let r = branch.rotation.unwrap();
            assert!(r.x.abs() <= limit && r.z.abs() <= limit);
        }
    }
}
