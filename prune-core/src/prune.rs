//! Cascading removal of tree parts, recorded by id.
//!
//! A child branch hangs off the top of its parent's last surviving
//! segment, so cutting a segment takes everything built on top of it.
//! The cascade writes all of those ids out explicitly: the [`PruneSet`]
//! alone decides what is visible.

use crate::tree::{NodeLocation, SEGMENTS_PER_BRANCH, Tree};
use crate::types::{BranchIndex, NodeId, ROOT_ID};
use std::collections::BTreeSet;

/// Result of a prune request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PruneOutcome {
    /// `added` ids were not in the set before.
    Pruned { added: usize },
    /// The base of the trunk cannot be cut. Nothing changed.
    ProtectedBase,
    /// The id does not exist in this tree. Nothing changed.
    UnknownNode,
}

impl PruneOutcome {
    pub fn is_pruned(self) -> bool {
        matches!(self, PruneOutcome::Pruned { .. })
    }
}

/// Ids removed from a tree. Grows monotonically for the lifetime of a tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneSet {
    ids: BTreeSet<NodeId>,
}

impl PruneSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a saved set. The trunk id is never accepted.
    pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut ids: BTreeSet<NodeId> = ids.into_iter().collect();
        if ids.remove(&ROOT_ID) {
            log::warn!("dropping trunk id {ROOT_ID} from restored prune set");
        }
        Self { ids }
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids.iter().copied()
    }

    fn insert_all(&mut self, ids: impl IntoIterator<Item = NodeId>) -> usize {
        ids.into_iter().filter(|&id| self.ids.insert(id)).count()
    }

    /// Removes a single leaf cluster.
    ///
    /// Only ids that name a leaf of `tree` are accepted; anything else
    /// (the trunk, a branch, a segment) is reported as [`PruneOutcome::UnknownNode`].
    pub fn prune_leaf(&mut self, tree: &Tree, leaf_id: NodeId) -> PruneOutcome {
        if leaf_id == ROOT_ID || !matches!(tree.locate(leaf_id), Some(NodeLocation::Leaf(_))) {
            log::warn!("ignoring leaf prune of non-leaf node {leaf_id}");
            return PruneOutcome::UnknownNode;
        }
        let added = self.insert_all([leaf_id]);
        PruneOutcome::Pruned { added }
    }

    /// Cuts `branch` at `segment_index`.
    ///
    /// Adds the segments from `segment_index` to the tip, the branch id
    /// itself when cutting at the first segment, the leaf, and the full
    /// subtree of every child. Cutting the trunk at its base is refused.
    pub fn prune_from_segment(
        &mut self,
        tree: &Tree,
        branch: BranchIndex,
        segment_index: usize,
    ) -> PruneOutcome {
        let data = tree.branch(branch);
        if data.level == 0 && segment_index == 0 {
            log::info!("refusing to prune the trunk base (segment {})", data.segments[0].id);
            return PruneOutcome::ProtectedBase;
        }

        let mut added = self.insert_all(
            data.segments[segment_index.min(SEGMENTS_PER_BRANCH)..]
                .iter()
                .map(|s| s.id),
        );
        if segment_index == 0 {
            added += self.insert_all([data.id]);
        }
        if let Some(leaf) = data.leaf {
            added += self.insert_all([leaf.id]);
        }
        for &child in &data.children {
            added += self.insert_all(tree.subtree_ids(child));
        }

        log::info!(
            "pruned branch {} from segment {segment_index}: {added} new ids",
            data.id
        );
        PruneOutcome::Pruned { added }
    }

    /// Prunes whatever `id` names in `tree`.
    ///
    /// A branch id is treated as its first segment.
    pub fn prune_node(&mut self, tree: &Tree, id: NodeId) -> PruneOutcome {
        match tree.locate(id) {
            Some(NodeLocation::Leaf(_)) => self.prune_leaf(tree, id),
            Some(NodeLocation::Segment(b, index)) => self.prune_from_segment(tree, b, index),
            Some(NodeLocation::Branch(b)) => self.prune_from_segment(tree, b, 0),
            None => {
                log::warn!("ignoring prune of unknown node {id}");
                PruneOutcome::UnknownNode
            }
        }
    }
}
