/// Identifier of a branch, segment or leaf in a generated [`crate::tree::Tree`].
///
/// Ids are handed out in pre-order while the tree is generated, so the
/// same seed always yields the same ids. Saved prune sets refer to them.
pub type NodeId = u32;

/// Index of a branch inside `Tree::branches`.
///
/// Only meaningful within the lifetime of a given `Tree` instance.
pub type BranchIndex = usize;

/// Seed that fully determines a tree's shape.
///
/// Any integer is accepted; the random stream only sees it modulo 2^32,
/// so `-5` and `4294967291` grow the same tree.
pub type Seed = i64;

/// Id of the trunk. Always the first id handed out.
pub const ROOT_ID: NodeId = 0;
