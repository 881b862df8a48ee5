//! Arena index types for the join tree.
//!
//! Nodes and link records live in `Vec` arenas owned by the tree; everything
//! else (columns, parent references, children) holds these stable indices.
//! Mutation through one index is visible to every holder of that index.

use std::fmt;

/// Stable index of a [`JoinNode`](crate::query_planner::JoinNode) in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Stable index of a [`Link`](crate::query_planner::Link) record in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}
