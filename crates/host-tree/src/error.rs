use std::result::Result as StdResult;

use thiserror::Error;

use crate::NodeId;

/// Convenient result type for host tree operations.
pub type Result<T> = StdResult<T, Error>;

/// Failures reported by a host when a tree operation cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The node is no longer part of the host tree (destroyed or never existed).
    #[error("node {0} is gone")]
    NodeGone(NodeId),

    /// The node cannot hold children.
    #[error("node {0} is not a container")]
    NotAContainer(NodeId),

    /// `child` is not currently a child of `parent`.
    #[error("node {child} is not a child of {parent}")]
    NotAChild {
        /// Container the removal was attempted on.
        parent: NodeId,
        /// Node that was expected under `parent`.
        child: NodeId,
    },

    /// `child` already has a parent and must be detached first.
    #[error("node {child} is already attached to {parent}")]
    AlreadyParented {
        /// Node being attached.
        child: NodeId,
        /// Its current parent.
        parent: NodeId,
    },
}
