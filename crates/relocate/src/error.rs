use std::result::Result as StdResult;

use host_tree::NodeId;
use thiserror::Error;

use crate::anchors::Role;

/// Convenient result type for the relocation crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for relocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A search query with neither a type nor a name.
    #[error("search query needs at least a type or a name")]
    InvalidQuery,

    /// A search root that is not part of the host tree.
    #[error("search root {0} is not in the host tree")]
    InvalidArgument(NodeId),

    /// A host element that every supported host version has is missing.
    #[error("required anchor {0} not found")]
    StructuralAnchorMissing(Role),

    /// The control to move has not been created yet.
    #[error("control to move not present yet")]
    TargetNotYetPresent,

    /// An optional anchor is missing; the matching layout mode is unsupported.
    #[error("optional anchor {0} not found")]
    OptionalAnchorMissing(Role),

    /// The child-index path to the primary-mode slot does not resolve.
    #[error("primary slot path {path:?} does not resolve under the title anchor")]
    SlotMissing {
        /// Child indices walked from the title anchor.
        path: Vec<usize>,
    },

    /// The alternate anchor has no parent panel to host the wrapper.
    #[error("alternate anchor {0} has no parent panel")]
    AlternateParentMissing(NodeId),

    /// The host refused a tree operation.
    #[error("host operation failed: {0}")]
    Host(#[from] host_tree::Error),

    /// Configuration could not be parsed or failed validation.
    #[error("config error: {0}")]
    Config(String),
}
