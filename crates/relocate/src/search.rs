//! Depth-first structural search over the host tree.
//!
//! [`search`] returns a lazy, forward-only iterator. It walks the descendants
//! of a root in pre-order with an explicit stack, so deep host trees cannot
//! exhaust the call stack, and it always descends into children whether or not
//! the parent matched. The iterator reads the tree as it goes; if the host may
//! have mutated the tree, start a fresh search.

use std::fmt::{Display, Formatter, Result as FmtResult};

use host_tree::{HostTree, NodeId};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What to look for: a host type identifier, an element name, or both.
///
/// When both are set a node must match both. Comparisons ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchQuery {
    /// Fully qualified host type identifier.
    pub type_name: Option<String>,
    /// Element name.
    pub name: Option<String>,
}

impl SearchQuery {
    /// Match on type only.
    pub fn by_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            name: None,
        }
    }

    /// Match on name only.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            type_name: None,
            name: Some(name.into()),
        }
    }

    /// Match on both type and name.
    pub fn both(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            name: Some(name.into()),
        }
    }

    /// True when neither field is set.
    pub fn is_empty(&self) -> bool {
        self.type_name.is_none() && self.name.is_none()
    }

    /// Test a single node against the query.
    pub fn matches<T: HostTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        if let Some(want) = &self.type_name {
            match tree.type_name(node) {
                Some(got) if same_ident(&got, want) => {}
                _ => return false,
            }
        }
        match &self.name {
            None => true,
            Some(want) => tree.name(node).is_some_and(|got| same_ident(&got, want)),
        }
    }
}

impl Display for SearchQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match (&self.type_name, &self.name) {
            (Some(t), Some(n)) => write!(f, "type={t} name={n}"),
            (Some(t), None) => write!(f, "type={t}"),
            (None, Some(n)) => write!(f, "name={n}"),
            (None, None) => write!(f, "<empty>"),
        }
    }
}

/// Case-insensitive identifier comparison.
pub(crate) fn same_ident(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || (!a.is_ascii() && a.to_lowercase() == b.to_lowercase())
}

/// Lazy pre-order iterator over the descendants of a root that match a query.
pub struct Search<'a, T: ?Sized> {
    /// Tree being walked.
    tree: &'a T,
    /// Query to test each node against.
    query: &'a SearchQuery,
    /// Nodes still to visit; the next one is on top.
    stack: Vec<NodeId>,
}

impl<T: HostTree + ?Sized> Iterator for Search<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(node) = self.stack.pop() {
            self.stack.extend(self.tree.children(node).into_iter().rev());
            if self.query.matches(self.tree, node) {
                return Some(node);
            }
        }
        None
    }
}

/// Search the descendants of `root` for nodes matching `query`.
///
/// The root itself is never yielded.
pub fn search<'a, T: HostTree + ?Sized>(
    tree: &'a T,
    root: NodeId,
    query: &'a SearchQuery,
) -> Result<Search<'a, T>> {
    if query.is_empty() {
        return Err(Error::InvalidQuery);
    }
    if !tree.contains(root) {
        return Err(Error::InvalidArgument(root));
    }
    let mut stack = tree.children(root);
    stack.reverse();
    Ok(Search { tree, query, stack })
}

/// First match of `query` below `root` in pre-order.
pub fn first<T: HostTree + ?Sized>(
    tree: &T,
    root: NodeId,
    query: &SearchQuery,
) -> Result<Option<NodeId>> {
    Ok(search(tree, root, query)?.next())
}
