//! Interfaces to an externally owned, retained-mode UI tree.
//!
//! The tree belongs to the host application. This crate only describes what a
//! caller may ask of it:
//! - [`HostTree`]: structural queries (children, type, name, visibility, width)
//!   and the small set of mutations needed to move an element around.
//! - [`HostEvents`]: subscribe/unsubscribe to host notifications on a node.
//!   Subscriptions are explicit handles; the host delivers each raised event as
//!   a [`Notification`] carrying the handle it was registered under.
//!
//! [`memory::MemoryHost`] implements both traits over an in-memory tree and is
//! used by the test suites and the simulator.
#![warn(missing_docs)]

use std::fmt::{Display, Formatter, Result as FmtResult};

mod error;
pub mod memory;

pub use error::{Error, Result};

/// Opaque handle to a node in the host tree.
///
/// Handles are cheap to copy and carry no ownership; the node they refer to
/// may disappear at any time, in which case host operations report
/// [`Error::NodeGone`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw host identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw host identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#{}", self.0)
    }
}

/// Margin or border widths around an element, in device-independent units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Thickness {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl Thickness {
    /// Zero on every edge.
    pub const ZERO: Self = Self::uniform(0.0);

    /// The same width on every edge.
    #[must_use]
    pub const fn uniform(v: f64) -> Self {
        Self {
            left: v,
            top: v,
            right: v,
            bottom: v,
        }
    }

    /// Copy with a different top edge.
    #[must_use]
    pub const fn with_top(self, top: f64) -> Self {
        Self { top, ..self }
    }

    /// Copy with a different left edge.
    #[must_use]
    pub const fn with_left(self, left: f64) -> Self {
        Self { left, ..self }
    }
}

impl Display for Thickness {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{},{},{},{}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Requested visibility of an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Rendered.
    #[default]
    Visible,
    /// Not rendered but still occupies layout space.
    Hidden,
    /// Not rendered and takes no layout space.
    Collapsed,
}

/// Row/column placement of an element inside a grid container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridCell {
    /// Zero-based row.
    pub row: u32,
    /// Zero-based column.
    pub column: u32,
}

/// Stacking direction of a stack panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Children laid out left to right.
    Horizontal,
    /// Children laid out top to bottom.
    Vertical,
}

/// Kinds of container this crate may ask a host to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelKind {
    /// A stack panel with the given orientation.
    Stack(Orientation),
    /// A border decorator holding a single child.
    Border,
}

/// Classes of notification a host can deliver for a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The node finished loading into the live tree.
    Loaded,
    /// A layout pass touched the node.
    LayoutUpdated,
    /// The node's effective visibility flipped.
    VisibilityChanged,
}

/// Handle returned by [`HostEvents::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a raw host subscription token.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw host subscription token.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A raised host event, tagged with the subscription it was delivered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Subscription the event matched.
    pub subscription: SubscriptionId,
    /// Node the event was raised on.
    pub node: NodeId,
    /// Event class.
    pub kind: EventKind,
}

/// Structural queries and mutations on the host tree.
///
/// All calls happen on the host's UI thread; implementations need not be
/// thread safe.
pub trait HostTree {
    /// True while `node` is part of the host tree.
    fn contains(&self, node: NodeId) -> bool;

    /// Ordered children of `node`. Unknown nodes have no children.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// The `index`-th child of `node`, if any.
    fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).get(index).copied()
    }

    /// Current parent of `node`.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Fully qualified host type identifier.
    fn type_name(&self, node: NodeId) -> Option<String>;

    /// Element name, for nodes that expose one.
    fn name(&self, node: NodeId) -> Option<String>;

    /// Accessibility name, for nodes that expose one.
    fn automation_name(&self, _node: NodeId) -> Option<String> {
        None
    }

    /// Effective visibility: the node and all its ancestors are rendered.
    fn is_visible(&self, node: NodeId) -> bool;

    /// True once the node has been loaded into the live tree.
    fn is_loaded(&self, node: NodeId) -> bool {
        self.contains(node)
    }

    /// Rendered width from the last layout pass.
    fn actual_width(&self, node: NodeId) -> f64;

    /// Current margin of `node`.
    fn margin(&self, node: NodeId) -> Thickness;

    /// Append `child` to the children of `parent`.
    fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    /// Replace the margin of `node`.
    fn set_margin(&mut self, node: NodeId, margin: Thickness) -> Result<()>;

    /// Replace the requested visibility of `node`.
    fn set_visibility(&mut self, node: NodeId, visibility: Visibility) -> Result<()>;

    /// Replace the border thickness of `node`.
    fn set_border_thickness(&mut self, node: NodeId, thickness: Thickness) -> Result<()>;

    /// Set the grid row/column `node` occupies inside a grid parent.
    fn set_grid_cell(&mut self, node: NodeId, cell: GridCell) -> Result<()>;

    /// Create a new, detached container.
    fn create_panel(&mut self, kind: PanelKind) -> Result<NodeId>;

    /// Create a new, detached, empty container of the same host type as
    /// `template`, carrying over its background.
    fn create_like(&mut self, template: NodeId) -> Result<NodeId>;

    /// Force a synchronous layout pass on `node`.
    fn update_layout(&mut self, node: NodeId) -> Result<()>;
}

/// Host notification registration.
pub trait HostEvents {
    /// Register interest in `kind` events raised on `node`.
    fn subscribe(&mut self, node: NodeId, kind: EventKind) -> SubscriptionId;

    /// Drop a registration. Returns false if it was not live.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// A full host: tree access plus notifications.
pub trait Host: HostTree + HostEvents {}

impl<T: HostTree + HostEvents> Host for T {}
