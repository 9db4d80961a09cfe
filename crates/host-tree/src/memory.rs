//! In-memory host used by tests and the simulator.
//!
//! [`MemoryHost`] keeps a plain tree of nodes and raises notifications the way
//! a retained-mode toolkit would:
//! - structural and margin changes raise `LayoutUpdated` on the affected
//!   container and every ancestor above it;
//! - any change of effective visibility raises `VisibilityChanged` on each node
//!   whose effective visibility flipped;
//! - [`MemoryHost::mark_loaded`] raises `Loaded`.
//!
//! Raised events are queued and handed out by [`MemoryHost::drain`], which
//! drops events for subscriptions that were removed after the event was raised.
//! Scene-building helpers ([`MemoryHost::insert`]) are silent.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fmt::Write as _,
};

use tracing::trace;

use crate::{
    Error, EventKind, GridCell, HostEvents, HostTree, NodeId, Notification, Orientation, PanelKind,
    Result, SubscriptionId, Thickness, Visibility,
};

/// Host type identifier of the root window created by [`MemoryHost::new`].
pub const WINDOW_TYPE: &str = "System.Windows.Window";
/// Host type identifier used for stack panels.
pub const STACK_PANEL_TYPE: &str = "System.Windows.Controls.StackPanel";
/// Host type identifier used for borders.
pub const BORDER_TYPE: &str = "System.Windows.Controls.Border";

/// Description of a node to insert into a [`MemoryHost`].
#[derive(Debug, Clone)]
pub struct NodeSpec {
    /// Host type identifier.
    type_name: String,
    /// Optional element name.
    name: Option<String>,
    /// Optional accessibility name.
    automation_name: Option<String>,
    /// Initial requested visibility.
    visibility: Visibility,
    /// Whether the node starts loaded.
    loaded: bool,
    /// Whether the node accepts children.
    container: bool,
    /// Rendered width.
    width: f64,
    /// Background brush name.
    background: Option<String>,
}

impl NodeSpec {
    /// A visible, loaded leaf of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            automation_name: None,
            visibility: Visibility::Visible,
            loaded: true,
            container: false,
            width: 0.0,
            background: None,
        }
    }

    /// A visible, loaded container of the given type.
    pub fn container(type_name: impl Into<String>) -> Self {
        Self {
            container: true,
            ..Self::new(type_name)
        }
    }

    /// Set the element name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the accessibility name.
    #[must_use]
    pub fn labelled(mut self, automation_name: impl Into<String>) -> Self {
        self.automation_name = Some(automation_name.into());
        self
    }

    /// Set the rendered width.
    #[must_use]
    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Start collapsed.
    #[must_use]
    pub fn collapsed(mut self) -> Self {
        self.visibility = Visibility::Collapsed;
        self
    }

    /// Start not yet loaded.
    #[must_use]
    pub fn unloaded(mut self) -> Self {
        self.loaded = false;
        self
    }

    /// Set the background brush name.
    #[must_use]
    pub fn background(mut self, brush: impl Into<String>) -> Self {
        self.background = Some(brush.into());
        self
    }
}

/// Stored state of a single node.
#[derive(Debug)]
struct MemNode {
    /// Static description.
    spec: NodeSpec,
    /// Current margin.
    margin: Thickness,
    /// Current border thickness.
    border: Thickness,
    /// Grid placement, once set.
    cell: Option<GridCell>,
    /// Parent link.
    parent: Option<NodeId>,
    /// Ordered children.
    children: Vec<NodeId>,
}

/// An in-memory [`HostTree`] + [`HostEvents`] implementation.
#[derive(Debug)]
pub struct MemoryHost {
    /// All live nodes.
    nodes: HashMap<NodeId, MemNode>,
    /// Root window.
    root: NodeId,
    /// Next node id to hand out.
    next_node: u64,
    /// Live subscriptions.
    subs: BTreeMap<SubscriptionId, (NodeId, EventKind)>,
    /// Next subscription token to hand out.
    next_sub: u64,
    /// Raised but not yet drained events.
    pending: VecDeque<Notification>,
    /// Successful trait-level mutations.
    mutations: u64,
    /// Forced layout passes requested through [`HostTree::update_layout`].
    layout_passes: u64,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// A host holding a single, loaded, visible root window.
    pub fn new() -> Self {
        Self::with_root(NodeSpec::container(WINDOW_TYPE))
    }

    /// A host whose root window is built from `spec`.
    pub fn with_root(spec: NodeSpec) -> Self {
        let root = NodeId::new(1);
        let mut nodes = HashMap::new();
        nodes.insert(root, MemNode::from_spec(spec));
        Self {
            nodes,
            root,
            next_node: 2,
            subs: BTreeMap::new(),
            next_sub: 1,
            pending: VecDeque::new(),
            mutations: 0,
            layout_passes: 0,
        }
    }

    /// The root window.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Insert a new node under `parent` without raising any notification.
    ///
    /// # Panics
    /// Panics if `parent` is unknown or not a container; this is a scene-building
    /// helper and a bad scene is a test bug.
    pub fn insert(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        let id = self.alloc(spec);
        let p = self
            .nodes
            .get_mut(&parent)
            .unwrap_or_else(|| panic!("insert under unknown parent {parent}"));
        assert!(p.spec.container, "insert under non-container {parent}");
        p.children.push(id);
        if let Some(n) = self.nodes.get_mut(&id) {
            n.parent = Some(parent);
        }
        id
    }

    /// Insert a new node under `parent` as the host would at runtime, raising
    /// layout and visibility notifications.
    pub fn spawn(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId> {
        let id = self.alloc(spec);
        self.add_child(parent, id)?;
        Ok(id)
    }

    /// Remove `node` and its subtree from the tree, as if the host destroyed it.
    pub fn destroy(&mut self, node: NodeId) -> Result<()> {
        if let Some(parent) = self.parent(node) {
            self.remove_child(parent, node)?;
        }
        for id in self.subtree(node) {
            self.nodes.remove(&id);
        }
        Ok(())
    }

    /// Show or collapse `node`, raising notifications.
    pub fn show(&mut self, node: NodeId, visible: bool) -> Result<()> {
        let v = if visible {
            Visibility::Visible
        } else {
            Visibility::Collapsed
        };
        self.set_visibility(node, v)
    }

    /// Change the rendered width of `node` and raise a layout pass.
    pub fn set_width(&mut self, node: NodeId, width: f64) -> Result<()> {
        let n = self.node_mut(node)?;
        n.spec.width = width;
        self.bubble_layout(node);
        Ok(())
    }

    /// Mark `node` loaded and raise `Loaded` on it.
    pub fn mark_loaded(&mut self, node: NodeId) -> Result<()> {
        self.node_mut(node)?.spec.loaded = true;
        self.raise(node, EventKind::Loaded);
        Ok(())
    }

    /// Raise `kind` on `node` for every matching live subscription.
    pub fn raise(&mut self, node: NodeId, kind: EventKind) {
        for (&subscription, &(n, k)) in &self.subs {
            if n == node && k == kind {
                self.pending.push_back(Notification {
                    subscription,
                    node,
                    kind,
                });
            }
        }
    }

    /// Take every queued notification whose subscription is still live.
    pub fn drain(&mut self) -> Vec<Notification> {
        let subs = &self.subs;
        self.pending
            .drain(..)
            .filter(|n| subs.contains_key(&n.subscription))
            .collect()
    }

    /// Number of live subscriptions.
    pub fn live_subscriptions(&self) -> usize {
        self.subs.len()
    }

    /// Event kinds currently subscribed on `node`, in registration order.
    pub fn subscriptions_on(&self, node: NodeId) -> Vec<EventKind> {
        self.subs
            .values()
            .filter(|(n, _)| *n == node)
            .map(|(_, k)| *k)
            .collect()
    }

    /// Number of successful mutations made through [`HostTree`].
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    /// Number of forced layout passes.
    pub fn layout_passes(&self) -> u64 {
        self.layout_passes
    }

    /// Requested visibility of `node`.
    pub fn visibility(&self, node: NodeId) -> Option<Visibility> {
        self.nodes.get(&node).map(|n| n.spec.visibility)
    }

    /// Border thickness of `node`.
    pub fn border_thickness(&self, node: NodeId) -> Option<Thickness> {
        self.nodes.get(&node).map(|n| n.border)
    }

    /// Grid placement of `node`.
    pub fn grid_cell(&self, node: NodeId) -> Option<GridCell> {
        self.nodes.get(&node).and_then(|n| n.cell)
    }

    /// Background brush of `node`.
    pub fn background(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|n| n.spec.background.clone())
    }

    /// Render the tree below the root as indented text, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(n) = self.nodes.get(&id) else {
                continue;
            };
            let short = n
                .spec
                .type_name
                .rsplit('.')
                .next()
                .unwrap_or(&n.spec.type_name);
            let _ignored = write!(out, "{:indent$}{short} {id}", "", indent = depth * 2);
            if let Some(name) = &n.spec.name {
                let _ignored = write!(out, " name={name}");
            }
            if let Some(label) = &n.spec.automation_name {
                let _ignored = write!(out, " label={label}");
            }
            if n.spec.visibility != Visibility::Visible {
                let _ignored = write!(out, " {:?}", n.spec.visibility);
            }
            if n.margin != Thickness::ZERO {
                let _ignored = write!(out, " margin={}", n.margin);
            }
            out.push('\n');
            for &child in n.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// Allocate a detached node.
    fn alloc(&mut self, spec: NodeSpec) -> NodeId {
        let id = NodeId::new(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, MemNode::from_spec(spec));
        id
    }

    /// Look up a node for mutation.
    fn node_mut(&mut self, node: NodeId) -> Result<&mut MemNode> {
        self.nodes.get_mut(&node).ok_or(Error::NodeGone(node))
    }

    /// `node` and all its descendants.
    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(n.children.iter().copied());
            }
        }
        out
    }

    /// Effective visibility of every node in the subtree of `node`.
    fn visibility_snapshot(&self, node: NodeId) -> Vec<(NodeId, bool)> {
        self.subtree(node)
            .into_iter()
            .map(|id| (id, self.is_visible(id)))
            .collect()
    }

    /// Raise `VisibilityChanged` for every node whose visibility differs from `before`.
    fn raise_visibility_diffs(&mut self, before: Vec<(NodeId, bool)>) {
        for (id, was) in before {
            if self.nodes.contains_key(&id) && self.is_visible(id) != was {
                self.raise(id, EventKind::VisibilityChanged);
            }
        }
    }

    /// Raise `LayoutUpdated` on `node` and each of its ancestors.
    fn bubble_layout(&mut self, node: NodeId) {
        let mut cur = Some(node);
        while let Some(id) = cur {
            self.raise(id, EventKind::LayoutUpdated);
            cur = self.parent(id);
        }
    }
}

impl MemNode {
    /// A detached node built from `spec`.
    fn from_spec(spec: NodeSpec) -> Self {
        Self {
            spec,
            margin: Thickness::ZERO,
            border: Thickness::ZERO,
            cell: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

impl HostTree for MemoryHost {
    fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn type_name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).map(|n| n.spec.type_name.clone())
    }

    fn name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|n| n.spec.name.clone())
    }

    fn automation_name(&self, node: NodeId) -> Option<String> {
        self.nodes
            .get(&node)
            .and_then(|n| n.spec.automation_name.clone())
    }

    fn is_visible(&self, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            let Some(n) = self.nodes.get(&cur) else {
                return false;
            };
            if n.spec.visibility != Visibility::Visible {
                return false;
            }
            match n.parent {
                Some(p) => cur = p,
                None => return cur == self.root,
            }
        }
    }

    fn is_loaded(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.spec.loaded)
    }

    fn actual_width(&self, node: NodeId) -> f64 {
        self.nodes.get(&node).map_or(0.0, |n| n.spec.width)
    }

    fn margin(&self, node: NodeId) -> Thickness {
        self.nodes.get(&node).map_or(Thickness::ZERO, |n| n.margin)
    }

    fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let p = self.nodes.get(&parent).ok_or(Error::NodeGone(parent))?;
        if !p.spec.container {
            return Err(Error::NotAContainer(parent));
        }
        let c = self.nodes.get(&child).ok_or(Error::NodeGone(child))?;
        if let Some(existing) = c.parent {
            return Err(Error::AlreadyParented {
                child,
                parent: existing,
            });
        }
        let before = self.visibility_snapshot(child);
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.mutations += 1;
        trace!(%parent, %child, "add_child");
        self.raise_visibility_diffs(before);
        self.bubble_layout(parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let p = self.nodes.get(&parent).ok_or(Error::NodeGone(parent))?;
        let Some(pos) = p.children.iter().position(|&c| c == child) else {
            return Err(Error::NotAChild { parent, child });
        };
        let before = self.visibility_snapshot(child);
        self.node_mut(parent)?.children.remove(pos);
        self.node_mut(child)?.parent = None;
        self.mutations += 1;
        trace!(%parent, %child, "remove_child");
        self.raise_visibility_diffs(before);
        self.bubble_layout(parent);
        Ok(())
    }

    fn set_margin(&mut self, node: NodeId, margin: Thickness) -> Result<()> {
        let n = self.node_mut(node)?;
        if n.margin == margin {
            return Ok(());
        }
        n.margin = margin;
        self.mutations += 1;
        self.bubble_layout(node);
        Ok(())
    }

    fn set_visibility(&mut self, node: NodeId, visibility: Visibility) -> Result<()> {
        if self.node_mut(node)?.spec.visibility == visibility {
            return Ok(());
        }
        let before = self.visibility_snapshot(node);
        self.node_mut(node)?.spec.visibility = visibility;
        self.mutations += 1;
        self.raise_visibility_diffs(before);
        if let Some(parent) = self.parent(node) {
            self.bubble_layout(parent);
        }
        Ok(())
    }

    fn set_border_thickness(&mut self, node: NodeId, thickness: Thickness) -> Result<()> {
        self.node_mut(node)?.border = thickness;
        self.mutations += 1;
        Ok(())
    }

    fn set_grid_cell(&mut self, node: NodeId, cell: GridCell) -> Result<()> {
        self.node_mut(node)?.cell = Some(cell);
        self.mutations += 1;
        Ok(())
    }

    fn create_panel(&mut self, kind: PanelKind) -> Result<NodeId> {
        let spec = match kind {
            PanelKind::Stack(Orientation::Horizontal | Orientation::Vertical) => {
                NodeSpec::container(STACK_PANEL_TYPE)
            }
            PanelKind::Border => NodeSpec::container(BORDER_TYPE),
        };
        self.mutations += 1;
        Ok(self.alloc(spec))
    }

    fn create_like(&mut self, template: NodeId) -> Result<NodeId> {
        let t = self.nodes.get(&template).ok_or(Error::NodeGone(template))?;
        let mut spec = NodeSpec::container(t.spec.type_name.clone());
        spec.background = t.spec.background.clone();
        self.mutations += 1;
        Ok(self.alloc(spec))
    }

    fn update_layout(&mut self, node: NodeId) -> Result<()> {
        if !self.contains(node) {
            return Err(Error::NodeGone(node));
        }
        self.layout_passes += 1;
        Ok(())
    }
}

impl HostEvents for MemoryHost {
    fn subscribe(&mut self, node: NodeId, kind: EventKind) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_sub);
        self.next_sub += 1;
        self.subs.insert(id, (node, kind));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subs.remove(&id).is_some()
    }
}
