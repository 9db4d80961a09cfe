use std::mem;

use host_tree::{
    Error as HostError, EventKind, GridCell, HostEvents, HostTree, NodeId, PanelKind,
    Result as HostResult, SubscriptionId, Thickness, Visibility, memory::MemoryHost,
};
use relocate::{
    MoveState, Outcome, RelocateConfig, Relocator,
    scene::{IdeScene, SceneOptions},
};

/// A `MemoryHost` that refuses selected mutations on selected nodes.
struct Faulty {
    /// The real tree.
    inner: MemoryHost,
    /// `set_border_thickness` fails on this node.
    border_fails_on: Option<NodeId>,
    /// `set_visibility` fails on this node.
    visibility_fails_on: Option<NodeId>,
    /// `update_layout` fails on this node.
    layout_fails_on: Option<NodeId>,
}

impl Faulty {
    /// Take over the host of `scene`.
    fn over(scene: &mut IdeScene) -> Self {
        Self {
            inner: mem::take(&mut scene.host),
            border_fails_on: None,
            visibility_fails_on: None,
            layout_fails_on: None,
        }
    }
}

impl HostTree for Faulty {
    fn contains(&self, node: NodeId) -> bool {
        self.inner.contains(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.children(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.parent(node)
    }

    fn type_name(&self, node: NodeId) -> Option<String> {
        self.inner.type_name(node)
    }

    fn name(&self, node: NodeId) -> Option<String> {
        self.inner.name(node)
    }

    fn automation_name(&self, node: NodeId) -> Option<String> {
        self.inner.automation_name(node)
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.inner.is_visible(node)
    }

    fn is_loaded(&self, node: NodeId) -> bool {
        self.inner.is_loaded(node)
    }

    fn actual_width(&self, node: NodeId) -> f64 {
        self.inner.actual_width(node)
    }

    fn margin(&self, node: NodeId) -> Thickness {
        self.inner.margin(node)
    }

    fn add_child(&mut self, parent: NodeId, child: NodeId) -> HostResult<()> {
        self.inner.add_child(parent, child)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> HostResult<()> {
        self.inner.remove_child(parent, child)
    }

    fn set_margin(&mut self, node: NodeId, margin: Thickness) -> HostResult<()> {
        self.inner.set_margin(node, margin)
    }

    fn set_visibility(&mut self, node: NodeId, visibility: Visibility) -> HostResult<()> {
        if self.visibility_fails_on == Some(node) {
            return Err(HostError::NodeGone(node));
        }
        self.inner.set_visibility(node, visibility)
    }

    fn set_border_thickness(&mut self, node: NodeId, thickness: Thickness) -> HostResult<()> {
        if self.border_fails_on == Some(node) {
            return Err(HostError::NodeGone(node));
        }
        self.inner.set_border_thickness(node, thickness)
    }

    fn set_grid_cell(&mut self, node: NodeId, cell: GridCell) -> HostResult<()> {
        self.inner.set_grid_cell(node, cell)
    }

    fn create_panel(&mut self, kind: PanelKind) -> HostResult<NodeId> {
        self.inner.create_panel(kind)
    }

    fn create_like(&mut self, template: NodeId) -> HostResult<NodeId> {
        self.inner.create_like(template)
    }

    fn update_layout(&mut self, node: NodeId) -> HostResult<()> {
        if self.layout_fails_on == Some(node) {
            return Err(HostError::NodeGone(node));
        }
        self.inner.update_layout(node)
    }
}

impl HostEvents for Faulty {
    fn subscribe(&mut self, node: NodeId, kind: EventKind) -> SubscriptionId {
        self.inner.subscribe(node, kind)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }
}

/// Run a relocator on `host`, delivering notifications until it goes quiet.
fn relocate(host: &mut Faulty, root: NodeId) -> Relocator {
    let mut relocator = Relocator::new(RelocateConfig::default());
    relocator.start(host, root);
    loop {
        let batch = host.inner.drain();
        if batch.is_empty() {
            break;
        }
        for n in &batch {
            relocator.handle(host, n);
        }
    }
    relocator
}

/// The control is back in the dock tray, rendered, with its grip showing.
fn assert_control_restored(scene: &IdeScene, host: &Faulty) {
    let control = scene.toolbar.unwrap();
    assert_eq!(host.parent(control), scene.tray);
    assert!(host.is_visible(control));
    assert_eq!(
        host.inner.visibility(scene.thumb.unwrap()),
        Some(Visibility::Visible)
    );
    assert_eq!(host.inner.live_subscriptions(), 0);
}

#[test]
fn border_fixup_failure_returns_control_to_tray() {
    let mut scene = IdeScene::new();
    let mut host = Faulty::over(&mut scene);
    host.border_fails_on = scene.toolbar;

    let relocator = relocate(&mut host, scene.root);
    assert_eq!(relocator.outcome(), Outcome::Impossible);
    assert!(relocator.context().is_none());
    assert_control_restored(&scene, &host);
}

#[test]
fn grip_fixup_failure_returns_control_to_tray() {
    let mut scene = IdeScene::new();
    let mut host = Faulty::over(&mut scene);
    host.visibility_fails_on = scene.thumb;

    let relocator = relocate(&mut host, scene.root);
    assert_eq!(relocator.outcome(), Outcome::Impossible);
    assert_control_restored(&scene, &host);
}

#[test]
fn failure_after_attach_detaches_wrapper() {
    let mut scene = IdeScene::build(SceneOptions {
        title_visible: false,
        ..SceneOptions::default()
    });
    let mut host = Faulty::over(&mut scene);
    let dock = scene.menu_dock.unwrap();
    let before = host.children(dock);
    // Re-showing the control is the last step of an alternate placement.
    host.visibility_fails_on = scene.toolbar;

    let relocator = relocate(&mut host, scene.root);
    assert_eq!(relocator.state(), MoveState::PermanentlyImpossible);
    assert_eq!(host.children(dock), before);
    assert_control_restored(&scene, &host);
}

#[test]
fn failed_relocation_is_not_retried() {
    let mut scene = IdeScene::new();
    let mut host = Faulty::over(&mut scene);
    host.border_fails_on = scene.toolbar;

    let mut relocator = relocate(&mut host, scene.root);
    host.border_fails_on = None;
    assert_eq!(relocator.run(&mut host, scene.root), Outcome::Impossible);
    assert_eq!(relocator.resolve_attempts(), 1);
    assert_eq!(host.parent(scene.toolbar.unwrap()), scene.tray);
}

#[test]
fn layout_failure_on_old_parent_does_not_block_mode_switch() {
    let mut scene = IdeScene::new();
    let mut host = Faulty::over(&mut scene);
    let mut relocator = relocate(&mut host, scene.root);
    assert_eq!(relocator.outcome(), Outcome::Placed);
    let wrapper = relocator.context().unwrap().wrapper;
    host.layout_fails_on = scene.slot;

    host.inner.show(scene.title_bar.unwrap(), false).unwrap();
    for n in host.inner.drain() {
        relocator.handle(&mut host, &n);
    }
    assert_eq!(relocator.state(), MoveState::Placed);
    assert_eq!(host.parent(wrapper), scene.menu_dock);
    assert_eq!(relocator.context().unwrap().current_parent, scene.menu_dock);
}
