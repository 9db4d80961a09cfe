//! Relocation state machine.
//!
//! The engine owns the moved control from the moment it is first found. It
//! builds a wrapper around it, places the wrapper for the current
//! [`LayoutMode`], and re-places it whenever the title anchor's visibility
//! flips. Anchors are resolved once; only placement repeats.

use host_tree::{
    EventKind, GridCell, Host, HostTree, NodeId, Orientation, PanelKind, SubscriptionId,
    Thickness, Visibility,
};
use tracing::{debug, error, info, trace};

use crate::{
    Error, Result,
    anchors::AnchorSet,
    config::RelocateConfig,
    search::first,
};

/// Lifecycle of a relocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MoveState {
    /// Not placed yet; retries are still allowed.
    #[default]
    Unresolved,
    /// The control lives in its wrapper and follows mode changes.
    Placed,
    /// A structural prerequisite is missing; nothing more will be attempted.
    PermanentlyImpossible,
}

impl MoveState {
    /// True for the two states that never change again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

/// The host's presentation mode, derived from the title anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Title bar shown.
    Primary,
    /// Title bar hidden (full screen).
    Alternate,
}

impl LayoutMode {
    /// Mode implied by the current visibility of `title_anchor`.
    pub fn of<T: HostTree + ?Sized>(tree: &T, title_anchor: NodeId) -> Self {
        if tree.is_visible(title_anchor) {
            Self::Primary
        } else {
            Self::Alternate
        }
    }
}

/// Notifications the engine subscribes to once placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EngineTrigger {
    /// Title anchor visibility flipped.
    ModeChanged,
    /// Title anchor went through a layout pass.
    TitleLayout,
}

/// Everything the engine holds on to after the first successful placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationContext {
    /// The relocated control.
    pub moved_control: NodeId,
    /// Horizontal stack the engine created; this is what gets moved around.
    pub wrapper: NodeId,
    /// Container of the source container's type now holding the control.
    pub tray: NodeId,
    /// Title anchor.
    pub title_anchor: NodeId,
    /// Alternate-mode anchor, when the host has one.
    pub alternate_anchor: Option<NodeId>,
    /// Where the wrapper is attached right now.
    pub current_parent: Option<NodeId>,
    /// Visibility subscription on the title anchor.
    mode_sub: Option<SubscriptionId>,
    /// Layout subscription on the title anchor.
    layout_sub: Option<SubscriptionId>,
}

/// Owns [`MoveState`] and, once placed, the [`RelocationContext`].
#[derive(Debug, Default)]
pub struct RelocationEngine {
    /// Current lifecycle state.
    state: MoveState,
    /// Present once the control has been moved.
    context: Option<RelocationContext>,
}

impl RelocationEngine {
    /// A fresh engine in [`MoveState::Unresolved`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> MoveState {
        self.state
    }

    /// Context, once placed.
    pub fn context(&self) -> Option<&RelocationContext> {
        self.context.as_ref()
    }

    /// Enter the permanent-failure state.
    pub(crate) fn give_up(&mut self) {
        self.state = MoveState::PermanentlyImpossible;
    }

    /// Move the control out of its source container and place it for the
    /// current mode. Only valid while unresolved.
    pub(crate) fn establish<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        cfg: &RelocateConfig,
        anchors: AnchorSet,
    ) -> MoveState {
        if self.state.is_terminal() {
            return self.state;
        }
        match self.try_establish(host, cfg, anchors) {
            Ok(mode) => {
                self.state = MoveState::Placed;
                info!(?mode, "moved control to title bar");
                self.on_title_layout(host, cfg);
            }
            Err(e) => {
                error!(error = %e, "could not relocate control");
                self.state = MoveState::PermanentlyImpossible;
            }
        }
        self.state
    }

    /// Build the wrapper, move the control into it, and run the first placement.
    ///
    /// Any failure after the control has left its origin puts it back there
    /// before the error is returned.
    fn try_establish<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        cfg: &RelocateConfig,
        anchors: AnchorSet,
    ) -> Result<LayoutMode> {
        let control = anchors.moved_control;
        let origin = host.parent(control).unwrap_or(anchors.source_container);

        let wrapper = host.create_panel(PanelKind::Stack(Orientation::Horizontal))?;
        host.set_margin(wrapper, Thickness::ZERO.with_top(cfg.primary_top_margin))?;
        let tray = host.create_like(anchors.source_container)?;
        let border = host.create_panel(PanelKind::Border)?;
        host.set_border_thickness(border, Thickness::ZERO)?;
        host.add_child(border, tray)?;
        host.add_child(wrapper, border)?;

        host.remove_child(origin, control)?;
        let mut ctx = RelocationContext {
            moved_control: control,
            wrapper,
            tray,
            title_anchor: anchors.title_anchor,
            alternate_anchor: anchors.alternate_anchor,
            current_parent: None,
            mode_sub: None,
            layout_sub: None,
        };
        let mut collapsed = None;
        let mode = match adopt(host, cfg, &mut ctx, &mut collapsed) {
            Ok(mode) => mode,
            Err(e) => {
                roll_back(host, &ctx, collapsed, origin);
                return Err(e);
            }
        };

        ctx.mode_sub = Some(host.subscribe(ctx.title_anchor, EventKind::VisibilityChanged));
        ctx.layout_sub = Some(host.subscribe(ctx.title_anchor, EventKind::LayoutUpdated));
        self.context = Some(ctx);
        Ok(mode)
    }

    /// Which engine handler, if any, owns `id`.
    pub(crate) fn owns(&self, id: SubscriptionId) -> Option<EngineTrigger> {
        let ctx = self.context.as_ref()?;
        if ctx.mode_sub == Some(id) {
            Some(EngineTrigger::ModeChanged)
        } else if ctx.layout_sub == Some(id) {
            Some(EngineTrigger::TitleLayout)
        } else {
            None
        }
    }

    /// Re-place the wrapper after the host switched modes.
    pub(crate) fn on_mode_changed<H: Host + ?Sized>(&mut self, host: &mut H, cfg: &RelocateConfig) {
        if self.state != MoveState::Placed {
            return;
        }
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        match place(host, cfg, ctx) {
            Ok(mode) => debug!(?mode, parent = ?ctx.current_parent, "re-placed wrapper"),
            Err(e) => error!(error = %e, "could not re-place wrapper"),
        }
    }

    /// Keep the wrapper clear of the informational control in the primary mode.
    pub(crate) fn on_title_layout<H: Host + ?Sized>(&mut self, host: &mut H, cfg: &RelocateConfig) {
        if self.state != MoveState::Placed {
            return;
        }
        let Some(ctx) = self.context.as_ref() else {
            return;
        };
        if LayoutMode::of(host, ctx.title_anchor) != LayoutMode::Primary {
            return;
        }
        let Ok(Some(info)) = first(host, ctx.title_anchor, &cfg.anchors.info_control) else {
            return;
        };
        let Ok(Some(measure)) = first(host, info, &cfg.anchors.info_measure) else {
            trace!(%info, "informational control has no measured element");
            return;
        };
        let left = host.actual_width(measure) + cfg.info_padding;
        let margin = host.margin(ctx.wrapper);
        if margin.left == left {
            return;
        }
        if let Err(e) = host.set_margin(ctx.wrapper, margin.with_left(left)) {
            debug!(error = %e, "could not align wrapper");
        }
    }

    /// Drop the engine's subscriptions. Used when the host tears the tree down.
    pub(crate) fn unsubscribe_all<H: Host + ?Sized>(&mut self, host: &mut H) {
        if let Some(ctx) = self.context.as_mut() {
            for id in [ctx.mode_sub.take(), ctx.layout_sub.take()].into_iter().flatten() {
                host.unsubscribe(id);
            }
        }
    }
}

/// Attach the wrapper where the current mode wants it.
fn place<H: HostTree + ?Sized>(
    host: &mut H,
    cfg: &RelocateConfig,
    ctx: &mut RelocationContext,
) -> Result<LayoutMode> {
    let mode = LayoutMode::of(host, ctx.title_anchor);
    trace!(?mode, "placing wrapper");

    if let Some(parent) = ctx.current_parent.take() {
        match host.remove_child(parent, ctx.wrapper) {
            Ok(()) => {
                if let Err(e) = host.update_layout(parent) {
                    debug!(%parent, error = %e, "layout pass after detach failed");
                }
            }
            Err(e) => debug!(%parent, error = %e, "wrapper already gone from recorded parent"),
        }
    }
    // The host may have reparented the wrapper behind our back.
    if let Some(stray) = host.parent(ctx.wrapper) {
        host.remove_child(stray, ctx.wrapper)?;
    }

    match (mode, ctx.alternate_anchor) {
        (LayoutMode::Primary, _) => {
            let margin = host.margin(ctx.wrapper).with_top(cfg.primary_top_margin);
            host.set_margin(ctx.wrapper, margin)?;
            host.set_grid_cell(ctx.wrapper, GridCell::from(cfg.primary_cell))?;
            let slot = slot_at(host, ctx.title_anchor, &cfg.primary_slot_path).ok_or_else(|| {
                Error::SlotMissing {
                    path: cfg.primary_slot_path.clone(),
                }
            })?;
            host.add_child(slot, ctx.wrapper)?;
            ctx.current_parent = Some(slot);
        }
        (LayoutMode::Alternate, Some(alternate)) => {
            let margin = host.margin(ctx.wrapper).with_top(cfg.alternate_top_margin);
            host.set_margin(ctx.wrapper, margin)?;
            let panel = host
                .parent(alternate)
                .ok_or(Error::AlternateParentMissing(alternate))?;
            host.add_child(panel, ctx.wrapper)?;
            // The host collapses the control during this transition.
            host.set_visibility(ctx.moved_control, Visibility::Visible)?;
            host.update_layout(panel)?;
            ctx.current_parent = Some(panel);
        }
        (LayoutMode::Alternate, None) => {
            debug!("alternate mode unsupported; wrapper left detached");
        }
    }
    Ok(mode)
}

/// Follow child indices `path` down from `start`.
fn slot_at<T: HostTree + ?Sized>(tree: &T, start: NodeId, path: &[usize]) -> Option<NodeId> {
    path.iter().try_fold(start, |node, &i| tree.child(node, i))
}

/// Put the detached control into the new tray, apply the fixups, and place
/// the wrapper. `collapsed` records the grip thumb once it has been hidden.
fn adopt<H: HostTree + ?Sized>(
    host: &mut H,
    cfg: &RelocateConfig,
    ctx: &mut RelocationContext,
    collapsed: &mut Option<NodeId>,
) -> Result<LayoutMode> {
    host.add_child(ctx.tray, ctx.moved_control)?;

    // Fixups: no border, and no grip since the control cannot be dragged any more.
    host.set_border_thickness(ctx.moved_control, Thickness::ZERO)?;
    if let Some(thumb) = first(host, ctx.moved_control, &cfg.anchors.grip_thumb)? {
        host.set_visibility(thumb, Visibility::Collapsed)?;
        *collapsed = Some(thumb);
    }
    place(host, cfg, ctx)
}

/// Best-effort undo of a failed first placement: detach the wrapper, show the
/// grip again, and return the control to `origin`.
fn roll_back<H: HostTree + ?Sized>(
    host: &mut H,
    ctx: &RelocationContext,
    collapsed: Option<NodeId>,
    origin: NodeId,
) {
    if let Some(parent) = host.parent(ctx.wrapper) {
        if let Err(e) = host.remove_child(parent, ctx.wrapper) {
            debug!(%parent, error = %e, "could not detach wrapper");
        }
    }
    if let Some(thumb) = collapsed {
        if let Err(e) = host.set_visibility(thumb, Visibility::Visible) {
            debug!(%thumb, error = %e, "could not show grip again");
        }
    }
    let control = ctx.moved_control;
    if let Some(from) = host.parent(control) {
        if let Err(e) = host.remove_child(from, control) {
            error!(%control, %from, error = %e, "could not take control out of the new tray");
            return;
        }
    }
    if let Err(e) = host.add_child(origin, control) {
        error!(%control, error = %e, "could not return control to its original container");
    }
}

#[cfg(test)]
mod tests {
    use host_tree::memory::{MemoryHost, NodeSpec};

    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!MoveState::Unresolved.is_terminal());
        assert!(MoveState::Placed.is_terminal());
        assert!(MoveState::PermanentlyImpossible.is_terminal());
    }

    #[test]
    fn mode_follows_title_visibility() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let title = host.insert(root, NodeSpec::container("Title"));
        assert_eq!(LayoutMode::of(&host, title), LayoutMode::Primary);
        host.show(title, false).unwrap();
        assert_eq!(LayoutMode::of(&host, title), LayoutMode::Alternate);
    }

    #[test]
    fn slot_path_walks_child_indices() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let a = host.insert(root, NodeSpec::container("A"));
        host.insert(a, NodeSpec::new("B0"));
        let b1 = host.insert(a, NodeSpec::container("B1"));
        assert_eq!(slot_at(&host, root, &[0, 1]), Some(b1));
        assert_eq!(slot_at(&host, root, &[0, 2]), None);
        assert_eq!(slot_at(&host, root, &[]), Some(root));
    }

    #[test]
    fn missing_slot_restores_control() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let tray = host.insert(root, NodeSpec::container("Tray").named("TopDockTray"));
        let control = host.insert(tray, NodeSpec::container("Bar"));
        let title = host.insert(root, NodeSpec::container("Title"));
        let anchors = AnchorSet {
            source_container: tray,
            moved_control: control,
            title_anchor: title,
            alternate_anchor: None,
        };
        let mut engine = RelocationEngine::new();
        let state = engine.establish(&mut host, &RelocateConfig::default(), anchors);
        assert_eq!(state, MoveState::PermanentlyImpossible);
        assert_eq!(host.parent(control), Some(tray));
        assert_eq!(host.live_subscriptions(), 0);
        assert!(engine.context().is_none());
    }
}
