//! An IDE-shaped [`MemoryHost`] scene and a notification pump.
//!
//! Used by the test suites and the simulator. The default scene mirrors the
//! shell the default [`crate::AnchorTable`] targets:
//!
//! ```text
//! Window
//!   Grid
//!     MainWindowTitleBar
//!       Grid
//!         Border (icon)
//!         Border (menu)
//!         Grid            <- primary slot, path [0, 2]
//!           SolutionInfoControl
//!             Border name=TextBorder
//!     DockPanel           <- alternate parent
//!       Menu name=PART_MainMenuBar
//!     VsToolBarTray name=TopDockTray
//!       VsToolBar label=Standard
//!       VsToolBar label=TitleBar
//!         Thumb name=ToolBarThumb
//!         Button
//! ```

use host_tree::{
    Error as HostError, NodeId, Result as HostResult,
    memory::{MemoryHost, NodeSpec},
};

use crate::{
    Outcome, Relocator,
    anchors::{SOLUTION_INFO_TYPE, TOOLBAR_TYPE},
};

/// Host type of the dock tray.
pub const TRAY_TYPE: &str = "Microsoft.VisualStudio.PlatformUI.VsToolBarTray";
/// Host type of the title bar.
pub const TITLE_BAR_TYPE: &str = "Microsoft.VisualStudio.PlatformUI.MainWindowTitleBar";
/// Host type used for plain grids.
pub const GRID_TYPE: &str = "System.Windows.Controls.Grid";
/// Upper bound on pump rounds; a scene that keeps raising past this is looping.
pub const MAX_PUMP_ROUNDS: usize = 64;

/// Which parts of the scene exist and how it starts out.
#[derive(Debug, Clone, Copy)]
pub struct SceneOptions {
    /// Build the dock tray.
    pub tray: bool,
    /// Put the labelled toolbar into the tray.
    pub toolbar: bool,
    /// Build the title bar.
    pub title_bar: bool,
    /// Build the full screen menu bar.
    pub menu_bar: bool,
    /// Build the solution info badge with this measured width.
    pub info_width: Option<f64>,
    /// Start with the title bar visible (primary mode).
    pub title_visible: bool,
    /// Start with the root window loaded.
    pub root_loaded: bool,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            tray: true,
            toolbar: true,
            title_bar: true,
            menu_bar: true,
            info_width: Some(120.0),
            title_visible: true,
            root_loaded: true,
        }
    }
}

/// A built scene with handles to its interesting nodes.
#[derive(Debug)]
pub struct IdeScene {
    /// The host.
    pub host: MemoryHost,
    /// Root window.
    pub root: NodeId,
    /// Top-level layout grid.
    pub layout: NodeId,
    /// Dock tray.
    pub tray: Option<NodeId>,
    /// An unrelated toolbar in the tray.
    pub standard_toolbar: Option<NodeId>,
    /// The toolbar to relocate.
    pub toolbar: Option<NodeId>,
    /// Its grip thumb.
    pub thumb: Option<NodeId>,
    /// Title bar.
    pub title_bar: Option<NodeId>,
    /// Grid the wrapper lands in for the primary mode.
    pub slot: Option<NodeId>,
    /// Solution info badge.
    pub info: Option<NodeId>,
    /// Measured element inside the badge.
    pub info_text: Option<NodeId>,
    /// Full screen menu bar.
    pub menu_bar: Option<NodeId>,
    /// Panel the wrapper lands in for the alternate mode.
    pub menu_dock: Option<NodeId>,
}

impl IdeScene {
    /// The full default scene.
    pub fn new() -> Self {
        Self::build(SceneOptions::default())
    }

    /// Build a scene from `opts`.
    pub fn build(opts: SceneOptions) -> Self {
        let window = NodeSpec::container("Microsoft.VisualStudio.PlatformUI.MainWindow");
        let window = if opts.root_loaded {
            window
        } else {
            window.unloaded()
        };
        let mut host = MemoryHost::with_root(window);
        let root = host.root();
        let layout = host.insert(root, NodeSpec::container(GRID_TYPE));

        let mut scene = Self {
            host,
            root,
            layout,
            tray: None,
            standard_toolbar: None,
            toolbar: None,
            thumb: None,
            title_bar: None,
            slot: None,
            info: None,
            info_text: None,
            menu_bar: None,
            menu_dock: None,
        };

        if opts.title_bar {
            scene.build_title_bar(opts);
        }
        if opts.menu_bar {
            let dock = scene.host.insert(
                layout,
                NodeSpec::container("System.Windows.Controls.DockPanel"),
            );
            let menu = scene.host.insert(
                dock,
                NodeSpec::container("System.Windows.Controls.Menu").named("PART_MainMenuBar"),
            );
            scene.menu_dock = Some(dock);
            scene.menu_bar = Some(menu);
        }
        if opts.tray {
            let tray = scene.host.insert(
                layout,
                NodeSpec::container(TRAY_TYPE)
                    .named("TopDockTray")
                    .background("ToolBarBackground"),
            );
            let standard = scene
                .host
                .insert(tray, NodeSpec::container(TOOLBAR_TYPE).labelled("Standard"));
            scene.tray = Some(tray);
            scene.standard_toolbar = Some(standard);
            if opts.toolbar {
                scene.add_toolbar_silently();
            }
        }
        scene
    }

    /// Title bar subtree, with the slot at child path `[0, 2]`.
    fn build_title_bar(&mut self, opts: SceneOptions) {
        let mut spec = NodeSpec::container(TITLE_BAR_TYPE).named("MainWindowTitleBar");
        if !opts.title_visible {
            spec = spec.collapsed();
        }
        let title = self.host.insert(self.layout, spec);
        let grid = self.host.insert(title, NodeSpec::container(GRID_TYPE));
        self.host
            .insert(grid, NodeSpec::new("System.Windows.Controls.Border").named("Icon"));
        self.host
            .insert(grid, NodeSpec::new("System.Windows.Controls.Border").named("Menu"));
        let slot = self.host.insert(grid, NodeSpec::container(GRID_TYPE));
        if let Some(width) = opts.info_width {
            let info = self
                .host
                .insert(slot, NodeSpec::container(SOLUTION_INFO_TYPE));
            let text = self.host.insert(
                info,
                NodeSpec::new("System.Windows.Controls.Border")
                    .named("TextBorder")
                    .width(width),
            );
            self.info = Some(info);
            self.info_text = Some(text);
        }
        self.title_bar = Some(title);
        self.slot = Some(slot);
    }

    /// The toolbar subtree, not yet attached anywhere.
    fn toolbar_spec() -> NodeSpec {
        NodeSpec::container(TOOLBAR_TYPE).labelled("TitleBar")
    }

    /// Insert the labelled toolbar into the tray without notifications.
    fn add_toolbar_silently(&mut self) {
        let Some(tray) = self.tray else {
            return;
        };
        let bar = self.host.insert(tray, Self::toolbar_spec());
        self.populate_toolbar(bar);
    }

    /// Grip and one button.
    fn populate_toolbar(&mut self, bar: NodeId) {
        let thumb = self.host.insert(
            bar,
            NodeSpec::new("System.Windows.Controls.Primitives.Thumb").named("ToolBarThumb"),
        );
        self.host
            .insert(bar, NodeSpec::new("System.Windows.Controls.Button").named("Build"));
        self.toolbar = Some(bar);
        self.thumb = Some(thumb);
    }

    /// The host enables the labelled toolbar at runtime.
    ///
    /// The toolbar is added to the tray through the host, so the tray's layout
    /// subscribers hear about it. Fails with [`HostError::NotAContainer`] on the
    /// layout grid when the scene was built without a tray.
    pub fn enable_toolbar(&mut self) -> HostResult<NodeId> {
        let tray = self.tray.ok_or(HostError::NotAContainer(self.layout))?;
        let bar = self.host.spawn(tray, Self::toolbar_spec())?;
        self.populate_toolbar(bar);
        Ok(bar)
    }

    /// Enter or leave full screen by hiding or showing the title bar.
    pub fn set_full_screen(&mut self, on: bool) -> HostResult<()> {
        match self.title_bar {
            Some(title) => self.host.show(title, !on),
            None => Ok(()),
        }
    }
}

impl Default for IdeScene {
    fn default() -> Self {
        Self::new()
    }
}

/// Deliver queued host notifications to `relocator` until the host goes quiet.
///
/// Returns the number of notifications handled.
pub fn pump(relocator: &mut Relocator, host: &mut MemoryHost) -> usize {
    let mut handled = 0;
    for _ in 0..MAX_PUMP_ROUNDS {
        let batch = host.drain();
        if batch.is_empty() {
            break;
        }
        for n in &batch {
            let _outcome: Outcome = relocator.handle(host, n);
            handled += 1;
        }
    }
    handled
}
