//! Relocate
//!
//! Moves a toolbar out of the host's top dock tray into the main window title
//! bar, and keeps it there while the host switches between its normal and full
//! screen layouts:
//! - [`search`]: lazy depth-first matching over the host tree
//! - [`anchors`]: the capability table and the anchor resolver
//! - [`engine`]: the placement state machine
//! - [`retry`]: deferred retries while the toolbar does not exist yet
//!
//! [`Relocator`] ties these together and is the only thing a host bootstrap
//! needs. It never fails loudly: every outcome is logged and reported as an
//! [`Outcome`].
#![warn(missing_docs)]

use host_tree::{EventKind, Host, HostTree, NodeId, Notification, SubscriptionId};
use tracing::{debug, error, trace};

pub mod anchors;
pub mod config;
pub mod engine;
mod error;
pub mod retry;
pub mod scene;
pub mod search;

pub use anchors::{AnchorSet, AnchorTable, ResolveFailure, Role};
pub use config::RelocateConfig;
pub use engine::{LayoutMode, MoveState, RelocationContext, RelocationEngine};
pub use error::{Error, Result};
pub use retry::RetryCoordinator;
pub use search::{Search, SearchQuery};

use engine::EngineTrigger;

/// What a call into [`Relocator`] achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The control sits in the title bar (or its full screen home).
    Placed,
    /// Waiting for the host; a later notification will retry.
    Pending,
    /// Given up for the life of the process.
    Impossible,
}

impl From<MoveState> for Outcome {
    fn from(s: MoveState) -> Self {
        match s {
            MoveState::Unresolved => Self::Pending,
            MoveState::Placed => Self::Placed,
            MoveState::PermanentlyImpossible => Self::Impossible,
        }
    }
}

/// Entry point for the host: resolves anchors, drives the engine, and routes
/// host notifications to whoever subscribed to them.
///
/// All methods run on the host's UI thread and process one call at a time.
#[derive(Debug)]
pub struct Relocator {
    /// Anchor table and geometry.
    config: RelocateConfig,
    /// Placement state machine.
    engine: RelocationEngine,
    /// Registrations waiting for the control to appear.
    retry: RetryCoordinator,
    /// Root passed to the last [`Relocator::run`], reused by retries.
    root: Option<NodeId>,
    /// `Loaded` registration on the root while waiting for it to load.
    boot: Option<SubscriptionId>,
    /// Number of resolve attempts made.
    attempts: u32,
}

impl Default for Relocator {
    fn default() -> Self {
        Self::new(RelocateConfig::default())
    }
}

impl Relocator {
    /// A relocator that has not run yet.
    pub fn new(config: RelocateConfig) -> Self {
        Self {
            config,
            engine: RelocationEngine::new(),
            retry: RetryCoordinator::new(),
            root: None,
            boot: None,
            attempts: 0,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &RelocateConfig {
        &self.config
    }

    /// Current engine state.
    pub fn state(&self) -> MoveState {
        self.engine.state()
    }

    /// Current state as an [`Outcome`].
    pub fn outcome(&self) -> Outcome {
        self.engine.state().into()
    }

    /// How many times anchors have been resolved.
    pub fn resolve_attempts(&self) -> u32 {
        self.attempts
    }

    /// Placement details, once placed.
    pub fn context(&self) -> Option<&RelocationContext> {
        self.engine.context()
    }

    /// Retry registrations.
    pub fn retry(&self) -> &RetryCoordinator {
        &self.retry
    }

    /// Layout mode the host is in, once placed.
    pub fn mode<T: HostTree + ?Sized>(&self, tree: &T) -> Option<LayoutMode> {
        self.context()
            .map(|ctx| LayoutMode::of(tree, ctx.title_anchor))
    }

    /// Bootstrap: run now if `root` is loaded, otherwise wait for its `Loaded`
    /// notification.
    pub fn start<H: Host + ?Sized>(&mut self, host: &mut H, root: NodeId) -> Outcome {
        if self.engine.state().is_terminal() {
            trace!(state = ?self.engine.state(), "relocation already settled");
            return self.outcome();
        }
        if host.is_loaded(root) {
            debug!(%root, "host root loaded; relocating directly");
            return self.run(host, root);
        }
        if self.boot.is_none() {
            debug!(%root, "host root not loaded; deferring");
            self.boot = Some(host.subscribe(root, EventKind::Loaded));
        }
        self.root = Some(root);
        self.outcome()
    }

    /// Resolve anchors below `root` and relocate. Idempotent once terminal.
    pub fn run<H: Host + ?Sized>(&mut self, host: &mut H, root: NodeId) -> Outcome {
        if self.engine.state().is_terminal() {
            trace!(state = ?self.engine.state(), "relocation already settled");
            return self.outcome();
        }
        self.root = Some(root);
        self.attempts += 1;

        match anchors::resolve(host, root, &self.config.anchors) {
            Ok(anchors) => {
                self.engine.establish(host, &self.config, anchors);
            }
            Err(ResolveFailure::Retryable {
                source_container,
                candidates,
            }) => {
                self.retry.arm(host, source_container, &candidates);
            }
            Err(ResolveFailure::Impossible(e)) => {
                debug!(error = %e, "relocation impossible on this host");
                self.engine.give_up();
            }
            Err(ResolveFailure::Invalid(e)) => {
                error!(error = %e, "relocation called with invalid arguments");
            }
        }

        if self.engine.state().is_terminal() {
            self.retry.dispose(host);
        }
        self.outcome()
    }

    /// Route a host notification. Unknown subscriptions are ignored.
    pub fn handle<H: Host + ?Sized>(&mut self, host: &mut H, n: &Notification) -> Outcome {
        if self.boot == Some(n.subscription) {
            host.unsubscribe(n.subscription);
            self.boot = None;
            debug!(root = %n.node, "host root loaded; relocating");
            return self.run(host, n.node);
        }
        if let Some(trigger) = self.engine.owns(n.subscription) {
            match trigger {
                EngineTrigger::ModeChanged => self.engine.on_mode_changed(host, &self.config),
                EngineTrigger::TitleLayout => self.engine.on_title_layout(host, &self.config),
            }
            return self.outcome();
        }
        if let Some(trigger) = self.retry.owns(n.subscription) {
            trace!(?trigger, node = %n.node, "retrying relocation");
            if let Some(root) = self.root {
                return self.run(host, root);
            }
        }
        self.outcome()
    }

    /// Drop every registration this relocator holds. State is kept.
    pub fn shutdown<H: Host + ?Sized>(&mut self, host: &mut H) {
        if let Some(id) = self.boot.take() {
            host.unsubscribe(id);
        }
        self.retry.dispose(host);
        self.engine.unsubscribe_all(host);
    }
}
