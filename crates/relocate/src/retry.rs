//! Deferred retries while the control to move does not exist yet.
//!
//! The coordinator listens on the source container (layout passes and load)
//! and on every candidate control already inside it (visibility). Any of those
//! notifications is a cue to resolve again. Registrations are keyed by node so
//! re-arming after each failed retry never duplicates them, and all of them are
//! dropped together once relocation reaches a terminal state.

use host_tree::{EventKind, HostEvents, NodeId, SubscriptionId};
use tracing::{debug, trace};

/// Which retry registration a notification arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryTrigger {
    /// Layout pass on the source container.
    ContainerLayout,
    /// The source container finished loading.
    ContainerLoaded,
    /// A candidate control became visible or hidden.
    CandidateVisibility,
}

/// Retry registrations for a single source container.
#[derive(Debug, Default)]
pub struct RetryCoordinator {
    /// Container the registrations below belong to.
    container: Option<NodeId>,
    /// `LayoutUpdated` on the container.
    layout: Option<SubscriptionId>,
    /// `Loaded` on the container.
    loaded: Option<SubscriptionId>,
    /// `VisibilityChanged` per candidate control.
    visibility: Vec<(NodeId, SubscriptionId)>,
}

impl RetryCoordinator {
    /// An idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while any registration is live.
    pub fn is_armed(&self) -> bool {
        self.layout.is_some() || self.loaded.is_some() || !self.visibility.is_empty()
    }

    /// Number of live registrations.
    pub fn subscription_count(&self) -> usize {
        usize::from(self.layout.is_some())
            + usize::from(self.loaded.is_some())
            + self.visibility.len()
    }

    /// Make sure we hear about changes to `container` and to each of `candidates`.
    ///
    /// Idempotent for an unchanged container. Candidates that disappeared since
    /// the last call lose their registration; new ones gain one.
    pub(crate) fn arm<H: HostEvents + ?Sized>(
        &mut self,
        host: &mut H,
        container: NodeId,
        candidates: &[NodeId],
    ) {
        if self.container.is_some_and(|c| c != container) {
            debug!(old = ?self.container, new = %container, "source container replaced");
            self.dispose(host);
        }
        self.container = Some(container);

        if self.layout.is_none() {
            self.layout = Some(host.subscribe(container, EventKind::LayoutUpdated));
        }
        if self.loaded.is_none() {
            self.loaded = Some(host.subscribe(container, EventKind::Loaded));
        }

        self.visibility.retain(|&(node, sub)| {
            let keep = candidates.contains(&node);
            if !keep {
                host.unsubscribe(sub);
            }
            keep
        });
        for &node in candidates {
            if !self.visibility.iter().any(|&(n, _)| n == node) {
                let sub = host.subscribe(node, EventKind::VisibilityChanged);
                self.visibility.push((node, sub));
            }
        }
        trace!(
            %container,
            subscriptions = self.subscription_count(),
            "retry armed"
        );
    }

    /// Which registration, if any, `id` is.
    pub(crate) fn owns(&self, id: SubscriptionId) -> Option<RetryTrigger> {
        if self.layout == Some(id) {
            Some(RetryTrigger::ContainerLayout)
        } else if self.loaded == Some(id) {
            Some(RetryTrigger::ContainerLoaded)
        } else if self.visibility.iter().any(|&(_, s)| s == id) {
            Some(RetryTrigger::CandidateVisibility)
        } else {
            None
        }
    }

    /// Drop every registration. Returns how many were live.
    pub(crate) fn dispose<H: HostEvents + ?Sized>(&mut self, host: &mut H) -> usize {
        let subs: Vec<SubscriptionId> = self
            .layout
            .take()
            .into_iter()
            .chain(self.loaded.take())
            .chain(self.visibility.drain(..).map(|(_, s)| s))
            .collect();
        for &id in &subs {
            host.unsubscribe(id);
        }
        self.container = None;
        if !subs.is_empty() {
            debug!(count = subs.len(), "retry subscriptions disposed");
        }
        subs.len()
    }
}

#[cfg(test)]
mod tests {
    use host_tree::memory::{MemoryHost, NodeSpec};

    use super::*;

    #[test]
    fn rearming_does_not_duplicate() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let tray = host.insert(root, NodeSpec::container("Tray"));
        let bar = host.insert(tray, NodeSpec::new("Bar"));
        let mut retry = RetryCoordinator::new();
        retry.arm(&mut host, tray, &[bar]);
        retry.arm(&mut host, tray, &[bar]);
        assert_eq!(retry.subscription_count(), 3);
        assert_eq!(host.live_subscriptions(), 3);
    }

    #[test]
    fn vanished_candidates_are_unsubscribed() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let tray = host.insert(root, NodeSpec::container("Tray"));
        let a = host.insert(tray, NodeSpec::new("Bar"));
        let b = host.insert(tray, NodeSpec::new("Bar"));
        let mut retry = RetryCoordinator::new();
        retry.arm(&mut host, tray, &[a, b]);
        retry.arm(&mut host, tray, &[b]);
        assert!(host.subscriptions_on(a).is_empty());
        assert_eq!(host.subscriptions_on(b), vec![EventKind::VisibilityChanged]);
    }

    #[test]
    fn dispose_clears_everything() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let tray = host.insert(root, NodeSpec::container("Tray"));
        let mut retry = RetryCoordinator::new();
        retry.arm(&mut host, tray, &[]);
        assert!(retry.is_armed());
        assert_eq!(retry.dispose(&mut host), 2);
        assert!(!retry.is_armed());
        assert_eq!(host.live_subscriptions(), 0);
        assert_eq!(retry.dispose(&mut host), 0);
    }
}
