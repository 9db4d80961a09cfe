//! Structural anchors and the table that locates them.
//!
//! Every host-version-specific identifier lives in [`AnchorTable`]: each
//! [`Role`] maps to the [`SearchQuery`] that finds it. [`resolve`] looks up the
//! four anchors relocation needs and classifies what is missing.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    result::Result as StdResult,
};

use host_tree::{HostTree, NodeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::{
    Error, Result,
    search::{SearchQuery, first, same_ident, search},
};

/// Host type identifier of the IDE's toolbars.
pub const TOOLBAR_TYPE: &str = "Microsoft.VisualStudio.PlatformUI.VsToolBar";
/// Host type identifier of the solution name badge shown in the title bar.
pub const SOLUTION_INFO_TYPE: &str = "Microsoft.VisualStudio.PlatformUI.SolutionInfoControl";

/// Structural role a host element plays for relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Container the control is taken out of.
    SourceContainer,
    /// The control being relocated.
    MovedControl,
    /// Title bar; its visibility decides the layout mode.
    TitleAnchor,
    /// Element whose parent hosts the control in the alternate mode.
    AlternateAnchor,
    /// Informational control sharing the title bar.
    InfoControl,
    /// Element inside the informational control whose width is measured.
    InfoMeasure,
    /// Drag grip of the moved control.
    GripThumb,
}

impl Role {
    /// Every role, in table order.
    pub const ALL: [Self; 7] = [
        Self::SourceContainer,
        Self::MovedControl,
        Self::TitleAnchor,
        Self::AlternateAnchor,
        Self::InfoControl,
        Self::InfoMeasure,
        Self::GripThumb,
    ];
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::SourceContainer => "source_container",
            Self::MovedControl => "moved_control",
            Self::TitleAnchor => "title_anchor",
            Self::AlternateAnchor => "alternate_anchor",
            Self::InfoControl => "info_control",
            Self::InfoMeasure => "info_measure",
            Self::GripThumb => "grip_thumb",
        };
        f.write_str(s)
    }
}

/// Capability table: how to find each [`Role`] in the host tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnchorTable {
    /// Finds the source container.
    pub source_container: SearchQuery,
    /// Finds candidate controls inside the source container.
    pub moved_control: SearchQuery,
    /// Accessibility name picking the control among the candidates; empty picks the first.
    pub moved_control_label: String,
    /// Finds the title bar.
    pub title_anchor: SearchQuery,
    /// Finds the alternate-mode anchor.
    pub alternate_anchor: SearchQuery,
    /// Finds the informational control inside the title bar.
    pub info_control: SearchQuery,
    /// Finds the measured element inside the informational control.
    pub info_measure: SearchQuery,
    /// Finds the grip thumb inside the moved control.
    pub grip_thumb: SearchQuery,
}

impl Default for AnchorTable {
    fn default() -> Self {
        Self {
            source_container: SearchQuery::by_name("TopDockTray"),
            moved_control: SearchQuery::by_type(TOOLBAR_TYPE),
            moved_control_label: "TitleBar".to_string(),
            title_anchor: SearchQuery::by_name("MainWindowTitleBar"),
            alternate_anchor: SearchQuery::by_name("PART_MainMenuBar"),
            info_control: SearchQuery::by_type(SOLUTION_INFO_TYPE),
            info_measure: SearchQuery::by_name("TextBorder"),
            grip_thumb: SearchQuery::by_name("ToolBarThumb"),
        }
    }
}

impl AnchorTable {
    /// Query registered for `role`.
    pub fn query(&self, role: Role) -> &SearchQuery {
        match role {
            Role::SourceContainer => &self.source_container,
            Role::MovedControl => &self.moved_control,
            Role::TitleAnchor => &self.title_anchor,
            Role::AlternateAnchor => &self.alternate_anchor,
            Role::InfoControl => &self.info_control,
            Role::InfoMeasure => &self.info_measure,
            Role::GripThumb => &self.grip_thumb,
        }
    }

    /// Reject tables with an empty query for any role.
    pub fn validate(&self) -> Result<()> {
        for role in Role::ALL {
            if self.query(role).is_empty() {
                return Err(Error::Config(format!("empty query for {role}")));
            }
        }
        Ok(())
    }

    /// True if `node` carries the configured accessibility label.
    fn is_labelled<T: HostTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        if self.moved_control_label.is_empty() {
            return true;
        }
        tree.automation_name(node)
            .is_some_and(|n| same_ident(&n, &self.moved_control_label))
    }
}

/// The anchors relocation works from, found by [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorSet {
    /// Container holding the control originally.
    pub source_container: NodeId,
    /// The control to relocate.
    pub moved_control: NodeId,
    /// Title bar.
    pub title_anchor: NodeId,
    /// Alternate-mode anchor; `None` means primary-mode only.
    pub alternate_anchor: Option<NodeId>,
}

/// Why [`resolve`] could not produce an [`AnchorSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    /// The control is not there yet; try again on a later notification.
    Retryable {
        /// The source container that was found.
        source_container: NodeId,
        /// Controls of the expected type currently inside it.
        candidates: Vec<NodeId>,
    },
    /// A structural prerequisite is missing; never retry.
    Impossible(Error),
    /// The call itself was malformed (bad root or query).
    Invalid(Error),
}

impl From<Error> for ResolveFailure {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidQuery | Error::InvalidArgument(_) => Self::Invalid(e),
            other => Self::Impossible(other),
        }
    }
}

/// Find the required anchors below `host_root`.
///
/// Order matters: the source container, then the control, then the title
/// anchor, then the alternate anchor. A missing alternate anchor is logged and
/// tolerated.
pub fn resolve<T: HostTree + ?Sized>(
    tree: &T,
    host_root: NodeId,
    table: &AnchorTable,
) -> StdResult<AnchorSet, ResolveFailure> {
    let Some(source_container) = first(tree, host_root, &table.source_container)? else {
        error!(query = %table.source_container, "could not find source container");
        return Err(ResolveFailure::Impossible(Error::StructuralAnchorMissing(
            Role::SourceContainer,
        )));
    };

    let candidates: Vec<NodeId> = search(tree, source_container, &table.moved_control)?.collect();
    let Some(moved_control) = candidates
        .iter()
        .copied()
        .find(|&c| table.is_labelled(tree, c))
    else {
        trace!(
            candidates = candidates.len(),
            label = %table.moved_control_label,
            "{}",
            Error::TargetNotYetPresent
        );
        return Err(ResolveFailure::Retryable {
            source_container,
            candidates,
        });
    };
    debug!(%moved_control, "found control");

    let Some(title_anchor) = first(tree, host_root, &table.title_anchor)? else {
        error!(query = %table.title_anchor, "could not find title anchor");
        return Err(ResolveFailure::Impossible(Error::StructuralAnchorMissing(
            Role::TitleAnchor,
        )));
    };
    debug!(%title_anchor, "found title anchor");

    let alternate_anchor = first(tree, host_root, &table.alternate_anchor)?;
    if alternate_anchor.is_none() {
        error!(
            query = %table.alternate_anchor,
            "{}; alternate mode not supported",
            Error::OptionalAnchorMissing(Role::AlternateAnchor)
        );
    }

    Ok(AnchorSet {
        source_container,
        moved_control,
        title_anchor,
        alternate_anchor,
    })
}

#[cfg(test)]
mod tests {
    use host_tree::memory::{MemoryHost, NodeSpec};

    use super::*;

    #[test]
    fn default_table_is_valid() {
        AnchorTable::default().validate().unwrap();
    }

    #[test]
    fn empty_role_fails_validation() {
        let table = AnchorTable {
            grip_thumb: SearchQuery::default(),
            ..AnchorTable::default()
        };
        assert_eq!(
            table.validate(),
            Err(Error::Config("empty query for grip_thumb".into()))
        );
    }

    #[test]
    fn picks_labelled_control_among_candidates() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let tray = host.insert(root, NodeSpec::container("Tray").named("TopDockTray"));
        let std_bar = host.insert(tray, NodeSpec::container(TOOLBAR_TYPE).labelled("Standard"));
        let title_bar = host.insert(tray, NodeSpec::container(TOOLBAR_TYPE).labelled("titlebar"));
        let title = host.insert(root, NodeSpec::container("Grid").named("MainWindowTitleBar"));
        let set = resolve(&host, root, &AnchorTable::default()).unwrap();
        assert_ne!(set.moved_control, std_bar);
        assert_eq!(set.moved_control, title_bar);
        assert_eq!(set.title_anchor, title);
        assert_eq!(set.alternate_anchor, None);
    }

    #[test]
    fn bad_root_is_invalid_not_impossible() {
        let host = MemoryHost::new();
        let ghost = NodeId::new(4242);
        assert_eq!(
            resolve(&host, ghost, &AnchorTable::default()),
            Err(ResolveFailure::Invalid(Error::InvalidArgument(ghost)))
        );
    }
}
