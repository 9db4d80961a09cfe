//! Relocation settings: the anchor table plus the geometry fixups.
//!
//! Defaults match the IDE shell this was built for. A RON document may
//! override any subset of fields:
//!
//! ```ron
//! (
//!     anchors: (moved_control_label: "Standard"),
//!     info_padding: 12.0,
//! )
//! ```

use host_tree::GridCell;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, anchors::AnchorTable};

/// Grid placement of the wrapper inside the primary-mode slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Cell {
    /// Zero-based grid row.
    pub row: u32,
    /// Zero-based grid column.
    pub column: u32,
}

impl Default for Cell {
    fn default() -> Self {
        Self { row: 0, column: 4 }
    }
}

impl From<Cell> for GridCell {
    fn from(c: Cell) -> Self {
        Self {
            row: c.row,
            column: c.column,
        }
    }
}

/// Everything the relocation core can be tuned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelocateConfig {
    /// How to find each structural anchor.
    pub anchors: AnchorTable,
    /// Wrapper top margin in the primary mode.
    pub primary_top_margin: f64,
    /// Wrapper top margin in the alternate mode.
    pub alternate_top_margin: f64,
    /// Grid cell the wrapper occupies in the primary-mode slot.
    pub primary_cell: Cell,
    /// Child indices walked from the title anchor to reach the primary-mode slot.
    pub primary_slot_path: Vec<usize>,
    /// Gap kept between the informational control and the wrapper.
    pub info_padding: f64,
}

impl Default for RelocateConfig {
    fn default() -> Self {
        Self {
            anchors: AnchorTable::default(),
            primary_top_margin: 4.0,
            alternate_top_margin: 0.0,
            primary_cell: Cell::default(),
            primary_slot_path: vec![0, 2],
            info_padding: 10.0,
        }
    }
}

impl RelocateConfig {
    /// Parse a RON document and validate it.
    pub fn from_ron(src: &str) -> Result<Self> {
        let cfg: Self = ron::from_str(src).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<()> {
        self.anchors.validate()?;
        for (what, v) in [
            ("primary_top_margin", self.primary_top_margin),
            ("alternate_top_margin", self.alternate_top_margin),
            ("info_padding", self.info_padding),
        ] {
            if !v.is_finite() {
                return Err(Error::Config(format!("{what} must be finite")));
            }
        }
        Ok(())
    }
}
