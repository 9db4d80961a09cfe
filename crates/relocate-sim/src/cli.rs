//! Command-line interface definitions for relocate-sim.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use clap::{Parser, ValueEnum};
use logging::LogArgs;

/// Command-line interface for the `relocate-sim` binary.
#[derive(Parser, Debug)]
#[command(
    name = "relocate-sim",
    about = "Relocate the title bar toolbar inside a simulated IDE window",
    version
)]
pub struct Cli {
    /// Logging controls shared across titledock binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// Which host situation to simulate.
    #[arg(long, value_enum, default_value_t = Scenario::Direct)]
    pub scenario: Scenario,

    /// RON file overriding the relocation settings.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Do not print the tree after each step.
    #[arg(long)]
    pub quiet: bool,
}

/// Host situations the simulator can set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Everything is present and loaded at startup.
    Direct,
    /// The main window loads after the relocator starts.
    Deferred,
    /// The toolbar is enabled only after the relocator starts.
    LateControl,
    /// The host has no dock tray.
    NoTray,
    /// The host has no full screen menu bar.
    NoFullscreen,
}

impl Display for Scenario {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Direct => "direct",
            Self::Deferred => "deferred",
            Self::LateControl => "late-control",
            Self::NoTray => "no-tray",
            Self::NoFullscreen => "no-fullscreen",
        };
        f.write_str(s)
    }
}
