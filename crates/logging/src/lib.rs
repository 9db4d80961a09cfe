#![warn(missing_docs)]

//! Logging setup shared by the titledock crates.
//!
//! - [`LogArgs`]: the `--trace`/`--debug`/`--log-level`/`--log-filter` flags
//!   and the [`EnvFilter`] they select
//! - [`fmt`]: logfmt rendering of tracing events
//! - [`sink`]: forwarding of our events to the host's activity log

use clap::Args;
use tracing::Level;
use tracing_subscriber::EnvFilter;

pub mod fmt;
pub mod sink;

/// Tracing targets of the titledock crates. Level flags only touch these.
pub const OUR_CRATES: &[&str] = &["relocate", "host_tree", "relocate_sim", "logging"];

/// Directives setting `level` on every crate in [`OUR_CRATES`].
pub fn crate_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    OUR_CRATES
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Logging controls for the relocation tools.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Log everything the relocation crates emit
    #[arg(long, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Log relocation decisions and host mutations
    #[arg(long, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Level for the relocation crates (error|warn|info|debug|trace)
    #[arg(long)]
    pub log_level: Option<Level>,

    /// Raw tracing filter, e.g. "relocate=trace,host_tree=debug"; beats every other flag
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl LogArgs {
    /// Level picked by the flags: `--trace`, then `--debug`, then `--log-level`.
    pub fn level(&self) -> Option<Level> {
        if self.trace {
            Some(Level::TRACE)
        } else if self.debug {
            Some(Level::DEBUG)
        } else {
            self.log_level
        }
    }

    /// Filter directives chosen on the command line, if any.
    pub fn directives(&self) -> Option<String> {
        self.log_filter
            .clone()
            .or_else(|| self.level().map(crate_directives))
    }

    /// The filter to install. Without flags, `RUST_LOG` applies, and failing
    /// that our crates log at `info`.
    pub fn env_filter(&self) -> EnvFilter {
        match self.directives() {
            Some(spec) => EnvFilter::new(spec),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(crate_directives(Level::INFO))),
        }
    }
}
