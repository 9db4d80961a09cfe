//! Error handling for the relocate-sim binary.

use std::{io, path::PathBuf, result};

use thiserror::Error;

/// Convenient result type for the simulator.
pub type Result<T> = result::Result<T, Error>;

/// Errors that stop a simulation run.
#[derive(Debug, Error)]
pub enum Error {
    /// The config file could not be read.
    #[error("could not read {path}: {source}")]
    ReadConfig {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The config file was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] relocate::Error),
    /// The simulated host refused a scripted change.
    #[error("host error: {0}")]
    Host(#[from] host_tree::Error),
}
