#![warn(missing_docs)]

//! Entry point for the `relocate-sim` binary.

mod cli;
mod error;
mod scenario;

use std::{fs, process, result::Result as StdResult};

use clap::Parser;
use logging::sink::{self, ActivitySink, EntryKind};
use relocate::RelocateConfig;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, registry};

use crate::{
    cli::Cli,
    error::{Error, Result},
};

/// Activity log that prints to stdout.
struct StdoutLog;

impl ActivitySink for StdoutLog {
    fn log_entry(&mut self, kind: EntryKind, source: &str, message: &str) -> StdResult<(), i32> {
        let tag = match kind {
            EntryKind::Information => "info",
            EntryKind::Error => "error",
        };
        println!("[activity {tag}] {source}: {message}");
        Ok(())
    }
}

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and run the chosen scenario.
fn run() -> Result<()> {
    let Cli {
        log,
        scenario,
        config,
        quiet,
    } = Cli::parse();
    let env_filter = log.env_filter();
    registry()
        .with(env_filter)
        .with(fmt::layer().without_time())
        .with(sink::layer())
        .try_init()
        .ok();
    sink::set_sink(StdoutLog);

    let config = match config {
        Some(path) => {
            let src = fs::read_to_string(&path).map_err(|source| Error::ReadConfig {
                path: path.clone(),
                source,
            })?;
            RelocateConfig::from_ron(&src)?
        }
        None => RelocateConfig::default(),
    };
    debug!(%scenario, "running simulation");

    let steps = scenario::run(scenario, config)?;
    print!("{}", scenario::render(&steps, !quiet));
    sink::clear_sink();
    Ok(())
}
