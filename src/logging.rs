//! Logger setup for the command-line tool.

use anyhow::{Context, Result};
use std::io::Write;

/// Install the `env_logger` backend.
///
/// Progress is logged at `info`; `verbose` also enables `debug` output.
pub fn init(verbose: bool) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .filter_level(level)
        .try_init()
        .context("failed to initialize logger")
}
