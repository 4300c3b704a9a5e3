//! Free space wiper.
//!
//! Runs every configured pass over the four patterns. Each (pass, pattern)
//! iteration fills one temporary file until the filesystem stops accepting
//! writes, then deletes it so the overwritten blocks return to free space.
//!
//! Per-iteration failures are logged and recorded in the [`WipeReport`];
//! they never abort the run.

mod fill;
mod temp_file;

pub use fill::{fill_until_exhausted, Exhaustion, FillBuffers, FillOutcome};
pub use temp_file::TempFile;

use crate::config::{temp_file_path, WipeRequest};
use crate::pattern::{ChunkGenerator, Pattern};
use crate::probe::{self, as_mib};
use rand::RngCore;
use serde::Serialize;
use std::path::PathBuf;

/// How a single (pass, pattern) iteration went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The file was filled until exhaustion.
    Filled(FillOutcome),
    /// The temp file could not be created.
    OpenFailed { error: String },
    /// The fill buffers could not be allocated.
    AllocFailed { error: String },
}

/// Record of one (pass, pattern) iteration.
#[derive(Debug, Clone, Serialize)]
pub struct IterationReport {
    pub pass: u32,
    pub pattern: Pattern,
    pub path: PathBuf,
    pub outcome: Outcome,
    /// Set when the temp file could not be removed afterwards.
    pub delete_error: Option<String>,
}

impl IterationReport {
    /// Bytes written during the iteration.
    pub fn bytes_written(&self) -> u64 {
        match &self.outcome {
            Outcome::Filled(fill) => fill.bytes_written,
            _ => 0,
        }
    }

    /// Whether anything went wrong during the iteration.
    pub fn has_error(&self) -> bool {
        !matches!(self.outcome, Outcome::Filled(_)) || self.delete_error.is_some()
    }
}

/// Summary of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct WipeReport {
    pub target: PathBuf,
    pub passes: u32,
    pub chunk_size: usize,
    /// Free space before the first pass, if the probe succeeded.
    pub free_space_before: Option<u64>,
    /// Free space after the last pass, if the probe succeeded.
    pub free_space_after: Option<u64>,
    pub iterations: Vec<IterationReport>,
}

impl WipeReport {
    /// Total bytes written across all iterations.
    pub fn total_bytes(&self) -> u64 {
        self.iterations.iter().map(IterationReport::bytes_written).sum()
    }

    /// Number of iterations that logged an error.
    pub fn error_count(&self) -> usize {
        self.iterations.iter().filter(|i| i.has_error()).count()
    }
}

/// Upper bound on report slots reserved up front.
const MAX_RESERVED_ITERATIONS: usize = 1024;

fn iteration_capacity(passes: u32) -> usize {
    (passes as usize)
        .saturating_mul(Pattern::ALL.len())
        .min(MAX_RESERVED_ITERATIONS)
}

/// Orchestrates passes × patterns over a target directory.
pub struct FreeSpaceWiper<R: RngCore> {
    request: WipeRequest,
    generator: ChunkGenerator<R>,
}

impl<R: RngCore> FreeSpaceWiper<R> {
    pub fn new(request: WipeRequest, generator: ChunkGenerator<R>) -> Self {
        Self { request, generator }
    }

    /// Run every pass and pattern. Never fails; see [`WipeReport`].
    pub fn run(&mut self) -> WipeReport {
        let target = self.request.target.clone();
        let passes = self.request.passes;

        let free_space_before = self.probe_free_space("Detected free space");

        let mut iterations = Vec::with_capacity(iteration_capacity(passes));
        for pass in 0..passes {
            log::info!("=== Pass {}/{} ===", pass + 1, passes);
            for pattern in Pattern::ALL {
                iterations.push(self.run_iteration(pass, pattern));
            }
        }

        let free_space_after = if passes > 0 {
            self.probe_free_space("Free space after wipe")
        } else {
            free_space_before
        };

        let report = WipeReport {
            target,
            passes,
            chunk_size: self.request.chunk_size,
            free_space_before,
            free_space_after,
            iterations,
        };

        log::info!(
            "Free space wipe complete: {} MB written, {} iteration(s) with errors",
            as_mib(report.total_bytes()),
            report.error_count()
        );

        report
    }

    /// Fill and reclaim one temp file.
    pub fn run_iteration(&mut self, pass: u32, pattern: Pattern) -> IterationReport {
        let path = temp_file_path(&self.request.target, pass, pattern.index());
        log::info!("Writing pattern: {} -> {}", pattern, path.display());

        let report = |outcome, delete_error| IterationReport {
            pass,
            pattern,
            path: path.clone(),
            outcome,
            delete_error,
        };

        let mut file = match TempFile::create(path.clone()) {
            Ok(file) => file,
            Err(e) => {
                log::error!("{}", e);
                return report(
                    Outcome::OpenFailed {
                        error: e.to_string(),
                    },
                    None,
                );
            }
        };

        let mut buffers = match FillBuffers::allocate(pattern, self.request.chunk_size) {
            Ok(buffers) => buffers,
            Err(e) => {
                log::error!("{}", e);
                let delete_error = self.reclaim(file);
                return report(
                    Outcome::AllocFailed {
                        error: e.to_string(),
                    },
                    delete_error,
                );
            }
        };

        let fill = fill_until_exhausted(
            &mut file,
            &mut self.generator,
            pattern,
            &mut buffers,
            self.request.max_chunks_per_file,
        );
        drop(buffers);

        log::info!("Wrote {} MB", as_mib(fill.bytes_written));
        if fill.skipped_chunks > 0 {
            log::warn!("Skipped {} chunk(s) that failed to generate", fill.skipped_chunks);
        }

        let delete_error = self.reclaim(file);
        report(Outcome::Filled(fill), delete_error)
    }

    fn reclaim(&self, file: TempFile) -> Option<String> {
        let path = file.path().to_path_buf();
        match file.finish(self.request.sync_each_file) {
            Ok(()) => {
                log::info!("Removed {}", path.display());
                None
            }
            Err(e) => {
                log::error!("{}", e);
                Some(e.to_string())
            }
        }
    }

    fn probe_free_space(&self, label: &str) -> Option<u64> {
        match probe::free_space(&self.request.target) {
            Ok(bytes) => {
                log::info!("{}: {} MB", label, as_mib(bytes));
                Some(bytes)
            }
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }
}
