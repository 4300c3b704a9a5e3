//! Free Shred - overwrite the free space of a mounted filesystem.
//!
//! Fills the target filesystem with temporary files holding successive
//! overwrite patterns, then deletes them to return the space.

use clap::{Parser, Subcommand};
use free_shred::config::{shred_params, DEFAULT_CHUNK_SIZE};
use free_shred::probe::{self, as_mib};
use free_shred::{cleanup, logging, shred};
use free_shred::{ChunkGenerator, FreeSpaceWiper, Result, WipeRequest};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "free-shred")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Overwrite the free space of a mounted filesystem",
    long_about = "Fills free space with zeros, ones, random and encrypted data in temporary files, then deletes them so deleted data cannot be recovered."
)]
struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wipe the free space of the filesystem containing TARGET
    Wipe {
        /// Directory on the filesystem to wipe
        target: PathBuf,

        /// Number of passes over all four patterns (default: 3)
        #[arg(allow_negative_numbers = true)]
        passes: Option<String>,

        /// Bytes per write (default: 512 MiB)
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Stop each temp file after this many chunks
        #[arg(long)]
        max_chunks: Option<u64>,

        /// Skip the fsync before each temp file is deleted
        #[arg(long)]
        no_sync: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove temp files left behind by an interrupted wipe
    Clean {
        /// Directory that was wiped
        target: PathBuf,
    },

    /// Overwrite, rename and delete a single file
    Shred {
        /// File to destroy
        file: PathBuf,

        /// Number of passes over all four patterns
        #[arg(long, default_value_t = shred_params::DEFAULT_PASSES)]
        passes: u32,

        /// Number of random renames before deletion
        #[arg(long, default_value_t = shred_params::DEFAULT_RENAMES)]
        renames: u32,
    },

    /// Show free space for the filesystem containing TARGET
    Probe {
        /// Directory on the filesystem to inspect
        target: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Wipe {
            target,
            passes,
            chunk_size,
            max_chunks,
            no_sync,
            json,
        } => cmd_wipe(target, passes.as_deref(), chunk_size, max_chunks, !no_sync, json),

        Commands::Clean { target } => cmd_clean(&target),

        Commands::Shred {
            file,
            passes,
            renames,
        } => cmd_shred(&file, passes, renames),

        Commands::Probe { target } => cmd_probe(&target),
    }
}

fn cmd_wipe(
    target: PathBuf,
    passes: Option<&str>,
    chunk_size: usize,
    max_chunks: Option<u64>,
    sync: bool,
    json: bool,
) -> Result<()> {
    let request = WipeRequest::from_args(target, passes)?
        .with_chunk_size(chunk_size)
        .with_max_chunks(max_chunks)
        .with_sync(sync);
    request.validate()?;

    let mut wiper = FreeSpaceWiper::new(request, ChunkGenerator::from_time());
    let report = wiper.run();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Free space wipe complete");
        println!("  Target:         {}", report.target.display());
        println!("  Passes:         {}", report.passes);
        println!("  Iterations:     {}", report.iterations.len());
        println!("  Written:        {} MB", as_mib(report.total_bytes()));
        println!("  Errors:         {}", report.error_count());
    }

    Ok(())
}

fn cmd_clean(target: &Path) -> Result<()> {
    let report = cleanup::remove_stale(target)?;

    if report.removed.is_empty() && report.failed.is_empty() {
        println!("No leftover temp files in {}", target.display());
    }
    for path in &report.removed {
        println!("Removed {}", path.display());
    }
    for (path, error) in &report.failed {
        println!("Failed to remove {}: {}", path.display(), error);
    }

    Ok(())
}

fn cmd_shred(file: &Path, passes: u32, renames: u32) -> Result<()> {
    let mut generator = ChunkGenerator::from_time();
    let report = shred::shred_file(file, passes, renames, &mut generator)?;

    println!(
        "Shredded {} ({} bytes, {} pass(es))",
        report.path.display(),
        report.size,
        report.passes
    );

    Ok(())
}

fn cmd_probe(target: &Path) -> Result<()> {
    let info = probe::capacity(target)?;

    println!("Filesystem Capacity");
    println!("===================");
    println!("Path:             {}", target.display());
    println!("Block size:       {} bytes", info.block_size);
    println!("Total:            {} MB", as_mib(info.total));
    println!("Free:             {} MB", as_mib(info.free));
    println!("Available:        {} MB", as_mib(info.available));

    Ok(())
}
