use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use fbxbake::batch;

/// Bakes node-level transforms of ASCII FBX files into mesh geometry and
/// resets the transform values of accompanying .prefab descriptors.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Directory containing the .fbx and .prefab files to bake. Results are
    /// written to a "baked" subdirectory.
    dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let summary = batch::process_dir(&args.dir)?;
    eprintln!(
        "{}: {} files processed, {} meshes baked, {} skipped, {} failed",
        if summary.is_ok() { "OK" } else { "FAIL" },
        summary.processed,
        summary.baked_meshes,
        summary.skipped,
        summary.failed,
    );

    if !summary.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}
