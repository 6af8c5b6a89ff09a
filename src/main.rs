mod error;
mod extract;
mod file_times;
mod flatten;
mod matcher;
mod sidecar;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use crate::error::MergeError;
use crate::matcher::BadSidecar;

#[derive(Parser)]
#[command(
    name = "gptm-rs",
    version,
    about = "Google Photos Takeout metadata merger - restore capture times from JSON sidecars"
)]
struct Cli {
    /// Google Takeout zip files
    #[arg(required = true)]
    zip_files: Vec<PathBuf>,

    /// Destination directory for the merged output
    #[arg(short, long)]
    output: PathBuf,

    /// Keep going when a sidecar is malformed; the file goes to no_metadata/
    #[arg(long)]
    skip_bad_metadata: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let t_total = Instant::now();

    let zips: Vec<PathBuf> = cli
        .zip_files
        .iter()
        .filter(|p| {
            p.extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("zip"))
        })
        .cloned()
        .collect();
    if zips.len() < cli.zip_files.len() {
        eprintln!(
            "Ignoring {} non-zip input(s)",
            cli.zip_files.len() - zips.len()
        );
    }
    if zips.is_empty() {
        return Err(MergeError::NoArchives.into());
    }

    let staging = cli.output.join("metadata_only");
    let combined = cli.output.join("combined_files");
    let no_metadata = cli.output.join("no_metadata");
    for dir in [&staging, &combined, &no_metadata] {
        fs::create_dir_all(dir).map_err(MergeError::Filesystem)?;
    }

    // Stage 1: Extract all zips into the staging directory
    eprintln!("=== Stage 1: Extracting ZIP archives ===");
    let t = Instant::now();
    let extracted = extract::extract_archives(&zips, &staging)?;
    eprintln!(
        "  Extracted {} entries in {:.2}s",
        extracted,
        t.elapsed().as_secs_f64()
    );

    // Stage 2: Flatten the extracted tree to a single level
    eprintln!("=== Stage 2: Flattening staging directory ===");
    let t = Instant::now();
    let moved = flatten::consolidate(&staging, &staging)?;
    eprintln!(
        "  Moved {} files in {:.2}s",
        moved,
        t.elapsed().as_secs_f64()
    );

    // Stage 3: Pair media with sidecars and rewrite timestamps
    eprintln!("=== Stage 3: Merging metadata ===");
    let t = Instant::now();
    let policy = if cli.skip_bad_metadata {
        BadSidecar::Unmatched
    } else {
        BadSidecar::Abort
    };
    let summary = matcher::process_files(&staging, &combined, &no_metadata, policy)?;
    eprintln!("  Merge took {:.2}s", t.elapsed().as_secs_f64());

    for warning in &summary.warnings {
        eprintln!("Warning: {}", warning);
    }
    eprintln!(
        "Done! {} matched, {} unmatched ({:.2}s total)",
        summary.matched,
        summary.unmatched,
        t_total.elapsed().as_secs_f64()
    );
    eprintln!("JSON sidecars are kept in {}", staging.display());
    Ok(())
}
