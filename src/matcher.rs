use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{MergeError, Result};
use crate::file_times;
use crate::sidecar::{self, SidecarIndex};

/// Policy for a sidecar that exists but cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadSidecar {
    /// Abort the whole run.
    Abort,
    /// Demote the media file to the no-metadata folder and keep going.
    Unmatched,
}

/// Counts and warnings from one merge pass.
#[derive(Debug, Default)]
pub struct MatchSummary {
    pub matched: u64,
    pub unmatched: u64,
    pub warnings: Vec<String>,
}

/// Classify every non-JSON file in `staging`: a file with a sidecar is
/// copied into `combined` with patched timestamps and its staged original
/// deleted; a file without one moves into `no_metadata` unchanged. Sidecars
/// themselves stay in `staging`.
pub fn process_files(
    staging: &Path,
    combined: &Path,
    no_metadata: &Path,
    on_bad_sidecar: BadSidecar,
) -> Result<MatchSummary> {
    fs::create_dir_all(combined)?;
    fs::create_dir_all(no_metadata)?;

    let index = SidecarIndex::build(staging)?;

    // Snapshot the listing before we start moving things out of it.
    let mut media: Vec<(PathBuf, OsString)> = Vec::new();
    for entry in fs::read_dir(staging)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if sidecar::is_sidecar_name(&name.to_string_lossy()) {
            continue;
        }
        media.push((entry.path(), name));
    }
    eprintln!(
        "Found {} media files, {} JSON sidecars",
        media.len(),
        index.len()
    );

    let pb = ProgressBar::new(media.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} merging metadata")
            .unwrap(),
    );

    let mut summary = MatchSummary::default();
    for (path, name) in media {
        pb.inc(1);
        match index.lookup(&name.to_string_lossy()) {
            Some(sidecar_path) => {
                let times = match sidecar::parse_sidecar(sidecar_path) {
                    Ok(times) => times,
                    Err(e @ MergeError::MetadataParse { .. })
                        if on_bad_sidecar == BadSidecar::Unmatched =>
                    {
                        summary.warnings.push(e.to_string());
                        fs::rename(&path, no_metadata.join(&name))?;
                        summary.unmatched += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                // An existing output of the same name is overwritten outright.
                let out_path = combined.join(&name);
                fs::copy(&path, &out_path)?;
                file_times::apply_times(&out_path, times.created, times.taken)?;
                fs::remove_file(&path)?;
                summary.matched += 1;
            }
            None => {
                fs::rename(&path, no_metadata.join(&name))?;
                summary.unmatched += 1;
            }
        }
    }

    pb.finish_and_clear();
    Ok(summary)
}
