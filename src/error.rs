use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a merge run.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no ZIP archives among the selected inputs")]
    NoArchives,

    #[error("failed to extract {}: {source}", .archive.display())]
    Extraction {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("bad metadata sidecar {}: {reason}", .sidecar.display())]
    MetadataParse { sidecar: PathBuf, reason: String },

    #[error("filesystem operation failed: {0}")]
    Filesystem(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, MergeError>;
