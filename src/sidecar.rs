use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{MergeError, Result};

/// Fields consumed from a Takeout JSON sidecar; everything else is ignored.
#[derive(Debug, Deserialize)]
struct RawSidecar {
    #[serde(rename = "photoTakenTime")]
    photo_taken_time: Option<TimeBlock>,
    #[serde(rename = "creationTime")]
    creation_time: Option<TimeBlock>,
}

#[derive(Debug, Deserialize)]
struct TimeBlock {
    timestamp: Option<Timestamp>,
}

/// Takeout writes epoch seconds as either a JSON string or a bare number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Text(String),
    Number(i64),
}

impl Timestamp {
    fn as_epoch(&self) -> Option<i64> {
        match self {
            Timestamp::Text(s) => s.trim().parse().ok(),
            Timestamp::Number(n) => Some(*n),
        }
    }
}

/// Capture times recorded in a sidecar, as UTC epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidecarTimes {
    /// `photoTakenTime.timestamp` - becomes mtime/atime.
    pub taken: i64,
    /// `creationTime.timestamp` - becomes the creation time where settable.
    pub created: i64,
}

pub fn parse_sidecar(path: &Path) -> Result<SidecarTimes> {
    let bytes = fs::read(path)?;
    let raw: RawSidecar = serde_json::from_slice(&bytes).map_err(|e| MergeError::MetadataParse {
        sidecar: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let taken = field_epoch(&raw.photo_taken_time, "photoTakenTime", path)?;
    let created = field_epoch(&raw.creation_time, "creationTime", path)?;
    Ok(SidecarTimes { taken, created })
}

fn field_epoch(block: &Option<TimeBlock>, field: &str, path: &Path) -> Result<i64> {
    let epoch = block
        .as_ref()
        .and_then(|b| b.timestamp.as_ref())
        .and_then(Timestamp::as_epoch)
        .ok_or_else(|| MergeError::MetadataParse {
            sidecar: path.to_path_buf(),
            reason: format!("missing or non-numeric {}.timestamp", field),
        })?;

    if chrono::DateTime::from_timestamp(epoch, 0).is_none() {
        return Err(MergeError::MetadataParse {
            sidecar: path.to_path_buf(),
            reason: format!("{}.timestamp {} out of range", field, epoch),
        });
    }
    Ok(epoch)
}

/// Check for the literal `.json` suffix, case-insensitively.
pub fn is_sidecar_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
}

/// Case-insensitive index of the sidecar files in a flat directory.
pub struct SidecarIndex {
    by_lower: HashMap<String, PathBuf>,
}

impl SidecarIndex {
    pub fn build(dir: &Path) -> Result<Self> {
        let mut by_lower = HashMap::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if is_sidecar_name(&name) {
                by_lower.insert(name, entry.path());
            }
        }
        Ok(Self { by_lower })
    }

    /// Sidecar for a media filename: `<media_name>.json`, any case.
    pub fn lookup(&self, media_name: &str) -> Option<&Path> {
        self.by_lower
            .get(&format!("{}.json", media_name.to_lowercase()))
            .map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.by_lower.len()
    }
}
