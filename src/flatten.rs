use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// Move every regular file found anywhere under `src` into the top level of
/// `dest` (which may be `src` itself; files already directly in `dest` stay
/// put). Collisions get the smallest unused `_N` suffix before the
/// extension; nothing is overwritten. Returns the number of files moved.
pub fn consolidate(src: &Path, dest: &Path) -> Result<u64> {
    fs::create_dir_all(dest)?;

    // Collect first: moving while walking would rescan our own moves.
    let files: Vec<PathBuf> = WalkDir::new(src)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.parent() != Some(dest))
        .collect();

    let mut moved = 0u64;
    for source in files {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let target = unique_dest(dest, &name);
        fs::rename(&source, &target)?;
        moved += 1;
    }

    // Prune subdirectories that are now empty, deepest first. A directory
    // that still has content just stays.
    for entry in WalkDir::new(src)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir() {
            let _ = fs::remove_dir(entry.path());
        }
    }

    Ok(moved)
}

/// First free name in `dir`: `name`, then `stem_1.ext`, `stem_2.ext`, ...
fn unique_dest(dir: &Path, name: &str) -> PathBuf {
    let dest = dir.join(name);
    if !dest.exists() {
        return dest;
    }

    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let ext = Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let mut counter = 1u32;
    loop {
        let candidate = if ext.is_empty() {
            format!("{}_{}", stem, counter)
        } else {
            format!("{}_{}.{}", stem, counter, ext)
        };
        let dest = dir.join(candidate);
        if !dest.exists() {
            return dest;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    #[test]
    fn collision_gets_counter_suffix() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub1")).unwrap();
        fs::create_dir_all(root.join("sub2")).unwrap();
        fs::write(root.join("sub1/a.jpg"), b"one").unwrap();
        fs::write(root.join("sub2/a.jpg"), b"two").unwrap();

        let moved = consolidate(root, root).unwrap();
        assert_eq!(moved, 2);
        assert!(root.join("a.jpg").is_file());
        assert!(root.join("a_1.jpg").is_file());

        // Both payloads survive; which one keeps the bare name depends on
        // directory listing order.
        let contents: HashSet<Vec<u8>> = [
            fs::read(root.join("a.jpg")).unwrap(),
            fs::read(root.join("a_1.jpg")).unwrap(),
        ]
        .into();
        assert!(contents.contains(&b"one".to_vec()));
        assert!(contents.contains(&b"two".to_vec()));
    }

    #[test]
    fn counter_takes_smallest_unused() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.jpg"), b"top").unwrap();
        fs::write(root.join("a_1.jpg"), b"taken").unwrap();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/a.jpg"), b"deep").unwrap();

        consolidate(root, root).unwrap();
        assert_eq!(fs::read(root.join("a_2.jpg")).unwrap(), b"deep");
    }

    #[test]
    fn top_level_files_stay_put() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.jpg"), b"top").unwrap();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/b.jpg"), b"deep").unwrap();

        let moved = consolidate(root, root).unwrap();
        assert_eq!(moved, 1);
        assert_eq!(fs::read(root.join("a.jpg")).unwrap(), b"top");
        assert!(!root.join("a_1.jpg").exists());
        assert!(root.join("b.jpg").is_file());
    }

    #[test]
    fn empty_subdirectories_are_pruned() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("x/y/z")).unwrap();
        fs::write(root.join("x/y/z/deep.jpg"), b"d").unwrap();
        fs::create_dir_all(root.join("already-empty")).unwrap();

        consolidate(root, root).unwrap();
        assert!(root.join("deep.jpg").is_file());
        assert!(!root.join("x").exists());
        assert!(!root.join("already-empty").exists());
    }

    #[test]
    fn flattens_into_a_separate_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("top.jpg"), b"t").unwrap();
        fs::write(src.join("sub/deep.jpg"), b"d").unwrap();

        let moved = consolidate(&src, &dest).unwrap();
        assert_eq!(moved, 2);
        assert!(dest.join("top.jpg").is_file());
        assert!(dest.join("deep.jpg").is_file());
    }
}
