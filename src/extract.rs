use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{MergeError, Result};

/// Extract every entry of every archive into `dest`, preserving the
/// directory layout stored in the archive. An unreadable or malformed
/// archive aborts the whole run.
pub fn extract_archives(zip_paths: &[PathBuf], dest: &Path) -> Result<u64> {
    fs::create_dir_all(dest)?;
    let mut extracted = 0u64;

    for zip_path in zip_paths {
        eprintln!("Extracting: {}", zip_path.display());
        let file = File::open(zip_path).map_err(|e| extraction_error(zip_path, ZipError::Io(e)))?;
        let mut archive = ZipArchive::new(file).map_err(|e| extraction_error(zip_path, e))?;

        let pb = ProgressBar::new(archive.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40}] {pos}/{len} extracting {msg}")
                .unwrap(),
        );
        pb.set_message(
            zip_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("archive")
                .to_string(),
        );

        for i in 0..archive.len() {
            pb.inc(1);
            let mut entry = archive.by_index(i).map_err(|e| extraction_error(zip_path, e))?;

            // Entries that would land outside dest are not extracted.
            let Some(rel_path) = entry.enclosed_name() else {
                pb.println(format!("Skipping unsafe entry: {}", entry.name()));
                continue;
            };
            let out_path = dest.join(rel_path);

            if entry.is_dir() {
                fs::create_dir_all(&out_path)?;
                continue;
            }
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)?;
            io::copy(&mut entry, &mut out)?;
            extracted += 1;
        }

        pb.finish_and_clear();
    }

    Ok(extracted)
}

fn extraction_error(archive: &Path, source: ZipError) -> MergeError {
    MergeError::Extraction {
        archive: archive.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn build_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, bytes) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_nested_entries() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("takeout.zip");
        build_zip(
            &zip_path,
            &[
                ("Takeout/Google Photos/a.jpg", b"aaa".as_slice()),
                ("Takeout/Google Photos/a.jpg.json", b"{}".as_slice()),
                ("top.txt", b"t".as_slice()),
            ],
        );

        let dest = dir.path().join("out");
        let extracted = extract_archives(&[zip_path], &dest).unwrap();
        assert_eq!(extracted, 3);
        assert_eq!(
            fs::read(dest.join("Takeout/Google Photos/a.jpg")).unwrap(),
            b"aaa"
        );
        assert_eq!(fs::read(dest.join("top.txt")).unwrap(), b"t");
    }

    #[test]
    fn extracts_multiple_archives_into_one_dest() {
        let dir = tempdir().unwrap();
        let zip_a = dir.path().join("a.zip");
        let zip_b = dir.path().join("b.zip");
        build_zip(&zip_a, &[("one/a.jpg", b"a".as_slice())]);
        build_zip(&zip_b, &[("two/b.jpg", b"b".as_slice())]);

        let dest = dir.path().join("out");
        let extracted = extract_archives(&[zip_a, zip_b], &dest).unwrap();
        assert_eq!(extracted, 2);
        assert!(dest.join("one/a.jpg").is_file());
        assert!(dest.join("two/b.jpg").is_file());
    }

    #[test]
    fn malformed_archive_aborts() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("broken.zip");
        fs::write(&zip_path, b"this is not a zip archive").unwrap();

        let err = extract_archives(&[zip_path], &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, MergeError::Extraction { .. }));
    }

    #[test]
    fn missing_archive_aborts() {
        let dir = tempdir().unwrap();
        let err = extract_archives(&[dir.path().join("nope.zip")], &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, MergeError::Extraction { .. }));
    }
}
