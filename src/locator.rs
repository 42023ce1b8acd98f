// 🔎 Record File Locator
// Finds `NNNNNNNN.rcd` files in the target directory and checks that their
// sequence numbers form a gap-free run before anything is aggregated.

use crate::error::SalesError;
use crate::schema::RecordFileName;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default record file extension
pub const RECORD_EXTENSION: &str = "rcd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFile {
    pub path: PathBuf,
    pub file_name: String,
    pub sequence: u32,
}

/// List `dir` (non-recursively), keep regular files named like record files,
/// sort them and verify the sequence numbers are contiguous.
///
/// An empty directory, or one holding a single record file, always passes.
pub fn locate_record_files(dir: &Path, extension: &str) -> Result<Vec<RecordFile>, SalesError> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        // Non UTF-8 names can't match the pattern anyway
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };

        let Some(parsed) = RecordFileName::parse(&file_name, extension) else {
            continue;
        };

        // Follows symlinks, so a link to a regular file counts
        if !path.is_file() {
            debug!(path = %path.display(), "skipping non-file entry");
            continue;
        }

        files.push(RecordFile {
            path,
            file_name,
            sequence: parsed.sequence,
        });
    }

    // Fixed-width names: lexicographic order == numeric order
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    check_sequential(&files)?;

    debug!(count = files.len(), "record files located");
    Ok(files)
}

/// Fails on the first adjacent pair whose sequence numbers don't differ by 1.
pub fn check_sequential(files: &[RecordFile]) -> Result<(), SalesError> {
    for pair in files.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);

        if next.sequence.checked_sub(previous.sequence) != Some(1) {
            warn!(
                previous = %previous.file_name,
                next = %next.file_name,
                "record files are not sequential"
            );
            return Err(SalesError::RecordFilesNotSequential {
                previous: previous.file_name.clone(),
                next: next.file_name.clone(),
            });
        }
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "001\n1000\n").unwrap();
    }

    fn names(files: &[RecordFile]) -> Vec<&str> {
        files.iter().map(|f| f.file_name.as_str()).collect()
    }

    #[test]
    fn test_locates_and_sorts() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "00000003.rcd");
        touch(temp.path(), "00000001.rcd");
        touch(temp.path(), "00000002.rcd");

        let files = locate_record_files(temp.path(), RECORD_EXTENSION).unwrap();

        assert_eq!(
            names(&files),
            vec!["00000001.rcd", "00000002.rcd", "00000003.rcd"]
        );
        assert_eq!(files[2].sequence, 3);
        assert_eq!(files[0].path, temp.path().join("00000001.rcd"));
    }

    #[test]
    fn test_ignores_non_matching_entries() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "00000001.rcd");
        touch(temp.path(), "00000002.rcd");
        touch(temp.path(), "00000005.txt");
        touch(temp.path(), "0000004.rcd");
        touch(temp.path(), "branch.lst");
        fs::create_dir(temp.path().join("00000003.rcd")).unwrap();

        let files = locate_record_files(temp.path(), RECORD_EXTENSION).unwrap();

        assert_eq!(names(&files), vec!["00000001.rcd", "00000002.rcd"]);
    }

    #[test]
    fn test_gap_is_rejected() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "00000001.rcd");
        touch(temp.path(), "00000003.rcd");

        let err = locate_record_files(temp.path(), RECORD_EXTENSION).unwrap_err();

        match err {
            SalesError::RecordFilesNotSequential { previous, next } => {
                assert_eq!(previous, "00000001.rcd");
                assert_eq!(next, "00000003.rcd");
            }
            other => panic!("expected RecordFilesNotSequential, got {other:?}"),
        }
    }

    #[test]
    fn test_first_gap_is_reported() {
        let temp = tempdir().unwrap();
        for name in ["00000001.rcd", "00000002.rcd", "00000004.rcd", "00000007.rcd"] {
            touch(temp.path(), name);
        }

        let err = locate_record_files(temp.path(), RECORD_EXTENSION).unwrap_err();

        assert!(matches!(
            err,
            SalesError::RecordFilesNotSequential { ref previous, .. } if previous == "00000002.rcd"
        ));
    }

    #[test]
    fn test_trivial_sets_pass() {
        let temp = tempdir().unwrap();
        assert!(locate_record_files(temp.path(), RECORD_EXTENSION)
            .unwrap()
            .is_empty());

        // A lone file doesn't have to start at 1
        touch(temp.path(), "00000042.rcd");
        let files = locate_record_files(temp.path(), RECORD_EXTENSION).unwrap();
        assert_eq!(names(&files), vec!["00000042.rcd"]);
    }

    #[test]
    fn test_custom_extension() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "00000001.rcd");
        touch(temp.path(), "00000010.dat");
        touch(temp.path(), "00000011.dat");

        let files = locate_record_files(temp.path(), "dat").unwrap();

        assert_eq!(names(&files), vec!["00000010.dat", "00000011.dat"]);
    }

    #[test]
    fn test_missing_directory_is_unknown_error() {
        let temp = tempdir().unwrap();
        let err = locate_record_files(&temp.path().join("nope"), RECORD_EXTENSION).unwrap_err();

        assert_eq!(err.kind(), "UnknownError");
    }
}
