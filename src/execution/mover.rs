//! Collision-safe file moves.
//!
//! A destination name is claimed with an exclusive create before the file is
//! moved over it, so concurrent workers can never pick the same name.

use crate::error::{OrganizeError, Result};
use std::ffi::{OsStr, OsString};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Counter suffixes tried before falling back to a UUID suffix
const MAX_NUMBERED_CANDIDATES: usize = 10_000;

/// Move `source` into `target_dir` as `filename`, or `stem_N.ext` when taken.
///
/// Names are handled as `OsStr`, so names that are not valid UTF-8 survive
/// unchanged. Returns the final path. On failure the source is left where it
/// was and no reservation or partial copy remains in `target_dir`.
pub fn move_into(source: &Path, target_dir: &Path, filename: impl AsRef<OsStr>) -> Result<PathBuf> {
    fs::create_dir_all(target_dir).map_err(|e| OrganizeError::io(target_dir, e))?;

    let destination = reserve_unique(target_dir, filename)?;
    if let Err(e) = relocate(source, &destination) {
        release(&destination);
        return Err(e);
    }

    tracing::debug!(
        from = %source.display(),
        to = %destination.display(),
        "Moved file"
    );
    Ok(destination)
}

/// Claim the first free name among `filename`, `stem_1.ext`, `stem_2.ext`, ...
pub fn reserve_unique(target_dir: &Path, filename: impl AsRef<OsStr>) -> Result<PathBuf> {
    let filename = filename.as_ref();
    let original = Path::new(filename);
    let stem = original.file_stem().unwrap_or_else(|| OsStr::new("file"));
    let ext = original.extension();

    let suffixed = |suffix: &str| {
        let mut name = OsString::from(stem);
        name.push("_");
        name.push(suffix);
        if let Some(ext) = ext {
            name.push(".");
            name.push(ext);
        }
        target_dir.join(name)
    };

    for counter in 0..=MAX_NUMBERED_CANDIDATES {
        let candidate = if counter == 0 {
            target_dir.join(filename)
        } else {
            suffixed(&counter.to_string())
        };
        if try_reserve(&candidate)? {
            return Ok(candidate);
        }
    }

    let candidate = suffixed(&uuid::Uuid::new_v4().to_string());
    if try_reserve(&candidate)? {
        return Ok(candidate);
    }
    Err(OrganizeError::Move {
        source_path: PathBuf::from(filename),
        destination: target_dir.to_path_buf(),
        reason: "no free destination name".to_string(),
    })
}

fn try_reserve(candidate: &Path) -> Result<bool> {
    match OpenOptions::new().write(true).create_new(true).open(candidate) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(OrganizeError::io(candidate, e)),
    }
}

fn release(reservation: &Path) {
    if let Err(e) = fs::remove_file(reservation) {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!(path = %reservation.display(), error = %e, "Failed to release reserved name");
        }
    }
}

/// Rename `source` to `destination`, falling back to copy + delete across
/// filesystems. A failed fallback removes the copy and keeps the source.
///
/// `destination` may be an existing placeholder file; it is overwritten.
pub fn relocate(source: &Path, destination: &Path) -> Result<()> {
    let rename_err = match fs::rename(source, destination) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    let move_error = |reason: String| OrganizeError::Move {
        source_path: source.to_path_buf(),
        destination: destination.to_path_buf(),
        reason,
    };

    if !source.is_file() {
        return Err(move_error(rename_err.to_string()));
    }

    tracing::debug!(
        from = %source.display(),
        error = %rename_err,
        "Rename failed, copying instead"
    );

    if let Err(e) = fs::copy(source, destination) {
        return Err(move_error(format!("copy failed: {}", e)));
    }

    if let Err(e) = fs::remove_file(source) {
        if let Err(cleanup) = fs::remove_file(destination) {
            tracing::warn!(path = %destination.display(), error = %cleanup, "Failed to remove partial copy");
        }
        return Err(move_error(format!("could not remove source after copy: {}", e)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_move_into_creates_target_dir() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("report.pdf");
        write(&source, "pdf");

        let target = temp_dir.path().join("Belgeler").join("Finans");
        let moved = move_into(&source, &target, "report.pdf").unwrap();

        assert_eq!(moved, target.join("report.pdf"));
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&moved).unwrap(), "pdf");
    }

    #[test]
    fn test_collisions_get_numbered_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Görseller");
        write(&target.join("a.jpg"), "existing");

        let first = temp_dir.path().join("one").join("a.jpg");
        let second = temp_dir.path().join("two").join("a.jpg");
        write(&first, "first");
        write(&second, "second");

        assert_eq!(move_into(&first, &target, "a.jpg").unwrap(), target.join("a_1.jpg"));
        assert_eq!(move_into(&second, &target, "a.jpg").unwrap(), target.join("a_2.jpg"));
        assert_eq!(fs::read_to_string(target.join("a.jpg")).unwrap(), "existing");
        assert_eq!(fs::read_to_string(target.join("a_2.jpg")).unwrap(), "second");
    }

    #[test]
    fn test_names_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        write(&temp_dir.path().join("Makefile"), "x");

        let reserved = reserve_unique(temp_dir.path(), "Makefile").unwrap();
        assert_eq!(reserved, temp_dir.path().join("Makefile_1"));
    }

    #[test]
    fn test_concurrent_moves_never_collide() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Diğerleri");
        let sources: Vec<PathBuf> = (0..16)
            .map(|i| {
                let path = temp_dir.path().join(format!("src{}", i)).join("same.txt");
                write(&path, &i.to_string());
                path
            })
            .collect();

        let handles: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let target = target.clone();
                std::thread::spawn(move || move_into(&source, &target, "same.txt").unwrap())
            })
            .collect();
        let mut destinations: Vec<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        destinations.sort();
        destinations.dedup();

        assert_eq!(destinations.len(), 16);
        let mut contents: Vec<u32> = destinations
            .iter()
            .map(|d| fs::read_to_string(d).unwrap().parse().unwrap())
            .collect();
        contents.sort();
        assert_eq!(contents, (0..16).collect::<Vec<_>>());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_kept_byte_for_byte() {
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let name = OsStr::from_bytes(b"caf\xe9.mp3");
        let target = temp_dir.path().join("Müzik");
        let first = temp_dir.path().join("one").join(name);
        let second = temp_dir.path().join("two").join(name);
        for source in [&first, &second] {
            fs::create_dir_all(source.parent().unwrap()).unwrap();
            fs::write(source, "x").unwrap();
        }

        assert_eq!(move_into(&first, &target, name).unwrap(), target.join(name));
        assert_eq!(
            move_into(&second, &target, name).unwrap(),
            target.join(OsStr::from_bytes(b"caf\xe9_1.mp3"))
        );
    }

    #[test]
    fn test_failed_move_leaves_no_reservation() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out");
        let missing = temp_dir.path().join("ghost.txt");

        let err = move_into(&missing, &target, "ghost.txt").unwrap_err();
        assert!(matches!(err, OrganizeError::Move { .. }));
        assert!(!target.join("ghost.txt").exists());
    }
}
