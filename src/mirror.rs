// Directory mirroring helpers.
// These replace the `xcopy /E /I /Y` and `rmdir /s /q` calls the launcher
// has always relied on: copy everything, overwrite whatever is there.

use crate::error::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Copy every file under `src` onto `dst`, overwriting existing files.
/// `progress` gets `(copied, total)` after each file. A missing `src` copies
/// nothing. Returns the number of files copied.
pub fn copy_tree<F>(src: &Path, dst: &Path, mut progress: F) -> Result<usize>
where
    F: FnMut(usize, usize),
{
    if !src.is_dir() {
        log::warn!("Nothing to copy, {} does not exist", src.display());
        return Ok(0);
    }

    // A walk error (unreadable entry, symlink loop) aborts the copy; callers
    // delete the source after a successful copy.
    let mut files = Vec::new();
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry);
        }
    }
    let total = files.len();

    fs::create_dir_all(dst)?;
    for (i, entry) in files.iter().enumerate() {
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)?;
        progress(i + 1, total);
    }

    log::info!("Copied {} files from {} to {}", total, src.display(), dst.display());
    Ok(total)
}

/// Delete a directory tree. An absent directory is fine.
pub fn clear_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            log::info!("Removed {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Clear a directory and recreate it empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    clear_dir(dir)?;
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Move each direct child of `src` into `dst`. Falls back to copy + delete
/// when a rename crosses filesystems.
pub fn move_children(src: &Path, dst: &Path) -> Result<usize> {
    fs::create_dir_all(dst)?;
    let mut moved = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if fs::rename(&from, &to).is_err() {
            if from.is_dir() {
                copy_tree(&from, &to, |_, _| {})?;
                clear_dir(&from)?;
            } else {
                fs::copy(&from, &to)?;
                fs::remove_file(&from)?;
            }
        }
        moved += 1;
    }
    log::debug!("Moved {} entries from {} to {}", moved, src.display(), dst.display());
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn copy_tree_copies_nested_files_and_overwrites() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src.join("content/0000/save.bin"), "new");
        write(&src.join("cache/shader.dat"), "cache");
        write(&dst.join("content/0000/save.bin"), "old");
        write(&dst.join("untouched.txt"), "keep");

        let mut seen = Vec::new();
        let copied = copy_tree(&src, &dst, |done, total| seen.push((done, total))).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
        assert_eq!(fs::read_to_string(dst.join("content/0000/save.bin")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dst.join("cache/shader.dat")).unwrap(), "cache");
        assert_eq!(fs::read_to_string(dst.join("untouched.txt")).unwrap(), "keep");
    }

    #[test]
    fn copy_tree_with_missing_source_copies_nothing() {
        let tmp = tempdir().unwrap();
        let dst = tmp.path().join("dst");
        let copied = copy_tree(&tmp.path().join("nope"), &dst, |_, _| {}).unwrap();
        assert_eq!(copied, 0);
        assert!(!dst.exists());
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_fails_on_unwalkable_source() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("content");
        write(&src.join("save.bin"), "data");
        std::os::unix::fs::symlink(&src, src.join("loop")).unwrap();

        let err = copy_tree(&src, &tmp.path().join("dst"), |_, _| {}).unwrap_err();
        assert!(matches!(err, crate::error::ManagerError::Io(_)));
    }

    #[test]
    fn clear_and_reset() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("Update/Depo");
        write(&dir.join("a/b.txt"), "x");

        reset_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

        clear_dir(&dir).unwrap();
        assert!(!dir.exists());
        clear_dir(&dir).unwrap();
    }

    #[test]
    fn move_children_moves_files_and_folders() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("extracted");
        let dst = tmp.path().join("Patches");
        write(&src.join("4D5307E6 - Halo 3.patch.toml"), "patch");
        write(&src.join("nested/inner.toml"), "inner");

        assert_eq!(move_children(&src, &dst).unwrap(), 2);
        assert!(dst.join("4D5307E6 - Halo 3.patch.toml").is_file());
        assert!(dst.join("nested/inner.toml").is_file());
        assert_eq!(fs::read_dir(&src).unwrap().count(), 0);
    }
}
