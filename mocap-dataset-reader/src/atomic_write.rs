use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use mocap_core::{MocapError, Result};
use tempfile::NamedTempFile;

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Writes `path` through a temporary file in the same directory, renamed into
/// place only after `write` succeeds. On failure nothing is left at `path`.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let temp = NamedTempFile::new_in(parent_dir(path)).map_err(|e| MocapError::io(path, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        write(&mut writer).map_err(|e| MocapError::io(path, e))?;
        writer.flush().map_err(|e| MocapError::io(path, e))?;
    }
    temp.persist(path).map_err(|e| MocapError::io(path, e.error))?;
    Ok(())
}

/// First of `<name>.bak`, `<name>.bak.1`, `<name>.bak.2`, ... that does not exist.
pub fn backup_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut candidate = path.with_file_name(format!("{file_name}.bak"));
    let mut index = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{file_name}.bak.{index}"));
        index += 1;
    }
    candidate
}

/// Moves an existing file out of the way, returning where it went.
pub fn backup_existing(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = backup_path(path);
    fs::rename(path, &backup).map_err(|e| MocapError::io(path, e))?;
    log::info!("moved previous {} to {}", path.display(), backup.display());
    Ok(Some(backup))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_write_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let result = write_atomically(&path, |w| {
            w.write_all(b"partial")?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
        });
        assert!(matches!(result, Err(MocapError::Io { .. })));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unwritable_directory_is_io_error() {
        let path = Path::new("/nonexistent-dir/out.json");
        let result = write_atomically(path, |w| w.write_all(b"{}"));
        assert!(matches!(result, Err(MocapError::Io { .. })));
    }

    #[test]
    fn test_backups_never_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");

        fs::write(&path, "first").unwrap();
        let first = backup_existing(&path).unwrap().unwrap();
        assert_eq!(first, dir.path().join("params.json.bak"));

        fs::write(&path, "second").unwrap();
        let second = backup_existing(&path).unwrap().unwrap();
        assert_eq!(second, dir.path().join("params.json.bak.1"));

        assert_eq!(fs::read_to_string(first).unwrap(), "first");
        assert_eq!(fs::read_to_string(second).unwrap(), "second");
        assert!(backup_existing(&path).unwrap().is_none());
    }
}
