//! Whole-file replacement that never leaves a half-written file behind.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Replace `path` with `data`.
///
/// The bytes go to a hidden sibling first and are synced before the sibling
/// is renamed over the destination. Missing parent directories are created.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let temp_path = sibling_temp_path(path)?;
    if let Some(parent) = temp_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;
    if let Err(e) = file.write_all(data).and_then(|_| file.sync_all()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    drop(file);

    rename_with_fallback(&temp_path, path)
}

/// Rename `temp_path` onto `destination`, removing the destination first if
/// the platform refuses to overwrite. The temp file is removed on failure.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Could not replace {} (initial: {}, retry: {})",
                    destination.display(),
                    initial_err,
                    retry_err
                ),
            )
        })?;
    }
    Ok(())
}

fn sibling_temp_path(path: &Path) -> io::Result<PathBuf> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid filename: {}", path.display()),
            )
        })?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    Ok(parent.join(format!(".{}.{}.tmp", filename, nanos)))
}
