//! All-or-nothing file replacement: write a sibling temp file, sync, rename.

use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;

/// Distinguishes temp files created concurrently by one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `path` with `bytes` so readers see either the old or the new file, never a mix.
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns `Error::Io` if the directory, temp file, or rename fails. The temp
/// file is removed on failure.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| return !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let result = write_and_sync(&tmp, bytes).and_then(|()| return std::fs::rename(&tmp, path));
    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::Io(e));
    }
    return Ok(());
}

/// Write the full buffer and flush it to disk before the rename publishes it.
fn write_and_sync(tmp: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    return Ok(());
}

/// `dir/.name.tmp-<pid>-<n>` next to the target, so the rename stays on one filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|s| return s.to_str())
        .unwrap_or("docsync");
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(".{name}.tmp-{}-{n}", std::process::id());
    return path.with_file_name(tmp_name);
}
