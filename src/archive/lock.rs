//! Best-effort detection of an archive held open by another program.
//!
//! This is a probe, not a mutex: another process can open the archive
//! between the probe and the extraction. Real exclusion has to come from
//! the extraction tool refusing concurrent access.

use std::fs::{File, OpenOptions, TryLockError};
use std::path::Path;

use crate::error::{Result, SlicerError};

/// Check whether `path` looks busy.
///
/// First tries to take and release an exclusive advisory lock. Platforms
/// that do not honour advisory locks are covered by renaming the file to a
/// sibling name and back, which fails while another program has it open
/// on systems that enforce sharing modes.
pub fn is_busy(path: &Path) -> Result<bool> {
    if !lock_round_trip(path) {
        tracing::debug!(path = %path.display(), "exclusive lock probe failed");
        return Ok(true);
    }

    rename_round_trip(path)
}

fn lock_round_trip(path: &Path) -> bool {
    let file: File = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };

    match file.try_lock() {
        Ok(()) => {
            let _ = file.unlock();
            true
        }
        Err(TryLockError::WouldBlock) => false,
        Err(TryLockError::Error(_)) => false,
    }
}

fn rename_round_trip(path: &Path) -> Result<bool> {
    let Some(parent) = path.parent() else {
        return Ok(false);
    };
    let probe = parent.join(format!(".probe-{}", uuid::Uuid::new_v4()));

    if std::fs::rename(path, &probe).is_err() {
        tracing::debug!(path = %path.display(), "rename probe failed");
        return Ok(true);
    }

    std::fs::rename(&probe, path).map_err(|e| {
        SlicerError::io(
            path,
            format!(
                "Archive was moved to {} during the busy check and could not be restored: {}",
                probe.display(),
                e
            ),
        )
    })?;

    Ok(false)
}
