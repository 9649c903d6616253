//! Publishing a finished run as `<output>/latest` plus `LATEST_RUN.txt`.
//!
//! The mirror is built in a staging directory next to `latest` and swapped in
//! with renames, so a crash leaves either the old mirror or the new one, never
//! a half-copied `latest`. The pointer file is written to a temp file and
//! renamed into place the same way.

use crate::layout::OutputLayout;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
#[error("failed to {action} {}: {source}", .path.display())]
pub struct PublishError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

fn step<T>(action: &'static str, path: &Path, result: io::Result<T>) -> Result<T, PublishError> {
    result.map_err(|source| PublishError {
        action,
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `<output>/latest` with a copy of `run_dir` and point
/// `LATEST_RUN.txt` at `run_id`. Returns the latest directory.
pub fn publish_latest(
    layout: &OutputLayout,
    run_id: &str,
    run_dir: &Path,
) -> Result<PathBuf, PublishError> {
    let root = layout.root();
    let latest = layout.latest_dir();
    let staging = root.join(format!(".latest-staging-{run_id}"));
    let retired = root.join(format!(".latest-retired-{run_id}"));

    remove_if_exists(&staging)?;
    if let Err(source) = copy_dir_all(run_dir, &staging) {
        let _ = fs::remove_dir_all(&staging);
        return Err(PublishError {
            action: "copy run into",
            path: staging,
            source,
        });
    }
    debug!(staging = %staging.display(), "staged latest mirror");

    let had_previous = latest.symlink_metadata().is_ok();
    if had_previous {
        remove_if_exists(&retired)?;
        step("move aside", &latest, fs::rename(&latest, &retired))?;
    }

    if let Err(source) = fs::rename(&staging, &latest) {
        if had_previous {
            // Put the previous mirror back; best effort.
            let _ = fs::rename(&retired, &latest);
        }
        return Err(PublishError {
            action: "swap in",
            path: latest,
            source,
        });
    }

    if had_previous {
        if let Err(e) = fs::remove_dir_all(&retired) {
            warn!(path = %retired.display(), error = %e, "could not remove previous latest mirror");
        }
    }

    write_pointer(&layout.latest_pointer(), run_id)?;
    Ok(latest)
}

/// Write `<run_id>\n` to the pointer file via temp file + rename.
pub fn write_pointer(pointer: &Path, run_id: &str) -> Result<(), PublishError> {
    let tmp = pointer.with_extension("txt.tmp");
    step("write", &tmp, fs::write(&tmp, format!("{run_id}\n")))?;
    if let Err(source) = fs::rename(&tmp, pointer) {
        let _ = fs::remove_file(&tmp);
        return Err(PublishError {
            action: "replace",
            path: pointer.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// Read the run id recorded in the pointer file, if any.
pub fn read_pointer(pointer: &Path) -> Option<String> {
    fs::read_to_string(pointer)
        .ok()
        .map(|s| s.trim_end().to_string())
        .filter(|s| !s.is_empty())
}

fn remove_if_exists(path: &Path) -> Result<(), PublishError> {
    match path.symlink_metadata() {
        Ok(meta) if meta.is_dir() => step("remove", path, fs::remove_dir_all(path)),
        Ok(_) => step("remove", path, fs::remove_file(path)),
        Err(_) => Ok(()),
    }
}

/// Recursively copy a directory tree. Symlinks are followed.
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
