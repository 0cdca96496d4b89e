pub mod raster;
pub mod svg;

pub use raster::*;

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Result, SignatureError};

/// Create the parent directory of an output path if it is missing.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| SignatureError::Write {
                path: dir.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Ancestors of `path` that do not exist yet, deepest first.
pub(crate) fn missing_ancestors(path: &Path) -> Vec<PathBuf> {
    path.ancestors()
        .skip(1)
        .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
        .map(Path::to_path_buf)
        .collect()
}

/// Remove the artifacts of a failed run along with the directories it created.
///
/// `created_dirs` must hold only directories that did not exist before the run;
/// they are removed deepest first and only when empty.
pub(crate) fn discard_outputs(files: &[&Path], created_dirs: &[PathBuf]) {
    for file in files {
        match std::fs::remove_file(file) {
            Ok(()) => warn!(path = %file.display(), "Removed partial output"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %file.display(), "Could not remove partial output: {err}"),
        }
    }

    let mut dirs = created_dirs.to_vec();
    dirs.sort_by_key(|dir| (std::cmp::Reverse(dir.components().count()), dir.clone()));
    dirs.dedup();
    for dir in dirs {
        // Fails on directories that still hold other files, which are left alone
        let _ = std::fs::remove_dir(&dir);
    }
}
