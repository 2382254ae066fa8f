use crate::error::AppError;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Make `path` absolute against `cwd` and drop `.` and `..` components
/// without touching the filesystem.
pub fn normalize_path(cwd: &Path, path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in cwd.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn has_allowed_extension(path: &Path, allowed_extensions: &HashSet<String>) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => {
            log::trace!("Checking extension: {} for file: {:?}", ext, path);
            allowed_extensions.contains(&ext.to_lowercase())
        }
        None => {
            log::trace!("Skipping file with no extension: {:?}", path);
            false
        }
    }
}

/// Send every file under `root` with an allowed extension to `paths_tx`.
pub fn start_walking(
    root: &Path,
    allowed_extensions: &HashSet<String>,
    recursive: bool,
    paths_tx: &crossbeam_channel::Sender<PathBuf>,
) -> Result<(), AppError> {
    log::info!("Starting file discovery in {:?}", root);
    log::debug!("Configured allowed extensions: {:?}", allowed_extensions);

    let max_depth = if recursive { usize::MAX } else { 1 };
    for entry in WalkDir::new(root).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() {
            log::trace!("Skipping non-file entry: {:?}", path);
        } else if path.to_str().is_none() {
            log::warn!("Skipping file with a non UTF-8 name: {:?}", path);
        } else if has_allowed_extension(path, allowed_extensions) {
            log::debug!("Discovered photo file: {:?}", path);
            paths_tx.send(path.to_path_buf())?;
        } else {
            log::trace!("Skipping file due to unsupported extension: {:?}", path);
        }
    }

    log::info!("File discovery complete.");
    Ok(())
}

/// Expand command-line inputs into a sorted, deduplicated list of absolute
/// file paths.
///
/// Files are taken as given, whatever their extension; directories are
/// walked. Anything else is passed through so that the caller reports it
/// as missing.
pub fn collect_paths(
    inputs: &[PathBuf],
    allowed_extensions: &HashSet<String>,
    recursive: bool,
) -> Result<Vec<PathBuf>, AppError> {
    let cwd = std::env::current_dir()?;
    let (paths_tx, paths_rx) = crossbeam_channel::unbounded();

    for input in inputs {
        let input = normalize_path(&cwd, input);
        if input.is_dir() {
            start_walking(&input, allowed_extensions, recursive, &paths_tx)?;
        } else {
            paths_tx.send(input)?;
        }
    }
    drop(paths_tx);

    let mut paths: Vec<PathBuf> = paths_rx.iter().collect();
    paths.sort();
    paths.dedup();
    log::info!("Collected {} path(s) from {} input(s)", paths.len(), inputs.len());
    Ok(paths)
}
