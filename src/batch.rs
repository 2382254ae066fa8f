use std::path::{Path, PathBuf};

/// Two quotes and a separating space around every file argument.
const PER_FILE_OVERHEAD: usize = 3;

/// Split `paths` into batches whose exiftool command line stays within
/// `char_limit` characters.
///
/// Order is preserved. A path that alone exceeds the budget still gets a
/// batch of its own; no batch is ever empty.
pub fn split_into_batches(
    paths: &[PathBuf],
    char_limit: usize,
    exiftool_bin: &Path,
) -> Vec<Vec<PathBuf>> {
    let bin_len = exiftool_bin.as_os_str().len() + 1;
    let budget = char_limit.saturating_sub(bin_len);

    let mut batches: Vec<Vec<PathBuf>> = Vec::new();
    let mut current: Vec<PathBuf> = Vec::new();
    let mut count = 0usize;

    for path in paths {
        let cost = path.as_os_str().len() + PER_FILE_OVERHEAD;
        if count + cost > budget && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
            count = 0;
        }
        count += cost;
        current.push(path.clone());
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
