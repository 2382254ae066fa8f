use crate::error::{AppError, AppResult};
use crate::value::{ExifMap, TagMap};
use std::path::{Path, PathBuf};

/// Which reader produces the tag maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Batched `exiftool -X` runs.
    #[default]
    Exiftool,
    /// In-process EXIF decoding.
    Native,
}

pub trait MetadataBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, paths: &[PathBuf]) -> AppResult<ExifMap>;
}

/// `Directory` joined with `FileName`, the key a record is filed under.
pub fn record_path(tags: &TagMap) -> AppResult<PathBuf> {
    let directory = text_tag(tags, "Directory")?;
    let file_name = text_tag(tags, "FileName")?;
    Ok(Path::new(directory).join(file_name))
}

fn text_tag<'a>(tags: &'a TagMap, name: &str) -> AppResult<&'a str> {
    tags.get(name)
        .and_then(|v| v.as_text())
        .ok_or_else(|| AppError::Parse(format!("record is missing the {} tag", name)))
}

pub(crate) fn thread_pool(num_workers: usize) -> AppResult<rayon::ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers.max(1))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TagValue;

    #[test]
    fn record_path_joins_directory_and_file_name() {
        let mut tags = TagMap::new();
        tags.insert("Directory".into(), TagValue::from("/photos/2020"));
        tags.insert("FileName".into(), TagValue::from("img.jpg"));
        assert_eq!(record_path(&tags).unwrap(), PathBuf::from("/photos/2020/img.jpg"));
    }

    #[test]
    fn record_path_requires_both_tags() {
        let mut tags = TagMap::new();
        tags.insert("FileName".into(), TagValue::from("img.jpg"));
        assert!(matches!(record_path(&tags), Err(AppError::Parse(_))));
    }
}
