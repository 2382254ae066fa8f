use crate::backend::{thread_pool, MetadataBackend};
use crate::error::{AppError, AppResult};
use crate::value::{ExifMap, TagMap, TagValue};
use exif::{In, Reader, Value};
use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Reads EXIF in-process with kamadak-exif. Read-only; writes always go
/// through exiftool.
pub struct NativeBackend {
    num_workers: usize,
}

impl NativeBackend {
    pub fn new(num_workers: usize) -> Self {
        Self { num_workers }
    }
}

impl MetadataBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn extract(&self, paths: &[PathBuf]) -> AppResult<ExifMap> {
        log::info!(
            "Reading EXIF in-process for {} files with {} workers",
            paths.len(),
            self.num_workers
        );

        let pool = thread_pool(self.num_workers)?;
        let records: Vec<(PathBuf, TagMap)> = pool.install(|| {
            paths
                .par_iter()
                .filter_map(|path| match read_tags(path) {
                    Ok(tags) => Some((path.clone(), tags)),
                    Err(e) => {
                        log::warn!("Failed to read metadata from {:?}: {}", path, e);
                        None
                    }
                })
                .collect()
        });

        log::info!("Read metadata for {} of {} files", records.len(), paths.len());
        Ok(records.into_iter().collect())
    }
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => Some(
            parts
                .iter()
                .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

fn read_tags(path: &Path) -> AppResult<TagMap> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();

    let mut tags = TagMap::new();
    let file_name = path
        .file_name()
        .ok_or_else(|| AppError::FileNotFound(path.display().to_string()))?;
    tags.insert("FileName".into(), TagValue::Text(file_name.to_string_lossy().into()));
    if let Some(dir) = path.parent() {
        tags.insert("Directory".into(), TagValue::Text(dir.display().to_string()));
    }
    tags.insert("FileSize".into(), TagValue::Int(size as i64));

    log::trace!("Extracting EXIF data for image: {:?}", path);
    let mut buf_reader = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf_reader) {
        Ok(exif) => exif,
        Err(e) => {
            log::debug!("No EXIF data found for {:?}: {}", path, e);
            return Ok(tags);
        }
    };

    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let text = field_text(&field.value)
            .unwrap_or_else(|| field.display_value().to_string());
        log::trace!("{:?} {} = {}", path, field.tag, text);
        tags.insert(field.tag.to_string(), TagValue::Text(text));
    }

    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn files_without_exif_still_get_a_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.jpg");
        fs::write(&path, b"not really a jpeg").unwrap();

        let exifd = NativeBackend::new(2).extract(&[path.clone()]).unwrap();
        let tags = &exifd[&path];
        assert_eq!(tags["FileName"], TagValue::from("plain.jpg"));
        assert_eq!(tags["FileSize"], TagValue::Int(17));
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.jpg");
        fs::write(&good, b"x").unwrap();
        let missing = dir.path().join("gone.jpg");

        let exifd = NativeBackend::new(1).extract(&[good.clone(), missing]).unwrap();
        assert_eq!(exifd.len(), 1);
        assert!(exifd.contains_key(&good));
    }

    #[test]
    fn ascii_values_lose_nul_padding() {
        let value = Value::Ascii(vec![b"Canon\0".to_vec()]);
        assert_eq!(field_text(&value).as_deref(), Some("Canon"));
        assert_eq!(field_text(&Value::Short(vec![1])), None);
    }
}
