use crate::backend::{Backend, MetadataBackend};
use crate::backends::{exiftool::ExiftoolBackend, native::NativeBackend};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::keys::{self, ColumnMap};
use crate::runner::{find_exiftool, CommandRunner, SystemRunner};
use crate::tags::{self, WriteValue};
use crate::value::{self, ExifMap};
use crate::walker::normalize_path;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of a write or remove, per file.
pub type WriteReport = BTreeMap<PathBuf, bool>;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub backend: Backend,
    pub clean_keys: bool,
    pub clean_values: bool,
}

/// EXIF metadata of one or more media files, read and written through
/// exiftool.
pub struct Exif {
    paths: Vec<PathBuf>,
    exiftool_bin: PathBuf,
    runner: Arc<dyn CommandRunner>,
    char_limit: usize,
    num_workers: usize,
    column_map: Option<ColumnMap>,
}

/// Absolute, normalized, existing files in first-seen order. Names must be
/// UTF-8 because they travel to exiftool and back through its XML output.
fn absolute_files<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> AppResult<Vec<PathBuf>> {
    let cwd = std::env::current_dir()?;
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for p in paths {
        let path = normalize_path(&cwd, p.as_ref());
        if path.to_str().is_none() {
            return Err(AppError::NonUtf8Path(path.display().to_string()));
        }
        if !path.is_file() {
            return Err(AppError::FileNotFound(path.display().to_string()));
        }
        if seen.insert(path.clone()) {
            files.push(path);
        } else {
            log::debug!("Ignoring repeated file {:?}", path);
        }
    }
    Ok(files)
}

impl Exif {
    /// Locate exiftool on `PATH` and validate `paths`.
    pub fn new<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> AppResult<Self> {
        Self::from_config(paths, &AppConfig::default())
    }

    pub fn from_config<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let exiftool_bin = find_exiftool(config.exiftool_path.as_deref())?;
        log::info!("Found exiftool binary {:?}", exiftool_bin);

        let column_map = match &config.column_map_path {
            Some(path) => Some(ColumnMap::from_file(Path::new(path))?),
            None => None,
        };

        let mut exif = Self::with_runner(paths, exiftool_bin, Arc::new(SystemRunner))?;
        exif.char_limit = config.char_limit;
        exif.num_workers = config.num_workers;
        exif.column_map = column_map;
        Ok(exif)
    }

    pub fn with_runner<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
        exiftool_bin: PathBuf,
        runner: Arc<dyn CommandRunner>,
    ) -> AppResult<Self> {
        let defaults = AppConfig::default();
        Ok(Self {
            paths: absolute_files(paths)?,
            exiftool_bin,
            runner,
            char_limit: defaults.char_limit,
            num_workers: defaults.num_workers,
            column_map: None,
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_batch(&self) -> bool {
        self.paths.len() > 1
    }

    fn backend(&self, backend: Backend) -> Box<dyn MetadataBackend> {
        match backend {
            Backend::Exiftool => Box::new(ExiftoolBackend::new(
                self.exiftool_bin.clone(),
                self.runner.clone(),
                self.char_limit,
                self.num_workers,
            )),
            Backend::Native => Box::new(NativeBackend::new(self.num_workers)),
        }
    }

    pub fn extract(&self, options: ExtractOptions) -> AppResult<ExifMap> {
        if self.paths.is_empty() {
            return Ok(ExifMap::new());
        }

        let backend = self.backend(options.backend);
        log::debug!("Extracting with the {} backend", backend.name());
        let mut exifd = backend.extract(&self.paths)?;

        if options.clean_keys {
            let column_map = match &self.column_map {
                Some(map) => map.clone(),
                None => ColumnMap::builtin()?,
            };
            exifd = keys::clean_keys(exifd, &column_map);
            log::info!("Cleaned EXIF dictionary keys");
        }

        if options.clean_values {
            exifd = value::clean_values(exifd);
            log::info!("Cleaned EXIF dictionary values");
        }

        log::info!("EXIF metadata extraction complete");
        Ok(exifd)
    }

    /// Write each `(tag, value)` pair on every file. A file is reported as
    /// successful only when all of its tags were written.
    pub fn write<K: AsRef<str>>(&self, attrs: &[(K, WriteValue)]) -> AppResult<WriteReport> {
        tags::validate_tag_names(attrs.iter().map(|(k, _)| k.as_ref()))?;

        let mut report = WriteReport::new();
        for path in &self.paths {
            let mut all_written = true;
            for (tag, value) in attrs {
                let tag = tag.as_ref();
                let args = tags::write_args(tag, value, path);
                let output = self.runner.run(&self.exiftool_bin, &args)?;

                if tags::is_successful_write(&output.message()) {
                    log::info!("File {:?} set tag \"{}\" to value \"{}\"", path, tag, value);
                } else {
                    log::error!(
                        "File {:?} failed to set tag \"{}\" to value \"{}\" but exiftool did not throw an error",
                        path,
                        tag,
                        value
                    );
                    all_written = false;
                }
            }
            report.insert(path.clone(), all_written);
        }
        Ok(report)
    }

    pub fn remove<K: AsRef<str>>(&self, tag_names: &[K]) -> AppResult<WriteReport> {
        tags::validate_tag_names(tag_names.iter().map(|t| t.as_ref()))?;

        let mut report = WriteReport::new();
        for path in &self.paths {
            log::info!("File: {:?}", path);
            let mut all_removed = true;
            for tag in tag_names {
                let tag = tag.as_ref();
                let args = tags::remove_args(tag, path);
                let output = self.runner.run(&self.exiftool_bin, &args).map_err(|e| {
                    log::error!("Failed. Tag: {}", tag);
                    e
                })?;

                if tags::is_successful_write(&output.message()) {
                    log::info!("Success. Tag: {}", tag);
                } else {
                    log::error!("ExifTool Error. Tag: {}", tag);
                    log::debug!("ExifTool output: {}", output.message().trim());
                    all_removed = false;
                }
            }
            report.insert(path.clone(), all_removed);
        }
        Ok(report)
    }
}
