use crate::backend::{record_path, thread_pool, MetadataBackend};
use crate::batch::split_into_batches;
use crate::error::AppResult;
use crate::rdf::parse_exiftool_xml;
use crate::runner::CommandRunner;
use crate::value::{ExifMap, TagMap};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

pub struct ExiftoolBackend {
    exiftool_bin: PathBuf,
    runner: Arc<dyn CommandRunner>,
    char_limit: usize,
    num_workers: usize,
}

impl ExiftoolBackend {
    pub fn new(
        exiftool_bin: PathBuf,
        runner: Arc<dyn CommandRunner>,
        char_limit: usize,
        num_workers: usize,
    ) -> Self {
        Self {
            exiftool_bin,
            runner,
            char_limit,
            num_workers,
        }
    }

    fn run_batch(
        &self,
        index: usize,
        total: usize,
        batch: &[PathBuf],
    ) -> AppResult<Vec<(PathBuf, TagMap)>> {
        log::info!(
            "Running batch {} of {} containing {} total files",
            index + 1,
            total,
            batch.len()
        );

        let mut args = vec!["-X".to_string()];
        args.extend(batch.iter().map(|p| p.to_string_lossy().to_string()));

        let output = self.runner.run(&self.exiftool_bin, &args)?;
        if !output.stderr.trim().is_empty() {
            log::debug!("exiftool stderr for batch {}: {}", index + 1, output.stderr.trim());
        }
        if !output.success {
            log::warn!("exiftool reported errors for batch {}", index + 1);
        }
        if output.stdout.trim().is_empty() {
            log::warn!("exiftool produced no XML for batch {}", index + 1);
            return Ok(Vec::new());
        }

        let records = parse_exiftool_xml(&output.stdout).map_err(|e| {
            log::info!("Unable to decode exiftool XML for batch {}", index + 1);
            e
        })?;

        records
            .into_iter()
            .map(|tags| Ok((record_path(&tags)?, tags)))
            .collect()
    }
}

impl MetadataBackend for ExiftoolBackend {
    fn name(&self) -> &'static str {
        "exiftool"
    }

    fn extract(&self, paths: &[PathBuf]) -> AppResult<ExifMap> {
        if paths.is_empty() {
            return Ok(ExifMap::new());
        }

        log::info!("Extracting EXIF metadata for {} files", paths.len());
        let batches = split_into_batches(paths, self.char_limit, &self.exiftool_bin);
        log::info!(
            "Split {} file(s) into {} batch(es)",
            paths.len(),
            batches.len()
        );

        let total = batches.len();
        let pool = thread_pool(self.num_workers)?;
        let results: Vec<Vec<(PathBuf, TagMap)>> = pool.install(|| {
            batches
                .par_iter()
                .enumerate()
                .map(|(i, batch)| self.run_batch(i, total, batch))
                .collect::<AppResult<_>>()
        })?;

        Ok(results.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::runner::CommandOutput;
    use crate::value::TagValue;
    use std::path::Path;
    use std::sync::Mutex;

    /// Answers every `-X` call with one description per requested file.
    #[derive(Default)]
    struct XmlRunner {
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl CommandRunner for XmlRunner {
        fn run(&self, _program: &Path, args: &[String]) -> AppResult<CommandOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            let mut xml = String::from(
                "<rdf:RDF xmlns:rdf='http://www.w3.org/1999/02/22-rdf-syntax-ns#'>",
            );
            for file in &args[1..] {
                let path = Path::new(file);
                xml.push_str(&format!(
                    "<rdf:Description rdf:about='{}'>\
                     <System:FileName>{}</System:FileName>\
                     <System:Directory>{}</System:Directory>\
                     <IFD0:ISO>200</IFD0:ISO></rdf:Description>",
                    file,
                    path.file_name().unwrap().to_string_lossy(),
                    path.parent().unwrap().display()
                ));
            }
            xml.push_str("</rdf:RDF>");
            Ok(CommandOutput {
                success: true,
                stdout: xml,
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn records_are_keyed_by_full_path() {
        let runner = Arc::new(XmlRunner::default());
        let backend = ExiftoolBackend::new(PathBuf::from("exiftool"), runner.clone(), 50_000, 2);
        let files = vec![PathBuf::from("/p/a.jpg"), PathBuf::from("/p/b.jpg")];

        let exifd = backend.extract(&files).unwrap();
        assert_eq!(exifd.len(), 2);
        assert_eq!(exifd[Path::new("/p/b.jpg")]["ISO"], TagValue::from("200"));

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["-X", "/p/a.jpg", "/p/b.jpg"]);
    }

    #[test]
    fn small_limit_runs_several_batches() {
        let runner = Arc::new(XmlRunner::default());
        let backend = ExiftoolBackend::new(PathBuf::from("exiftool"), runner.clone(), 40, 2);
        let files: Vec<PathBuf> = ["/p/a.jpg", "/p/b.jpg", "/p/c.jpg"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let exifd = backend.extract(&files).unwrap();
        assert_eq!(exifd.len(), 3);
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn no_files_means_no_calls() {
        let runner = Arc::new(XmlRunner::default());
        let backend = ExiftoolBackend::new(PathBuf::from("exiftool"), runner.clone(), 100, 1);
        assert!(backend.extract(&[]).unwrap().is_empty());
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    struct SilentRunner;

    impl CommandRunner for SilentRunner {
        fn run(&self, _program: &Path, _args: &[String]) -> AppResult<CommandOutput> {
            Ok(CommandOutput {
                success: false,
                stdout: "  \n".into(),
                stderr: "Error: File format error - /p/a.jpg\n".into(),
            })
        }
    }

    #[test]
    fn empty_output_yields_no_records() {
        let backend = ExiftoolBackend::new(PathBuf::from("exiftool"), Arc::new(SilentRunner), 100, 1);
        let exifd = backend.extract(&[PathBuf::from("/p/a.jpg")]).unwrap();
        assert!(exifd.is_empty());
    }

    struct GarbageRunner;

    impl CommandRunner for GarbageRunner {
        fn run(&self, _program: &Path, _args: &[String]) -> AppResult<CommandOutput> {
            Ok(CommandOutput {
                success: true,
                stdout: "<html></html>".into(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn undecodable_output_is_an_error() {
        let backend = ExiftoolBackend::new(PathBuf::from("exiftool"), Arc::new(GarbageRunner), 100, 1);
        let err = backend.extract(&[PathBuf::from("/p/a.jpg")]).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }
}
