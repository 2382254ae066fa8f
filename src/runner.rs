use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout and stderr together, the way exiftool reports write results.
    pub fn message(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Runs external programs on behalf of the exiftool wrapper.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[String]) -> AppResult<CommandOutput>;
}

/// Spawns the program directly, without a shell, so file names need no
/// quoting.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> AppResult<CommandOutput> {
        log::trace!("Running {:?} with {} argument(s)", program, args.len());
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| AppError::Command {
                command: program.display().to_string(),
                source,
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Locate exiftool: an explicitly configured path wins, otherwise `PATH`.
pub fn find_exiftool(configured: Option<&str>) -> AppResult<PathBuf> {
    match configured {
        Some(path) => {
            let path = PathBuf::from(path);
            if path.is_file() {
                Ok(path)
            } else {
                Err(AppError::ExiftoolNotFound(path.display().to_string()))
            }
        }
        None => which::which("exiftool")
            .map_err(|e| AppError::ExiftoolNotFound(format!("not on PATH ({})", e))),
    }
}
