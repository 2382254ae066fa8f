use serde_json::Error as SerdeJsonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] SerdeJsonError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Channel send error")]
    SendError,

    #[error("File \"{0}\" does not exist")]
    FileNotFound(String),

    #[error("File name \"{0}\" is not valid UTF-8")]
    NonUtf8Path(String),

    #[error("exiftool binary not found: {0}")]
    ExiftoolNotFound(String),

    #[error("Illegal character \"{ch}\" in tag name \"{tag}\"")]
    IllegalTagName { ch: char, tag: String },

    #[error("Unable to execute system command {command}: {source}")]
    Command {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl<T> From<crossbeam_channel::SendError<T>> for AppError {
    fn from(_: crossbeam_channel::SendError<T>) -> Self {
        AppError::SendError
    }
}
