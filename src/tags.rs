use crate::error::{AppError, AppResult};
use std::path::Path;

const ILLEGAL_TAG_CHARS: [char; 2] = ['-', '_'];

/// Value to write into a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteValue {
    Single(String),
    Many(Vec<String>),
}

impl WriteValue {
    fn joined(&self) -> String {
        match self {
            WriteValue::Single(s) => s.clone(),
            WriteValue::Many(items) => items.join(", "),
        }
    }
}

impl std::fmt::Display for WriteValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.joined())
    }
}

impl From<&str> for WriteValue {
    fn from(s: &str) -> Self {
        WriteValue::Single(s.to_string())
    }
}

impl From<String> for WriteValue {
    fn from(s: String) -> Self {
        WriteValue::Single(s)
    }
}

impl From<Vec<String>> for WriteValue {
    fn from(items: Vec<String>) -> Self {
        WriteValue::Many(items)
    }
}

pub fn validate_tag_name(tag: &str) -> AppResult<()> {
    match tag.chars().find(|c| ILLEGAL_TAG_CHARS.contains(c)) {
        Some(ch) => Err(AppError::IllegalTagName {
            ch,
            tag: tag.to_string(),
        }),
        None => Ok(()),
    }
}

pub fn validate_tag_names<'a>(tags: impl IntoIterator<Item = &'a str>) -> AppResult<()> {
    tags.into_iter().try_for_each(validate_tag_name)
}

/// exiftool exits cleanly even when it left the file untouched, so the
/// message is the only signal.
pub fn is_successful_write(message: &str) -> bool {
    !message.to_lowercase().contains("nothing to do")
}

/// Arguments for writing one tag on one file.
///
/// `Keywords` given as a comma separated string is split into separate
/// values, and several keywords become repeated `-keywords=` arguments so
/// they are not stored as a single string.
pub fn write_args(tag: &str, value: &WriteValue, file: &Path) -> Vec<String> {
    let mut args = vec!["-overwrite_original".to_string()];

    let keywords = if tag == "Keywords" {
        match value {
            WriteValue::Single(s) if s.contains(", ") => {
                Some(s.split(", ").map(str::to_string).collect::<Vec<_>>())
            }
            WriteValue::Many(items) => Some(items.clone()),
            _ => None,
        }
    } else {
        None
    };

    match keywords {
        Some(items) if items.len() > 1 => {
            args.extend(items.iter().map(|kw| format!("-keywords={}", kw)));
        }
        _ => args.push(format!("-{}={}", tag, value)),
    }

    args.push(file.to_string_lossy().to_string());
    args
}

pub fn remove_args(tag: &str, file: &Path) -> Vec<String> {
    vec![
        "-overwrite_original".to_string(),
        format!("-{}=", tag),
        file.to_string_lossy().to_string(),
    ]
}
