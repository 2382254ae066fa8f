use crate::error::AppResult;
use crate::value::{ExifMap, TagMap};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const BUILTIN_COLUMN_MAP: &str = include_str!("../data/exif_column_map.json");

/// Raw exiftool tag names mapped to their cleaned names.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    names: BTreeMap<String, String>,
    targets: HashSet<String>,
}

impl ColumnMap {
    pub fn new(names: BTreeMap<String, String>) -> Self {
        let targets = names.values().cloned().collect();
        Self { names, targets }
    }

    pub fn builtin() -> AppResult<Self> {
        Ok(Self::new(serde_json::from_str(BUILTIN_COLUMN_MAP)?))
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        log::debug!("Loading column map from {:?}", path);
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&raw)?))
    }

    /// Clean name for `key`, or `None` when the key is neither a raw name nor
    /// an already-cleaned one.
    fn lookup<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        match self.names.get(key) {
            Some(mapped) => Some(mapped.as_str()),
            None if self.targets.contains(key) => Some(key),
            None => None,
        }
    }
}

/// `ExifKeyName` -> `exif_key_name`.
pub fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i > 0 && ch.is_uppercase() {
            out.push('_');
        }
        out.push(ch);
    }
    out.to_lowercase().replace("i_d", "id")
}

pub fn clean_tag_keys(tags: TagMap, column_map: &ColumnMap) -> TagMap {
    tags.into_iter()
        .map(|(key, value)| {
            let clean = match column_map.lookup(&key) {
                Some(mapped) => mapped.to_string(),
                None => {
                    log::warn!(
                        "No mapped name found for key {}, converting to snake_case",
                        key
                    );
                    snake_case(&key)
                }
            };
            (clean, value)
        })
        .collect()
}

pub fn clean_keys(exifd: ExifMap, column_map: &ColumnMap) -> ExifMap {
    exifd
        .into_iter()
        .map(|(path, tags)| (path, clean_tag_keys(tags, column_map)))
        .collect()
}
