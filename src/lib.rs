//! Utilities for reading and writing metadata from/to local photo files.
//!
//! Reading goes through batched `exiftool -X` runs or, for plain EXIF, an
//! in-process reader. Writing and removing tags always shell out to exiftool.

pub mod backend;
pub mod backends;
pub mod batch;
pub mod config;
pub mod error;
pub mod keys;
pub mod metadata;
pub mod rdf;
pub mod runner;
pub mod tags;
pub mod value;
pub mod walker;

pub use backend::Backend;
pub use error::{AppError, AppResult};
pub use metadata::{Exif, ExtractOptions, WriteReport};
pub use tags::WriteValue;
pub use value::{ExifMap, TagMap, TagValue};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
