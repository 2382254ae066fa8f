pub mod exiftool;
pub mod native;
