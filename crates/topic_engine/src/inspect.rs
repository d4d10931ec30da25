use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStatus {
    Present,
    /// A regular file of length zero.
    Empty,
    Missing,
    NotAFile,
}

/// Checks a chosen path once, at selection time. Unreadable metadata counts as missing.
pub fn inspect_path(path: &Path) -> InputStatus {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() == 0 => InputStatus::Empty,
        Ok(meta) if meta.is_file() => InputStatus::Present,
        Ok(_) => InputStatus::NotAFile,
        Err(_) => InputStatus::Missing,
    }
}
