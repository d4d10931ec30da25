use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("output directory {} is not usable: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates `dir` if needed and checks that files can be created inside it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |source| PersistError::OutputDir {
        path: dir.to_path_buf(),
        source,
    };
    if dir.exists() {
        if !fs::metadata(dir).map_err(unusable)?.is_dir() {
            return Err(PersistError::NotADirectory(dir.to_path_buf()));
        }
    } else {
        fs::create_dir_all(dir).map_err(unusable)?;
    }
    NamedTempFile::new_in(dir).map_err(unusable)?;
    Ok(())
}

/// Writes whole files into one directory through a temp file and rename, so
/// readers never observe a half-written file.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }
}
