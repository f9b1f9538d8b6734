use std::path::{Path, PathBuf};
use std::{env, io};
use thiserror::Error;

use crate::infrastructure::MANIFEST_FILE_NAME;

/// Errors that can occur while locating the project root
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("could not determine the current directory")]
    CurrentDir(#[source] io::Error),

    #[error("composer.json not found in {} or any parent directory", start.display())]
    NotInProject { start: PathBuf },
}

/// Locate the project root by walking up from the current directory until a
/// `composer.json` is found.
///
/// # Errors
///
/// Returns an error if the current directory is unavailable or no manifest
/// exists in any ancestor.
pub fn find_root() -> Result<PathBuf, RepoError> {
    let cwd = env::current_dir().map_err(RepoError::CurrentDir)?;
    find_root_from(&cwd)
}

/// Walk up from `start` until a directory containing `composer.json` is
/// found.
///
/// # Errors
///
/// Returns an error if no ancestor of `start` holds a manifest.
pub fn find_root_from(start: &Path) -> Result<PathBuf, RepoError> {
    let mut dir = start;
    loop {
        if dir.join(MANIFEST_FILE_NAME).is_file() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => {
                return Err(RepoError::NotInProject {
                    start: start.to_path_buf(),
                });
            }
        }
    }
}
