use glob::Pattern;
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors that can occur while scanning and rewriting project files
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("invalid file name pattern `{pattern}`")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to scan the project tree")]
    Walk(#[source] walkdir::Error),

    #[error("file disappeared during rename: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file: {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Literal-substring rename across a directory tree.
///
/// The rewritten identifiers are namespace-qualified class references that
/// appear as contiguous text in source files, so a plain substring replace
/// is all that is needed; nothing here parses the files it touches.
pub struct TreeRenamer {
    root: PathBuf,
    exclude_dirs: Vec<String>,
}

impl TreeRenamer {
    #[must_use]
    pub fn new(root: &Path, exclude_dirs: &[&str]) -> Self {
        Self {
            root: root.to_path_buf(),
            exclude_dirs: exclude_dirs.iter().map(|dir| (*dir).to_string()).collect(),
        }
    }

    /// Lazily yield every file under the root whose name matches
    /// `name_pattern` and whose content contains `needle`, pruning any
    /// directory named in the exclude list. Each call re-scans the tree.
    ///
    /// Files that are not valid UTF-8 are skipped (they are not plain text);
    /// a file that vanishes between discovery and read yields
    /// `RenameError::NotFound`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name_pattern` is not a valid glob pattern.
    pub fn find_files_containing<'a>(
        &'a self,
        needle: &'a str,
        name_pattern: &str,
    ) -> Result<impl Iterator<Item = Result<PathBuf, RenameError>> + 'a, RenameError> {
        let pattern = Pattern::new(name_pattern).map_err(|source| RenameError::Pattern {
            pattern: name_pattern.to_string(),
            source,
        })?;

        let files = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self.is_excluded(entry.file_name())
            })
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(source) => return Some(Err(RenameError::Walk(source))),
                };
                if !entry.file_type().is_file() {
                    return None;
                }
                if !pattern.matches(&entry.file_name().to_string_lossy()) {
                    return None;
                }

                let path = entry.into_path();
                match fs::read_to_string(&path) {
                    Ok(content) if content.contains(needle) => Some(Ok(path)),
                    Ok(_) => None,
                    Err(source) if source.kind() == ErrorKind::NotFound => {
                        Some(Err(RenameError::NotFound { path }))
                    }
                    Err(source) if source.kind() == ErrorKind::InvalidData => None,
                    Err(source) => Some(Err(RenameError::Read { path, source })),
                }
            });

        Ok(files)
    }

    /// Apply each `(from, to)` pair as a literal global replace, in order,
    /// and write the file back only if the content changed. Returns whether
    /// a write happened. Safe to call on an already-migrated file: when no
    /// `from` occurs, nothing is touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    pub fn replace_in_file(
        path: &Path,
        replacements: &[(&str, &str)],
    ) -> Result<bool, RenameError> {
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => RenameError::NotFound {
                path: path.to_path_buf(),
            },
            _ => RenameError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let mut updated = content.clone();
        for (from, to) in replacements {
            updated = updated.replace(from, to);
        }

        if updated == content {
            return Ok(false);
        }

        fs::write(path, &updated).map_err(|source| RenameError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(true)
    }

    /// Rewrite every matching file under the root. The first failure aborts
    /// the batch; there is no skip-and-continue.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan or any rewrite fails.
    pub fn rename_all(
        &self,
        needle: &str,
        name_pattern: &str,
        replacements: &[(&str, &str)],
    ) -> Result<Vec<PathBuf>, RenameError> {
        let files: Vec<PathBuf> = self
            .find_files_containing(needle, name_pattern)?
            .collect::<Result<_, _>>()?;

        let mut changed = Vec::new();
        for path in files {
            if Self::replace_in_file(&path, replacements)? {
                debug!("{}", path.display());
                changed.push(path);
            }
        }
        Ok(changed)
    }

    fn is_excluded(&self, name: &std::ffi::OsStr) -> bool {
        name.to_str()
            .is_some_and(|name| self.exclude_dirs.iter().any(|dir| dir == name))
    }
}
