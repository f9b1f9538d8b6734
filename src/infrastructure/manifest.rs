use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::Manifest;

pub const MANIFEST_FILE_NAME: &str = "composer.json";

/// Pure I/O trait for loading and saving the project manifest.
/// Edit operations live on the `Manifest` domain entity.
pub trait ManifestStore {
    /// Load the manifest from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not valid JSON.
    fn load(&self) -> Result<Manifest, ManifestError>;

    /// Save the given manifest to storage, rewriting the whole file.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized or written.
    fn save(&self, manifest: &Manifest) -> Result<(), ManifestError>;

    /// The path this store reads from and writes to.
    fn path(&self) -> &Path;
}

/// Errors that can occur when working with the manifest file
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found or unreadable: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest file: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<serde_json::Error>,
    },

    #[error("failed to write manifest file: {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize manifest to JSON")]
    Serialize(#[source] serde_json::Error),
}

/// File-backed manifest store.
///
/// Every save rewrites the file in full; there is no partial-write
/// protection, so a crash mid-write can leave a corrupt manifest. Callers
/// are expected to treat each load-edit-save cycle as one edit unit.
pub struct FileManifest {
    path: PathBuf,
}

impl FileManifest {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl ManifestStore for FileManifest {
    fn load(&self) -> Result<Manifest, ManifestError> {
        let content = fs::read_to_string(&self.path).map_err(|source| ManifestError::NotFound {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: self.path.clone(),
            source: Box::new(source),
        })
    }

    fn save(&self, manifest: &Manifest) -> Result<(), ManifestError> {
        // composer.json convention: 4-space indent, literal forward slashes.
        // serde_json never escapes `/`, so slashes round-trip as-is.
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        manifest
            .serialize(&mut serializer)
            .map_err(ManifestError::Serialize)?;
        buf.push(b'\n');

        fs::write(&self.path, buf).map_err(|source| ManifestError::Write {
            path: self.path.clone(),
            source,
        })?;

        info!("Manifest updated: {}", self.path.display());
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write as IoWrite;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_missing_file_is_not_found() {
        let store = FileManifest::new(Path::new("/nonexistent/composer.json"));
        let err = store.load().unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[test]
    fn test_load_invalid_json_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        let store = FileManifest::new(file.path());
        let err = store.load().unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn test_save_and_load_roundtrip_preserves_unrelated_keys() {
        let content = r#"{
    "name": "acme/app",
    "description": "demo",
    "require": {
        "php": "^8.1",
        "masterro/laravel-fresh-start": "^1.0"
    },
    "autoload": {
        "psr-4": {"App\\": "app/"}
    },
    "minimum-stability": "stable"
}"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let store = FileManifest::new(file.path());
        let loaded = store.load().unwrap();
        store.save(&loaded).unwrap();
        let reloaded = store.load().unwrap();

        assert_eq!(loaded, reloaded);
        assert_eq!(reloaded.rest["name"], json!("acme/app"));
        assert_eq!(reloaded.rest["minimum-stability"], json!("stable"));
        assert_eq!(
            reloaded.require.as_ref().unwrap().get("php"),
            Some(&"^8.1".to_string())
        );
    }

    #[test]
    fn test_save_does_not_escape_forward_slashes() {
        let file = NamedTempFile::new().unwrap();
        let store = FileManifest::new(file.path());

        let mut manifest = Manifest::default();
        manifest
            .add_dont_discover("laravel", &["barryvdh/laravel-debugbar".to_string()])
            .unwrap();
        store.save(&manifest).unwrap();

        let written = fs::read_to_string(file.path()).unwrap();
        assert!(written.contains("barryvdh/laravel-debugbar"), "got: {written}");
        assert!(!written.contains(r"barryvdh\/laravel-debugbar"), "got: {written}");
    }

    #[test]
    fn test_save_uses_four_space_indent_and_trailing_newline() {
        let file = NamedTempFile::new().unwrap();
        let store = FileManifest::new(file.path());

        let manifest: Manifest =
            serde_json::from_value(json!({"require": {"php": "^8.1"}})).unwrap();
        store.save(&manifest).unwrap();

        let written = fs::read_to_string(file.path()).unwrap();
        assert!(written.contains("\n    \"require\""), "got: {written}");
        assert!(written.ends_with("}\n"), "got: {written}");
    }

    #[test]
    fn test_save_sorts_requirements_alphabetically() {
        let file = NamedTempFile::new().unwrap();
        let store = FileManifest::new(file.path());

        let manifest: Manifest = serde_json::from_value(json!({
            "require": {"zulu/pkg": "^1.0", "alpha/pkg": "^2.0"}
        }))
        .unwrap();
        store.save(&manifest).unwrap();

        let written = fs::read_to_string(file.path()).unwrap();
        let alpha = written.find("alpha/pkg").unwrap();
        let zulu = written.find("zulu/pkg").unwrap();
        assert!(alpha < zulu);
    }
}
