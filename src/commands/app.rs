use anyhow::Result;
use std::path::Path;

use crate::config::ScaffoldConfig;
use crate::infrastructure::{FileManifest, MANIFEST_FILE_NAME, SystemRunner};

/// Run the fresh-start pipeline against a real project: file-backed manifest
/// store and OS process runner.
///
/// # Errors
///
/// Returns an error if any pipeline step fails.
pub fn fresh_start(root: &Path, config: &ScaffoldConfig) -> Result<()> {
    let store = FileManifest::new(&root.join(MANIFEST_FILE_NAME));
    let runner = SystemRunner;
    super::fresh_start::run(root, config, &store, &runner)
}
