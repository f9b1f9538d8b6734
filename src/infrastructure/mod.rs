pub mod manifest;
pub mod process;
pub mod renamer;

pub use manifest::{FileManifest, MANIFEST_FILE_NAME, ManifestError, ManifestStore};
pub use process::{CommandRunner, ProcessError, SystemRunner};
pub use renamer::{RenameError, TreeRenamer};
