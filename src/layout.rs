use std::fs;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::subdirectory_name;
use crate::error::HarvestError;

/// Output tree of one run: `<root>/00001/`, `<root>/00002/`, ...
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: Utf8PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path) -> Result<Self, HarvestError> {
        if root.as_os_str().is_empty() {
            return Err(HarvestError::MissingOutput);
        }
        let root = Utf8PathBuf::from_path_buf(root.to_path_buf())
            .map_err(|_| HarvestError::Filesystem("non-utf8 output directory".to_string()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn record_dir(&self, sequence: usize) -> Utf8PathBuf {
        self.root.join(subdirectory_name(sequence))
    }

    pub fn ensure_root(&self) -> Result<(), HarvestError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| HarvestError::Filesystem(format!("create {}: {err}", self.root)))
    }

    pub fn ensure_record_dir(&self, sequence: usize) -> Result<Utf8PathBuf, HarvestError> {
        let dir = self.record_dir(sequence);
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| HarvestError::Filesystem(format!("create {dir}: {err}")))?;
        Ok(dir)
    }
}
