//! Turns an archive metadata document into the list of artifacts to fetch.

use std::collections::HashSet;

use serde::Deserialize;

use crate::domain::{ArchiveId, ArtifactDescriptor};
use crate::error::HarvestError;

/// Archive text fields are sometimes a single string, sometimes a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Single(String),
    Many(Vec<String>),
}

impl Default for TextField {
    fn default() -> Self {
        TextField::Single(String::new())
    }
}

impl TextField {
    pub fn joined(&self) -> String {
        match self {
            TextField::Single(value) => value.clone(),
            TextField::Many(values) => values.join("; "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemMetadata {
    #[serde(default)]
    pub creator: TextField,
    #[serde(default)]
    pub description: TextField,
    #[serde(default)]
    pub date: TextField,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetadataDocument {
    pub metadata: ItemMetadata,
    pub files: Vec<FileEntry>,
}

impl MetadataDocument {
    pub fn parse(body: &[u8]) -> Result<Self, HarvestError> {
        serde_json::from_slice(body)
            .map_err(|err| HarvestError::MetadataUnavailable(err.to_string()))
    }
}

pub struct DataSourceResolver<'a> {
    accepted_formats: &'a [String],
    catalog_file_name: &'a str,
    metadata_file_name: &'a str,
}

impl<'a> DataSourceResolver<'a> {
    pub fn new(
        accepted_formats: &'a [String],
        catalog_file_name: &'a str,
        metadata_file_name: &'a str,
    ) -> Self {
        Self {
            accepted_formats,
            catalog_file_name,
            metadata_file_name,
        }
    }

    /// Names the harvester writes itself must not be replaced by archive files.
    fn is_reserved(&self, name: &str) -> bool {
        name == self.catalog_file_name || name == self.metadata_file_name
    }

    /// Archive files in document order, then the catalog record last.
    pub fn resolve(
        &self,
        archive_id: &ArchiveId,
        accession: &str,
        document: &MetadataDocument,
    ) -> Vec<ArtifactDescriptor> {
        let mut seen = HashSet::new();
        let mut artifacts = Vec::new();
        for file in &document.files {
            let accepted = file
                .format
                .as_deref()
                .map(|format| self.accepted_formats.iter().any(|allowed| allowed == format))
                .unwrap_or(false);
            if !accepted {
                continue;
            }
            if file.name.is_empty() {
                tracing::warn!(archive_id = %archive_id, "accepted file entry has no name");
                continue;
            }
            if self.is_reserved(&file.name) || !seen.insert(file.name.as_str()) {
                tracing::warn!(
                    archive_id = %archive_id,
                    file = %file.name,
                    "file name already taken, skipping entry"
                );
                continue;
            }
            artifacts.push(ArtifactDescriptor::archive_file(
                file.name.clone(),
                accession,
                archive_id,
            ));
        }
        artifacts.push(ArtifactDescriptor::bibliographic_record(
            self.catalog_file_name,
            accession,
        ));
        artifacts
    }
}
