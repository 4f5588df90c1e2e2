use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

/// Width of the zero-padded per-record output directory name.
pub const SUBDIRECTORY_WIDTH: usize = 5;

/// An archive identifier shaped as a "details" page URL, e.g.
/// `https://archive.org/details/item`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveId(String);

impl ArchiveId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn metadata_url(&self) -> String {
        self.0.replacen("details", "metadata", 1)
    }

    pub fn download_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.0.replacen("details", "download", 1), file_name)
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArchiveId {
    type Err = HarvestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        if normalized.is_empty() || !normalized.contains("details") {
            return Err(HarvestError::InvalidArchiveId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "IarchiveID")]
    pub archive_id: String,
    #[serde(rename = "Oclc")]
    pub accession_number: String,
}

impl InputRecord {
    pub fn new(
        title: impl Into<String>,
        archive_id: impl Into<String>,
        accession_number: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            archive_id: archive_id.into(),
            accession_number: accession_number.into(),
        }
    }
}

/// Placeholder accession numbers ("0", "n/a", ...) are too short to query.
pub fn is_queryable_accession(accession: &str, min_len: usize) -> bool {
    accession.chars().count() >= min_len
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    ArchiveFile,
    BibliographicRecord,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::ArchiveFile => write!(f, "archive"),
            SourceKind::BibliographicRecord => write!(f, "catalog"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    pub file_name: String,
    pub accession_number: String,
    pub source: SourceKind,
    /// Only set for [`SourceKind::ArchiveFile`].
    pub base_url: Option<ArchiveId>,
}

impl ArtifactDescriptor {
    pub fn archive_file(file_name: impl Into<String>, accession: &str, base: &ArchiveId) -> Self {
        Self {
            file_name: file_name.into(),
            accession_number: accession.to_string(),
            source: SourceKind::ArchiveFile,
            base_url: Some(base.clone()),
        }
    }

    pub fn bibliographic_record(file_name: impl Into<String>, accession: &str) -> Self {
        Self {
            file_name: file_name.into(),
            accession_number: accession.to_string(),
            source: SourceKind::BibliographicRecord,
            base_url: None,
        }
    }
}

pub fn subdirectory_name(sequence: usize) -> String {
    format!("{sequence:0width$}", width = SUBDIRECTORY_WIDTH)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_archive_id_valid() {
        let id: ArchiveId = " https://x/details/ia1 ".parse().unwrap();
        assert_eq!(id.as_str(), "https://x/details/ia1");
    }

    #[test]
    fn parse_archive_id_invalid() {
        let err = "Identifier".parse::<ArchiveId>().unwrap_err();
        assert_matches!(err, HarvestError::InvalidArchiveId(_));
        let err = "   ".parse::<ArchiveId>().unwrap_err();
        assert_matches!(err, HarvestError::InvalidArchiveId(_));
    }

    #[test]
    fn endpoint_urls_replace_first_details_only() {
        let id: ArchiveId = "https://archive.org/details/details-of-x".parse().unwrap();
        assert_eq!(
            id.metadata_url(),
            "https://archive.org/metadata/details-of-x"
        );
        assert_eq!(
            id.download_url("a.pdf"),
            "https://archive.org/download/details-of-x/a.pdf"
        );
    }

    #[test]
    fn accession_gate() {
        assert!(!is_queryable_accession("12", 5));
        assert!(!is_queryable_accession("1234", 5));
        assert!(is_queryable_accession("12345", 5));
    }

    #[test]
    fn subdirectory_is_zero_padded() {
        assert_eq!(subdirectory_name(1), "00001");
        assert_eq!(subdirectory_name(42), "00042");
        assert_eq!(subdirectory_name(123456), "123456");
    }
}
