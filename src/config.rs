use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

pub const DEFAULT_METADATA_FILE: &str = "iarchive.json";
pub const DEFAULT_CATALOG_FILE: &str = "worldcat.xml";
pub const DEFAULT_CATALOG_BASE_URL: &str = "http://www.worldcat.org/webservices/catalog/content";
pub const DEFAULT_AUDIT_LOG: &str = "audit.log";
pub const DEFAULT_FAILURE_LOG: &str = "audit-failures.log";

/// Settings for one harvest run. Every field has a default, so a settings
/// file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Raw archive metadata response, written into every record directory.
    pub metadata_file_name: String,
    /// Raw catalog response, written when the bibliographic record is fetched.
    pub catalog_file_name: String,
    /// Declared file formats that are downloaded from the archive.
    pub archive_formats: Vec<String>,
    pub catalog_base_url: String,
    pub audit_log: PathBuf,
    pub failure_log: PathBuf,
    pub max_concurrent_downloads: usize,
    pub request_timeout_secs: Option<u64>,
    /// Accession numbers shorter than this are never sent to the catalog.
    pub min_accession_len: usize,
    pub write_report: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            metadata_file_name: DEFAULT_METADATA_FILE.to_string(),
            catalog_file_name: DEFAULT_CATALOG_FILE.to_string(),
            archive_formats: default_archive_formats(),
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            audit_log: PathBuf::from(DEFAULT_AUDIT_LOG),
            failure_log: PathBuf::from(DEFAULT_FAILURE_LOG),
            max_concurrent_downloads: 8,
            request_timeout_secs: None,
            min_accession_len: 5,
            write_report: true,
        }
    }
}

impl HarvestConfig {
    pub fn load(path: &Path) -> Result<Self, HarvestError> {
        let content =
            fs::read_to_string(path).map_err(|_| HarvestError::ConfigRead(path.to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| HarvestError::ConfigParse(err.to_string()))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn report_path(&self) -> PathBuf {
        report_path_for(&self.audit_log)
    }
}

/// Default report location: the audit log with a `csv` extension, or
/// `<stem>.report.csv` when the log itself already ends in `.csv`.
pub fn report_path_for(audit_log: &Path) -> PathBuf {
    let path = audit_log.with_extension("csv");
    if path == audit_log {
        audit_log.with_extension("report.csv")
    } else {
        path
    }
}

pub fn default_archive_formats() -> Vec<String> {
    vec!["Text PDF".to_string(), "DjVuTXT".to_string()]
}

/// Shape of the credential file: `{"Comment": "...", "Key": "..."}`.
#[derive(Debug, Deserialize)]
struct CredentialFile {
    #[serde(rename = "Comment", default)]
    _comment: Option<String>,
    #[serde(rename = "Key", default)]
    key: String,
}

/// Catalog service key. An empty credential only disables catalog lookups.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_configured() {
            write!(f, "Credential(***)")
        } else {
            write!(f, "Credential(none)")
        }
    }
}

pub struct CredentialLoader;

impl CredentialLoader {
    /// A missing or unreadable file yields an empty credential, not an error.
    pub fn load(path: Option<&Path>) -> Result<Credential, HarvestError> {
        let Some(path) = path else {
            tracing::warn!("no api configuration file, harvesting archive records only");
            return Ok(Credential::none());
        };
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                tracing::warn!(
                    path = %path.display(),
                    "unable to open api key file, harvesting archive records only"
                );
                return Ok(Credential::none());
            }
        };
        let file: CredentialFile = serde_json::from_str(&content)
            .map_err(|err| HarvestError::ConfigParse(err.to_string()))?;
        let credential = Credential::new(file.key);
        if !credential.is_configured() {
            tracing::warn!(path = %path.display(), "api key file has an empty key");
        }
        Ok(credential)
    }
}
