#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use archive_harvester::archive::ArchiveClient;
use archive_harvester::catalog::CatalogClient;
use archive_harvester::config::{Credential, HarvestConfig};
use archive_harvester::domain::ArchiveId;
use archive_harvester::error::HarvestError;

pub const METADATA_T1: &str = r#"{"metadata":{"creator":"A","description":"D","date":"2020"},"files":[{"name":"ia1.pdf","format":"Text PDF"}]}"#;

#[derive(Default)]
pub struct MockArchive {
    metadata: HashMap<String, Vec<u8>>,
    files: HashMap<String, Vec<u8>>,
    delays: HashMap<String, Duration>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockArchive {
    pub fn with_metadata(mut self, archive_id: &str, body: &str) -> Self {
        self.metadata
            .insert(archive_id.to_string(), body.as_bytes().to_vec());
        self
    }

    pub fn with_file(mut self, archive_id: &str, name: &str, body: &[u8]) -> Self {
        self.files.insert(url(archive_id, name), body.to_vec());
        self
    }

    pub fn with_slow_file(
        mut self,
        archive_id: &str,
        name: &str,
        body: &[u8],
        delay: Duration,
    ) -> Self {
        self.delays.insert(url(archive_id, name), delay);
        self.with_file(archive_id, name, body)
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

fn url(archive_id: &str, name: &str) -> String {
    archive_id
        .parse::<ArchiveId>()
        .unwrap()
        .download_url(name)
}

fn not_found() -> HarvestError {
    HarvestError::ArchiveStatus {
        status: 404,
        message: "not found".to_string(),
    }
}

impl ArchiveClient for MockArchive {
    fn fetch_metadata(&self, id: &ArchiveId) -> Result<Vec<u8>, HarvestError> {
        self.calls.lock().unwrap().push(id.metadata_url());
        self.metadata.get(id.as_str()).cloned().ok_or_else(not_found)
    }

    fn download_file(&self, id: &ArchiveId, file_name: &str) -> Result<Vec<u8>, HarvestError> {
        let url = id.download_url(file_name);
        self.calls.lock().unwrap().push(url.clone());
        if let Some(delay) = self.delays.get(&url) {
            thread::sleep(*delay);
        }
        self.files.get(&url).cloned().ok_or_else(not_found)
    }
}

#[derive(Default)]
pub struct MockCatalog {
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    pub fail: bool,
}

impl MockCatalog {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.calls)
    }
}

impl CatalogClient for MockCatalog {
    fn fetch_record(
        &self,
        accession: &str,
        credential: &Credential,
    ) -> Result<Vec<u8>, HarvestError> {
        self.calls
            .lock()
            .unwrap()
            .push((accession.to_string(), credential.as_str().to_string()));
        if self.fail {
            return Err(HarvestError::CatalogHttp("connection refused".to_string()));
        }
        Ok(format!("<record>{accession}</record>").into_bytes())
    }
}

pub fn test_config(dir: &std::path::Path) -> HarvestConfig {
    HarvestConfig {
        audit_log: dir.join("audit.log"),
        failure_log: dir.join("audit-failures.log"),
        ..HarvestConfig::default()
    }
}
