use std::time::Duration;

use reqwest::blocking::Client;

use crate::domain::ArchiveId;
use crate::error::HarvestError;
use crate::http::{BodyError, build_client, read_body};

pub trait ArchiveClient: Send + Sync {
    fn fetch_metadata(&self, id: &ArchiveId) -> Result<Vec<u8>, HarvestError>;
    fn download_file(&self, id: &ArchiveId, file_name: &str) -> Result<Vec<u8>, HarvestError>;
}

#[derive(Clone)]
pub struct ArchiveHttpClient {
    client: Client,
}

impl ArchiveHttpClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self, HarvestError> {
        let client = build_client(timeout).map_err(HarvestError::ArchiveHttp)?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| HarvestError::ArchiveHttp(err.to_string()))?;
        read_body(response).map_err(|err| match err {
            BodyError::Status { status, message } => {
                HarvestError::ArchiveStatus { status, message }
            }
            BodyError::Transport(message) => HarvestError::ArchiveHttp(message),
        })
    }
}

impl ArchiveClient for ArchiveHttpClient {
    fn fetch_metadata(&self, id: &ArchiveId) -> Result<Vec<u8>, HarvestError> {
        self.get(&id.metadata_url())
    }

    fn download_file(&self, id: &ArchiveId, file_name: &str) -> Result<Vec<u8>, HarvestError> {
        self.get(&id.download_url(file_name))
    }
}

/// Retrieves the metadata document for one record, downgrading remote
/// failures to an absent body.
pub struct MetadataFetcher<'a, A: ArchiveClient> {
    client: &'a A,
}

impl<'a, A: ArchiveClient> MetadataFetcher<'a, A> {
    pub fn new(client: &'a A) -> Self {
        Self { client }
    }

    /// Local errors from a client are still propagated.
    pub fn fetch(&self, id: &ArchiveId) -> Result<Option<Vec<u8>>, HarvestError> {
        match self.client.fetch_metadata(id) {
            Ok(body) => Ok(Some(body)),
            Err(err) if !err.is_fatal() => {
                tracing::warn!(archive_id = %id, error = %err, "metadata request failed");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
