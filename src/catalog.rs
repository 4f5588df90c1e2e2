use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::Credential;
use crate::error::HarvestError;
use crate::http::{BodyError, build_client, read_body};

pub trait CatalogClient: Send + Sync {
    fn fetch_record(&self, accession: &str, credential: &Credential)
    -> Result<Vec<u8>, HarvestError>;
}

#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
    base_url: String,
}

impl CatalogHttpClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, HarvestError> {
        let client = build_client(timeout).map_err(HarvestError::CatalogHttp)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn record_url(&self, accession: &str) -> String {
        format!("{}/{}", self.base_url, accession)
    }
}

impl CatalogClient for CatalogHttpClient {
    fn fetch_record(
        &self,
        accession: &str,
        credential: &Credential,
    ) -> Result<Vec<u8>, HarvestError> {
        let response = self
            .client
            .get(self.record_url(accession))
            .query(&[("wskey", credential.as_str())])
            .send()
            .map_err(|err| HarvestError::CatalogHttp(err.to_string()))?;
        read_body(response).map_err(|err| match err {
            BodyError::Status { status, message } => {
                HarvestError::CatalogStatus { status, message }
            }
            BodyError::Transport(message) => HarvestError::CatalogHttp(message),
        })
    }
}
