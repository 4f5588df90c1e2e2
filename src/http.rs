use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

pub fn build_client(timeout: Option<Duration>) -> Result<Client, String> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("archive-harvester/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| err.to_string())?,
    );
    // reqwest's blocking client applies a 30s default unless told otherwise.
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|err| err.to_string())
}

pub enum BodyError {
    Status { status: u16, message: String },
    Transport(String),
}

pub fn read_body(response: Response) -> Result<Vec<u8>, BodyError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "request failed".to_string());
        return Err(BodyError::Status { status, message });
    }
    response
        .bytes()
        .map(|bytes| bytes.to_vec())
        .map_err(|err| BodyError::Transport(err.to_string()))
}
