use std::{io, path::Path};

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use url::Url;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Sends file bodies to one-time upload targets.
#[derive(Clone)]
pub struct TransferClient {
    http: Client,
}

impl TransferClient {
    pub fn new() -> Self {
        Self::with_http(Client::new())
    }

    pub fn with_http(http: Client) -> Self {
        Self { http }
    }

    /// Streams `source` to `target` as a raw `PUT` body. The status is
    /// returned as-is; deciding what counts as success is up to the caller.
    pub async fn upload_from_path(
        &self,
        target: &Url,
        source: &Path,
    ) -> Result<StatusCode, TransferError> {
        let file = tokio::fs::File::open(source).await?;
        let length = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let response = self
            .http
            .put(target.clone())
            .header(reqwest::header::CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await?;
        Ok(response.status())
    }
}

impl Default for TransferClient {
    fn default() -> Self {
        Self::new()
    }
}
