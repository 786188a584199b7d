use reqwest::StatusCode;
use thiserror::Error;
use url::Url;
use yadisk_core::{YadiskClient, YadiskError};

use crate::listing::Entry;
use crate::transfer::{TransferClient, TransferError};
use crate::upload::LocalFile;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("api error: {0}")]
    Api(#[from] YadiskError),
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl GatewayError {
    pub fn is_unauthorized(&self) -> bool {
        match self {
            GatewayError::Api(err) => err.is_unauthorized(),
            GatewayError::Transfer(_) => false,
        }
    }
}

/// Source of folder listings.
#[allow(async_fn_in_trait)]
pub trait FolderGateway {
    async fn list_folder(&self, path: &str) -> Result<Vec<Entry>, GatewayError>;
}

/// Two-step upload: obtain a transfer target, then send the bytes there.
#[allow(async_fn_in_trait)]
pub trait UploadGateway {
    async fn request_target(&self, destination: &str, overwrite: bool)
    -> Result<Url, GatewayError>;

    async fn transmit(&self, target: &Url, file: &LocalFile) -> Result<StatusCode, GatewayError>;
}

pub struct YadiskGateway {
    client: YadiskClient,
    transfer: TransferClient,
    list_limit: u32,
}

impl YadiskGateway {
    pub fn new(client: YadiskClient, list_limit: u32) -> Self {
        Self {
            client,
            transfer: TransferClient::new(),
            list_limit: list_limit.max(1),
        }
    }

    pub fn with_transfer(mut self, transfer: TransferClient) -> Self {
        self.transfer = transfer;
        self
    }
}

impl FolderGateway for YadiskGateway {
    async fn list_folder(&self, path: &str) -> Result<Vec<Entry>, GatewayError> {
        let list = self
            .client
            .list_directory(path, Some(self.list_limit))
            .await?;
        Ok(list.items.into_iter().map(Entry::from).collect())
    }
}

impl UploadGateway for YadiskGateway {
    async fn request_target(
        &self,
        destination: &str,
        overwrite: bool,
    ) -> Result<Url, GatewayError> {
        let link = self.client.get_upload_link(destination, overwrite).await?;
        Ok(link.href)
    }

    async fn transmit(&self, target: &Url, file: &LocalFile) -> Result<StatusCode, GatewayError> {
        Ok(self.transfer.upload_from_path(target, &file.path).await?)
    }
}
