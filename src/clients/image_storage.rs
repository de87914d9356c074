//! Image upload targets: a local directory or an Azure-style blob container.

use reqwest::Client;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{StorageBackend, StorageConfig};

const MAX_CONTAINER_NAME_LEN: usize = 63;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid container name: {0}")]
    InvalidContainer(String),

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait ImageStorage: Send + Sync {
    /// Stores `data` under a fresh name in `container` and returns its public URL.
    async fn upload(
        &self,
        container: &str,
        original_filename: &str,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<String, StorageError>;
}

/// Builds the configured backend.
#[must_use]
pub fn from_config(client: Client, config: &StorageConfig) -> Box<dyn ImageStorage> {
    match config.backend {
        StorageBackend::Local => Box::new(LocalImageStorage::new(
            &config.images_path,
            &config.public_base_url,
        )),
        StorageBackend::Azure => Box::new(AzureBlobStorage::new(
            client,
            &config.account_url,
            &config.sas_token,
        )),
    }
}

/// Random blob name that keeps the extension of the uploaded file.
#[must_use]
pub fn blob_name(original_filename: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some(ext) if !ext.is_empty() => format!("{id}.{ext}"),
        _ => id.to_string(),
    }
}

fn validate_container(container: &str) -> Result<(), StorageError> {
    let valid = !container.is_empty()
        && container.len() <= MAX_CONTAINER_NAME_LEN
        && container
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidContainer(container.to_string()))
    }
}

pub struct LocalImageStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ImageStorage for LocalImageStorage {
    async fn upload(
        &self,
        container: &str,
        original_filename: &str,
        _content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<String, StorageError> {
        validate_container(container)?;

        let dir = self.root.join(container);
        tokio::fs::create_dir_all(&dir).await?;

        let name = blob_name(original_filename);
        let path = dir.join(&name);
        tokio::fs::write(&path, &data).await?;

        info!(path = %path.display(), bytes = data.len(), "Stored image");
        Ok(format!("{}/{container}/{name}", self.public_base_url))
    }
}

pub struct AzureBlobStorage {
    client: Client,
    account_url: String,
    sas_token: String,
}

impl AzureBlobStorage {
    #[must_use]
    pub fn new(client: Client, account_url: &str, sas_token: &str) -> Self {
        Self {
            client,
            account_url: account_url.trim_end_matches('/').to_string(),
            sas_token: sas_token.trim_start_matches('?').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ImageStorage for AzureBlobStorage {
    async fn upload(
        &self,
        container: &str,
        original_filename: &str,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<String, StorageError> {
        validate_container(container)?;

        let name = blob_name(original_filename);
        let blob_url = format!("{}/{container}/{name}", self.account_url);
        let request_url = if self.sas_token.is_empty() {
            blob_url.clone()
        } else {
            format!("{blob_url}?{}", self.sas_token)
        };

        let content_type = content_type.map_or_else(
            || mime_guess::from_path(&name).first_or_octet_stream().to_string(),
            str::to_string,
        );

        debug!(url = %blob_url, bytes = data.len(), "Uploading blob");

        let response = self
            .client
            .put(request_url)
            .header("x-ms-blob-type", "BlockBlob")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Upstream {
                status: status.as_u16(),
                message: format!("{status}: {body}"),
            });
        }

        info!(url = %blob_url, "Uploaded blob");
        Ok(blob_url)
    }
}
