//! S3 upload client.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::uri::S3Uri;

/// Blob storage collaborator seam.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a local file to the given location.
    async fn put(&self, path: &Path, uri: &S3Uri) -> StorageResult<()>;
}

/// S3-backed artifact store.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
}

impl S3BlobStore {
    /// Create a new store around an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create from environment variables using the shared AWS config loader.
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_from_env().await;
        Self::new(Client::new(&sdk_config))
    }
}

/// Infer a content type from the file extension.
fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("srt") => "application/x-subrip",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, path: &Path, uri: &S3Uri) -> StorageResult<()> {
        debug!("Uploading {} to {}", path.display(), uri);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .body(body)
            .content_type(content_type_for(path))
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), uri);
        Ok(())
    }
}
