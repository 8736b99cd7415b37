use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;

/// Long-term storage for the original uploaded CV files.
#[async_trait]
pub trait CvArchive: Send + Sync {
    async fn store(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), AppError>;
    /// Deleting a key that does not exist succeeds.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Object key for an uploaded CV: `cvs/{user_id}/{upload_id}.{ext}`.
pub fn cv_object_key(user_id: uuid::Uuid, upload_id: uuid::Uuid, extension: &str) -> String {
    format!("cvs/{user_id}/{upload_id}.{extension}")
}

/// S3 / MinIO-backed archive.
pub struct S3Archive {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Archive {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl CvArchive for S3Archive {
    async fn store(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Archived CV to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;

        info!("Removed s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
