use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use super::model::UploadFile;
use crate::error::{AtomError, AtomResult};

/// Accepts binary content and hands back a durable public URL.
/// Validation happens in the caller; the store only stores.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn store(&self, file: &UploadFile) -> AtomResult<String>;

    /// Remove an object previously returned by `store`
    async fn delete(&self, url: &str) -> AtomResult<()>;
}

/// Catalog images in S3 under {prefix}/{millis}-{uuid}.{ext}
#[derive(Clone, Debug)]
pub struct S3ImageStore {
    client: S3Client,
    bucket: String,
    prefix: String,
    public_base_url: String,
}

impl S3ImageStore {
    pub fn new(
        client: S3Client,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn object_key(&self, file: &UploadFile) -> String {
        format!(
            "{}/{}-{}.{}",
            self.prefix,
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4(),
            file.extension()
        )
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn store(&self, file: &UploadFile) -> AtomResult<String> {
        let key = self.object_key(file);

        tracing::info!(
            "📤 Uploading {} ({} bytes) to s3://{}/{}",
            file.file_name,
            file.bytes.len(),
            self.bucket,
            key
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&file.content_type)
            .body(ByteStream::from(file.bytes.clone()))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 put_object failed for {}: {}", file.file_name, e);
                AtomError::Storage(format!("Upload error for {}: {}", file.file_name, e))
            })?;

        Ok(self.public_url(&key))
    }

    async fn delete(&self, url: &str) -> AtomResult<()> {
        let key = self
            .key_for_url(url)
            .ok_or_else(|| AtomError::Storage(format!("{} is not an object of this store", url)))?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AtomError::Storage(format!("S3 delete_object error: {}", e)))?;

        Ok(())
    }
}
