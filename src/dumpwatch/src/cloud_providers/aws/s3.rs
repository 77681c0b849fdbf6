use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{DumpwatchError, Result};
use crate::storage::ObjectStore;

pub struct S3Client {
    client: aws_sdk_s3::Client,
}

impl S3Client {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| DumpwatchError::Storage(format!("put s3://{bucket}/{key}: {err:?}")))?;
        Ok(())
    }
}
