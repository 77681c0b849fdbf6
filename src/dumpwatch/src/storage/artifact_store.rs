use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::constants::DEFAULT_S3_PREFIX;
use crate::error::Result;
use crate::types::{ArtifactLocator, DiagnosticArtifact};

/// Write-only blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;
}

pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim();
    if trimmed.is_empty() {
        return DEFAULT_S3_PREFIX.to_string();
    }
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKeys {
    pub dump: String,
    pub analysis: String,
    pub heap: String,
}

#[derive(Debug, Clone)]
pub struct StoredArtifacts {
    pub dump: ArtifactLocator,
    pub analysis: ArtifactLocator,
}

pub struct ArtifactStore {
    objects: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
}

impl ArtifactStore {
    pub fn new(objects: Arc<dyn ObjectStore>, bucket: impl Into<String>, prefix: &str) -> Self {
        Self {
            objects,
            bucket: bucket.into(),
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Keys have one-second resolution; two writes for the same target in
    /// the same second overwrite each other.
    pub fn keys_for(&self, target_id: &str, at: DateTime<Utc>) -> ArtifactKeys {
        let stem = format!(
            "{}{}/{}",
            self.prefix,
            target_id,
            at.format("%Y-%m-%d-%H-%M-%S")
        );
        ArtifactKeys {
            dump: format!("{stem}.txt"),
            analysis: format!("{stem}_analysis.md"),
            heap: format!("{stem}.hprof"),
        }
    }

    /// Stores the dump then its analysis, both keyed on the dump's capture time.
    pub async fn store(
        &self,
        target_id: &str,
        dump: &DiagnosticArtifact,
        analysis: &DiagnosticArtifact,
    ) -> Result<StoredArtifacts> {
        let keys = self.keys_for(target_id, dump.produced_at());

        self.objects
            .put(&self.bucket, &keys.dump, dump.bytes().to_vec(), "text/plain")
            .await?;
        info!(bucket = %self.bucket, key = %keys.dump, "Stored thread dump");

        self.objects
            .put(
                &self.bucket,
                &keys.analysis,
                analysis.bytes().to_vec(),
                "text/markdown",
            )
            .await?;
        info!(bucket = %self.bucket, key = %keys.analysis, "Stored analysis");

        Ok(StoredArtifacts {
            dump: ArtifactLocator::s3(&self.bucket, &keys.dump),
            analysis: ArtifactLocator::s3(&self.bucket, &keys.analysis),
        })
    }

    /// Heap dumps are binary and never analyzed, so only the `.hprof` is written.
    pub async fn store_heap_dump(
        &self,
        target_id: &str,
        dump: &DiagnosticArtifact,
    ) -> Result<ArtifactLocator> {
        let key = self.keys_for(target_id, dump.produced_at()).heap;

        self.objects
            .put(&self.bucket, &key, dump.bytes().to_vec(), "application/octet-stream")
            .await?;
        info!(bucket = %self.bucket, key = %key, bytes = dump.bytes().len(), "Stored heap dump");

        Ok(ArtifactLocator::s3(&self.bucket, &key))
    }
}
