use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    RawDump,
    HeapDump,
    Analysis,
}

/// Output of a capture or an analysis. Immutable once built.
///
/// Thread dumps and analyses are text; heap dumps are raw `.hprof` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticArtifact {
    kind: ArtifactKind,
    body: Vec<u8>,
    produced_at: DateTime<Utc>,
}

impl DiagnosticArtifact {
    pub fn new(kind: ArtifactKind, body: impl Into<Vec<u8>>, produced_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            body: body.into(),
            produced_at,
        }
    }

    pub fn raw_dump(content: impl Into<String>) -> Self {
        let content: String = content.into();
        Self::new(ArtifactKind::RawDump, content, Utc::now())
    }

    pub fn heap_dump(body: Vec<u8>) -> Self {
        Self::new(ArtifactKind::HeapDump, body, Utc::now())
    }

    pub fn analysis(content: impl Into<String>) -> Self {
        let content: String = content.into();
        Self::new(ArtifactKind::Analysis, content, Utc::now())
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// The body as text; binary artifacts come back lossily decoded.
    pub fn content(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn produced_at(&self) -> DateTime<Utc> {
        self.produced_at
    }
}

/// Where a stored artifact lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLocator {
    pub bucket: String,
    pub key: String,
    pub uri: String,
}

impl ArtifactLocator {
    pub fn s3(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let key = key.into();
        let uri = format!("s3://{}/{}", bucket, key);
        Self { bucket, key, uri }
    }
}
