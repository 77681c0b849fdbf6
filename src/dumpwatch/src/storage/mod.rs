mod artifact_store;

pub use artifact_store::{normalize_prefix, ArtifactKeys, ArtifactStore, ObjectStore, StoredArtifacts};
