mod artifact;
mod capture;
mod credential;

pub use artifact::{ArtifactKind, ArtifactLocator, DiagnosticArtifact};
pub use capture::{CaptureRequest, DumpKind, RuntimeKind, RuntimeTarget};
pub use credential::Credential;
