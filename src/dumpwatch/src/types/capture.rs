use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DumpwatchError;

/// Which of the two runtimes a capture is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeKind {
    /// In-container command execution (EKS pods)
    Exec,
    /// HTTP diagnostics over the task network address (ECS tasks)
    HttpIntrospection,
}

impl FromStr for RuntimeKind {
    type Err = DumpwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eks" | "exec" => Ok(RuntimeKind::Exec),
            "ecs" | "http" | "http_introspection" => Ok(RuntimeKind::HttpIntrospection),
            other => Err(DumpwatchError::Validation(format!(
                "Unsupported cluster type: {other}"
            ))),
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeKind::Exec => write!(f, "eks"),
            RuntimeKind::HttpIntrospection => write!(f, "ecs"),
        }
    }
}

/// What to collect from the JVM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpKind {
    #[default]
    Thread,
    /// `.hprof` heap dump, exec runtime only
    Heap,
}

impl FromStr for DumpKind {
    type Err = DumpwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thread" | "threads" => Ok(DumpKind::Thread),
            "heap" => Ok(DumpKind::Heap),
            other => Err(DumpwatchError::Validation(format!(
                "Unsupported dump kind: {other}"
            ))),
        }
    }
}

impl fmt::Display for DumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpKind::Thread => write!(f, "thread"),
            DumpKind::Heap => write!(f, "heap"),
        }
    }
}

/// Fields that only make sense for one runtime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "runtime", rename_all = "snake_case")]
pub enum RuntimeTarget {
    Exec { namespace: String },
    HttpIntrospection { network_address: Option<String> },
}

/// A normalized description of one workload to collect a dump from.
///
/// Construction goes through the normalizer, which guarantees the
/// runtime-specific fields are present before a request exists.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub cluster_id: String,
    /// Pod name (possibly a pattern) or ECS task identifier
    pub target_id: String,
    pub container_name: Option<String>,
    pub runtime: RuntimeTarget,
    #[serde(default)]
    pub dump_kind: DumpKind,
}

impl CaptureRequest {
    pub fn exec(
        cluster_id: impl Into<String>,
        target_id: impl Into<String>,
        container_name: Option<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            target_id: target_id.into(),
            container_name,
            runtime: RuntimeTarget::Exec {
                namespace: namespace.into(),
            },
            dump_kind: DumpKind::Thread,
        }
    }

    pub fn http_introspection(
        cluster_id: impl Into<String>,
        target_id: impl Into<String>,
        container_name: Option<String>,
        network_address: Option<String>,
    ) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            target_id: target_id.into(),
            container_name,
            runtime: RuntimeTarget::HttpIntrospection { network_address },
            dump_kind: DumpKind::Thread,
        }
    }

    pub fn with_dump_kind(mut self, dump_kind: DumpKind) -> Self {
        self.dump_kind = dump_kind;
        self
    }

    pub fn runtime_kind(&self) -> RuntimeKind {
        match self.runtime {
            RuntimeTarget::Exec { .. } => RuntimeKind::Exec,
            RuntimeTarget::HttpIntrospection { .. } => RuntimeKind::HttpIntrospection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("eks", RuntimeKind::Exec)]
    #[case("EKS", RuntimeKind::Exec)]
    #[case(" ecs ", RuntimeKind::HttpIntrospection)]
    fn test_runtime_kind_from_cluster_type(#[case] raw: &str, #[case] expected: RuntimeKind) {
        assert_eq!(raw.parse::<RuntimeKind>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_cluster_type_is_validation_error() {
        let err = "gke".parse::<RuntimeKind>().unwrap_err();
        assert!(matches!(err, DumpwatchError::Validation(_)));
    }

    #[rstest]
    #[case("heap", DumpKind::Heap)]
    #[case("Thread", DumpKind::Thread)]
    fn test_dump_kind_parses(#[case] raw: &str, #[case] expected: DumpKind) {
        assert_eq!(raw.parse::<DumpKind>().unwrap(), expected);
    }

    #[test]
    fn test_requests_default_to_thread_dumps() {
        let request = CaptureRequest::exec("c", "pod-1", None, "default");
        assert_eq!(request.dump_kind, DumpKind::Thread);
        assert_eq!(request.with_dump_kind(DumpKind::Heap).dump_kind, DumpKind::Heap);
    }

    #[test]
    fn test_runtime_kind_follows_target() {
        let exec = CaptureRequest::exec("c", "pod-1", None, "default");
        let http = CaptureRequest::http_introspection("c", "task", None, None);
        assert_eq!(exec.runtime_kind(), RuntimeKind::Exec);
        assert_eq!(http.runtime_kind(), RuntimeKind::HttpIntrospection);
    }
}
