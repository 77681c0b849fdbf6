use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::alerts::DirectInvocation;
use crate::types::DumpKind;

#[derive(Parser, Clone, Debug)]
#[clap(
    name = "dumpwatch",
    about = "Captures and analyzes JVM thread dumps when alerts fire",
    version
)]
pub struct Cli {
    /// TOML configuration file
    #[clap(long, global = true, env = "DUMPWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP trigger server
    Serve {
        /// Bind address, overrides the configured one
        #[clap(long)]
        server: Option<String>,
    },

    /// Handle one raw invocation event read from a JSON file
    Invoke {
        #[clap(long)]
        event: PathBuf,
    },

    /// Capture and store a dump from one workload
    Capture(CaptureArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// eks or ecs
    #[clap(long)]
    pub cluster_type: String,
    #[clap(long)]
    pub cluster: String,
    /// Pod name (may be a pattern) or ECS task id
    #[clap(long)]
    pub target: String,
    #[clap(long)]
    pub container: Option<String>,
    #[clap(long)]
    pub namespace: Option<String>,
    /// Task address for ecs, skips the task lookup
    #[clap(long)]
    pub address: Option<String>,
    /// thread or heap; heap dumps are eks only and skip analysis
    #[clap(long, default_value = "thread")]
    pub dump_kind: DumpKind,
}

impl From<CaptureArgs> for DirectInvocation {
    fn from(args: CaptureArgs) -> Self {
        DirectInvocation {
            cluster_type: Some(args.cluster_type),
            cluster: Some(args.cluster),
            task_pod_id: Some(args.target),
            container_name: args.container,
            namespace: args.namespace,
            container_ip: args.address,
            dump_kind: Some(args.dump_kind.to_string()),
            value_string: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_command_parses() {
        let cli = Cli::try_parse_from([
            "dumpwatch",
            "capture",
            "--cluster-type",
            "eks",
            "--cluster",
            "prod",
            "--target",
            "api-*",
            "--namespace",
            "shop",
        ])
        .unwrap();

        let Command::Capture(args) = cli.command else {
            panic!("expected capture command");
        };
        let invocation = DirectInvocation::from(args);
        assert_eq!(invocation.task_pod_id.as_deref(), Some("api-*"));
        assert_eq!(invocation.namespace.as_deref(), Some("shop"));
        assert_eq!(invocation.container_name, None);
        assert_eq!(invocation.dump_kind.as_deref(), Some("thread"));
    }

    #[test]
    fn test_heap_dump_kind_flag() {
        let cli = Cli::try_parse_from([
            "dumpwatch",
            "capture",
            "--cluster-type",
            "eks",
            "--cluster",
            "prod",
            "--target",
            "api-1",
            "--dump-kind",
            "heap",
        ])
        .unwrap();

        let Command::Capture(args) = cli.command else {
            panic!("expected capture command");
        };
        assert_eq!(args.dump_kind, DumpKind::Heap);
        assert!(Cli::try_parse_from([
            "dumpwatch", "capture", "--cluster-type", "eks", "--cluster", "prod",
            "--target", "api-1", "--dump-kind", "core",
        ])
        .is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["dumpwatch", "serve", "--config", "/etc/dumpwatch.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/dumpwatch.toml")));
    }
}
