use clap::Parser;
use dumpwatch::cli::{process_command, Cli};

pub fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install default crypto provider: {:?}", e))?;

    process_command(Cli::parse())
}
