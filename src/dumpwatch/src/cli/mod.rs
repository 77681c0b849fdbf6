mod commands;
mod process_command;

pub use commands::{CaptureArgs, Cli, Command};
pub use process_command::{process_command, run_command};
