pub mod alerts;
pub mod analysis;
pub mod capture;
pub mod cli;
pub mod cloud_providers;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod initialization;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod types;

pub use error::{DumpwatchError, Result};
