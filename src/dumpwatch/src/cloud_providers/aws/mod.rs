pub mod bedrock;
pub mod config;
pub mod ecs;
pub mod eks;
pub mod s3;
pub mod secrets;
pub mod sns;
