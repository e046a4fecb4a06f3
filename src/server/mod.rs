//! RTP ingest server
//!
//! A thin UDP front-end feeding the stream registry.

pub mod config;
pub mod listener;

pub use config::ServerConfig;
pub use listener::RtpServer;
