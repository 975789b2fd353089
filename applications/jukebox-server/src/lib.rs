//! Jukebox Server Library
//!
//! Daemon plumbing around the jukebox engine: configuration loading and the
//! `yt-dlp` backed media resolver.
//!
//! This library exposes the core components for testing purposes.

pub mod config;
pub mod error;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::YtDlpResolver;
