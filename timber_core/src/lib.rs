#![forbid(unsafe_code)]

//! Hierarchical structured logging with console and file sinks.
//!
//! This crate provides:
//! - Log levels, thresholds and message values
//! - Pretty (console) and simple (file) formatting
//! - Parent/child loggers with upward event publication
//! - File streams that rotate and compress the previous log on open
//! - TOML configuration

pub mod types;
pub mod error;
pub mod inspect;
pub mod console;
pub mod formatter;
pub mod rotation;
pub mod stream;
pub mod logger;
pub mod config;
pub mod diagnostics;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use inspect::InspectOptions;
pub use console::{ConsoleSink, StdConsole};
pub use formatter::{ColorMode, DefaultFormatter, FormatOptions, Formatter};
pub use rotation::Compression;
pub use stream::{FileStreamOptions, FileWriteStream, FileWriteStreamMode, InitialContent};
pub use logger::{LogEvent, Logger, LoggerOptions, SubscriptionId, WeakLogger};
pub use config::LogConfig;
