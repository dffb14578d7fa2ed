//! Shared configuration and logging setup for hookgen.
//!
//! This crate holds the pieces used both by the generator core and by the
//! host tool that embeds it:
//!
//! - [`config`]: generator options, loadable from TOML
//! - [`logging`]: `tracing` subscriber setup for the host process

pub mod config;
pub mod logging;

// Re-export commonly used types
pub use config::{ConfigError, EnumStyle, GeneratorConfig, NoContentPolicy};
