//! Shared types for the quadshade workspace.
//!
//! # Layout
//! - [`Resolution`]: surface size in physical pixels.
//! - [`ShellConfig`]: everything the shell reads at startup, loadable from YAML.

mod config;
mod types;

pub use config::{CameraConfig, ConfigError, ShaderPaths, ShellConfig, WindowConfig};
pub use types::Resolution;
