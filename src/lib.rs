//! Nimbus weather client core
//!
//! Ties the workspace crates together: configuration loading and the
//! [`AppContext`] that owns the weather, theme and localization stores,
//! navigation, and the animated background's scene guard.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;

pub use config::{AppConfig, ConfigError};
pub use context::{detect_os_locales, AppContext, ContextError};
