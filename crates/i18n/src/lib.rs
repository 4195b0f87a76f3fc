//! Internationalization for Nimbus
//!
//! This crate provides the supported language set, initial language
//! negotiation against persisted and OS preferences, Fluent string tables
//! with English fallback, and the language store views read from.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lang;
pub mod store;
pub mod translator;

pub use fluent::FluentArgs;
pub use lang::{match_os_locales, parse_os_locales, resolve_initial_language, Language};
pub use store::LocalizationStore;
pub use translator::{Catalog, I18nError, Result};
