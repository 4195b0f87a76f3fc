//! Storage layer for Nimbus
//!
//! This crate provides the persisted key-value store and the user preference
//! schema kept in it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;
pub mod preferences;

pub use kv::{KvConfig, KvError, KvStore, Result};
pub use preferences::{
    NotificationKind, NotificationSettings, PreferenceStore, PreferencesSnapshot, SearchHistory,
    TemperatureUnit, ThemeMode, UnitPreferences, WindUnit, SEARCH_HISTORY_LIMIT,
};
