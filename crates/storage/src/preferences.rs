//! User preferences persisted in the key-value store
//!
//! This module defines the persisted preference schema (language, theme mode,
//! notification toggles, unit preferences, and city search history) and the
//! [`PreferenceStore`] that reads and writes it.
//!
//! Reads never fail: a missing key yields the default value, and a value that
//! cannot be decoded (for example corrupt JSON) is logged and replaced by the
//! default without surfacing an error to the user.

use crate::kv::{KvStore, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

/// Key scope shared by every preference entry
pub const PREFS_SCOPE: &str = "prefs";

/// Preference keys
pub mod keys {
    /// Selected interface language code
    pub const LANGUAGE: &str = "language";
    /// Theme mode (auto/light/dark)
    pub const THEME_MODE: &str = "theme_mode";
    /// Notification toggles
    pub const NOTIFICATIONS: &str = "notifications";
    /// Unit preferences
    pub const UNITS: &str = "units";
    /// City search history
    pub const SEARCH_HISTORY: &str = "search_history";
}

/// Maximum number of entries kept in the search history
pub const SEARCH_HISTORY_LIMIT: usize = 10;

/// Theme mode preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Follow the operating system color scheme
    #[default]
    Auto,
    /// Always use light mode
    Light,
    /// Always use dark mode
    Dark,
}

impl ThemeMode {
    /// Whether this mode is an explicit user choice
    pub fn is_explicit(&self) -> bool {
        !matches!(self, ThemeMode::Auto)
    }

    /// Resolve the effective dark flag given the OS preference
    pub fn resolve_dark(&self, os_prefers_dark: bool) -> bool {
        match self {
            ThemeMode::Auto => os_prefers_dark,
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeMode::Auto => write!(f, "auto"),
            ThemeMode::Light => write!(f, "light"),
            ThemeMode::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" | "system" => Ok(ThemeMode::Auto),
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            _ => Err(format!("Unknown theme mode: {}", s)),
        }
    }
}

/// Notification toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    /// Master switch
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Severe weather alerts
    #[serde(default = "default_true")]
    pub severe_weather: bool,

    /// Morning forecast summary
    #[serde(default)]
    pub daily_forecast: bool,

    /// Air quality warnings
    #[serde(default = "default_true")]
    pub air_quality: bool,

    /// Upcoming precipitation
    #[serde(default)]
    pub precipitation: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            severe_weather: true,
            daily_forecast: false,
            air_quality: true,
            precipitation: false,
        }
    }
}

/// A single notification toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Severe weather alerts
    SevereWeather,
    /// Morning forecast summary
    DailyForecast,
    /// Air quality warnings
    AirQuality,
    /// Upcoming precipitation
    Precipitation,
}

impl NotificationSettings {
    /// Check whether a notification kind would be delivered
    pub fn is_enabled(&self, kind: NotificationKind) -> bool {
        if !self.enabled {
            return false;
        }

        match kind {
            NotificationKind::SevereWeather => self.severe_weather,
            NotificationKind::DailyForecast => self.daily_forecast,
            NotificationKind::AirQuality => self.air_quality,
            NotificationKind::Precipitation => self.precipitation,
        }
    }

    /// Set a single toggle
    pub fn set(&mut self, kind: NotificationKind, enabled: bool) {
        match kind {
            NotificationKind::SevereWeather => self.severe_weather = enabled,
            NotificationKind::DailyForecast => self.daily_forecast = enabled,
            NotificationKind::AirQuality => self.air_quality = enabled,
            NotificationKind::Precipitation => self.precipitation = enabled,
        }
    }
}

/// Temperature display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// Degrees Celsius
    #[default]
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius value into this unit
    pub fn convert(&self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Unit symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

/// Wind speed display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindUnit {
    /// Beaufort scale level
    #[default]
    Beaufort,
    /// Kilometres per hour
    Kmh,
}

/// Unit preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPreferences {
    /// Temperature unit
    #[serde(default)]
    pub temperature: TemperatureUnit,
    /// Wind speed unit
    #[serde(default)]
    pub wind: WindUnit,
}

/// Most-recent-first list of searched city names
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a search
    ///
    /// The entry moves to the front, any earlier occurrence is removed, and the
    /// list is truncated to [`SEARCH_HISTORY_LIMIT`]. Blank entries are ignored.
    /// Returns whether the history changed.
    pub fn record(&mut self, city: &str) -> bool {
        let city = city.trim();
        if city.is_empty() {
            return false;
        }

        if self.entries.first().map(String::as_str) == Some(city) {
            return false;
        }

        self.entries.retain(|entry| entry != city);
        self.entries.insert(0, city.to_string());
        self.entries.truncate(SEARCH_HISTORY_LIMIT);
        true
    }

    /// Remove a single entry
    pub fn remove(&mut self, city: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != city);
        self.entries.len() != before
    }

    /// Entries, most recent first
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn normalize(mut self) -> Self {
        let mut normalized = SearchHistory::new();
        for entry in self.entries.drain(..).rev() {
            normalized.record(&entry);
        }
        normalized
    }
}

/// Snapshot of every persisted preference
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesSnapshot {
    /// Stored language code, if the user picked one
    pub language: Option<String>,
    /// Theme mode
    pub theme_mode: ThemeMode,
    /// Notification toggles
    pub notifications: NotificationSettings,
    /// Unit preferences
    pub units: UnitPreferences,
    /// Search history
    pub search_history: SearchHistory,
}

/// Reads and writes user preferences in a [`KvStore`]
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    kv: Arc<KvStore>,
}

impl PreferenceStore {
    /// Create a preference store backed by a key-value store
    pub fn new(kv: Arc<KvStore>) -> Self {
        Self { kv }
    }

    /// Create a preference store over a temporary in-memory database
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(KvStore::in_memory()?)))
    }

    /// Underlying key-value store
    pub fn kv(&self) -> &Arc<KvStore> {
        &self.kv
    }

    /// Stored language code, if any
    pub fn language(&self) -> Option<String> {
        self.load::<String>(keys::LANGUAGE)
            .filter(|code| !code.trim().is_empty())
    }

    /// Persist the language code
    pub fn set_language(&self, code: &str) -> Result<()> {
        self.save(keys::LANGUAGE, &code.to_string())
    }

    /// Stored theme mode (defaults to [`ThemeMode::Auto`])
    pub fn theme_mode(&self) -> ThemeMode {
        self.load_or_default(keys::THEME_MODE)
    }

    /// Persist the theme mode
    pub fn set_theme_mode(&self, mode: ThemeMode) -> Result<()> {
        self.save(keys::THEME_MODE, &mode)
    }

    /// Notification toggles
    pub fn notifications(&self) -> NotificationSettings {
        self.load_or_default(keys::NOTIFICATIONS)
    }

    /// Persist notification toggles
    pub fn set_notifications(&self, settings: &NotificationSettings) -> Result<()> {
        self.save(keys::NOTIFICATIONS, settings)
    }

    /// Update notification toggles in place
    pub fn update_notifications<F>(&self, f: F) -> Result<NotificationSettings>
    where
        F: FnOnce(&mut NotificationSettings),
    {
        let mut settings = self.notifications();
        f(&mut settings);
        self.set_notifications(&settings)?;
        Ok(settings)
    }

    /// Unit preferences
    pub fn units(&self) -> UnitPreferences {
        self.load_or_default(keys::UNITS)
    }

    /// Persist unit preferences
    pub fn set_units(&self, units: UnitPreferences) -> Result<()> {
        self.save(keys::UNITS, &units)
    }

    /// City search history, most recent first
    pub fn search_history(&self) -> SearchHistory {
        self.load_or_default::<SearchHistory>(keys::SEARCH_HISTORY)
            .normalize()
    }

    /// Record a city search and persist the updated history
    pub fn record_search(&self, city: &str) -> Result<SearchHistory> {
        let mut history = self.search_history();
        if history.record(city) {
            self.save(keys::SEARCH_HISTORY, &history)?;
        }
        Ok(history)
    }

    /// Remove one entry from the search history
    pub fn remove_search(&self, city: &str) -> Result<SearchHistory> {
        let mut history = self.search_history();
        if history.remove(city) {
            self.save(keys::SEARCH_HISTORY, &history)?;
        }
        Ok(history)
    }

    /// Clear the search history
    pub fn clear_search_history(&self) -> Result<()> {
        self.kv.remove_scoped(&[PREFS_SCOPE, keys::SEARCH_HISTORY])?;
        self.kv.flush()
    }

    /// Read every preference at once
    pub fn snapshot(&self) -> PreferencesSnapshot {
        PreferencesSnapshot {
            language: self.language(),
            theme_mode: self.theme_mode(),
            notifications: self.notifications(),
            units: self.units(),
            search_history: self.search_history(),
        }
    }

    fn load<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        match self.kv.get_scoped::<T>(&[PREFS_SCOPE, key]) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable preference");
                None
            }
        }
    }

    fn load_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        self.load(key).unwrap_or_default()
    }

    fn save<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.kv.set_scoped(&[PREFS_SCOPE, key], value)?;
        self.kv.flush()
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PreferenceStore {
        PreferenceStore::in_memory().unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let prefs = store();
        assert_eq!(prefs.language(), None);
        assert_eq!(prefs.theme_mode(), ThemeMode::Auto);
        assert_eq!(prefs.notifications(), NotificationSettings::default());
        assert_eq!(prefs.units(), UnitPreferences::default());
        assert!(prefs.search_history().is_empty());
    }

    #[test]
    fn test_language_roundtrip() {
        let prefs = store();
        prefs.set_language("fr").unwrap();
        assert_eq!(prefs.language(), Some("fr".to_string()));
    }

    #[test]
    fn test_blank_language_is_ignored() {
        let prefs = store();
        prefs.set_language("  ").unwrap();
        assert_eq!(prefs.language(), None);
    }

    #[test]
    fn test_theme_mode_roundtrip() {
        let prefs = store();
        prefs.set_theme_mode(ThemeMode::Dark).unwrap();
        assert_eq!(prefs.theme_mode(), ThemeMode::Dark);
    }

    #[test]
    fn test_corrupt_theme_mode_falls_back_to_default() {
        let prefs = store();
        prefs.kv().set_raw("prefs:theme_mode", b"{\"broken").unwrap();
        assert_eq!(prefs.theme_mode(), ThemeMode::Auto);
    }

    #[test]
    fn test_corrupt_units_fall_back_to_default() {
        let prefs = store();
        prefs.kv().set_raw("prefs:units", b"not json at all").unwrap();
        assert_eq!(prefs.units(), UnitPreferences::default());

        // Writing again repairs the entry
        let units = UnitPreferences {
            temperature: TemperatureUnit::Fahrenheit,
            wind: WindUnit::Kmh,
        };
        prefs.set_units(units).unwrap();
        assert_eq!(prefs.units(), units);
    }

    #[test]
    fn test_corrupt_language_is_none() {
        let prefs = store();
        prefs.kv().set_raw("prefs:language", b"[1,2").unwrap();
        assert_eq!(prefs.language(), None);
    }

    #[test]
    fn test_theme_mode_resolve_dark() {
        assert!(ThemeMode::Auto.resolve_dark(true));
        assert!(!ThemeMode::Auto.resolve_dark(false));
        assert!(!ThemeMode::Light.resolve_dark(true));
        assert!(ThemeMode::Dark.resolve_dark(false));
        assert!(!ThemeMode::Auto.is_explicit());
        assert!(ThemeMode::Dark.is_explicit());
    }

    #[test]
    fn test_theme_mode_from_str() {
        assert_eq!("dark".parse::<ThemeMode>().unwrap(), ThemeMode::Dark);
        assert_eq!("SYSTEM".parse::<ThemeMode>().unwrap(), ThemeMode::Auto);
        assert!("sepia".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn test_notification_toggles() {
        let prefs = store();
        let updated = prefs
            .update_notifications(|n| n.set(NotificationKind::Precipitation, true))
            .unwrap();
        assert!(updated.is_enabled(NotificationKind::Precipitation));
        assert!(prefs.notifications().precipitation);

        let updated = prefs.update_notifications(|n| n.enabled = false).unwrap();
        assert!(!updated.is_enabled(NotificationKind::SevereWeather));
    }

    #[test]
    fn test_notification_settings_missing_fields_use_defaults() {
        let parsed: NotificationSettings = serde_json::from_str(r#"{"enabled":false}"#).unwrap();
        assert!(!parsed.enabled);
        assert!(parsed.severe_weather);
        assert!(!parsed.daily_forecast);
    }

    #[test]
    fn test_temperature_unit_convert() {
        assert_eq!(TemperatureUnit::Celsius.convert(20.0), 20.0);
        assert_eq!(TemperatureUnit::Fahrenheit.convert(100.0), 212.0);
        assert_eq!(TemperatureUnit::Fahrenheit.symbol(), "°F");
    }

    #[test]
    fn test_search_history_dedup_most_recent_first() {
        let prefs = store();
        prefs.record_search("北京市").unwrap();
        prefs.record_search("上海市").unwrap();
        let history = prefs.record_search("北京市").unwrap();

        assert_eq!(history.entries(), &["北京市".to_string(), "上海市".to_string()]);
        assert_eq!(prefs.search_history(), history);
    }

    #[test]
    fn test_search_history_is_capped() {
        let mut history = SearchHistory::new();
        for i in 0..15 {
            history.record(&format!("city-{}", i));
        }
        assert_eq!(history.len(), SEARCH_HISTORY_LIMIT);
        assert_eq!(history.entries()[0], "city-14");
        assert_eq!(history.entries()[9], "city-5");
    }

    #[test]
    fn test_search_history_ignores_blank() {
        let mut history = SearchHistory::new();
        assert!(!history.record("   "));
        assert!(history.is_empty());
    }

    #[test]
    fn test_search_history_remove_and_clear() {
        let prefs = store();
        prefs.record_search("广州市").unwrap();
        prefs.record_search("深圳市").unwrap();

        let history = prefs.remove_search("广州市").unwrap();
        assert_eq!(history.entries(), &["深圳市".to_string()]);

        prefs.clear_search_history().unwrap();
        assert!(prefs.search_history().is_empty());
    }

    #[test]
    fn test_stored_history_with_duplicates_is_normalized() {
        let prefs = store();
        prefs
            .kv()
            .set("prefs:search_history", &vec!["A", "B", "A", "", "C"])
            .unwrap();

        let history = prefs.search_history();
        assert_eq!(history.entries(), &["A".to_string(), "B".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_snapshot() {
        let prefs = store();
        prefs.set_language("de").unwrap();
        prefs.set_theme_mode(ThemeMode::Light).unwrap();

        let snapshot = prefs.snapshot();
        assert_eq!(snapshot.language.as_deref(), Some("de"));
        assert_eq!(snapshot.theme_mode, ThemeMode::Light);
    }

    #[test]
    fn test_search_history_serializes_as_list() {
        let mut history = SearchHistory::new();
        history.record("杭州市");
        assert_eq!(serde_json::to_string(&history).unwrap(), r#"["杭州市"]"#);
    }
}
