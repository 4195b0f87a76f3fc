//! View models for the Nimbus screens
//!
//! Components are plain serializable structs produced from store snapshots.
//! They carry already-localized, already-formatted text so the renderer only
//! lays them out. User interaction is expressed as [`Action`] values attached
//! to buttons and rows, which the application dispatches back to the stores.
//!
//! Rendering a route returns `Result<View, RenderError>`; an
//! [`ErrorBoundary`] turns failures into a static fallback panel.

use crate::navigation::Route;
use crate::theme::{tokens_for, Color, StyleTokens};
use crate::tokens::{breakpoints, radius, spacing, Breakpoint, Shadow, Transition};
use app_platform::{DisplayCapabilities, SceneView};
use app_state::theme::ThemeSnapshot;
use app_state::weather::{FetchStatus, WeatherSnapshot};
use chrono::{Local, NaiveTime};
use i18n::{FluentArgs, Language, LocalizationStore};
use serde::Serialize;
use storage::{
    NotificationKind, PreferencesSnapshot, TemperatureUnit, ThemeMode, UnitPreferences, WindUnit,
};
use thiserror::Error;
use weather::{
    beaufort_to_kmh, search_cities, CompassPoint, DailySlot, HourlySlot, WeatherBundle,
    WeatherKind, WeatherReading,
};

/// Maximum number of city search results shown
pub const SEARCH_RESULT_LIMIT: usize = 8;

// =============================================================================
// Actions
// =============================================================================

/// Something the user asked for
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum Action {
    /// Refresh the selected city again
    Retry,
    /// Clear an error boundary and render again
    ResetBoundary,
    /// Ask the scene guard to create a new context
    RetryScene,
    /// Select a city
    SelectCity(String),
    /// Add or remove a favorite
    ToggleFavorite(String),
    /// Remove a city from the search history
    ForgetSearch(String),
    /// Clear the search history
    ClearSearchHistory,
    /// Switch the interface language
    SetLanguage(String),
    /// Store a theme mode
    SetThemeMode(ThemeMode),
    /// Flip between light and dark
    ToggleDarkMode,
    /// Change the temperature unit
    SetTemperatureUnit(TemperatureUnit),
    /// Change the wind unit
    SetWindUnit(WindUnit),
    /// Flip a notification toggle
    SetNotification(NotificationKind, bool),
    /// Flip the notification master switch
    SetNotificationsEnabled(bool),
    /// Navigate to a route
    Navigate(Route),
}

// =============================================================================
// Errors
// =============================================================================

/// Rendering failures caught by [`ErrorBoundary`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// The store reports data that is not there
    #[error("{view} has no data to show")]
    MissingData {
        /// View being rendered
        view: &'static str,
    },

    /// Data is present but cannot be displayed
    #[error("Invalid data for display: {0}")]
    InvalidData(String),
}

/// Result type for rendering
pub type Result<T> = std::result::Result<T, RenderError>;

// =============================================================================
// Primitive Components
// =============================================================================

/// Interactive button
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    /// Visible (and accessible) label
    pub label: String,
    /// Icon name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Dispatched when pressed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_press: Option<Action>,
    /// Whether the button is disabled
    pub disabled: bool,
}

impl Button {
    /// Create a new button with the given label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            icon: None,
            on_press: None,
            disabled: false,
        }
    }

    /// Set the icon
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the action dispatched on press
    pub fn on_press(mut self, action: Action) -> Self {
        self.on_press = Some(action);
        self
    }

    /// Disable the button
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Glass card options
///
/// Every recognized option is a field; unset options keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardStyle {
    /// Blur the background behind the card
    pub blur: bool,
    /// Lift the card on hover (fine pointers only)
    pub hoverable: bool,
    /// Draw a drop shadow
    pub elevated: bool,
    /// Inner padding in pixels
    pub padding: f32,
    /// Corner radius in pixels
    pub radius: f32,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            blur: true,
            hoverable: false,
            elevated: true,
            padding: spacing::LG,
            radius: radius::LG,
        }
    }
}

impl CardStyle {
    /// Create card options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set backdrop blur
    pub fn with_blur(mut self, blur: bool) -> Self {
        self.blur = blur;
        self
    }

    /// Set hover lift
    pub fn hoverable(mut self, hoverable: bool) -> Self {
        self.hoverable = hoverable;
        self
    }

    /// Set drop shadow
    pub fn elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    /// Set padding
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    /// Set corner radius
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Resolve the options against the current style tokens
    pub fn computed_styles(&self, tokens: &StyleTokens) -> CardStyles {
        CardStyles {
            background: tokens.card_background.clone(),
            border: tokens.card_border.clone(),
            text: tokens.text.clone(),
            backdrop_blur: if self.blur { tokens.blur } else { 0.0 },
            shadow: if self.elevated {
                tokens.shadow.clone()
            } else {
                crate::tokens::shadows::none()
            },
            padding: self.padding,
            radius: self.radius,
            hover_lift: if self.hoverable { 4.0 } else { 0.0 },
            transition: if self.hoverable { Transition::hover() } else { Transition::none() },
        }
    }
}

/// Computed card styles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardStyles {
    /// Fill color
    pub background: Color,
    /// Border color
    pub border: Color,
    /// Text color
    pub text: Color,
    /// Backdrop blur radius
    pub backdrop_blur: f32,
    /// Drop shadow
    pub shadow: Shadow,
    /// Inner padding
    pub padding: f32,
    /// Corner radius
    pub radius: f32,
    /// Hover translation in pixels
    pub hover_lift: f32,
    /// Hover animation
    pub transition: Transition,
}

/// A labelled value in the details grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailItem {
    /// Icon name
    pub icon: &'static str,
    /// Localized label
    pub label: String,
    /// Formatted value
    pub value: String,
}

/// Air quality indicator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityBadge {
    /// Numeric AQI
    pub aqi: u32,
    /// Localized level name
    pub label: String,
    /// Indicator color
    pub color: &'static str,
}

// =============================================================================
// Formatting
// =============================================================================

/// Localized value formatting honoring the unit preferences
#[derive(Debug, Clone, Copy)]
pub struct Formatter<'a> {
    i18n: &'a LocalizationStore,
    units: UnitPreferences,
}

impl<'a> Formatter<'a> {
    /// Create a formatter
    pub fn new(i18n: &'a LocalizationStore, units: UnitPreferences) -> Self {
        Self { i18n, units }
    }

    /// Translate a key
    pub fn t(&self, key: &str) -> String {
        self.i18n.translate(key)
    }

    /// A Celsius temperature in the preferred unit, e.g. `26°C` or `79°F`
    pub fn temperature(&self, celsius: i32) -> String {
        let value = self.units.temperature.convert(celsius as f64).round() as i64;
        format!("{}{}", value, self.units.temperature.symbol())
    }

    /// Wind strength in the preferred unit
    pub fn wind_speed(&self, level: u8) -> String {
        match self.units.wind {
            WindUnit::Beaufort => {
                let mut args = FluentArgs::new();
                args.set("level", level);
                self.i18n.translate_with("wind.level", &args)
            }
            WindUnit::Kmh => format!(
                "{:.0} {}",
                beaufort_to_kmh(level),
                self.t("unit.kmh")
            ),
        }
    }

    /// Wind direction and strength, e.g. `Northeast · Level 3`
    pub fn wind(&self, level: u8, direction: CompassPoint) -> String {
        format!("{} · {}", self.t(direction.translation_key()), self.wind_speed(level))
    }

    /// A percentage
    pub fn percent(&self, value: u8) -> String {
        format!("{}%", value)
    }

    /// Precipitation chance, e.g. `Precipitation 40%`
    pub fn precipitation(&self, chance: u8) -> String {
        let mut args = FluentArgs::new();
        args.set("chance", chance);
        self.i18n.translate_with("forecast.precipitation", &args)
    }

    /// Clock time, e.g. `05:42`
    pub fn time(&self, time: NaiveTime) -> String {
        time.format("%H:%M").to_string()
    }

    /// Hour of day, e.g. `14:00`
    pub fn hour(&self, hour: u32) -> String {
        format!("{:02}:00", hour % 24)
    }

    /// Condition name
    pub fn condition(&self, kind: WeatherKind) -> String {
        self.t(kind.translation_key())
    }
}

// =============================================================================
// Screens
// =============================================================================

/// Current conditions card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeatherView {
    /// City name
    pub city: String,
    /// Formatted temperature
    pub temperature: String,
    /// Localized condition
    pub condition: String,
    /// Condition icon
    pub icon: &'static str,
    /// "Feels like" line
    pub feels_like: String,
    /// High/low line
    pub high_low: String,
    /// Details grid
    pub details: Vec<DetailItem>,
    /// Air quality indicator
    pub air_quality: AirQualityBadge,
    /// "Updated at" line
    pub updated_at: String,
    /// Whether a newer refresh is in flight
    pub refreshing: bool,
    /// Favorite toggle
    pub favorite: Button,
    /// Card styles
    pub card: CardStyles,
}

impl CurrentWeatherView {
    /// Build the card from a reading
    pub fn build(
        reading: &WeatherReading,
        fmt: &Formatter<'_>,
        is_favorite: bool,
        card: CardStyles,
    ) -> Self {
        let mut feels = FluentArgs::new();
        feels.set("temperature", fmt.temperature(reading.feels_like));

        let mut high_low = FluentArgs::new();
        high_low.set("high", fmt.temperature(reading.max_temp));
        high_low.set("low", fmt.temperature(reading.min_temp));

        let mut updated = FluentArgs::new();
        updated.set(
            "time",
            reading.update_time.with_timezone(&Local).format("%H:%M").to_string(),
        );

        let details = vec![
            DetailItem {
                icon: "droplet",
                label: fmt.t("current.humidity"),
                value: fmt.percent(reading.humidity),
            },
            DetailItem {
                icon: "wind",
                label: fmt.t("current.wind"),
                value: fmt.wind(reading.wind_speed, reading.wind_compass()),
            },
            DetailItem {
                icon: "gauge",
                label: fmt.t("current.pressure"),
                value: format!("{} {}", reading.pressure, fmt.t("unit.hpa")),
            },
            DetailItem {
                icon: "eye",
                label: fmt.t("current.visibility"),
                value: format!("{} {}", reading.visibility, fmt.t("unit.km")),
            },
            DetailItem {
                icon: "sun",
                label: fmt.t("current.uv-index"),
                value: reading.uv_index.to_string(),
            },
            DetailItem {
                icon: "sunrise",
                label: fmt.t("current.sunrise"),
                value: fmt.time(reading.sunrise),
            },
            DetailItem {
                icon: "sunset",
                label: fmt.t("current.sunset"),
                value: fmt.time(reading.sunset),
            },
        ];

        let favorite_key = if is_favorite {
            "cities.remove-favorite"
        } else {
            "cities.add-favorite"
        };

        Self {
            city: reading.location.clone(),
            temperature: fmt.temperature(reading.temperature),
            condition: fmt.condition(reading.condition),
            icon: reading.condition.icon_name(),
            feels_like: fmt.i18n.translate_with("current.feels-like", &feels),
            high_low: fmt.i18n.translate_with("current.high-low", &high_low),
            details,
            air_quality: AirQualityBadge {
                aqi: reading.air_quality.aqi,
                label: fmt.t(reading.air_quality.level.translation_key()),
                color: reading.air_quality.level.color(),
            },
            updated_at: fmt.i18n.translate_with("status.updated-at", &updated),
            refreshing: false,
            favorite: Button::new(fmt.t(favorite_key))
                .with_icon(if is_favorite { "star-filled" } else { "star" })
                .on_press(Action::ToggleFavorite(reading.location.clone())),
            card,
        }
    }
}

/// One column of the hourly strip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyItem {
    /// `HH:00`
    pub time: String,
    /// Formatted temperature
    pub temperature: String,
    /// Condition icon
    pub icon: &'static str,
    /// Localized condition
    pub condition: String,
    /// Precipitation line
    pub precipitation: String,
}

impl HourlyItem {
    fn build(slot: &HourlySlot, fmt: &Formatter<'_>) -> Self {
        Self {
            time: fmt.hour(slot.hour),
            temperature: fmt.temperature(slot.temperature),
            icon: slot.weather_kind.icon_name(),
            condition: fmt.condition(slot.weather_kind),
            precipitation: fmt.precipitation(slot.precipitation_chance),
        }
    }
}

/// One row of the daily list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyItem {
    /// Today / Tomorrow / weekday name
    pub label: String,
    /// `MM-DD`
    pub date: String,
    /// Daytime icon
    pub day_icon: &'static str,
    /// Night icon
    pub night_icon: &'static str,
    /// Localized daytime condition
    pub day_condition: String,
    /// Localized night condition
    pub night_condition: String,
    /// Formatted high
    pub high: String,
    /// Formatted low
    pub low: String,
    /// Precipitation line
    pub precipitation: String,
    /// Localized air quality level
    pub air_quality: String,
    /// Air quality indicator color
    pub air_quality_color: &'static str,
}

impl DailyItem {
    fn build(slot: &DailySlot, fmt: &Formatter<'_>) -> Self {
        Self {
            label: fmt.t(slot.weekday_label.translation_key()),
            date: slot.date.format("%m-%d").to_string(),
            day_icon: slot.day_weather_kind.icon_name(),
            night_icon: slot.night_weather_kind.icon_name(),
            day_condition: fmt.condition(slot.day_weather_kind),
            night_condition: fmt.condition(slot.night_weather_kind),
            high: fmt.temperature(slot.max_temp),
            low: fmt.temperature(slot.min_temp),
            precipitation: fmt.precipitation(slot.precipitation_chance),
            air_quality: fmt.t(slot.air_quality_level.translation_key()),
            air_quality_color: slot.air_quality_level.color(),
        }
    }
}

/// Hourly and daily forecast screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    /// City name
    pub city: String,
    /// Hourly heading
    pub hourly_title: String,
    /// Next 24 hours
    pub hourly: Vec<HourlyItem>,
    /// Daily heading
    pub daily_title: String,
    /// Next 14 days
    pub daily: Vec<DailyItem>,
    /// Daily grid columns for the current breakpoint
    pub columns: usize,
    /// Card styles
    pub card: CardStyles,
}

impl ForecastView {
    /// Build the forecast screen
    pub fn build(
        bundle: &WeatherBundle,
        fmt: &Formatter<'_>,
        breakpoint: Breakpoint,
        card: CardStyles,
    ) -> Result<Self> {
        if bundle.hourly.is_empty() || bundle.daily.is_empty() {
            return Err(RenderError::InvalidData("empty forecast".to_string()));
        }
        if let Some(slot) = bundle.hourly.iter().find(|s| s.hour > 23) {
            return Err(RenderError::InvalidData(format!("hour out of range: {}", slot.hour)));
        }

        Ok(Self {
            city: bundle.current.location.clone(),
            hourly_title: fmt.t("forecast.hourly"),
            hourly: bundle.hourly.iter().map(|s| HourlyItem::build(s, fmt)).collect(),
            daily_title: fmt.t("forecast.daily"),
            daily: bundle.daily.iter().map(|s| DailyItem::build(s, fmt)).collect(),
            columns: breakpoint.forecast_columns(),
            card,
        })
    }
}

/// A city in a list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityRow {
    /// City name
    pub name: String,
    /// Province, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    /// Whether the city is a favorite
    pub is_favorite: bool,
    /// Whether the city is selected
    pub is_selected: bool,
    /// Dispatched when the row is tapped
    pub on_press: Action,
}

/// City search and favorites screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitiesView {
    /// Search box placeholder
    pub placeholder: String,
    /// Current query
    pub query: String,
    /// Search results
    pub results: Vec<CityRow>,
    /// Shown when a non-blank query has no results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_results: Option<String>,
    /// Favorites heading
    pub favorites_title: String,
    /// Favorite cities
    pub favorites: Vec<CityRow>,
    /// Recent searches heading
    pub recent_title: String,
    /// Recent searches, most recent first
    pub recent: Vec<CityRow>,
    /// Clear-history button (absent when the history is empty)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_history: Option<Button>,
}

impl CitiesView {
    /// Build the cities screen
    pub fn build(
        query: &str,
        weather: &WeatherSnapshot,
        prefs: &PreferencesSnapshot,
        fmt: &Formatter<'_>,
    ) -> Self {
        let row = |name: &str, province: Option<&str>| CityRow {
            name: name.to_string(),
            province: province.map(str::to_string),
            is_favorite: weather.is_favorite(name),
            is_selected: weather.city == name,
            on_press: Action::SelectCity(name.to_string()),
        };

        let results: Vec<CityRow> = search_cities(query, SEARCH_RESULT_LIMIT)
            .iter()
            .map(|c| row(c.name, Some(c.province)))
            .collect();

        let no_results = if results.is_empty() && !query.trim().is_empty() {
            Some(fmt.t("cities.no-results"))
        } else {
            None
        };

        let history = prefs.search_history.entries();
        let clear_history = if history.is_empty() {
            None
        } else {
            Some(Button::new(fmt.t("cities.clear-history")).on_press(Action::ClearSearchHistory))
        };

        Self {
            placeholder: fmt.t("cities.search-placeholder"),
            query: query.to_string(),
            results,
            no_results,
            favorites_title: fmt.t("cities.favorites"),
            favorites: weather.favorites.iter().map(|c| row(c, None)).collect(),
            recent_title: fmt.t("cities.recent-searches"),
            recent: history.iter().map(|c| row(c, None)).collect(),
            clear_history,
        }
    }
}

/// One option in a picker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    /// Localized label
    pub label: String,
    /// Whether this option is active
    pub selected: bool,
    /// Dispatched when picked
    pub on_select: Action,
}

/// A notification switch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toggle {
    /// Localized label
    pub label: String,
    /// Current value
    pub on: bool,
    /// Whether the switch can be used
    pub enabled: bool,
    /// Dispatched when flipped
    pub on_toggle: Action,
}

/// Preferences screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsView {
    /// Language heading
    pub language_title: String,
    /// Language picker (labels are native names)
    pub languages: Vec<Choice>,
    /// Theme heading
    pub theme_title: String,
    /// Theme mode picker
    pub theme_modes: Vec<Choice>,
    /// Temperature unit picker
    pub temperature_units: Vec<Choice>,
    /// Wind unit picker
    pub wind_units: Vec<Choice>,
    /// Notification master switch
    pub notifications: Toggle,
    /// Per-kind notification switches
    pub notification_kinds: Vec<Toggle>,
}

impl SettingsView {
    /// Build the settings screen
    pub fn build(
        language: Language,
        theme: &ThemeSnapshot,
        prefs: &PreferencesSnapshot,
        fmt: &Formatter<'_>,
    ) -> Self {
        let languages = Language::ALL
            .iter()
            .map(|lang| Choice {
                label: lang.native_name().to_string(),
                selected: *lang == language,
                on_select: Action::SetLanguage(lang.code().to_string()),
            })
            .collect();

        let theme_modes = [
            (ThemeMode::Auto, "settings.theme-auto"),
            (ThemeMode::Light, "settings.theme-light"),
            (ThemeMode::Dark, "settings.theme-dark"),
        ]
        .into_iter()
        .map(|(mode, key)| Choice {
            label: fmt.t(key),
            selected: theme.mode == mode,
            on_select: Action::SetThemeMode(mode),
        })
        .collect();

        let temperature_units = [
            (TemperatureUnit::Celsius, "settings.celsius"),
            (TemperatureUnit::Fahrenheit, "settings.fahrenheit"),
        ]
        .into_iter()
        .map(|(unit, key)| Choice {
            label: fmt.t(key),
            selected: prefs.units.temperature == unit,
            on_select: Action::SetTemperatureUnit(unit),
        })
        .collect();

        let wind_units = [
            (WindUnit::Beaufort, "settings.beaufort"),
            (WindUnit::Kmh, "settings.kmh"),
        ]
        .into_iter()
        .map(|(unit, key)| Choice {
            label: fmt.t(key),
            selected: prefs.units.wind == unit,
            on_select: Action::SetWindUnit(unit),
        })
        .collect();

        let settings = &prefs.notifications;
        let notification_kinds = [
            (NotificationKind::SevereWeather, "settings.notify-severe", settings.severe_weather),
            (NotificationKind::DailyForecast, "settings.notify-daily", settings.daily_forecast),
            (NotificationKind::AirQuality, "settings.notify-air", settings.air_quality),
            (
                NotificationKind::Precipitation,
                "settings.notify-precipitation",
                settings.precipitation,
            ),
        ]
        .into_iter()
        .map(|(kind, key, on)| Toggle {
            label: fmt.t(key),
            on,
            enabled: settings.enabled,
            on_toggle: Action::SetNotification(kind, !on),
        })
        .collect();

        Self {
            language_title: fmt.t("settings.language"),
            languages,
            theme_title: fmt.t("settings.theme"),
            theme_modes,
            temperature_units,
            wind_units,
            notifications: Toggle {
                label: fmt.t("settings.notifications"),
                on: settings.enabled,
                enabled: true,
                on_toggle: Action::SetNotificationsEnabled(!settings.enabled),
            },
            notification_kinds,
        }
    }
}

/// Inline status or fallback panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPanel {
    /// Main message
    pub message: String,
    /// Extra detail (error text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Show a spinner
    pub loading: bool,
    /// Retry affordance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<Button>,
}

impl StatusPanel {
    /// Panel for a fetch status that has nothing else to show
    pub fn for_status(status: &FetchStatus, fmt: &Formatter<'_>) -> Self {
        match status {
            FetchStatus::Loading => Self {
                message: fmt.t("status.loading"),
                detail: None,
                loading: true,
                retry: None,
            },
            FetchStatus::Failed(message) => Self {
                message: fmt.t("status.error"),
                detail: Some(message.clone()),
                loading: false,
                retry: Some(
                    Button::new(fmt.t("status.retry"))
                        .with_icon("refresh")
                        .on_press(Action::Retry),
                ),
            },
            FetchStatus::Idle | FetchStatus::Ready => Self {
                message: fmt.t("status.idle"),
                detail: None,
                loading: false,
                retry: None,
            },
        }
    }
}

/// Animated background or its static fallback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundView {
    /// Style tokens for the current theme and weather
    pub tokens: StyleTokens,
    /// Whether the animated surface is live
    pub animated: bool,
    /// Cross-fade between gradients when the theme or weather changes
    pub transition: Transition,
    /// Fallback notice when the surface is not live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Retry affordance while recovery is still possible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<Button>,
}

impl BackgroundView {
    /// Build the background from the scene state
    pub fn build(scene: &SceneView, tokens: StyleTokens, fmt: &Formatter<'_>) -> Self {
        match scene {
            SceneView::Live => Self {
                tokens,
                animated: true,
                transition: Transition::cross_fade(),
                notice: None,
                retry: None,
            },
            SceneView::Fallback { retryable: true } => Self {
                tokens,
                animated: false,
                transition: Transition::cross_fade(),
                notice: Some(fmt.t("scene.fallback")),
                retry: Some(Button::new(fmt.t("scene.retry")).on_press(Action::RetryScene)),
            },
            SceneView::Fallback { retryable: false } => Self {
                tokens,
                animated: false,
                transition: Transition::cross_fade(),
                notice: Some(fmt.t("scene.gave-up")),
                retry: None,
            },
        }
    }
}

/// A rendered screen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "props", rename_all = "snake_case")]
pub enum View {
    /// Current conditions
    Current(Box<CurrentWeatherView>),
    /// Forecast
    Forecast(Box<ForecastView>),
    /// Cities
    Cities(Box<CitiesView>),
    /// Settings
    Settings(Box<SettingsView>),
    /// Loading, idle or inline error panel
    Status(StatusPanel),
    /// Unknown route
    NotFound {
        /// Localized message
        message: String,
    },
    /// Error boundary fallback
    Fallback(StatusPanel),
}

// =============================================================================
// Rendering
// =============================================================================

/// Everything a screen is rendered from
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Weather store snapshot
    pub weather: &'a WeatherSnapshot,
    /// Theme store snapshot
    pub theme: &'a ThemeSnapshot,
    /// Localization store
    pub i18n: &'a LocalizationStore,
    /// Persisted preferences
    pub prefs: &'a PreferencesSnapshot,
    /// Display capabilities
    pub display: &'a DisplayCapabilities,
}

impl<'a> RenderContext<'a> {
    /// Value formatter for this context
    pub fn formatter(&self) -> Formatter<'a> {
        Formatter::new(self.i18n, self.prefs.units)
    }

    /// Layout breakpoint for the viewport
    pub fn breakpoint(&self) -> Breakpoint {
        breakpoints::current(self.display.viewport_width)
    }

    /// Style tokens for the current theme and weather
    pub fn style_tokens(&self) -> StyleTokens {
        let kind = self
            .weather
            .data
            .as_ref()
            .map(|bundle| bundle.current.condition)
            .unwrap_or_default();
        tokens_for(self.theme, kind)
    }

    /// Card styles for the current tokens
    pub fn card(&self) -> CardStyles {
        CardStyle::new()
            .hoverable(self.display.supports_hover())
            .computed_styles(&self.style_tokens())
    }

    /// Background for a scene state
    ///
    /// With reduced motion the gradient switches instantly.
    pub fn background(&self, scene: &SceneView) -> BackgroundView {
        let mut background = BackgroundView::build(scene, self.style_tokens(), &self.formatter());
        if !self.display.allows_animation() {
            background.transition = Transition::none();
        }
        background
    }
}

/// Render a route
///
/// Screens that need weather data show a status panel while loading, when
/// idle, or after a failure.
pub fn render(route: &Route, ctx: &RenderContext<'_>) -> Result<View> {
    let fmt = ctx.formatter();

    match route {
        Route::Current => render_current(ctx, &fmt),
        Route::CityWeather { city } => {
            if ctx.weather.city != *city {
                // The app selects the city on navigation; until the store
                // catches up there is nothing to show for it.
                return Ok(View::Status(StatusPanel::for_status(&FetchStatus::Loading, &fmt)));
            }
            render_current(ctx, &fmt)
        }
        Route::Forecast => match weather_data(ctx, &fmt, "forecast")? {
            Ok(bundle) => Ok(View::Forecast(Box::new(ForecastView::build(
                bundle,
                &fmt,
                ctx.breakpoint(),
                ctx.card(),
            )?))),
            Err(panel) => Ok(View::Status(panel)),
        },
        Route::Cities { q } => Ok(View::Cities(Box::new(CitiesView::build(
            q.as_deref().unwrap_or(""),
            ctx.weather,
            ctx.prefs,
            &fmt,
        )))),
        Route::Settings => Ok(View::Settings(Box::new(SettingsView::build(
            ctx.i18n.current_language(),
            ctx.theme,
            ctx.prefs,
            &fmt,
        )))),
        Route::NotFound => Ok(View::NotFound { message: fmt.t("nav.not-found") }),
    }
}

fn render_current(ctx: &RenderContext<'_>, fmt: &Formatter<'_>) -> Result<View> {
    match weather_data(ctx, fmt, "current weather")? {
        Ok(bundle) => {
            let reading = &bundle.current;
            let mut view =
                CurrentWeatherView::build(reading, fmt, ctx.weather.is_favorite(&reading.location), ctx.card());
            view.refreshing = ctx.weather.status.is_loading();
            Ok(View::Current(Box::new(view)))
        }
        Err(panel) => Ok(View::Status(panel)),
    }
}

/// Data to show, or the panel to show instead
fn weather_data<'s>(
    ctx: &RenderContext<'s>,
    fmt: &Formatter<'_>,
    view: &'static str,
) -> Result<std::result::Result<&'s WeatherBundle, StatusPanel>> {
    let snapshot = ctx.weather;
    match (&snapshot.status, snapshot.data.as_deref()) {
        (FetchStatus::Failed(_), _) => Ok(Err(StatusPanel::for_status(&snapshot.status, fmt))),
        (FetchStatus::Ready, None) => Err(RenderError::MissingData { view }),
        (_, Some(bundle)) => Ok(Ok(bundle)),
        (status, None) => Ok(Err(StatusPanel::for_status(status, fmt))),
    }
}

// =============================================================================
// Error Boundary
// =============================================================================

/// Contains rendering failures of a subtree
///
/// After a failure the boundary keeps showing its fallback until
/// [`reset`](Self::reset) is called.
#[derive(Debug, Default)]
pub struct ErrorBoundary {
    error: Option<RenderError>,
}

impl ErrorBoundary {
    /// Create a boundary with no error
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `child`, or the fallback if it fails or has failed before
    pub fn render<F>(&mut self, i18n: &LocalizationStore, child: F) -> View
    where
        F: FnOnce() -> Result<View>,
    {
        if self.error.is_none() {
            match child() {
                Ok(view) => return view,
                Err(e) => {
                    tracing::error!(error = %e, "render failed");
                    self.error = Some(e);
                }
            }
        }

        View::Fallback(StatusPanel {
            message: i18n.translate("error-boundary"),
            detail: self.error.as_ref().map(ToString::to_string),
            loading: false,
            retry: Some(Button::new(i18n.translate("status.retry")).on_press(Action::ResetBoundary)),
        })
    }

    /// Caught error, if any
    pub fn error(&self) -> Option<&RenderError> {
        self.error.as_ref()
    }

    /// Whether the fallback is showing
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Forget the caught error so the next render tries again
    pub fn reset(&mut self) {
        if self.error.take().is_some() {
            tracing::debug!("error boundary reset");
        }
    }
}
