//! Application context
//!
//! Owns every store and wires user actions from the view models back into
//! them. Stores are created once here and shared by `Arc`; nothing in Nimbus
//! is a global.

use crate::config::{AppConfig, ConfigError};
use app_platform::{RenderSurface, SceneError, SceneGuard, SceneView, SurfaceEvent};
use app_state::{Clock, FetchStatus, SystemClock, TaskHandle, ThemeStore, WeatherStore};
use app_ui::components::{self, BackgroundView};
use app_ui::{Action, ErrorBoundary, NavigationState, Route, Router, RenderContext, View};
use i18n::{I18nError, LocalizationStore};
use std::sync::Arc;
use storage::{KvError, KvStore, PreferenceStore};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Errors raised while building or driving the context
#[derive(Debug, Error)]
pub enum ContextError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Preference storage failed
    #[error(transparent)]
    Storage(#[from] KvError),

    /// Localization catalog failed to load
    #[error(transparent)]
    I18n(#[from] I18nError),

    /// The animated scene could not be mounted
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Result type for context operations
pub type Result<T> = std::result::Result<T, ContextError>;

/// Locale list from the environment (`LC_ALL`, `LC_MESSAGES`, `LANG`)
///
/// POSIX forms like `fr_FR.UTF-8` are normalized to `fr-FR`.
pub fn detect_os_locales() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|value| normalize_posix_locale(&value))
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
        .unwrap_or_default()
}

fn normalize_posix_locale(value: &str) -> String {
    let value = value.split(['.', '@']).next().unwrap_or_default();
    value.trim().replace('_', "-")
}

/// Every store plus the navigation and error boundary state
pub struct AppContext {
    /// Configuration the context was built from
    pub config: AppConfig,
    /// Persisted preferences
    pub prefs: PreferenceStore,
    /// Localization
    pub i18n: LocalizationStore,
    /// Weather
    pub weather: Arc<WeatherStore>,
    /// Theme
    pub theme: Arc<ThemeStore>,
    router: Router,
    navigation: NavigationState,
    boundary: ErrorBoundary,
    scene: Option<SceneGuard>,
    theme_ticker: Option<TaskHandle>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("language", &self.i18n.current_language())
            .field("city", &self.weather.selected_city())
            .field("route", self.navigation.current_route())
            .field("scene", &self.scene)
            .finish()
    }
}

impl AppContext {
    /// Open the on-disk preference store and build every store
    pub fn open(config: AppConfig) -> Result<Self> {
        let kv = KvStore::new(config.storage.clone())?;
        Self::with_kv(config, Arc::new(kv), Arc::new(SystemClock))
    }

    /// Build the stores on top of an existing key-value store
    ///
    /// The initial language comes from the persisted preference, then the
    /// configured locale, then the environment.
    pub fn with_kv(config: AppConfig, kv: Arc<KvStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let prefs = PreferenceStore::new(kv);

        let os_locales = match &config.locale {
            Some(locale) => locale.clone(),
            None => detect_os_locales(),
        };
        let i18n = LocalizationStore::with_bundled(prefs.clone(), &os_locales)?;

        let weather = Arc::new(WeatherStore::with_mock(config.weather.clone()));
        let theme = Arc::new(ThemeStore::new(config.theme.clone(), clock, prefs.clone()));

        tracing::info!(
            language = %i18n.current_language(),
            city = %weather.selected_city(),
            "application context ready"
        );

        Ok(Self {
            config,
            prefs,
            i18n,
            weather,
            theme,
            router: Router::new(),
            navigation: NavigationState::new(),
            boundary: ErrorBoundary::new(),
            scene: None,
            theme_ticker: None,
        })
    }

    /// Start background work: the theme ticker and the first refresh
    pub fn start(&mut self) -> JoinHandle<FetchStatus> {
        if self.theme_ticker.is_none() {
            self.theme_ticker = Some(self.theme.start_ticking());
        }
        self.weather.spawn_refresh()
    }

    /// Mount the animated background on `surface`
    ///
    /// Replaces (and unmounts) any previously mounted scene.
    pub fn mount_scene(
        &mut self,
        surface: Arc<dyn RenderSurface>,
        events: mpsc::Receiver<SurfaceEvent>,
    ) -> Result<()> {
        if let Some(previous) = self.scene.take() {
            previous.unmount();
        }
        self.scene = Some(SceneGuard::mount(surface, events, self.config.scene.clone())?);
        Ok(())
    }

    /// The mounted scene guard, if any
    pub fn scene(&self) -> Option<&SceneGuard> {
        self.scene.as_ref()
    }

    /// Stop background work and release the scene
    pub async fn shutdown(&mut self) {
        if let Some(scene) = self.scene.take() {
            scene.unmount();
        }
        if let Some(ticker) = self.theme_ticker.take() {
            ticker.shutdown().await;
        }
        tracing::debug!("application context shut down");
    }

    /// Current route
    pub fn route(&self) -> &Route {
        self.navigation.current_route()
    }

    /// Navigation state
    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    /// Open a path; city routes also select the city
    pub async fn open_path(&mut self, path: &str) -> Option<JoinHandle<FetchStatus>> {
        let route = self.navigation.open_path(&self.router, path).clone();
        self.follow_route(&route).await
    }

    /// Go back in the active tab
    pub fn go_back(&mut self) -> bool {
        self.navigation.go_back()
    }

    async fn follow_route(&mut self, route: &Route) -> Option<JoinHandle<FetchStatus>> {
        match route.city() {
            Some(city) if city != self.weather.selected_city() => {
                self.weather.select_city(city).await
            }
            _ => None,
        }
    }

    /// Render the current route inside the error boundary
    pub fn render(&mut self) -> View {
        let weather = self.weather.snapshot();
        let theme = self.theme.snapshot();
        let prefs = self.prefs.snapshot();
        let route = self.navigation.current_route().clone();

        let ctx = RenderContext {
            weather: &weather,
            theme: &theme,
            i18n: &self.i18n,
            prefs: &prefs,
            display: &self.config.display,
        };
        self.boundary.render(&self.i18n, || components::render(&route, &ctx))
    }

    /// Whether the error boundary is showing its fallback
    pub fn has_render_error(&self) -> bool {
        self.boundary.has_error()
    }

    /// Background for the current theme, weather, and scene state
    pub fn background(&self) -> BackgroundView {
        let weather = self.weather.snapshot();
        let theme = self.theme.snapshot();
        let prefs = self.prefs.snapshot();

        let scene = match &self.scene {
            Some(scene) if self.config.display.allows_animation() => scene.view(),
            _ => SceneView::Fallback { retryable: false },
        };

        RenderContext {
            weather: &weather,
            theme: &theme,
            i18n: &self.i18n,
            prefs: &prefs,
            display: &self.config.display,
        }
        .background(&scene)
    }

    /// Apply a user action
    ///
    /// Returns the fetch the action started, if any.
    pub async fn dispatch(&mut self, action: Action) -> Result<Option<JoinHandle<FetchStatus>>> {
        tracing::debug!(?action, "dispatch");

        match action {
            Action::Retry => return Ok(Some(self.weather.spawn_refresh())),
            Action::ResetBoundary => self.boundary.reset(),
            Action::RetryScene => {
                if let Some(scene) = &self.scene {
                    scene.retry();
                }
            }
            Action::SelectCity(city) => {
                self.prefs.record_search(&city)?;
                let fetch = self.weather.select_city(&city).await;
                self.navigation.navigate(Route::Current);
                return Ok(fetch);
            }
            Action::ToggleFavorite(city) => {
                self.weather.toggle_favorite(&city).await;
            }
            Action::ForgetSearch(city) => {
                self.prefs.remove_search(&city)?;
            }
            Action::ClearSearchHistory => self.prefs.clear_search_history()?,
            Action::SetLanguage(code) => {
                if !self.i18n.change_language(&code)? {
                    tracing::warn!(code = %code, "ignoring unsupported language");
                }
            }
            Action::SetThemeMode(mode) => self.theme.set_mode(mode)?,
            Action::ToggleDarkMode => {
                self.theme.toggle_dark_mode()?;
            }
            Action::SetTemperatureUnit(unit) => {
                let mut units = self.prefs.units();
                units.temperature = unit;
                self.prefs.set_units(units)?;
            }
            Action::SetWindUnit(unit) => {
                let mut units = self.prefs.units();
                units.wind = unit;
                self.prefs.set_units(units)?;
            }
            Action::SetNotification(kind, enabled) => {
                self.prefs.update_notifications(|n| n.set(kind, enabled))?;
            }
            Action::SetNotificationsEnabled(enabled) => {
                self.prefs.update_notifications(|n| n.enabled = enabled)?;
            }
            Action::Navigate(route) => {
                self.navigation.navigate(route.clone());
                return Ok(self.follow_route(&route).await);
            }
        }

        Ok(None)
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        if let Some(scene) = self.scene.take() {
            scene.unmount();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_state::FixedClock;
    use app_ui::NavigationTab;
    use chrono::{Local, TimeZone};
    use std::time::Duration;
    use storage::{NotificationKind, TemperatureUnit, ThemeMode};

    fn context() -> AppContext {
        let config = AppConfig::new()
            .with_weather(app_state::WeatherConfig::new().latency(Duration::from_millis(200)))
            .with_locale("en-US");
        let clock = Arc::new(FixedClock::new(
            Local.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
        ));
        AppContext::with_kv(config, Arc::new(KvStore::in_memory().unwrap()), clock).unwrap()
    }

    #[test]
    fn test_normalize_posix_locale() {
        assert_eq!(normalize_posix_locale("fr_FR.UTF-8"), "fr-FR");
        assert_eq!(normalize_posix_locale("de_DE@euro"), "de-DE");
        assert_eq!(normalize_posix_locale("ja"), "ja");
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_city_records_search_and_navigates() {
        let mut ctx = context();
        ctx.navigation.switch_tab(NavigationTab::Cities);

        let fetch = ctx
            .dispatch(Action::SelectCity("杭州市".to_string()))
            .await
            .unwrap()
            .expect("city change starts a fetch");

        assert_eq!(fetch.await.unwrap(), FetchStatus::Ready);
        assert_eq!(ctx.weather.selected_city(), "杭州市");
        assert_eq!(ctx.prefs.search_history().entries(), ["杭州市"]);
        assert_eq!(ctx.route(), &Route::Current);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preference_actions_persist() {
        let mut ctx = context();

        ctx.dispatch(Action::SetTemperatureUnit(TemperatureUnit::Fahrenheit)).await.unwrap();
        ctx.dispatch(Action::SetNotification(NotificationKind::AirQuality, false)).await.unwrap();
        ctx.dispatch(Action::SetThemeMode(ThemeMode::Dark)).await.unwrap();
        ctx.dispatch(Action::SetLanguage("ja".to_string())).await.unwrap();
        ctx.dispatch(Action::SetLanguage("xx".to_string())).await.unwrap();

        assert_eq!(ctx.prefs.units().temperature, TemperatureUnit::Fahrenheit);
        assert!(!ctx.prefs.notifications().air_quality);
        assert_eq!(ctx.prefs.theme_mode(), ThemeMode::Dark);
        assert!(ctx.theme.is_dark());
        assert_eq!(ctx.prefs.language().as_deref(), Some("ja"));
        assert_eq!(ctx.i18n.current_language().code(), "ja");
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_follows_fetch() {
        let mut ctx = context();
        assert!(matches!(ctx.render(), View::Status(_)));

        let status = ctx.start().await.unwrap();
        assert_eq!(status, FetchStatus::Ready);

        let View::Current(view) = ctx.render() else {
            panic!("expected current weather");
        };
        assert_eq!(view.city, "北京市");

        ctx.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_city_path_selects_city() {
        let mut ctx = context();
        let fetch = ctx.open_path("/weather/%E6%88%90%E9%83%BD%E5%B8%82").await;
        assert!(fetch.is_some());
        assert_eq!(ctx.weather.selected_city(), "成都市");
        assert_eq!(ctx.route(), &Route::CityWeather { city: "成都市".to_string() });

        assert!(ctx.open_path("/nowhere").await.is_none());
        assert_eq!(ctx.route(), &Route::NotFound);
    }

    #[tokio::test]
    async fn test_background_without_scene_is_static() {
        let ctx = context();
        let background = ctx.background();
        assert!(!background.animated);
        assert!(background.retry.is_none());
    }
}
