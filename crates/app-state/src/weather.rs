//! Weather state store
//!
//! Owns the selected city, the favorites list and the latest weather bundle.
//! Views read [`WeatherSnapshot`]s from a watch channel and dispatch actions
//! (`select_city`, `refresh`, `retry`, favorites) back to the store.
//!
//! Every refresh takes a ticket from a monotonic request counter. When it
//! completes, it only publishes if its ticket is still the latest one, so a
//! slow refresh for a previously selected city can never overwrite the data
//! of the current one.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use weather::{MockConfig, MockWeatherSource, WeatherBundle, WeatherSource};

/// City selected when nothing else is configured
pub const DEFAULT_CITY: &str = "北京市";

/// Favorites seeded on first start
pub const DEFAULT_FAVORITES: [&str; 4] = ["北京市", "上海市", "广州市", "深圳市"];

/// Weather store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    /// City selected at startup
    pub default_city: String,
    /// Initial favorites, in display order
    pub favorites: Vec<String>,
    /// Simulated network delay of the mock source, in milliseconds
    pub latency_ms: u64,
    /// Probability that a mock fetch fails
    pub failure_rate: f64,
    /// Buffer size of the event channel
    pub event_capacity: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            default_city: DEFAULT_CITY.to_string(),
            favorites: DEFAULT_FAVORITES.iter().map(|c| c.to_string()).collect(),
            latency_ms: 1000,
            failure_rate: 0.0,
            event_capacity: 32,
        }
    }
}

impl WeatherConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the startup city
    pub fn default_city(mut self, city: impl Into<String>) -> Self {
        self.default_city = city.into();
        self
    }

    /// Set the initial favorites
    pub fn favorites<I, S>(mut self, favorites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.favorites = favorites.into_iter().map(Into::into).collect();
        self
    }

    /// Set the simulated delay
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency_ms = latency.as_millis() as u64;
        self
    }

    /// Set the simulated failure probability
    pub fn failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate;
        self
    }

    /// Mock source settings derived from this configuration
    pub fn mock_config(&self) -> MockConfig {
        MockConfig::new()
            .latency(Duration::from_millis(self.latency_ms))
            .failure_rate(self.failure_rate)
    }
}

/// Progress of the latest refresh
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum FetchStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A refresh is in flight
    Loading,
    /// The latest refresh succeeded
    Ready,
    /// The latest refresh failed
    Failed(String),
}

impl FetchStatus {
    /// Whether a refresh is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchStatus::Loading)
    }

    /// Failure message, if the latest refresh failed
    pub fn error(&self) -> Option<&str> {
        match self {
            FetchStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Point-in-time view of the store
#[derive(Debug, Clone, Default)]
pub struct WeatherSnapshot {
    /// Selected city
    pub city: String,
    /// Status of the latest refresh
    pub status: FetchStatus,
    /// Data from the latest successful refresh
    ///
    /// Kept while a newer refresh is loading or after it fails, but cleared
    /// when the selected city changes.
    pub data: Option<Arc<WeatherBundle>>,
    /// Favorite cities in insertion order
    pub favorites: Vec<String>,
}

impl WeatherSnapshot {
    /// Whether `city` is a favorite
    pub fn is_favorite(&self, city: &str) -> bool {
        self.favorites.iter().any(|c| c == city)
    }
}

/// Events broadcast when the store changes
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherEvent {
    /// A different city was selected
    CitySelected(String),
    /// A refresh started
    Loading {
        /// City being refreshed
        city: String,
    },
    /// A refresh published new data
    Updated {
        /// City the data belongs to
        city: String,
    },
    /// A refresh failed
    Failed {
        /// City that failed
        city: String,
        /// Error message
        message: String,
    },
    /// The favorites list changed
    FavoritesChanged(Vec<String>),
}

#[derive(Debug)]
struct WeatherState {
    city: String,
    status: FetchStatus,
    data: Option<Arc<WeatherBundle>>,
    favorites: Vec<String>,
    /// Ticket of the most recently started refresh
    latest_request: u64,
}

impl WeatherState {
    fn snapshot(&self) -> WeatherSnapshot {
        WeatherSnapshot {
            city: self.city.clone(),
            status: self.status.clone(),
            data: self.data.clone(),
            favorites: self.favorites.clone(),
        }
    }
}

/// Store for the selected city, favorites and weather data
///
/// # Example
///
/// ```no_run
/// use app_state::weather::{FetchStatus, WeatherConfig, WeatherStore};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let store = Arc::new(WeatherStore::with_mock(WeatherConfig::new()));
///
///     if let Some(task) = store.select_city("上海市").await {
///         let _ = task.await;
///     }
///
///     assert_eq!(store.snapshot().status, FetchStatus::Ready);
/// }
/// ```
pub struct WeatherStore {
    state: RwLock<WeatherState>,
    source: Arc<dyn WeatherSource>,
    snapshot_tx: watch::Sender<WeatherSnapshot>,
    events_tx: broadcast::Sender<WeatherEvent>,
}

impl std::fmt::Debug for WeatherStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherStore")
            .field("snapshot", &*self.snapshot_tx.borrow())
            .finish()
    }
}

impl WeatherStore {
    /// Create a store that fetches from `source`
    pub fn new(config: &WeatherConfig, source: Arc<dyn WeatherSource>) -> Self {
        let mut favorites: Vec<String> = Vec::new();
        for city in &config.favorites {
            let city = city.trim();
            if !city.is_empty() && !favorites.iter().any(|c| c == city) {
                favorites.push(city.to_string());
            }
        }

        let city = match config.default_city.trim() {
            "" => DEFAULT_CITY.to_string(),
            city => city.to_string(),
        };

        let state = WeatherState {
            city,
            status: FetchStatus::Idle,
            data: None,
            favorites,
            latest_request: 0,
        };

        let (snapshot_tx, _) = watch::channel(state.snapshot());
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));

        Self { state: RwLock::new(state), source, snapshot_tx, events_tx }
    }

    /// Create a store backed by the mock weather source
    pub fn with_mock(config: WeatherConfig) -> Self {
        let source = Arc::new(MockWeatherSource::new(config.mock_config()));
        Self::new(&config, source)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> WeatherSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Selected city
    pub fn selected_city(&self) -> String {
        self.snapshot_tx.borrow().city.clone()
    }

    /// Status of the latest refresh
    pub fn status(&self) -> FetchStatus {
        self.snapshot_tx.borrow().status.clone()
    }

    /// Favorite cities in insertion order
    pub fn favorites(&self) -> Vec<String> {
        self.snapshot_tx.borrow().favorites.clone()
    }

    /// Whether `city` is a favorite
    pub fn is_favorite(&self, city: &str) -> bool {
        self.snapshot_tx.borrow().is_favorite(city)
    }

    /// Subscribe to snapshots
    pub fn subscribe(&self) -> watch::Receiver<WeatherSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to change events
    pub fn subscribe_events(&self) -> broadcast::Receiver<WeatherEvent> {
        self.events_tx.subscribe()
    }

    /// Select a city and start refreshing it in the background
    ///
    /// Blank names are ignored and return `None`. The city is not checked
    /// against any list. Selecting the already-selected city keeps its data
    /// and simply refreshes it.
    pub async fn select_city(self: &Arc<Self>, name: &str) -> Option<JoinHandle<FetchStatus>> {
        let name = name.trim();
        if name.is_empty() {
            tracing::debug!("ignoring blank city selection");
            return None;
        }

        let changed = {
            let mut state = self.state.write().await;
            let changed = state.city != name;
            if changed {
                state.city = name.to_string();
                state.data = None;
                self.publish(&state);
            }
            changed
        };

        if changed {
            tracing::info!(city = name, "city selected");
            let _ = self.events_tx.send(WeatherEvent::CitySelected(name.to_string()));
        }

        Some(self.spawn_refresh())
    }

    /// Run [`refresh`](Self::refresh) on a background task
    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<FetchStatus> {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.refresh().await })
    }

    /// Fetch fresh data for the selected city
    ///
    /// Returns the store status once this refresh has finished. If a newer
    /// refresh started in the meantime, this one's result is discarded and the
    /// returned status is whatever the store holds at that point, which is
    /// usually `Loading`. Read [`status`](Self::status) after the latest
    /// refresh completes for the settled outcome.
    pub async fn refresh(&self) -> FetchStatus {
        let (ticket, city) = {
            let mut state = self.state.write().await;
            state.latest_request += 1;
            state.status = FetchStatus::Loading;
            self.publish(&state);
            (state.latest_request, state.city.clone())
        };

        tracing::debug!(%city, ticket, "refresh started");
        let _ = self.events_tx.send(WeatherEvent::Loading { city: city.clone() });

        let result = self.source.fetch(&city).await;

        let mut state = self.state.write().await;
        if state.latest_request != ticket {
            tracing::debug!(%city, ticket, latest = state.latest_request, "dropping stale refresh");
            return state.status.clone();
        }

        let event = match result {
            Ok(bundle) => {
                state.status = FetchStatus::Ready;
                state.data = Some(Arc::new(bundle));
                tracing::debug!(%city, ticket, "refresh completed");
                WeatherEvent::Updated { city }
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(%city, error = %message, "refresh failed");
                state.status = FetchStatus::Failed(message.clone());
                WeatherEvent::Failed { city, message }
            }
        };

        self.publish(&state);
        let status = state.status.clone();
        drop(state);

        let _ = self.events_tx.send(event);
        status
    }

    /// Refresh again after a failure
    pub async fn retry(&self) -> FetchStatus {
        tracing::info!("retrying weather refresh");
        self.refresh().await
    }

    /// Add a favorite city
    ///
    /// Returns `false` if the name is blank or already a favorite.
    pub async fn add_favorite(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        let mut state = self.state.write().await;
        if state.favorites.iter().any(|c| c == name) {
            return false;
        }

        state.favorites.push(name.to_string());
        self.favorites_changed(&state);
        true
    }

    /// Remove a favorite city
    ///
    /// Returns `false` if it was not a favorite.
    pub async fn remove_favorite(&self, name: &str) -> bool {
        let name = name.trim();
        let mut state = self.state.write().await;
        let before = state.favorites.len();
        state.favorites.retain(|c| c != name);
        if state.favorites.len() == before {
            return false;
        }

        self.favorites_changed(&state);
        true
    }

    /// Add or remove a favorite; returns whether it is a favorite afterwards
    pub async fn toggle_favorite(&self, name: &str) -> bool {
        if self.is_favorite(name.trim()) {
            self.remove_favorite(name).await;
            false
        } else {
            self.add_favorite(name).await
        }
    }

    fn favorites_changed(&self, state: &WeatherState) {
        tracing::debug!(favorites = ?state.favorites, "favorites changed");
        self.publish(state);
        let _ = self
            .events_tx
            .send(WeatherEvent::FavoritesChanged(state.favorites.clone()));
    }

    fn publish(&self, state: &WeatherState) {
        self.snapshot_tx.send_replace(state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use weather::{WeatherError, WeatherSource};

    fn mock_store(latency: Duration, failure_rate: f64) -> Arc<WeatherStore> {
        Arc::new(WeatherStore::with_mock(
            WeatherConfig::new().latency(latency).failure_rate(failure_rate),
        ))
    }

    /// Source with a per-city delay
    struct SlowCities {
        delays: HashMap<String, Duration>,
        inner: MockWeatherSource,
    }

    #[async_trait]
    impl WeatherSource for SlowCities {
        async fn fetch(&self, city: &str) -> weather::Result<WeatherBundle> {
            if let Some(delay) = self.delays.get(city) {
                tokio::time::sleep(*delay).await;
            }
            self.inner.fetch(city).await
        }
    }

    /// Source that fails a fixed number of times before succeeding
    struct Flaky {
        failures_left: AtomicUsize,
        inner: MockWeatherSource,
    }

    #[async_trait]
    impl WeatherSource for Flaky {
        async fn fetch(&self, city: &str) -> weather::Result<WeatherBundle> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(WeatherError::Generation("boom".to_string()));
            }
            self.inner.fetch(city).await
        }
    }

    fn instant_source() -> MockWeatherSource {
        MockWeatherSource::new(MockConfig::new().latency(Duration::ZERO))
    }

    #[test]
    fn test_default_state() {
        let store = WeatherStore::with_mock(WeatherConfig::new());
        let snapshot = store.snapshot();

        assert_eq!(snapshot.city, "北京市");
        assert_eq!(snapshot.status, FetchStatus::Idle);
        assert!(snapshot.data.is_none());
        assert_eq!(snapshot.favorites, vec!["北京市", "上海市", "广州市", "深圳市"]);
    }

    #[test]
    fn test_config_favorites_are_deduplicated() {
        let config = WeatherConfig::new()
            .default_city("  ")
            .favorites(["杭州市", "杭州市", " ", "成都市"]);
        let store = WeatherStore::with_mock(config);

        assert_eq!(store.selected_city(), DEFAULT_CITY);
        assert_eq!(store.favorites(), vec!["杭州市", "成都市"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_city_then_refresh_within_delay() {
        let store = mock_store(Duration::from_secs(1), 0.0);
        let started = tokio::time::Instant::now();

        let task = store.select_city("上海市").await.unwrap();
        assert_eq!(store.selected_city(), "上海市");

        let status = task.await.unwrap();

        assert_eq!(status, FetchStatus::Ready);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.data.unwrap().current.location, "上海市");
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_shows_loading_then_ready() {
        let store = mock_store(Duration::from_secs(1), 0.0);
        let mut rx = store.subscribe();

        let task = store.spawn_refresh();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().status.is_loading());

        assert_eq!(task.await.unwrap(), FetchStatus::Ready);
        assert_eq!(store.status(), FetchStatus::Ready);
        let data = store.snapshot().data.unwrap();
        assert_eq!(data.hourly.len(), 24);
        assert_eq!(data.daily.len(), 14);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_sets_failed_and_retry_recovers() {
        let source = Arc::new(Flaky {
            failures_left: AtomicUsize::new(1),
            inner: instant_source(),
        });
        let store = WeatherStore::new(&WeatherConfig::new(), source);

        let status = store.refresh().await;
        assert!(matches!(status, FetchStatus::Failed(_)));
        assert_eq!(store.status().error(), Some("Weather data generation failed: boom"));

        assert_eq!(store.retry().await, FetchStatus::Ready);
        assert!(store.snapshot().data.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_never_stays_loading() {
        for rate in [0.0, 1.0] {
            let store = mock_store(Duration::from_millis(200), rate);
            let status = store.refresh().await;
            assert!(!status.is_loading());
            assert!(!store.status().is_loading());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_refresh_is_discarded() {
        let mut delays = HashMap::new();
        delays.insert("北京市".to_string(), Duration::from_secs(5));
        delays.insert("上海市".to_string(), Duration::from_secs(1));
        let source = Arc::new(SlowCities { delays, inner: instant_source() });
        let store = Arc::new(WeatherStore::new(&WeatherConfig::new(), source));

        let mut rx = store.subscribe();
        let slow = store.spawn_refresh();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().status.is_loading());

        let fast = store.select_city("上海市").await.unwrap();

        assert_eq!(fast.await.unwrap(), FetchStatus::Ready);
        slow.await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.city, "上海市");
        assert_eq!(snapshot.status, FetchStatus::Ready);
        assert_eq!(snapshot.data.unwrap().current.location, "上海市");
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_refresh_leaves_outcome_to_latest() {
        let mut delays = HashMap::new();
        delays.insert("北京市".to_string(), Duration::from_secs(1));
        delays.insert("上海市".to_string(), Duration::from_secs(5));
        let source = Arc::new(SlowCities { delays, inner: instant_source() });
        let store = Arc::new(WeatherStore::new(&WeatherConfig::new(), source));

        let mut rx = store.subscribe();
        let superseded = store.spawn_refresh();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().status.is_loading());

        let latest = store.select_city("上海市").await.unwrap();

        // Finishes first, while the newer request is still in flight
        assert_eq!(superseded.await.unwrap(), FetchStatus::Loading);
        assert!(store.status().is_loading());
        assert!(store.snapshot().data.is_none());

        assert_eq!(latest.await.unwrap(), FetchStatus::Ready);
        assert_eq!(store.status(), FetchStatus::Ready);
        assert_eq!(store.snapshot().data.unwrap().current.location, "上海市");
    }

    #[tokio::test]
    async fn test_blank_city_is_ignored() {
        let store = mock_store(Duration::ZERO, 0.0);
        assert!(store.select_city("   ").await.is_none());
        assert_eq!(store.selected_city(), "北京市");
        assert_eq!(store.status(), FetchStatus::Idle);
    }

    #[tokio::test]
    async fn test_unknown_city_is_accepted() {
        let store = mock_store(Duration::ZERO, 0.0);
        let task = store.select_city("Atlantis").await.unwrap();
        assert_eq!(task.await.unwrap(), FetchStatus::Ready);
        assert_eq!(store.snapshot().data.unwrap().current.location, "Atlantis");
    }

    #[tokio::test]
    async fn test_add_favorite_twice_equals_once() {
        let store = mock_store(Duration::ZERO, 0.0);

        assert!(store.add_favorite("杭州市").await);
        let once = store.favorites();
        assert!(!store.add_favorite("杭州市").await);

        assert_eq!(store.favorites(), once);
        assert_eq!(once.last().map(String::as_str), Some("杭州市"));
    }

    #[tokio::test]
    async fn test_remove_missing_favorite_is_no_op() {
        let store = mock_store(Duration::ZERO, 0.0);
        let before = store.favorites();
        assert!(!store.remove_favorite("拉萨市").await);
        assert_eq!(store.favorites(), before);
    }

    #[tokio::test]
    async fn test_favorites_match_net_set_effect() {
        let store = Arc::new(WeatherStore::with_mock(
            WeatherConfig::new().favorites(Vec::<String>::new()),
        ));
        let cities = ["北京市", "上海市", "广州市", "深圳市", "杭州市"];
        let mut expected: Vec<String> = Vec::new();

        // Deterministic pseudo-random sequence of adds and removes
        let mut seed: u32 = 17;
        for _ in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let city = cities[(seed >> 16) as usize % cities.len()];
            if (seed >> 8) % 2 == 0 {
                store.add_favorite(city).await;
                if !expected.iter().any(|c| c == city) {
                    expected.push(city.to_string());
                }
            } else {
                store.remove_favorite(city).await;
                expected.retain(|c| c != city);
            }

            let favorites = store.favorites();
            let mut deduped = favorites.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), favorites.len());
            assert_eq!(favorites, expected);
        }
    }

    #[tokio::test]
    async fn test_toggle_favorite() {
        let store = mock_store(Duration::ZERO, 0.0);
        assert!(!store.toggle_favorite("北京市").await);
        assert!(!store.is_favorite("北京市"));
        assert!(store.toggle_favorite("北京市").await);
        assert!(store.is_favorite("北京市"));
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let store = mock_store(Duration::ZERO, 0.0);
        let mut events = store.subscribe_events();

        store.add_favorite("厦门市").await;
        let task = store.select_city("厦门市").await.unwrap();
        task.await.unwrap();

        assert!(matches!(events.recv().await.unwrap(), WeatherEvent::FavoritesChanged(_)));
        assert_eq!(
            events.recv().await.unwrap(),
            WeatherEvent::CitySelected("厦门市".to_string())
        );
        assert_eq!(
            events.recv().await.unwrap(),
            WeatherEvent::Loading { city: "厦门市".to_string() }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            WeatherEvent::Updated { city: "厦门市".to_string() }
        );
    }

    #[test]
    fn test_config_deserialize_rejects_unknown_fields() {
        let config: WeatherConfig =
            serde_json::from_str(r#"{"default_city": "成都市", "latency_ms": 0}"#).unwrap();
        assert_eq!(config.default_city, "成都市");
        assert_eq!(config.favorites.len(), 4);

        let err = serde_json::from_str::<WeatherConfig>(r#"{"city": "成都市"}"#);
        assert!(err.is_err());
    }
}
