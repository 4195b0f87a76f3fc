//! Theme state
//!
//! Tracks the time-of-day bucket, the user's [`ThemeMode`] and the OS dark
//! preference, and resolves them to a single "dark or not" flag. The style
//! tokens derived from that state live in `app-ui`.
//!
//! The OS preference is only observed while the mode is [`ThemeMode::Auto`]:
//! storing an explicit Light or Dark choice drops the subscription, and
//! returning to Auto re-creates it.

use crate::task::TaskHandle;
use chrono::{DateTime, Local, Timelike};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use storage::{PreferenceStore, ThemeMode};
use tokio::sync::watch;

/// Source of the current local time
pub trait Clock: Send + Sync {
    /// Current local time
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl FixedClock {
    /// Create a clock frozen at `now`
    pub fn new(now: DateTime<Local>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Move the clock to `now`
    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock() = now;
    }

    /// Move the clock forward
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}

/// Coarse part of the day driving the background palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    /// 05:00-10:59
    Morning,
    /// 11:00-13:59
    Noon,
    /// 14:00-17:59
    Afternoon,
    /// 18:00-20:59
    Evening,
    /// 21:00-04:59
    Night,
}

impl TimeOfDay {
    /// Bucket for an hour of the day (values above 23 wrap)
    pub fn from_hour(hour: u32) -> Self {
        match hour % 24 {
            5..=10 => TimeOfDay::Morning,
            11..=13 => TimeOfDay::Noon,
            14..=17 => TimeOfDay::Afternoon,
            18..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    /// Bucket for a point in time
    pub fn at(time: DateTime<Local>) -> Self {
        Self::from_hour(time.hour())
    }

    /// Translation key for the bucket name
    pub fn translation_key(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "time-of-day.morning",
            TimeOfDay::Noon => "time-of-day.noon",
            TimeOfDay::Afternoon => "time-of-day.afternoon",
            TimeOfDay::Evening => "time-of-day.evening",
            TimeOfDay::Night => "time-of-day.night",
        }
    }
}

/// Theme store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// How often the time-of-day bucket is recomputed, in seconds
    pub tick_interval_secs: u64,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self { tick_interval_secs: 60 }
    }
}

impl ThemeConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick interval
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_secs = interval.as_secs().max(1);
        self
    }

    /// Tick interval as a duration
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }
}

/// Point-in-time view of the theme state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeSnapshot {
    /// Current time-of-day bucket
    pub time_of_day: TimeOfDay,
    /// Stored mode
    pub mode: ThemeMode,
    /// Last known OS dark preference
    pub os_prefers_dark: bool,
    /// Whether dark styling is in effect
    pub dark: bool,
}

#[derive(Debug)]
struct ThemeState {
    time_of_day: TimeOfDay,
    mode: ThemeMode,
    os_prefers_dark: bool,
}

impl ThemeState {
    fn snapshot(&self) -> ThemeSnapshot {
        ThemeSnapshot {
            time_of_day: self.time_of_day,
            mode: self.mode,
            os_prefers_dark: self.os_prefers_dark,
            dark: self.mode.resolve_dark(self.os_prefers_dark),
        }
    }
}

/// Store for time-of-day, theme mode and dark resolution
pub struct ThemeStore {
    state: RwLock<ThemeState>,
    config: ThemeConfig,
    clock: Arc<dyn Clock>,
    prefs: PreferenceStore,
    snapshot_tx: watch::Sender<ThemeSnapshot>,
    /// OS dark-preference feed, if the platform provides one
    os_source: Mutex<Option<watch::Receiver<bool>>>,
    /// Listener on `os_source`, present only while the mode is Auto
    os_listener: Mutex<Option<TaskHandle>>,
}

impl std::fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeStore")
            .field("snapshot", &self.snapshot())
            .field("config", &self.config)
            .field("following_os", &self.is_following_os())
            .finish()
    }
}

impl ThemeStore {
    /// Create the store, reading the persisted mode
    pub fn new(config: ThemeConfig, clock: Arc<dyn Clock>, prefs: PreferenceStore) -> Self {
        let state = ThemeState {
            time_of_day: TimeOfDay::at(clock.now()),
            mode: prefs.theme_mode(),
            os_prefers_dark: false,
        };
        tracing::debug!(mode = %state.mode, time_of_day = ?state.time_of_day, "theme initialized");

        let (snapshot_tx, _) = watch::channel(state.snapshot());
        Self {
            state: RwLock::new(state),
            config,
            clock,
            prefs,
            snapshot_tx,
            os_source: Mutex::new(None),
            os_listener: Mutex::new(None),
        }
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> ThemeSnapshot {
        *self.snapshot_tx.borrow()
    }

    /// Current time-of-day bucket
    pub fn time_of_day(&self) -> TimeOfDay {
        self.state.read().time_of_day
    }

    /// Stored theme mode
    pub fn mode(&self) -> ThemeMode {
        self.state.read().mode
    }

    /// Whether dark styling is in effect
    pub fn is_dark(&self) -> bool {
        self.snapshot().dark
    }

    /// Subscribe to snapshots
    pub fn subscribe(&self) -> watch::Receiver<ThemeSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Whether the OS preference is currently being observed
    pub fn is_following_os(&self) -> bool {
        self.os_listener
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Recompute the time-of-day bucket from the clock
    ///
    /// Returns whether the bucket changed.
    pub fn tick(&self) -> bool {
        let next = TimeOfDay::at(self.clock.now());
        let mut state = self.state.write();
        if state.time_of_day == next {
            return false;
        }

        tracing::debug!(from = ?state.time_of_day, to = ?next, "time of day changed");
        state.time_of_day = next;
        self.publish(&state);
        true
    }

    /// Start recomputing the bucket on the configured interval
    pub fn start_ticking(self: &Arc<Self>) -> TaskHandle {
        let store = Arc::clone(self);
        let period = self.config.tick_duration();

        TaskHandle::spawn(move |mut stop_rx| async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        store.tick();
                    }
                    _ = &mut stop_rx => break,
                }
            }
            tracing::debug!("theme ticker stopped");
        })
    }

    /// Connect the platform's dark-preference feed
    ///
    /// The current value is applied immediately if the mode is Auto.
    pub fn attach_os_preference(self: &Arc<Self>, source: watch::Receiver<bool>) {
        *self.os_source.lock() = Some(source);
        if self.mode() == ThemeMode::Auto {
            self.follow_os();
        }
    }

    /// Record an OS dark-preference value
    ///
    /// Only has a visible effect while the mode is Auto.
    pub fn set_os_preference(&self, prefers_dark: bool) {
        let mut state = self.state.write();
        if state.os_prefers_dark == prefers_dark {
            return;
        }

        tracing::debug!(prefers_dark, "OS dark preference changed");
        state.os_prefers_dark = prefers_dark;
        self.publish(&state);
    }

    /// Store a theme mode
    ///
    /// The choice is persisted first. Explicit modes stop observing the OS
    /// preference; Auto starts observing it again.
    pub fn set_mode(self: &Arc<Self>, mode: ThemeMode) -> storage::Result<()> {
        self.prefs.set_theme_mode(mode)?;

        {
            let mut state = self.state.write();
            if state.mode != mode {
                tracing::info!(%mode, "theme mode changed");
                state.mode = mode;
                self.publish(&state);
            }
        }

        if mode.is_explicit() {
            self.unfollow_os();
        } else {
            self.follow_os();
        }
        Ok(())
    }

    /// Flip between explicit Light and Dark
    ///
    /// From Auto, the flip is relative to what is currently shown.
    pub fn toggle_dark_mode(self: &Arc<Self>) -> storage::Result<ThemeMode> {
        let next = if self.is_dark() { ThemeMode::Light } else { ThemeMode::Dark };
        self.set_mode(next)?;
        Ok(next)
    }

    fn follow_os(self: &Arc<Self>) {
        let Some(mut source) = self.os_source.lock().clone() else {
            return;
        };

        let mut listener = self.os_listener.lock();
        if listener.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!("no async runtime; OS theme changes will not be observed");
            return;
        }

        self.set_os_preference(*source.borrow_and_update());

        let store = Arc::downgrade(self);
        *listener = Some(TaskHandle::spawn(move |mut stop_rx| async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    changed = source.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let prefers_dark = *source.borrow_and_update();
                        match store.upgrade() {
                            Some(store) => store.set_os_preference(prefers_dark),
                            None => break,
                        }
                    }
                }
            }
        }));
        tracing::debug!("following OS theme preference");
    }

    fn unfollow_os(&self) {
        if self.os_listener.lock().take().is_some() {
            tracing::debug!("stopped following OS theme preference");
        }
    }

    fn publish(&self, state: &ThemeState) {
        self.snapshot_tx.send_replace(state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_hour(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 16, hour, 15, 0).unwrap()
    }

    fn store_at(hour: u32) -> (Arc<ThemeStore>, Arc<FixedClock>, PreferenceStore) {
        let clock = Arc::new(FixedClock::new(at_hour(hour)));
        let prefs = PreferenceStore::in_memory().unwrap();
        let store = Arc::new(ThemeStore::new(ThemeConfig::new(), clock.clone(), prefs.clone()));
        (store, clock, prefs)
    }

    #[test]
    fn test_time_of_day_buckets() {
        let expected = [
            (0, TimeOfDay::Night),
            (4, TimeOfDay::Night),
            (5, TimeOfDay::Morning),
            (10, TimeOfDay::Morning),
            (11, TimeOfDay::Noon),
            (13, TimeOfDay::Noon),
            (14, TimeOfDay::Afternoon),
            (17, TimeOfDay::Afternoon),
            (18, TimeOfDay::Evening),
            (20, TimeOfDay::Evening),
            (21, TimeOfDay::Night),
            (23, TimeOfDay::Night),
        ];
        for (hour, bucket) in expected {
            assert_eq!(TimeOfDay::from_hour(hour), bucket, "hour {}", hour);
        }
    }

    #[test]
    fn test_every_hour_has_a_bucket() {
        for hour in 0..24 {
            let _ = TimeOfDay::from_hour(hour).translation_key();
        }
        assert_eq!(TimeOfDay::from_hour(29), TimeOfDay::Morning);
    }

    #[test]
    fn test_initial_bucket_comes_from_clock() {
        let (store, _, _) = store_at(12);
        assert_eq!(store.time_of_day(), TimeOfDay::Noon);
        assert_eq!(store.mode(), ThemeMode::Auto);
        assert!(!store.is_dark());
    }

    #[test]
    fn test_tick_publishes_bucket_changes() {
        let (store, clock, _) = store_at(10);
        let rx = store.subscribe();

        assert!(!store.tick());
        assert!(!rx.has_changed().unwrap());

        clock.set(at_hour(19));
        assert!(store.tick());
        assert!(rx.has_changed().unwrap());
        assert_eq!(store.time_of_day(), TimeOfDay::Evening);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_follows_clock() {
        let (store, clock, _) = store_at(20);
        let handle = store.start_ticking();

        clock.advance(chrono::Duration::hours(1));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(store.time_of_day(), TimeOfDay::Night);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_explicit_mode_overrides_os() {
        let (store, _, prefs) = store_at(9);
        let (os_tx, os_rx) = watch::channel(true);
        store.attach_os_preference(os_rx);
        assert!(store.is_dark());

        store.set_mode(ThemeMode::Light).unwrap();
        assert!(!store.is_dark());
        assert_eq!(prefs.theme_mode(), ThemeMode::Light);

        os_tx.send(true).unwrap();
        assert!(!store.is_dark());
    }

    #[tokio::test]
    async fn test_os_subscription_only_while_auto() {
        let (store, _, _) = store_at(9);
        let (os_tx, os_rx) = watch::channel(false);
        store.attach_os_preference(os_rx);
        assert!(store.is_following_os());

        store.set_mode(ThemeMode::Dark).unwrap();
        assert!(!store.is_following_os());

        // Changes while explicit are not observed
        os_tx.send(true).unwrap();
        tokio::task::yield_now().await;
        assert!(!store.snapshot().os_prefers_dark);

        // Returning to Auto re-subscribes and picks up the current value
        store.set_mode(ThemeMode::Auto).unwrap();
        assert!(store.is_following_os());
        assert!(store.is_dark());
    }

    #[tokio::test]
    async fn test_os_changes_are_observed_live() {
        let (store, _, _) = store_at(9);
        let (os_tx, os_rx) = watch::channel(false);
        store.attach_os_preference(os_rx);
        let mut rx = store.subscribe();

        os_tx.send(true).unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().dark);
    }

    #[tokio::test]
    async fn test_toggle_dark_mode() {
        let (store, _, prefs) = store_at(15);

        assert_eq!(store.toggle_dark_mode().unwrap(), ThemeMode::Dark);
        assert!(store.is_dark());
        assert_eq!(store.toggle_dark_mode().unwrap(), ThemeMode::Light);
        assert!(!store.is_dark());
        assert_eq!(prefs.theme_mode(), ThemeMode::Light);
    }

    #[test]
    fn test_persisted_mode_is_loaded() {
        let prefs = PreferenceStore::in_memory().unwrap();
        prefs.set_theme_mode(ThemeMode::Dark).unwrap();

        let clock = Arc::new(FixedClock::new(at_hour(8)));
        let store = ThemeStore::new(ThemeConfig::new(), clock, prefs);

        assert_eq!(store.mode(), ThemeMode::Dark);
        assert!(store.is_dark());
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let config: ThemeConfig = serde_json::from_str(r#"{"tick_interval_secs": 5}"#).unwrap();
        assert_eq!(config.tick_duration(), Duration::from_secs(5));
        assert!(serde_json::from_str::<ThemeConfig>(r#"{"tick": 5}"#).is_err());
    }
}
