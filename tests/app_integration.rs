//! End-to-end tests across the Nimbus crates

use app_platform::{HeadlessSurface, SceneState, SceneView};
use app_state::{FetchStatus, FixedClock, WeatherConfig};
use app_ui::{Action, View};
use chrono::{Local, TimeZone};
use nimbus::{AppConfig, AppContext};
use std::sync::Arc;
use std::time::Duration;
use storage::{KvConfig, KvStore};
use tempfile::TempDir;

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(Local.with_ymd_and_hms(2026, 10, 16, 19, 30, 0).unwrap()))
}

fn in_memory(config: AppConfig) -> AppContext {
    AppContext::with_kv(config, Arc::new(KvStore::in_memory().unwrap()), clock()).unwrap()
}

/// Selecting 上海市 produces a reading for 上海市 within the simulated delay
#[tokio::test(start_paused = true)]
async fn test_select_city_and_refresh() {
    let config = AppConfig::new()
        .with_weather(WeatherConfig::new().latency(Duration::from_millis(1000)))
        .with_locale("zh-CN");
    let mut app = in_memory(config);

    let started = tokio::time::Instant::now();
    let fetch = app
        .dispatch(Action::SelectCity("上海市".to_string()))
        .await
        .unwrap()
        .unwrap();
    assert!(app.weather.snapshot().data.is_none());

    assert_eq!(fetch.await.unwrap(), FetchStatus::Ready);
    assert!(started.elapsed() <= Duration::from_millis(1000));

    let snapshot = app.weather.snapshot();
    let bundle = snapshot.data.as_ref().unwrap();
    assert_eq!(bundle.current.location, "上海市");
    assert_eq!(bundle.hourly.len(), 24);
    assert_eq!(bundle.daily.len(), 14);

    let View::Current(view) = app.render() else {
        panic!("expected current weather view");
    };
    assert_eq!(view.city, "上海市");
}

/// A persisted language survives a restart and beats the OS locale
#[tokio::test(start_paused = true)]
async fn test_language_persists_across_restart() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::new()
        .with_storage(KvConfig::new(dir.path().join("prefs.db")).flush_every_ms(None))
        .with_locale("de-DE");

    {
        let mut app = AppContext::open(config.clone()).unwrap();
        assert_eq!(app.i18n.current_language().code(), "de");

        app.dispatch(Action::SetLanguage("fr".to_string())).await.unwrap();
        assert_eq!(app.i18n.current_language().code(), "fr");
        app.prefs.kv().flush().unwrap();
    }

    let app = AppContext::open(config).unwrap();
    assert_eq!(app.i18n.current_language().code(), "fr");
}

/// Search history is de-duplicated, most recent first
#[tokio::test(start_paused = true)]
async fn test_search_history_dedup() {
    let mut app = in_memory(AppConfig::new().with_locale("en"));

    for city in ["北京市", "上海市", "北京市"] {
        app.prefs.record_search(city).unwrap();
    }
    assert_eq!(app.prefs.search_history().entries(), ["北京市", "上海市"]);

    app.open_path("/cities").await;
    let View::Cities(view) = app.render() else {
        panic!("expected cities view");
    };
    let recent: Vec<_> = view.recent.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(recent, ["北京市", "上海市"]);

    app.dispatch(Action::ClearSearchHistory).await.unwrap();
    assert!(app.prefs.search_history().is_empty());
}

/// Three losses without a restore leave the scene on the static fallback
#[tokio::test]
async fn test_scene_gives_up_after_repeated_loss() {
    let mut app = in_memory(AppConfig::new().with_locale("en"));
    let (surface, events) = HeadlessSurface::new(true);
    app.mount_scene(surface.clone(), events).unwrap();

    let mut states = app.scene().unwrap().subscribe();
    assert_eq!(*states.borrow_and_update(), SceneState::Active);
    assert!(app.background().animated);

    for _ in 0..3 {
        assert!(surface.lose_context());
    }
    while *states.borrow_and_update() != SceneState::GivingUp {
        states.changed().await.unwrap();
    }

    assert!(surface.restore_context(true));
    tokio::task::yield_now().await;
    assert_eq!(app.scene().unwrap().state(), SceneState::GivingUp);
    assert_eq!(app.scene().unwrap().view(), SceneView::Fallback { retryable: false });

    let background = app.background();
    assert!(!background.animated);
    assert!(background.retry.is_none());

    app.shutdown().await;
    assert!(surface.is_released());
}

/// A failed fetch shows the inline retry panel, and retry fetches again
#[tokio::test(start_paused = true)]
async fn test_failure_then_retry() {
    let config = AppConfig::new()
        .with_weather(WeatherConfig::new().failure_rate(1.0))
        .with_locale("en");
    let mut app = in_memory(config);

    let status = app.start().await.unwrap();
    assert!(matches!(status, FetchStatus::Failed(_)));

    let View::Status(panel) = app.render() else {
        panic!("expected status panel");
    };
    let retry = panel.retry.expect("failed fetch offers a retry");
    assert_eq!(retry.on_press, Some(Action::Retry));

    let fetch = app.dispatch(Action::Retry).await.unwrap().unwrap();
    assert!(matches!(fetch.await.unwrap(), FetchStatus::Failed(_)));

    app.shutdown().await;
}
