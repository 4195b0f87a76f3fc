//! Nimbus demo session
//!
//! Builds the application context, fetches the default city, walks through
//! a few screens, and prints each rendered view as JSON.
//!
//! Set `NIMBUS_CONFIG` to a JSON config file and `RUST_LOG` to adjust logging.

use anyhow::Context as _;
use app_platform::HeadlessSurface;
use app_ui::{Action, View};
use nimbus::{AppConfig, AppContext};
use tracing_subscriber::EnvFilter;

fn print_view(label: &str, view: &View) -> anyhow::Result<()> {
    println!("== {label}");
    println!("{}", serde_json::to_string_pretty(view)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("NIMBUS_CONFIG") {
        Ok(path) => AppConfig::from_json_file(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        Err(_) => AppConfig::default(),
    };

    let mut app = AppContext::open(config).context("opening application context")?;

    let (surface, events) = HeadlessSurface::new(true);
    app.mount_scene(surface.clone(), events)?;

    app.start().await?;
    tracing::info!(
        status = ?app.weather.status(),
        city = %app.weather.selected_city(),
        "initial refresh finished"
    );
    print_view("current", &app.render())?;

    app.open_path("/forecast").await;
    print_view("forecast", &app.render())?;

    app.open_path("/cities?q=shang").await;
    print_view("cities", &app.render())?;

    if let Some(fetch) = app.dispatch(Action::SelectCity("上海市".to_string())).await? {
        fetch.await?;
    }
    print_view("current (上海市)", &app.render())?;

    surface.lose_context();
    tokio::task::yield_now().await;
    println!("== background");
    println!("{}", serde_json::to_string_pretty(&app.background())?);

    app.shutdown().await;
    Ok(())
}
