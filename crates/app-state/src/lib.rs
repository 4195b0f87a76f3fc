//! Application state for Nimbus
//!
//! This crate provides the reactive stores views read from: the weather
//! store (selected city, favorites, fetched data) and the theme store
//! (time of day, theme mode, OS dark preference).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod task;
pub mod theme;
pub mod weather;

pub use task::TaskHandle;
pub use theme::{Clock, FixedClock, SystemClock, ThemeConfig, ThemeSnapshot, ThemeStore, TimeOfDay};
pub use weather::{FetchStatus, WeatherConfig, WeatherEvent, WeatherSnapshot, WeatherStore};
