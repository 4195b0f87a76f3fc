//! User interface layer for Nimbus
//!
//! Everything here is pure presentation logic: routes, design tokens, the
//! time-of-day and weather driven style tokens, and the view models built
//! from store snapshots. No widget toolkit is involved; a renderer consumes
//! the serialized [`View`] values.
//!
//! # Modules
//!
//! - [`tokens`] - Spacing, radius, shadow, breakpoint and animation tokens
//! - [`theme`] - Color helpers and `style_tokens`
//! - [`navigation`] - Routes, tabs and per-tab stacks
//! - [`components`] - View models, rendering and the error boundary
//!
//! # Example
//!
//! ```rust
//! use app_ui::navigation::{Route, Router};
//! use app_ui::tokens::{breakpoints, Breakpoint};
//!
//! let router = Router::new();
//! assert_eq!(
//!     router.match_path("/weather/%E4%B8%8A%E6%B5%B7%E5%B8%82"),
//!     Route::CityWeather { city: "上海市".to_string() }
//! );
//! assert_eq!(breakpoints::current(390), Breakpoint::Phone);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod components;
pub mod navigation;
pub mod theme;
pub mod tokens;

pub use components::{
    render, Action, Button, CardStyle, CardStyles, CitiesView, CurrentWeatherView, ErrorBoundary,
    Formatter, ForecastView, RenderContext, RenderError, SettingsView, StatusPanel, View,
};
pub use navigation::{NavigationStack, NavigationState, NavigationTab, Route, Router, StackEntry};
pub use theme::{style_tokens, tokens_for, Gradient, StyleTokens};
pub use tokens::{breakpoints, shadows, spacing, Breakpoint, Shadow, Transition};
