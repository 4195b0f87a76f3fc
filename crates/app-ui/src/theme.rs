//! Weather-driven styling
//!
//! The background gradient, glass blur, shadow depth and text/card colors are
//! a pure function of three inputs: the time-of-day bucket, whether dark
//! styling is in effect, and the current weather kind.
//!
//! # Usage
//!
//! ```rust
//! use app_state::theme::TimeOfDay;
//! use app_ui::theme::style_tokens;
//! use weather::WeatherKind;
//!
//! let tokens = style_tokens(TimeOfDay::Evening, false, WeatherKind::LightRain);
//! assert_eq!(tokens.gradient.stops.len(), 3);
//! assert!(tokens.gradient.is_well_formed());
//! ```

use crate::tokens::{shadows, Shadow};
use app_state::theme::{ThemeSnapshot, TimeOfDay};
use serde::{Deserialize, Serialize};
use weather::WeatherKind;

// =============================================================================
// Color Types
// =============================================================================

/// A color represented as an RGB(A) hex string (e.g., "#FFFFFF" or "#FFFFFF80")
pub type Color = String;

/// Parse a hex color string to RGB components
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() < 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Convert RGB to hex string
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Blend `from` toward `to` by `amount` (0 keeps `from`, 1 gives `to`)
///
/// Unparseable inputs return `from` unchanged.
pub fn mix(from: &str, to: &str, amount: f32) -> Color {
    let (Some(a), Some(b)) = (parse_hex_color(from), parse_hex_color(to)) else {
        return from.to_string();
    };
    let t = amount.clamp(0.0, 1.0);
    let channel = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    rgb_to_hex(channel(a.0, b.0), channel(a.1, b.1), channel(a.2, b.2))
}

/// Append an alpha channel to a `#RRGGBB` color
pub fn with_alpha(color: &str, alpha: f32) -> Color {
    match parse_hex_color(color) {
        Some((r, g, b)) => {
            let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
            format!("{}{:02X}", rgb_to_hex(r, g, b), a)
        }
        None => color.to_string(),
    }
}

/// Relative luminance in `0.0..=1.0` (sRGB weights, no gamma)
pub fn luminance(color: &str) -> f32 {
    parse_hex_color(color)
        .map(|(r, g, b)| (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0)
        .unwrap_or(0.0)
}

// =============================================================================
// Palettes
// =============================================================================

/// Base sky colors, top to bottom
pub mod sky {
    /// Sunrise peach to soft blue
    pub const MORNING: [&str; 3] = ["#FFD89B", "#FFB88C", "#89CFF0"];
    /// Bright midday blue
    pub const NOON: [&str; 3] = ["#4FACFE", "#00C6FB", "#E0F7FF"];
    /// Warm gold to sky blue
    pub const AFTERNOON: [&str; 3] = ["#F6D365", "#FDA085", "#87CEEB"];
    /// Sunset pink to violet
    pub const EVENING: [&str; 3] = ["#FA709A", "#FEB47B", "#6A4C93"];
    /// Deep night blues
    pub const NIGHT: [&str; 3] = ["#0F2027", "#203A43", "#2C5364"];
}

/// Overlay colors blended over the sky for each weather family
pub mod overlay {
    /// Rain and sleet
    pub const RAIN: &str = "#5D6D7E";
    /// Thunderstorm
    pub const STORM: &str = "#2C3E50";
    /// Fog and haze
    pub const MIST: &str = "#BDC3C7";
    /// Snow
    pub const SNOW: &str = "#ECF0F1";
    /// Clouds
    pub const CLOUD: &str = "#95A5A6";
    /// Applied to every stop in dark mode
    pub const DARK: &str = "#000000";
}

/// Text on light surfaces
pub const TEXT_ON_LIGHT: &str = "#1A1A2E";
/// Text on dark surfaces
pub const TEXT_ON_DARK: &str = "#F5F7FA";

fn sky_for(time_of_day: TimeOfDay) -> [&'static str; 3] {
    match time_of_day {
        TimeOfDay::Morning => sky::MORNING,
        TimeOfDay::Noon => sky::NOON,
        TimeOfDay::Afternoon => sky::AFTERNOON,
        TimeOfDay::Evening => sky::EVENING,
        TimeOfDay::Night => sky::NIGHT,
    }
}

/// Overlay color and strength for a weather kind
fn weather_overlay(kind: WeatherKind) -> Option<(&'static str, f32)> {
    match kind {
        WeatherKind::Sunny => None,
        WeatherKind::PartlyCloudy => Some((overlay::CLOUD, 0.15)),
        WeatherKind::Cloudy => Some((overlay::CLOUD, 0.3)),
        WeatherKind::Overcast => Some((overlay::CLOUD, 0.45)),
        WeatherKind::LightRain => Some((overlay::RAIN, 0.3)),
        WeatherKind::ModerateRain => Some((overlay::RAIN, 0.45)),
        WeatherKind::HeavyRain | WeatherKind::Sleet => Some((overlay::RAIN, 0.6)),
        WeatherKind::Thunderstorm => Some((overlay::STORM, 0.65)),
        WeatherKind::Snow => Some((overlay::SNOW, 0.45)),
        WeatherKind::Fog | WeatherKind::Haze => Some((overlay::MIST, 0.5)),
    }
}

// =============================================================================
// Gradients
// =============================================================================

/// A gradient stop with position and color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position from 0.0 to 1.0
    pub position: f32,
    /// Color at this position
    pub color: Color,
}

/// A linear gradient definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    /// Gradient stops
    pub stops: Vec<GradientStop>,
    /// Direction in degrees (180 is top to bottom)
    pub angle: f32,
}

impl Gradient {
    /// Create a new gradient with stops
    pub fn new(stops: Vec<(f32, &str)>, angle: f32) -> Self {
        Self {
            stops: stops
                .into_iter()
                .map(|(pos, color)| GradientStop {
                    position: pos.clamp(0.0, 1.0),
                    color: color.to_string(),
                })
                .collect(),
            angle,
        }
    }

    /// Stops are in `0.0..=1.0` and non-decreasing
    pub fn is_well_formed(&self) -> bool {
        self.stops.iter().all(|s| (0.0..=1.0).contains(&s.position))
            && self.stops.windows(2).all(|w| w[0].position <= w[1].position)
    }

    /// CSS `linear-gradient(...)` rendering
    pub fn to_css(&self) -> String {
        let stops: Vec<String> = self
            .stops
            .iter()
            .map(|s| format!("{} {:.0}%", s.color, s.position * 100.0))
            .collect();
        format!("linear-gradient({:.0}deg, {})", self.angle, stops.join(", "))
    }
}

// =============================================================================
// Style Tokens
// =============================================================================

/// Everything the view layer needs to paint the background and cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTokens {
    /// Background gradient
    pub gradient: Gradient,
    /// Backdrop blur behind cards, in pixels
    pub blur: f32,
    /// Card shadow depth in `0.0..=1.0`
    pub shadow_intensity: f32,
    /// Card shadow derived from `shadow_intensity`
    pub shadow: Shadow,
    /// Primary text color
    pub text: Color,
    /// Secondary text color
    pub text_muted: Color,
    /// Card fill (with alpha)
    pub card_background: Color,
    /// Card border (with alpha)
    pub card_border: Color,
    /// Whether the tokens are dark-styled
    pub dark: bool,
}

/// Derive style tokens
///
/// Pure: the same inputs always produce the same tokens.
pub fn style_tokens(time_of_day: TimeOfDay, dark: bool, kind: WeatherKind) -> StyleTokens {
    let overlay = weather_overlay(kind);
    let darken = if dark { 0.55 } else { 0.0 };

    let colors: Vec<Color> = sky_for(time_of_day)
        .iter()
        .map(|base| {
            let tinted = match overlay {
                Some((color, amount)) => mix(base, color, amount),
                None => base.to_string(),
            };
            mix(&tinted, overlay::DARK, darken)
        })
        .collect();

    let gradient = Gradient {
        stops: colors
            .into_iter()
            .zip([0.0, 0.55, 1.0])
            .map(|(color, position)| GradientStop { position, color })
            .collect(),
        angle: 180.0,
    };

    let mut blur: f32 = 12.0;
    if kind.is_obscured() {
        blur += 12.0;
    } else if kind.is_precipitation() {
        blur += 6.0;
    }
    if dark {
        blur += 4.0;
    }

    let mut shadow_intensity: f32 = match time_of_day {
        TimeOfDay::Noon => 0.35,
        TimeOfDay::Morning | TimeOfDay::Afternoon => 0.25,
        TimeOfDay::Evening => 0.2,
        TimeOfDay::Night => 0.15,
    };
    if matches!(kind, WeatherKind::Sunny) {
        shadow_intensity += 0.15;
    }
    if kind.is_obscured() || matches!(kind, WeatherKind::Overcast) {
        shadow_intensity -= 0.1;
    }
    if dark {
        shadow_intensity += 0.3;
    }
    let shadow_intensity = shadow_intensity.clamp(0.0, 1.0);

    let middle = gradient
        .stops
        .get(1)
        .map(|s| s.color.as_str())
        .unwrap_or(TEXT_ON_LIGHT);
    let light_text = dark || luminance(middle) < 0.5;
    let (text, card_base, border_base) = if light_text {
        (TEXT_ON_DARK, "#1E1E2E", "#FFFFFF")
    } else {
        (TEXT_ON_LIGHT, "#FFFFFF", "#FFFFFF")
    };

    StyleTokens {
        gradient,
        blur,
        shadow_intensity,
        shadow: shadows::with_intensity(shadow_intensity),
        text: text.to_string(),
        text_muted: with_alpha(text, 0.7),
        card_background: with_alpha(card_base, if light_text { 0.55 } else { 0.7 }),
        card_border: with_alpha(border_base, if light_text { 0.12 } else { 0.4 }),
        dark,
    }
}

/// Derive style tokens from a theme snapshot
pub fn tokens_for(theme: &ThemeSnapshot, kind: WeatherKind) -> StyleTokens {
    style_tokens(theme.time_of_day, theme.dark, kind)
}
