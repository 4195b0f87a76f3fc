//! Design tokens for Nimbus
//!
//! Spacing, radius, shadow, breakpoint and animation primitives shared by the
//! weather cards and the background.

use serde::{Deserialize, Serialize};

// =============================================================================
// Spacing Tokens
// =============================================================================

/// Spacing in pixels
pub mod spacing {
    /// Card padding
    pub const LG: f32 = 16.0;
}

/// Corner radii in pixels
pub mod radius {
    /// Cards
    pub const LG: f32 = 20.0;
}

// =============================================================================
// Shadow Tokens
// =============================================================================

/// Drop shadow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    /// Horizontal offset
    pub offset_x: f32,
    /// Vertical offset
    pub offset_y: f32,
    /// Blur radius
    pub blur: f32,
    /// Spread radius
    pub spread: f32,
    /// Shadow color (with alpha)
    pub color: String,
}

impl Shadow {
    /// Create a new shadow
    pub fn new(offset_x: f32, offset_y: f32, blur: f32, spread: f32, color: &str) -> Self {
        Self {
            offset_x,
            offset_y,
            blur,
            spread,
            color: color.to_string(),
        }
    }
}

/// Shadow presets
pub mod shadows {
    use super::Shadow;

    /// No shadow
    pub fn none() -> Shadow {
        Shadow::new(0.0, 0.0, 0.0, 0.0, "transparent")
    }

    /// Shadow scaled by an intensity in `0.0..=1.0`
    ///
    /// Zero gives [`none`]; one gives a deep card shadow. Out-of-range values
    /// are clamped.
    pub fn with_intensity(intensity: f32) -> Shadow {
        let intensity = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
        if intensity == 0.0 {
            return none();
        }

        let alpha = 0.05 + 0.35 * intensity;
        Shadow::new(
            0.0,
            2.0 + 10.0 * intensity,
            6.0 + 24.0 * intensity,
            -2.0 * intensity,
            &format!("rgba(0, 0, 0, {:.2})", alpha),
        )
    }
}

// =============================================================================
// Breakpoint Tokens
// =============================================================================

/// Layout breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Breakpoint {
    /// Phone (< 500px)
    Phone,
    /// Greater than phone (>= 500px)
    GtPhone,
    /// Greater than mobile (>= 800px)
    GtMobile,
    /// Greater than tablet (>= 1300px)
    GtTablet,
}

impl Breakpoint {
    /// Number of daily forecast columns shown at this width
    pub fn forecast_columns(&self) -> usize {
        match self {
            Breakpoint::Phone => 1,
            Breakpoint::GtPhone => 2,
            Breakpoint::GtMobile => 3,
            Breakpoint::GtTablet => 4,
        }
    }
}

/// Breakpoint widths
pub mod breakpoints {
    /// Phone breakpoint (500px)
    pub const PHONE: u32 = 500;
    /// Mobile breakpoint (800px)
    pub const MOBILE: u32 = 800;
    /// Tablet breakpoint (1300px)
    pub const TABLET: u32 = 1300;

    /// Get current breakpoint
    pub fn current(width: u32) -> super::Breakpoint {
        if width >= TABLET {
            super::Breakpoint::GtTablet
        } else if width >= MOBILE {
            super::Breakpoint::GtMobile
        } else if width >= PHONE {
            super::Breakpoint::GtPhone
        } else {
            super::Breakpoint::Phone
        }
    }
}

// =============================================================================
// Animation Tokens
// =============================================================================

/// Animation durations in milliseconds
pub mod duration {
    /// Card hover lift
    pub const FAST: u32 = 150;
    /// Background gradient cross-fade
    pub const SLOW: u32 = 800;
}

/// Easing curves
pub mod easing {
    /// Hover and press feedback
    pub const DEFAULT: &str = "cubic-bezier(0.17, 0.73, 0.14, 1)";
    /// Background cross-fade
    pub const EASE_IN_OUT: &str = "cubic-bezier(0.4, 0, 0.2, 1)";
}

/// An animated property change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// Duration in milliseconds (zero means instant)
    pub duration_ms: u32,
    /// CSS easing curve
    pub easing: &'static str,
}

impl Transition {
    /// No animation
    pub fn none() -> Self {
        Self { duration_ms: 0, easing: "linear" }
    }

    /// Card hover lift
    pub fn hover() -> Self {
        Self { duration_ms: duration::FAST, easing: easing::DEFAULT }
    }

    /// Background gradient cross-fade
    pub fn cross_fade() -> Self {
        Self { duration_ms: duration::SLOW, easing: easing::EASE_IN_OUT }
    }

    /// Whether anything animates
    pub fn is_animated(&self) -> bool {
        self.duration_ms > 0
    }
}
