//! Display capabilities
//!
//! Pointer, touch and viewport information used only to adapt layout. The
//! host fills this in (or it comes from configuration); nothing here talks to
//! a windowing system.

use serde::{Deserialize, Serialize};

/// Primary pointing device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    /// Mouse or trackpad
    #[default]
    Fine,
    /// Finger
    Coarse,
    /// No pointer (keyboard, remote)
    None,
}

/// How tightly the layout packs content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutDensity {
    /// Small targets for precise pointers
    Compact,
    /// Larger targets for touch
    Comfortable,
}

impl LayoutDensity {
    /// Minimum interactive target size in pixels
    pub fn min_target_size(&self) -> f32 {
        match self {
            LayoutDensity::Compact => 32.0,
            LayoutDensity::Comfortable => 44.0,
        }
    }
}

/// What the display can do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayCapabilities {
    /// Primary pointer
    pub pointer: PointerKind,
    /// Whether a touch screen is present
    pub touch: bool,
    /// Viewport width in CSS pixels
    pub viewport_width: u32,
    /// Viewport height in CSS pixels
    pub viewport_height: u32,
    /// Device pixel ratio
    pub device_pixel_ratio: f32,
    /// User asked for reduced motion
    pub prefers_reduced_motion: bool,
}

impl Default for DisplayCapabilities {
    fn default() -> Self {
        Self {
            pointer: PointerKind::Fine,
            touch: false,
            viewport_width: 1280,
            viewport_height: 800,
            device_pixel_ratio: 1.0,
            prefers_reduced_motion: false,
        }
    }
}

impl DisplayCapabilities {
    /// Capabilities for a viewport, other fields at their defaults
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            viewport_width,
            viewport_height,
            ..Self::default()
        }
    }

    /// Set the pointer kind
    ///
    /// A coarse pointer implies touch.
    pub fn with_pointer(mut self, pointer: PointerKind) -> Self {
        self.pointer = pointer;
        if pointer == PointerKind::Coarse {
            self.touch = true;
        }
        self
    }

    /// Set touch support
    pub fn with_touch(mut self, touch: bool) -> Self {
        self.touch = touch;
        self
    }

    /// Set the device pixel ratio (non-positive values become 1.0)
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.device_pixel_ratio = if ratio > 0.0 { ratio } else { 1.0 };
        self
    }

    /// Set the reduced motion preference
    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.prefers_reduced_motion = reduced;
        self
    }

    /// Hover effects only make sense with a fine pointer
    pub fn supports_hover(&self) -> bool {
        self.pointer == PointerKind::Fine
    }

    /// Whether the viewport is taller than it is wide
    pub fn is_portrait(&self) -> bool {
        self.viewport_height > self.viewport_width
    }

    /// Layout density for these capabilities
    pub fn layout_density(&self) -> LayoutDensity {
        if self.touch || self.pointer == PointerKind::Coarse {
            LayoutDensity::Comfortable
        } else {
            LayoutDensity::Compact
        }
    }

    /// Whether the animated background should run
    pub fn allows_animation(&self) -> bool {
        !self.prefers_reduced_motion
    }
}
