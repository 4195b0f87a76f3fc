//! Platform layer for Nimbus
//!
//! Display capability detection and the lifecycle guard for the GPU-backed
//! animated background.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capabilities;
pub mod scene;

pub use capabilities::{DisplayCapabilities, LayoutDensity, PointerKind};
pub use scene::{
    GpuResource, HeadlessSurface, RenderSurface, ResourceCache, ResourceKind, SceneConfig,
    SceneError, SceneGuard, SceneState, SceneView, SurfaceEvent,
};
