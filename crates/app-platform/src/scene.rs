//! Scene lifecycle guard for the animated background
//!
//! The background renders into a GPU-backed surface whose context can be
//! lost at any time (driver reset, memory pressure, tab backgrounding). The
//! [`SceneGuard`] tracks the context through an explicit state machine:
//!
//! ```text
//! Uninitialized -> Active -> Lost -> Recovering -> Active
//!                                              \-> Lost
//! (any) -> GivingUp once the loss count reaches the threshold
//! ```
//!
//! Surface events arrive on a channel owned by the surface. The guard runs a
//! listener task and a maintenance task; both end when the guard is
//! unmounted or dropped.

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Scene errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// The surface could not create a context
    #[error("Failed to create rendering context: {0}")]
    ContextCreation(String),

    /// The surface could not release its context
    #[error("Failed to release rendering context: {0}")]
    Release(String),

    /// `mount` was called outside a Tokio runtime
    #[error("Scene guard must be mounted inside a Tokio runtime")]
    NoRuntime,
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;

/// Signals raised by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// The context was lost
    ContextLost,
    /// The platform says the context can be used again
    ContextRestored,
}

/// A GPU-backed drawing surface
#[cfg_attr(test, mockall::automock)]
pub trait RenderSurface: Send + Sync {
    /// Create the rendering context
    fn create_context(&self) -> Result<()>;

    /// Whether the context is currently usable
    fn is_context_valid(&self) -> bool;

    /// Release the context immediately
    fn force_release(&self) -> Result<()>;

    /// Whether [`request_memory_reclaim`](Self::request_memory_reclaim) does anything
    fn supports_memory_hint(&self) -> bool;

    /// Ask the platform to reclaim unused GPU memory
    fn request_memory_reclaim(&self);
}

// =============================================================================
// Configuration
// =============================================================================

/// Scene guard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Losses before the guard gives up
    pub loss_threshold: u32,
    /// Seconds between resource cache clears
    pub cache_clear_secs: u64,
    /// Seconds between memory reclamation requests
    pub memory_hint_secs: u64,
    /// Resource cache capacity
    pub cache_capacity: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            loss_threshold: 3,
            cache_clear_secs: 30,
            memory_hint_secs: 60,
            cache_capacity: 64,
        }
    }
}

impl SceneConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the loss threshold (at least 1)
    pub fn loss_threshold(mut self, threshold: u32) -> Self {
        self.loss_threshold = threshold.max(1);
        self
    }

    /// Set the cache clear interval
    pub fn cache_clear_interval(mut self, interval: Duration) -> Self {
        self.cache_clear_secs = interval.as_secs();
        self
    }

    /// Set the memory hint interval
    pub fn memory_hint_interval(mut self, interval: Duration) -> Self {
        self.memory_hint_secs = interval.as_secs();
        self
    }

    /// Set the resource cache capacity
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    fn cache_clear_period(&self) -> Duration {
        Duration::from_secs(self.cache_clear_secs.max(1))
    }

    fn memory_hint_period(&self) -> Duration {
        Duration::from_secs(self.memory_hint_secs.max(1))
    }
}

// =============================================================================
// Resource Cache
// =============================================================================

/// Kind of cached GPU resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Texture
    Texture,
    /// Vertex and index buffers
    Geometry,
    /// Compiled shader program
    Material,
}

/// A cached GPU resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuResource {
    /// Kind of resource
    pub kind: ResourceKind,
    /// Approximate size in bytes
    pub bytes: usize,
}

impl GpuResource {
    /// Create a resource record
    pub fn new(kind: ResourceKind, bytes: usize) -> Self {
        Self { kind, bytes }
    }
}

/// LRU cache of GPU resources
pub struct ResourceCache {
    entries: Mutex<LruCache<String, GpuResource>>,
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("len", &self.len())
            .finish()
    }
}

impl ResourceCache {
    /// Create a cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Insert a resource, evicting the least recently used one when full
    pub fn insert(&self, key: impl Into<String>, resource: GpuResource) {
        let key = key.into();
        let mut entries = self.entries.lock();
        if let Some((evicted, _)) = entries.push(key.clone(), resource) {
            if evicted != key {
                tracing::trace!(key = %evicted, "evicted GPU resource");
            }
        }
    }

    /// Look up a resource and mark it recently used
    pub fn get(&self, key: &str) -> Option<GpuResource> {
        self.entries.lock().get(key).cloned()
    }

    /// Whether a resource is cached
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains(key)
    }

    /// Number of cached resources
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total size of cached resources
    pub fn size_bytes(&self) -> usize {
        self.entries.lock().iter().map(|(_, r)| r.bytes).sum()
    }

    /// Drop every resource, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }
}

// =============================================================================
// State Machine
// =============================================================================

/// Context lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneState {
    /// No context yet
    Uninitialized,
    /// Context is live
    Active,
    /// Context was lost
    Lost,
    /// Probing a restored context
    Recovering,
    /// Too many losses; the static fallback stays for the rest of the mount
    GivingUp,
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SceneState::Uninitialized => "uninitialized",
            SceneState::Active => "active",
            SceneState::Lost => "lost",
            SceneState::Recovering => "recovering",
            SceneState::GivingUp => "giving_up",
        };
        f.write_str(name)
    }
}

/// What to draw in place of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneView {
    /// The live animated surface
    Live,
    /// The static fallback panel
    Fallback {
        /// Whether a retry affordance is offered
        retryable: bool,
    },
}

impl SceneView {
    /// View for a lifecycle state
    pub fn for_state(state: SceneState) -> Self {
        match state {
            SceneState::Active => SceneView::Live,
            SceneState::GivingUp => SceneView::Fallback { retryable: false },
            SceneState::Uninitialized | SceneState::Lost | SceneState::Recovering => {
                SceneView::Fallback { retryable: true }
            }
        }
    }
}

#[derive(Debug)]
struct Machine {
    state: SceneState,
    losses: u32,
    created: bool,
    mounted: bool,
}

struct Shared {
    machine: Mutex<Machine>,
    surface: Arc<dyn RenderSurface>,
    cache: ResourceCache,
    config: SceneConfig,
    state_tx: watch::Sender<SceneState>,
}

impl Shared {
    fn transition(&self, machine: &mut Machine, next: SceneState) {
        if machine.state != next {
            tracing::debug!(from = %machine.state, to = %next, "scene state changed");
            machine.state = next;
            self.state_tx.send_replace(next);
        }
    }

    fn create_context(&self) {
        let mut machine = self.machine.lock();
        if machine.created {
            return;
        }
        machine.created = true;

        match self.surface.create_context() {
            Ok(()) => self.transition(&mut machine, SceneState::Active),
            Err(e) => {
                tracing::warn!(error = %e, "rendering context creation failed");
                self.record_loss(&mut machine);
            }
        }
    }

    fn record_loss(&self, machine: &mut Machine) {
        machine.losses += 1;
        let cleared = self.cache.clear();
        tracing::debug!(losses = machine.losses, cleared, "rendering context lost");

        if machine.losses >= self.config.loss_threshold {
            tracing::warn!(losses = machine.losses, "giving up on the animated scene");
            self.transition(machine, SceneState::GivingUp);
        } else {
            self.transition(machine, SceneState::Lost);
        }
    }

    fn recover(&self, machine: &mut Machine) {
        self.transition(machine, SceneState::Recovering);

        if self.surface.is_context_valid() {
            machine.losses = 0;
            tracing::info!("rendering context recovered");
            self.transition(machine, SceneState::Active);
        } else {
            tracing::warn!("restored context is not usable");
            self.transition(machine, SceneState::Lost);
        }
    }

    fn handle_event(&self, event: SurfaceEvent) {
        let mut machine = self.machine.lock();
        if !machine.mounted || machine.state == SceneState::GivingUp {
            tracing::trace!(?event, state = %machine.state, "ignoring surface event");
            return;
        }

        match event {
            SurfaceEvent::ContextLost => self.record_loss(&mut machine),
            SurfaceEvent::ContextRestored if machine.state == SceneState::Lost => {
                self.recover(&mut machine)
            }
            SurfaceEvent::ContextRestored => {
                tracing::debug!(state = %machine.state, "restore signal without a loss");
            }
        }
    }

    fn clear_cache(&self) {
        let cleared = self.cache.clear();
        if cleared > 0 {
            tracing::trace!(cleared, "cleared GPU resource cache");
        }
    }

    fn hint_memory(&self) {
        if self.surface.supports_memory_hint() {
            self.surface.request_memory_reclaim();
        }
    }
}

/// Guards the animated background's rendering context
///
/// Created by [`mount`](Self::mount); torn down by [`unmount`](Self::unmount)
/// or on drop.
pub struct SceneGuard {
    shared: Arc<Shared>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for SceneGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let machine = self.shared.machine.lock();
        f.debug_struct("SceneGuard")
            .field("state", &machine.state)
            .field("losses", &machine.losses)
            .field("mounted", &machine.mounted)
            .finish()
    }
}

impl SceneGuard {
    /// Mount the scene: create the context once and start the background tasks
    ///
    /// A failed creation counts as a loss.
    pub fn mount(
        surface: Arc<dyn RenderSurface>,
        events: mpsc::Receiver<SurfaceEvent>,
        config: SceneConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| SceneError::NoRuntime)?;

        let (state_tx, _) = watch::channel(SceneState::Uninitialized);
        let shared = Arc::new(Shared {
            machine: Mutex::new(Machine {
                state: SceneState::Uninitialized,
                losses: 0,
                created: false,
                mounted: true,
            }),
            surface,
            cache: ResourceCache::new(config.cache_capacity),
            config,
            state_tx,
        });

        shared.create_context();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let tasks = vec![
            runtime.spawn(listen(Arc::downgrade(&shared), events, shutdown_rx.clone())),
            runtime.spawn(maintain(Arc::downgrade(&shared), shutdown_rx)),
        ];

        Ok(Self {
            shared,
            shutdown_tx,
            tasks: Mutex::new(tasks),
        })
    }

    /// Current state
    pub fn state(&self) -> SceneState {
        self.shared.machine.lock().state
    }

    /// Losses since the last successful recovery
    pub fn loss_count(&self) -> u32 {
        self.shared.machine.lock().losses
    }

    /// Whether the guard is still mounted
    pub fn is_mounted(&self) -> bool {
        self.shared.machine.lock().mounted
    }

    /// What to draw
    pub fn view(&self) -> SceneView {
        SceneView::for_state(self.state())
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<SceneState> {
        self.shared.state_tx.subscribe()
    }

    /// GPU resource cache
    pub fn cache(&self) -> &ResourceCache {
        &self.shared.cache
    }

    /// Configuration
    pub fn config(&self) -> &SceneConfig {
        &self.shared.config
    }

    /// Apply a surface event directly
    ///
    /// Events normally arrive through the channel passed to [`mount`](Self::mount).
    pub fn handle_event(&self, event: SurfaceEvent) {
        self.shared.handle_event(event);
    }

    /// Probe the surface again from the fallback's retry affordance
    ///
    /// Only does anything in the `Lost` state.
    pub fn retry(&self) -> SceneState {
        let mut machine = self.shared.machine.lock();
        if machine.mounted && machine.state == SceneState::Lost {
            self.shared.recover(&mut machine);
        }
        machine.state
    }

    /// Tear the scene down
    ///
    /// Stops the background tasks, then tries to release the context. Release
    /// failures are logged. Calling this more than once does nothing.
    pub fn unmount(&self) {
        {
            let mut machine = self.shared.machine.lock();
            if !machine.mounted {
                return;
            }
            machine.mounted = false;
        }

        self.shutdown_tx.send_replace(true);

        if let Err(e) = self.shared.surface.force_release() {
            tracing::warn!(error = %e, "failed to release rendering context");
        }
        self.shared.cache.clear();
        tracing::debug!("scene unmounted");
    }
}

impl Drop for SceneGuard {
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn listen(
    shared: Weak<Shared>,
    mut events: mpsc::Receiver<SurfaceEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("surface event channel closed");
                    break;
                };
                let Some(shared) = shared.upgrade() else { break };
                shared.handle_event(event);
            }
        }
    }
}

async fn maintain(shared: Weak<Shared>, mut shutdown: watch::Receiver<bool>) {
    let (cache_period, memory_period) = match shared.upgrade() {
        Some(shared) => (
            shared.config.cache_clear_period(),
            shared.config.memory_hint_period(),
        ),
        None => return,
    };

    let start = Instant::now();
    let mut cache_tick = interval_at(start + cache_period, cache_period);
    let mut memory_tick = interval_at(start + memory_period, memory_period);
    cache_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    memory_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = cache_tick.tick() => {
                let Some(shared) = shared.upgrade() else { break };
                shared.clear_cache();
            }
            _ = memory_tick.tick() => {
                let Some(shared) = shared.upgrade() else { break };
                shared.hint_memory();
            }
        }
    }
}

// =============================================================================
// Headless Surface
// =============================================================================

/// Surface without a GPU, driven by hand
///
/// Used by the demo binary and integration tests to simulate context loss.
#[derive(Debug)]
pub struct HeadlessSurface {
    valid: AtomicBool,
    fail_creation: AtomicBool,
    released: AtomicBool,
    memory_hint: bool,
    reclaims: AtomicUsize,
    events: mpsc::Sender<SurfaceEvent>,
}

impl HeadlessSurface {
    /// Create a surface and the event channel the guard listens on
    pub fn new(memory_hint: bool) -> (Arc<Self>, mpsc::Receiver<SurfaceEvent>) {
        let (events, rx) = mpsc::channel(16);
        let surface = Arc::new(Self {
            valid: AtomicBool::new(false),
            fail_creation: AtomicBool::new(false),
            released: AtomicBool::new(false),
            memory_hint,
            reclaims: AtomicUsize::new(0),
            events,
        });
        (surface, rx)
    }

    /// Make context creation fail
    pub fn set_fail_creation(&self, fail: bool) {
        self.fail_creation.store(fail, Ordering::SeqCst);
    }

    /// Lose the context and signal it
    pub fn lose_context(&self) -> bool {
        self.valid.store(false, Ordering::SeqCst);
        self.signal(SurfaceEvent::ContextLost)
    }

    /// Signal a restore; `usable` decides whether the probe succeeds
    pub fn restore_context(&self, usable: bool) -> bool {
        self.valid.store(usable, Ordering::SeqCst);
        self.signal(SurfaceEvent::ContextRestored)
    }

    /// Number of memory reclamation requests received
    pub fn reclaim_requests(&self) -> usize {
        self.reclaims.load(Ordering::SeqCst)
    }

    /// Whether the context was force-released
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn signal(&self, event: SurfaceEvent) -> bool {
        match self.events.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "dropped surface event");
                false
            }
        }
    }
}

impl RenderSurface for HeadlessSurface {
    fn create_context(&self) -> Result<()> {
        if self.fail_creation.load(Ordering::SeqCst) {
            return Err(SceneError::ContextCreation("headless surface refused".to_string()));
        }
        self.valid.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_context_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn force_release(&self) -> Result<()> {
        self.valid.store(false, Ordering::SeqCst);
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn supports_memory_hint(&self) -> bool {
        self.memory_hint
    }

    fn request_memory_reclaim(&self) {
        self.reclaims.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_surface(valid_after_restore: bool) -> MockRenderSurface {
        let mut surface = MockRenderSurface::new();
        surface.expect_create_context().times(1).returning(|| Ok(()));
        surface
            .expect_is_context_valid()
            .returning(move || valid_after_restore);
        surface.expect_force_release().returning(|| Ok(()));
        surface.expect_supports_memory_hint().returning(|| false);
        surface
    }

    fn mount_mock(surface: MockRenderSurface) -> (SceneGuard, mpsc::Sender<SurfaceEvent>) {
        let (tx, rx) = mpsc::channel(8);
        let guard = SceneGuard::mount(Arc::new(surface), rx, SceneConfig::default()).unwrap();
        (guard, tx)
    }

    #[test]
    fn test_mount_requires_runtime() {
        let (surface, rx) = HeadlessSurface::new(false);
        let err = SceneGuard::mount(surface, rx, SceneConfig::default()).unwrap_err();
        assert_eq!(err, SceneError::NoRuntime);
    }

    #[tokio::test]
    async fn test_mount_activates() {
        let (guard, _tx) = mount_mock(mock_surface(true));
        assert_eq!(guard.state(), SceneState::Active);
        assert_eq!(guard.view(), SceneView::Live);
        assert_eq!(guard.loss_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_creation_counts_as_loss() {
        let mut surface = MockRenderSurface::new();
        surface
            .expect_create_context()
            .times(1)
            .returning(|| Err(SceneError::ContextCreation("no adapter".to_string())));
        surface.expect_force_release().returning(|| Ok(()));
        surface.expect_supports_memory_hint().returning(|| false);

        let (guard, _tx) = mount_mock(surface);
        assert_eq!(guard.state(), SceneState::Lost);
        assert_eq!(guard.loss_count(), 1);
        assert_eq!(guard.view(), SceneView::Fallback { retryable: true });
    }

    #[tokio::test]
    async fn test_loss_then_recovery() {
        let (guard, _tx) = mount_mock(mock_surface(true));
        guard.cache().insert("sky", GpuResource::new(ResourceKind::Texture, 4096));

        guard.handle_event(SurfaceEvent::ContextLost);
        assert_eq!(guard.state(), SceneState::Lost);
        assert_eq!(guard.loss_count(), 1);
        assert!(guard.cache().is_empty());

        guard.handle_event(SurfaceEvent::ContextRestored);
        assert_eq!(guard.state(), SceneState::Active);
        assert_eq!(guard.loss_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_restore_falls_back_to_lost() {
        let (guard, _tx) = mount_mock(mock_surface(false));
        let mut states = guard.subscribe();

        guard.handle_event(SurfaceEvent::ContextLost);
        guard.handle_event(SurfaceEvent::ContextRestored);

        assert_eq!(guard.state(), SceneState::Lost);
        assert_eq!(guard.loss_count(), 1);
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), SceneState::Lost);
    }

    #[tokio::test]
    async fn test_gives_up_after_threshold() {
        let (guard, _tx) = mount_mock(mock_surface(true));

        for _ in 0..3 {
            guard.handle_event(SurfaceEvent::ContextLost);
        }
        assert_eq!(guard.state(), SceneState::GivingUp);
        assert_eq!(guard.view(), SceneView::Fallback { retryable: false });

        // Nothing brings it back
        guard.handle_event(SurfaceEvent::ContextRestored);
        guard.handle_event(SurfaceEvent::ContextLost);
        assert_eq!(guard.retry(), SceneState::GivingUp);
        assert_eq!(guard.state(), SceneState::GivingUp);
        assert_eq!(guard.loss_count(), 3);
    }

    #[tokio::test]
    async fn test_restore_while_active_is_ignored() {
        let (guard, _tx) = mount_mock(mock_surface(true));
        guard.handle_event(SurfaceEvent::ContextRestored);
        assert_eq!(guard.state(), SceneState::Active);
    }

    #[tokio::test]
    async fn test_events_arrive_over_channel() {
        let (surface, rx) = HeadlessSurface::new(false);
        let guard = SceneGuard::mount(surface.clone(), rx, SceneConfig::default()).unwrap();
        let mut states = guard.subscribe();

        assert!(surface.lose_context());
        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), SceneState::Lost);

        assert!(surface.restore_context(true));
        while *states.borrow_and_update() != SceneState::Active {
            states.changed().await.unwrap();
        }
        assert_eq!(guard.loss_count(), 0);
    }

    #[tokio::test]
    async fn test_retry_from_fallback() {
        let (surface, rx) = HeadlessSurface::new(false);
        surface.set_fail_creation(true);
        let guard = SceneGuard::mount(surface.clone(), rx, SceneConfig::default()).unwrap();
        assert_eq!(guard.state(), SceneState::Lost);

        assert_eq!(guard.retry(), SceneState::Lost);

        surface.set_fail_creation(false);
        surface.create_context().unwrap();
        assert_eq!(guard.retry(), SceneState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_maintenance_tasks() {
        let (surface, rx) = HeadlessSurface::new(true);
        let guard = SceneGuard::mount(surface.clone(), rx, SceneConfig::default()).unwrap();

        guard.cache().insert("clouds", GpuResource::new(ResourceKind::Geometry, 128));
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(guard.cache().is_empty());
        assert_eq!(surface.reclaim_requests(), 0);

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(surface.reclaim_requests(), 2);

        guard.unmount();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(surface.reclaim_requests(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_memory_hint_without_support() {
        let mut surface = mock_surface(true);
        surface.expect_request_memory_reclaim().never();
        let (_guard, _tx) = mount_mock(surface);

        tokio::time::sleep(Duration::from_secs(180)).await;
    }

    #[tokio::test]
    async fn test_unmount_is_idempotent_and_tolerates_release_failure() {
        let mut surface = MockRenderSurface::new();
        surface.expect_create_context().returning(|| Ok(()));
        surface.expect_supports_memory_hint().returning(|| false);
        surface
            .expect_force_release()
            .times(1)
            .returning(|| Err(SceneError::Release("device gone".to_string())));

        let (guard, _tx) = mount_mock(surface);
        guard.unmount();
        guard.unmount();
        assert!(!guard.is_mounted());

        let tasks = std::mem::take(&mut *guard.tasks.lock());
        for task in tasks {
            task.await.unwrap();
        }

        // Events after unmount are ignored
        guard.handle_event(SurfaceEvent::ContextLost);
        assert_eq!(guard.loss_count(), 0);
        // Drop runs unmount again; force_release is still called once
    }

    #[tokio::test]
    async fn test_drop_releases_surface() {
        let (surface, rx) = HeadlessSurface::new(false);
        let guard = SceneGuard::mount(surface.clone(), rx, SceneConfig::default()).unwrap();
        drop(guard);
        assert!(surface.is_released());
    }

    #[test]
    fn test_resource_cache_evicts_lru() {
        let cache = ResourceCache::new(2);
        cache.insert("a", GpuResource::new(ResourceKind::Texture, 10));
        cache.insert("b", GpuResource::new(ResourceKind::Material, 20));
        assert!(cache.get("a").is_some());
        cache.insert("c", GpuResource::new(ResourceKind::Geometry, 30));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.size_bytes(), 40);
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = SceneConfig::new()
            .loss_threshold(0)
            .cache_clear_interval(Duration::from_secs(10))
            .cache_capacity(0);
        assert_eq!(config.loss_threshold, 1);
        assert_eq!(config.cache_clear_secs, 10);
        assert_eq!(ResourceCache::new(config.cache_capacity).len(), 0);

        let parsed: SceneConfig = serde_json::from_str(r#"{"loss_threshold":5}"#).unwrap();
        assert_eq!(parsed.loss_threshold, 5);
        assert_eq!(parsed.memory_hint_secs, 60);
    }
}
