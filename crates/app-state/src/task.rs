//! Scoped background tasks

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle for a background loop started by a store
///
/// When dropped, the loop is asked to stop.
#[derive(Debug)]
pub struct TaskHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Spawn `body`, passing it the stop signal it must watch for
    pub fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(oneshot::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(body(stop_rx));
        Self { stop_tx: Some(stop_tx), handle: Some(handle) }
    }

    /// Whether the loop has ended
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop the loop and wait for it to finish
    pub async fn shutdown(mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }
    }

    fn signal_stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.signal_stop();
    }
}
