//! Progress and cancellation hooks for attachment uploads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Capability handed to the upload orchestrator by the caller.
///
/// Cancellation is cooperative: it is polled between individual file
/// uploads, never in the middle of one.
pub trait UploadHooks: Send + Sync {
    /// Overall progress of the batch, `0.0..=1.0`.
    fn report_progress(&self, fraction: f32);

    fn is_cancelled(&self) -> bool;

    fn cancel(&self);
}

/// Hooks shared between the caller and a running submission.
pub type SharedHooks = Arc<dyn UploadHooks>;

/// Default hooks: a cancellation flag plus a progress value observable
/// through a [`watch`] channel.
#[derive(Debug)]
pub struct UploadFileHooks {
    cancelled: AtomicBool,
    progress: watch::Sender<f32>,
}

impl UploadFileHooks {
    pub fn new() -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            cancelled: AtomicBool::new(false),
            progress,
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Latest reported progress.
    pub fn progress(&self) -> f32 {
        *self.progress.borrow()
    }

    /// Receiver notified on every progress report.
    pub fn subscribe(&self) -> watch::Receiver<f32> {
        self.progress.subscribe()
    }
}

impl Default for UploadFileHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadHooks for UploadFileHooks {
    fn report_progress(&self, fraction: f32) {
        self.progress.send_replace(fraction.clamp(0.0, 1.0));
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}
