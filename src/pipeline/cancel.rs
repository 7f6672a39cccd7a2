/*!
 * Cooperative cancellation.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a run and its controllers
///
/// Clones share the same flag. Cancellation is only observed at chunk and
/// stage boundaries, never in the middle of a generation call.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag before a new run
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
