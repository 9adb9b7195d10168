//! Recognition progress reporting

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Forwards recognition progress (percent) to an optional callback.
///
/// Values are clamped to 100 and never go backwards: a report lower than
/// the highest one seen so far is dropped. This also holds across retries
/// of the same scan.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    highest: AtomicU8,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            highest: AtomicU8::new(0),
        }
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        Self::new(Some(Arc::new(f)))
    }

    /// Reporter that only tracks the value
    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.highest.fetch_max(percent, Ordering::SeqCst);
        if percent < previous {
            return;
        }

        if let Some(callback) = &self.callback {
            callback(percent);
        }
    }

    /// Highest percentage reported so far
    pub fn current(&self) -> u8 {
        self.highest.load(Ordering::SeqCst)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::silent()
    }
}
