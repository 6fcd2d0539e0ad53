use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Pass counters accumulated across snapshots by a long-running driver.
pub struct MetricsRecorder {
    inner: Mutex<PassCounts>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassCounts {
    pub rendered: usize,
    pub empty: usize,
    pub failed: usize,
    pub samples: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PassCounts::default()),
        }
    }

    pub fn record_rendered(&self, samples: usize) {
        if let Ok(mut counts) = self.inner.lock() {
            counts.rendered += 1;
            counts.samples += samples;
        }
    }

    pub fn record_empty(&self) {
        if let Ok(mut counts) = self.inner.lock() {
            counts.empty += 1;
        }
    }

    pub fn record_failed(&self) {
        if let Ok(mut counts) = self.inner.lock() {
            counts.failed += 1;
        }
    }

    pub fn snapshot(&self) -> PassCounts {
        self.inner
            .lock()
            .map(|counts| *counts)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
