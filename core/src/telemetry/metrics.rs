use std::sync::Mutex;

/// Per-job project counters.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub samples: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_processed(&self, samples: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.processed += 1;
            metrics.samples += samples;
        }
    }

    pub fn record_skipped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.skipped += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent() {
        let metrics = MetricsRecorder::new();
        metrics.record_processed(10);
        metrics.record_processed(5);
        metrics.record_skipped();
        metrics.record_error();
        assert_eq!(
            metrics.snapshot(),
            Metrics {
                processed: 2,
                skipped: 1,
                errors: 1,
                samples: 15,
            }
        );
    }
}
