use log::{debug, info, warn};

pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }

    pub fn trace(&self, message: &str) {
        debug!("{}", message);
    }

    /// Non-fatal condition that points at a configuration mismatch.
    pub fn warn(&self, message: &str) {
        warn!("{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
