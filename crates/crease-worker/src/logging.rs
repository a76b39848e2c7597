//! Structured delivery logging.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Logs one delivery's lifecycle with its id attached to every event.
#[derive(Debug, Clone)]
pub struct DeliveryLogger {
    delivery_id: String,
    source: String,
}

impl DeliveryLogger {
    /// Logger for a delivery read from `source` (a path or other label).
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            delivery_id: Uuid::new_v4().to_string(),
            source: source.into(),
        }
    }

    pub fn with_id(delivery_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            delivery_id: delivery_id.into(),
            source: source.into(),
        }
    }

    pub fn log_start(&self, stage: &str) {
        info!(delivery_id = %self.delivery_id, source = %self.source, stage, "Stage started");
    }

    pub fn log_completion(&self, stage: &str, elapsed_ms: u128) {
        info!(
            delivery_id = %self.delivery_id,
            source = %self.source,
            stage,
            elapsed_ms,
            "Stage completed"
        );
    }

    /// Insufficient evidence. Expected and common, so a warning rather than an error.
    pub fn log_insufficient(&self, stage: &str, reason: &str) {
        warn!(delivery_id = %self.delivery_id, source = %self.source, stage, reason, "Insufficient data");
    }

    pub fn log_error(&self, stage: &str, message: &str) {
        error!(delivery_id = %self.delivery_id, source = %self.source, stage, "Stage failed: {}", message);
    }

    pub fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("delivery", delivery_id = %self.delivery_id, source = %self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_ids() {
        let a = DeliveryLogger::new("clip.mp4");
        let b = DeliveryLogger::new("clip.mp4");
        assert_ne!(a.delivery_id(), b.delivery_id());
        assert_eq!(a.source(), "clip.mp4");

        let fixed = DeliveryLogger::with_id("d-1", "net-session");
        assert_eq!(fixed.delivery_id(), "d-1");
    }
}
