use std::fmt;
use std::time::{Duration, Instant};

use serde::Deserialize;

/// The two downstream processors, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorId {
    Default,
    Fallback,
}

impl ProcessorId {
    pub const ALL: [ProcessorId; 2] = [ProcessorId::Default, ProcessorId::Fallback];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorId::Default => "default",
            ProcessorId::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `GET /payments/service-health` on a processor.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HealthCheckResponse {
    pub failing: bool,
    #[serde(rename = "minResponseTime")]
    pub min_response_time: i64,
}

/// Cached health verdict for one processor. Starts unchecked and unhealthy
/// so the first `is_healthy` call always probes.
#[derive(Debug, Clone, Copy)]
pub struct HealthEntry {
    pub last_checked_at: Option<Instant>,
    pub healthy: bool,
}

impl HealthEntry {
    pub fn new() -> Self {
        HealthEntry {
            last_checked_at: None,
            healthy: false,
        }
    }

    /// Whether the cached verdict is still inside the TTL window.
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        match self.last_checked_at {
            Some(checked) => now.duration_since(checked) < ttl,
            None => false,
        }
    }
}

impl Default for HealthEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_response_deserializes_wire_names() {
        let health: HealthCheckResponse =
            serde_json::from_str(r#"{"failing":false,"minResponseTime":120}"#).unwrap();
        assert!(!health.failing);
        assert_eq!(health.min_response_time, 120);
    }

    #[test]
    fn fresh_entry_holds_until_ttl_elapses() {
        let now = Instant::now();
        let entry = HealthEntry {
            last_checked_at: Some(now),
            healthy: true,
        };
        let ttl = Duration::from_secs(5);

        assert!(entry.is_fresh(ttl, now + Duration::from_secs(4)));
        assert!(!entry.is_fresh(ttl, now + Duration::from_secs(5)));
    }

    #[test]
    fn unchecked_entry_is_stale_and_unhealthy() {
        let entry = HealthEntry::new();
        assert!(!entry.healthy);
        assert!(!entry.is_fresh(Duration::from_secs(5), Instant::now()));
    }
}
