//! Dispatch metrics.
//!
//! Counts how each operation was settled: by the live backend, by its
//! fallback, or by a rejection.

use crate::bridge::operation::{Operation, OPERATIONS};
use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// How a dispatched request was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Resolved by the live backend
    Live,
    /// Resolved with the operation's fallback
    Fallback,
    /// Rejected with an error code
    Rejected(ErrorCode),
}

/// Per-operation counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStats {
    /// Calls served by the live backend
    pub live: u64,
    /// Calls answered with the fallback
    pub fallback: u64,
    /// Calls rejected
    pub rejected: u64,
}

/// Point-in-time copy of the collector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Total requests dispatched
    pub total_requests: u64,
    /// Requests naming an unregistered channel
    pub unknown_channel: u64,
    /// Average dispatch time in microseconds
    pub avg_dispatch_time_us: f64,
    /// Counters by channel name
    pub operations: HashMap<String, OperationStats>,
}

struct OperationCounters {
    live: AtomicU64,
    fallback: AtomicU64,
    rejected: AtomicU64,
}

impl OperationCounters {
    fn new() -> Self {
        Self {
            live: AtomicU64::new(0),
            fallback: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    fn stats(&self) -> OperationStats {
        OperationStats {
            live: self.live.load(Ordering::Relaxed),
            fallback: self.fallback.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Metrics collector shared by all dispatch tasks
pub struct BridgeMetrics {
    total_requests: AtomicU64,
    unknown_channel: AtomicU64,
    total_dispatch_time_us: AtomicU64,
    // Indexed by `Operation as usize`.
    operations: Vec<OperationCounters>,
    error_counts: parking_lot::Mutex<HashMap<ErrorCode, u64>>,
}

impl BridgeMetrics {
    /// Create a new collector
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            unknown_channel: AtomicU64::new(0),
            total_dispatch_time_us: AtomicU64::new(0),
            operations: OPERATIONS.iter().map(|_| OperationCounters::new()).collect(),
            error_counts: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for a registered operation
    pub fn record(&self, operation: Operation, settlement: Settlement, elapsed: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_dispatch_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);

        let counters = &self.operations[operation as usize];
        match settlement {
            Settlement::Live => {
                counters.live.fetch_add(1, Ordering::Relaxed);
            }
            Settlement::Fallback => {
                counters.fallback.fetch_add(1, Ordering::Relaxed);
            }
            Settlement::Rejected(code) => {
                counters.rejected.fetch_add(1, Ordering::Relaxed);
                self.record_error(code);
            }
        }
    }

    /// Record a request naming an unregistered channel
    pub fn record_unknown_channel(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.unknown_channel.fetch_add(1, Ordering::Relaxed);
        self.record_error(ErrorCode::UnknownOperation);
    }

    fn record_error(&self, code: ErrorCode) {
        *self.error_counts.lock().entry(code).or_insert(0) += 1;
    }

    /// Get total requests
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Get counters for one operation
    pub fn operation(&self, operation: Operation) -> OperationStats {
        self.operations[operation as usize].stats()
    }

    /// Get average dispatch time in microseconds
    pub fn avg_dispatch_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            self.total_dispatch_time_us.load(Ordering::Relaxed) as f64 / total as f64
        }
    }

    /// Get error counts
    pub fn error_counts(&self) -> HashMap<ErrorCode, u64> {
        self.error_counts.lock().clone()
    }

    /// Copy all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests(),
            unknown_channel: self.unknown_channel.load(Ordering::Relaxed),
            avg_dispatch_time_us: self.avg_dispatch_time_us(),
            operations: OPERATIONS
                .iter()
                .map(|spec| (spec.channel.to_string(), self.operation(spec.operation)))
                .collect(),
        }
    }

    /// Export Prometheus-format metrics
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP shell_bridge_requests_total Bridge requests by settlement\n");
        output.push_str("# TYPE shell_bridge_requests_total counter\n");
        for spec in OPERATIONS.iter() {
            let stats = self.operation(spec.operation);
            for (settlement, count) in [
                ("live", stats.live),
                ("fallback", stats.fallback),
                ("rejected", stats.rejected),
            ] {
                output.push_str(&format!(
                    "shell_bridge_requests_total{{channel=\"{}\",settlement=\"{}\"}} {}\n",
                    spec.channel, settlement, count
                ));
            }
        }

        output.push_str(
            "\n# HELP shell_bridge_unknown_channel_total Requests for unregistered channels\n",
        );
        output.push_str("# TYPE shell_bridge_unknown_channel_total counter\n");
        output.push_str(&format!(
            "shell_bridge_unknown_channel_total {}\n",
            self.unknown_channel.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP shell_bridge_dispatch_time_us Average dispatch time\n");
        output.push_str("# TYPE shell_bridge_dispatch_time_us gauge\n");
        output.push_str(&format!(
            "shell_bridge_dispatch_time_us {:.2}\n",
            self.avg_dispatch_time_us()
        ));

        output.push_str("\n# HELP shell_bridge_errors_total Rejections by code\n");
        output.push_str("# TYPE shell_bridge_errors_total counter\n");
        for (code, count) in self.error_counts() {
            output.push_str(&format!(
                "shell_bridge_errors_total{{code=\"{}\"}} {}\n",
                code, count
            ));
        }

        output
    }
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer for measuring dispatch duration
pub struct DispatchTimer {
    start: Instant,
}

impl DispatchTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_settlements() {
        let metrics = BridgeMetrics::new();
        let tick = Duration::from_micros(10);

        metrics.record(Operation::Add, Settlement::Live, tick);
        metrics.record(Operation::Add, Settlement::Fallback, tick);
        metrics.record(
            Operation::Add,
            Settlement::Rejected(ErrorCode::InvalidArgument),
            tick,
        );

        let stats = metrics.operation(Operation::Add);
        assert_eq!(stats, OperationStats { live: 1, fallback: 1, rejected: 1 });
        assert_eq!(metrics.operation(Operation::Hello), OperationStats::default());
        assert_eq!(metrics.total_requests(), 3);
        assert_eq!(metrics.error_counts().get(&ErrorCode::InvalidArgument), Some(&1));
    }

    #[test]
    fn test_unknown_channel() {
        let metrics = BridgeMetrics::new();
        metrics.record_unknown_channel();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.unknown_channel, 1);
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.operations.len(), OPERATIONS.len());
    }

    #[test]
    fn test_avg_dispatch_time() {
        let metrics = BridgeMetrics::new();
        assert_eq!(metrics.avg_dispatch_time_us(), 0.0);
        metrics.record(Operation::Hello, Settlement::Live, Duration::from_micros(10));
        metrics.record(Operation::Hello, Settlement::Live, Duration::from_micros(30));
        assert!((metrics.avg_dispatch_time_us() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_prometheus_output() {
        let metrics = BridgeMetrics::new();
        metrics.record(Operation::SaveConfig, Settlement::Fallback, Duration::ZERO);

        let output = metrics.to_prometheus();
        assert!(output.contains(
            "shell_bridge_requests_total{channel=\"save-config\",settlement=\"fallback\"} 1"
        ));
        assert!(output.contains("shell_bridge_unknown_channel_total 0"));
    }
}
