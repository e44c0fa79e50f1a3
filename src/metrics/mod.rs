//! Operation Metrics
//!
//! Counters describing how a deque is being used: how many operations ran,
//! how many failed (teardown, allocation failure, empty `try_pop_*`), how many
//! had to wait on a condition variable, and how long operations took,
//! waiting included.
//!
//! Collection is compiled in with the `metrics` feature (on by default) and can
//! be switched off per deque at runtime through [`MetricsCollector`].

#[cfg(feature = "metrics")]
use core::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Snapshot of a deque's operation counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PerformanceMetrics {
    /// Total number of operations performed
    pub total_operations: u64,
    /// Number of operations that succeeded
    pub successful_operations: u64,
    /// Number of operations that failed or came back empty
    pub failed_operations: u64,
    /// Number of operations that waited on a condition variable
    pub contended_operations: u64,
    /// Average operation time in nanoseconds
    pub avg_operation_time_ns: u64,
    /// Maximum operation time in nanoseconds
    pub max_operation_time_ns: u64,
}

impl PerformanceMetrics {
    /// Success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        self.rate(self.successful_operations)
    }

    /// Contention rate as a percentage
    pub fn contention_rate(&self) -> f64 {
        self.rate(self.contended_operations)
    }

    /// Failure rate as a percentage
    pub fn failure_rate(&self) -> f64 {
        self.rate(self.failed_operations)
    }

    /// Average operation time
    pub fn avg_operation_time(&self) -> Duration {
        Duration::from_nanos(self.avg_operation_time_ns)
    }

    /// Maximum operation time
    pub fn max_operation_time(&self) -> Duration {
        Duration::from_nanos(self.max_operation_time_ns)
    }

    fn rate(&self, count: u64) -> f64 {
        if self.total_operations == 0 {
            0.0
        } else {
            (count as f64 / self.total_operations as f64) * 100.0
        }
    }
}

/// Internal atomic counters
#[cfg(feature = "metrics")]
#[cfg_attr(feature = "unstable", doc(cfg(feature = "metrics")))]
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    total_operations: AtomicU64,
    successful_operations: AtomicU64,
    failed_operations: AtomicU64,
    contended_operations: AtomicU64,
    total_time_ns: AtomicU64,
    max_time_ns: AtomicU64,
}

#[cfg(feature = "metrics")]
impl AtomicMetrics {
    /// Record a successful operation with its duration
    pub fn record_success(&self, duration: Duration) {
        let duration_ns = duration.as_nanos().min(u64::MAX as u128) as u64;

        self.total_operations.fetch_add(1, Ordering::Relaxed);
        self.successful_operations.fetch_add(1, Ordering::Relaxed);
        self.total_time_ns.fetch_add(duration_ns, Ordering::Relaxed);
        self.max_time_ns.fetch_max(duration_ns, Ordering::Relaxed);
    }

    /// Record a failed operation
    pub fn record_failure(&self) {
        self.total_operations.fetch_add(1, Ordering::Relaxed);
        self.failed_operations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an operation that had to wait before proceeding
    pub fn record_contention(&self) {
        self.contended_operations.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counters
    pub fn snapshot(&self) -> PerformanceMetrics {
        let total_ops = self.total_operations.load(Ordering::Relaxed);
        let successful_ops = self.successful_operations.load(Ordering::Relaxed);
        let total_time = self.total_time_ns.load(Ordering::Relaxed);

        PerformanceMetrics {
            total_operations: total_ops,
            successful_operations: successful_ops,
            failed_operations: self.failed_operations.load(Ordering::Relaxed),
            contended_operations: self.contended_operations.load(Ordering::Relaxed),
            // Timing is only taken for successful operations.
            avg_operation_time_ns: if successful_ops > 0 {
                total_time / successful_ops
            } else {
                0
            },
            max_operation_time_ns: self.max_time_ns.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.total_operations.store(0, Ordering::Relaxed);
        self.successful_operations.store(0, Ordering::Relaxed);
        self.failed_operations.store(0, Ordering::Relaxed);
        self.contended_operations.store(0, Ordering::Relaxed);
        self.total_time_ns.store(0, Ordering::Relaxed);
        self.max_time_ns.store(0, Ordering::Relaxed);
    }
}

/// Trait for data structures that report [`PerformanceMetrics`]
pub trait MetricsCollector {
    /// Current counters
    fn metrics(&self) -> PerformanceMetrics;

    /// Zero all counters
    fn reset_metrics(&self);

    /// Enable or disable collection
    fn set_metrics_enabled(&self, enabled: bool);

    /// Whether collection is enabled
    fn is_metrics_enabled(&self) -> bool;
}

/// No-op counters used when the `metrics` feature is disabled
#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct AtomicMetrics;

#[cfg(not(feature = "metrics"))]
#[allow(missing_docs)]
impl AtomicMetrics {
    pub fn record_success(&self, _duration: Duration) {}
    pub fn record_failure(&self) {}
    pub fn record_contention(&self) {}
    pub fn snapshot(&self) -> PerformanceMetrics {
        PerformanceMetrics::default()
    }
    pub fn reset(&self) {}
}
