//! In-process statistics for the risk scoring service.

use crate::error::RiskError;
use crate::types::assessment::RiskTier;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Counters and distributions for scored borrowers
pub struct AssessmentMetrics {
    /// Borrowers scored successfully
    pub assessed: AtomicU64,
    pub validation_failures: AtomicU64,
    pub schema_failures: AtomicU64,
    pub inference_failures: AtomicU64,
    /// Indexed by `RiskTier as usize`
    tiers: [AtomicU64; 3],
    /// Recent request latencies in microseconds
    latencies: RwLock<Vec<u64>>,
    /// Probability histogram, ten buckets of width 0.1
    probability_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl AssessmentMetrics {
    pub fn new() -> Self {
        Self {
            assessed: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            schema_failures: AtomicU64::new(0),
            inference_failures: AtomicU64::new(0),
            tiers: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            latencies: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful assessment
    pub fn record_assessment(&self, elapsed: Duration, probability: f64, tier: RiskTier) {
        self.assessed.fetch_add(1, Ordering::Relaxed);
        self.tiers[tier as usize].fetch_add(1, Ordering::Relaxed);
        self.record_latency(elapsed);

        let bucket = ((probability * 10.0) as usize).min(9);
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a failed assessment by error kind
    pub fn record_failure(&self, elapsed: Duration, error: &RiskError) {
        let counter = match error {
            RiskError::Validation(_) => &self.validation_failures,
            RiskError::SchemaMismatch(_) => &self.schema_failures,
            RiskError::Inference(_) => &self.inference_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.record_latency(elapsed);
    }

    fn record_latency(&self, elapsed: Duration) {
        if let Ok(mut times) = self.latencies.write() {
            times.push(elapsed.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }
    }

    pub fn tier_count(&self, tier: RiskTier) -> u64 {
        self.tiers[tier as usize].load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.validation_failures.load(Ordering::Relaxed)
            + self.schema_failures.load(Ordering::Relaxed)
            + self.inference_failures.load(Ordering::Relaxed)
    }

    /// Get latency statistics
    pub fn latency_stats(&self) -> LatencyStats {
        let Ok(times) = self.latencies.read() else {
            return LatencyStats::default();
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = times.clone();
        drop(times);
        sorted.sort_unstable();

        let count = sorted.len();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    pub fn probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|b| *b)
            .unwrap_or_default()
    }

    /// Assessments per second since startup
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.assessed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn log_summary(&self) {
        let assessed = self.assessed.load(Ordering::Relaxed);
        let latency = self.latency_stats();

        info!(
            assessed = assessed,
            failed = self.failure_count(),
            validation_failures = self.validation_failures.load(Ordering::Relaxed),
            schema_failures = self.schema_failures.load(Ordering::Relaxed),
            inference_failures = self.inference_failures.load(Ordering::Relaxed),
            throughput = format!("{:.1}/s", self.throughput()),
            "Assessment summary"
        );
        info!(
            low = self.tier_count(RiskTier::Low),
            medium = self.tier_count(RiskTier::Medium),
            high = self.tier_count(RiskTier::High),
            "Assessments by risk tier"
        );
        info!(
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p95_us = latency.p95_us,
            p99_us = latency.p99_us,
            max_us = latency.max_us,
            "Assessment latency"
        );

        let distribution = self.probability_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let pct = count as f64 / total as f64 * 100.0;
            info!(
                bucket = format!("{:.1}-{:.1}", i as f64 / 10.0, (i + 1) as f64 / 10.0),
                count = count,
                share = format!("{:.1}%", pct),
                "Probability distribution"
            );
        }
    }
}

impl Default for AssessmentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Logs a metrics summary on a fixed interval
pub struct MetricsReporter {
    metrics: Arc<AssessmentMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<AssessmentMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.log_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_metrics_recording() {
        let metrics = AssessmentMetrics::new();

        metrics.record_assessment(Duration::from_micros(100), 0.12, RiskTier::Low);
        metrics.record_assessment(Duration::from_micros(300), 0.95, RiskTier::High);
        metrics.record_assessment(Duration::from_micros(200), 1.0, RiskTier::High);
        metrics.record_failure(
            Duration::from_micros(50),
            &RiskError::Validation(ValidationError::Malformed("x".to_string())),
        );

        assert_eq!(metrics.assessed.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.tier_count(RiskTier::High), 2);
        assert_eq!(metrics.tier_count(RiskTier::Medium), 0);
        assert_eq!(metrics.failure_count(), 1);

        let distribution = metrics.probability_distribution();
        assert_eq!(distribution[1], 1);
        // probability 1.0 lands in the last bucket
        assert_eq!(distribution[9], 2);
    }

    #[test]
    fn test_latency_stats() {
        let metrics = AssessmentMetrics::new();
        assert_eq!(metrics.latency_stats(), LatencyStats::default());

        for us in [100, 200, 300, 400] {
            metrics.record_assessment(Duration::from_micros(us), 0.5, RiskTier::Medium);
        }

        let stats = metrics.latency_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
        assert_eq!(stats.p99_us, 400);
    }
}
