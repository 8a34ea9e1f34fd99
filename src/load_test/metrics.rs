// Request outcome accounting and response-time statistics.

use std::time::Duration;

use serde::Serialize;

/// Outcomes of one simulated user, or of a whole run once merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceMetrics {
    /// Seconds, successful requests only.
    response_times: Vec<f64>,
    pub success_count: usize,
    pub error_count: usize,
    pub timeout_count: usize,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, elapsed: Duration) {
        self.response_times.push(elapsed.as_secs_f64());
        self.success_count += 1;
    }

    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    pub fn record_timeout(&mut self) {
        self.timeout_count += 1;
    }

    pub fn merge(&mut self, other: PerformanceMetrics) {
        self.response_times.extend(other.response_times);
        self.success_count += other.success_count;
        self.error_count += other.error_count;
        self.timeout_count += other.timeout_count;
    }

    pub fn total(&self) -> usize {
        self.success_count + self.error_count + self.timeout_count
    }

    pub fn response_times(&self) -> &[f64] {
        &self.response_times
    }

    pub fn statistics(&self, duration: Duration) -> Statistics {
        let total = self.total();
        let duration_seconds = duration.as_secs_f64();
        Statistics {
            total_requests: total,
            success_count: self.success_count,
            error_count: self.error_count,
            timeout_count: self.timeout_count,
            success_rate: if total > 0 {
                self.success_count as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            duration_seconds,
            requests_per_second: if duration_seconds > 0.0 {
                total as f64 / duration_seconds
            } else {
                0.0
            },
            response_time: ResponseTimeStats::from_samples(&self.response_times),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_requests: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub timeout_count: usize,
    /// Percent of all requests.
    pub success_rate: f64,
    pub duration_seconds: f64,
    pub requests_per_second: f64,
    /// Absent when no request succeeded.
    pub response_time: Option<ResponseTimeStats>,
}

/// Seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTimeStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub p99: f64,
}

impl ResponseTimeStats {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let len = sorted.len();
        let median = if len % 2 == 1 {
            sorted[len / 2]
        } else {
            (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
        };
        Some(Self {
            mean: sorted.iter().sum::<f64>() / len as f64,
            median,
            min: sorted[0],
            max: sorted[len - 1],
            p95: cut_point(&sorted, 20, 19),
            p99: cut_point(&sorted, 100, 99),
        })
    }
}

/// The `i`-th of the `n - 1` cut points dividing `sorted` into `n` groups,
/// interpolated over the `len + 1` exclusive positions. Points past either
/// end extrapolate from the two nearest samples.
pub fn cut_point(sorted: &[f64], n: usize, i: usize) -> f64 {
    let len = sorted.len();
    if len == 1 {
        return sorted[0];
    }
    let (n, i, m) = (n as i64, i as i64, len as i64 + 1);
    let j = (i * m / n).clamp(1, len as i64 - 1);
    let delta = (i * m - j * n) as f64;
    let n = n as f64;
    let (lo, hi) = (sorted[j as usize - 1], sorted[j as usize]);
    (lo * (n - delta) + hi * delta) / n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn counts_and_rates() {
        let mut m = PerformanceMetrics::new();
        for _ in 0..3 {
            m.record_success(Duration::from_millis(100));
        }
        m.record_error();
        let s = m.statistics(Duration::from_secs(2));
        assert_eq!(s.total_requests, 4);
        assert_eq!(s.success_rate, 75.0);
        assert_eq!(s.requests_per_second, 2.0);
        assert!(close(s.response_time.unwrap().mean, 0.1));
    }

    #[test]
    fn no_successes_means_no_timing() {
        let mut m = PerformanceMetrics::new();
        m.record_timeout();
        let s = m.statistics(Duration::ZERO);
        assert_eq!(s.success_rate, 0.0);
        assert_eq!(s.requests_per_second, 0.0);
        assert!(s.response_time.is_none());
    }

    #[test]
    fn exclusive_percentiles() {
        let data: Vec<f64> = (1..=10).map(f64::from).collect();
        let r = ResponseTimeStats::from_samples(&data).unwrap();
        assert!(close(r.p95, 10.45));
        assert!(close(r.p99, 10.89));
        assert!(close(r.median, 5.5));
        assert_eq!((r.min, r.max), (1.0, 10.0));
    }

    #[test]
    fn percentiles_inside_the_range() {
        let data: Vec<f64> = (1..=100).map(f64::from).collect();
        // 19 * 101 / 20 = 95.95
        assert!(close(cut_point(&data, 20, 19), 95.95));
        assert!(close(cut_point(&data, 100, 99), 99.99));
    }

    #[test]
    fn single_sample_is_every_percentile() {
        let r = ResponseTimeStats::from_samples(&[0.25]).unwrap();
        assert_eq!((r.p95, r.p99, r.median), (0.25, 0.25, 0.25));
    }

    #[test]
    fn merge_sums_everything() {
        let mut a = PerformanceMetrics::new();
        a.record_success(Duration::from_secs(1));
        let mut b = PerformanceMetrics::new();
        b.record_success(Duration::from_secs(3));
        b.record_timeout();
        a.merge(b);
        assert_eq!(a.total(), 3);
        assert_eq!(a.response_times(), &[1.0, 3.0]);
    }
}
