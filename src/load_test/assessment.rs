// Threshold checks over run statistics.

use serde::Serialize;

use super::metrics::Statistics;

const MIN_SUCCESS_RATE: f64 = 95.0;
const MAX_MEAN_SECS: f64 = 1.0;
const MAX_P95_SECS: f64 = 2.0;
const MIN_REQUESTS_PER_SEC: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    LowSuccessRate,
    HighMeanResponseTime,
    HighP95ResponseTime,
    LowThroughput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    pub recommendation: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Assessment {
    pub issues: Vec<Issue>,
}

impl Assessment {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

pub fn assess(stats: &Statistics) -> Assessment {
    let mut issues = Vec::new();

    if stats.success_rate < MIN_SUCCESS_RATE {
        issues.push(Issue {
            kind: IssueKind::LowSuccessRate,
            message: format!("Low success rate: {:.2}%", stats.success_rate),
            recommendation: "Investigate error logs and increase resource allocation",
        });
    }
    if let Some(rt) = &stats.response_time {
        if rt.mean > MAX_MEAN_SECS {
            issues.push(Issue {
                kind: IssueKind::HighMeanResponseTime,
                message: format!("High average response time: {:.2}s", rt.mean),
                recommendation: "Consider caching, database indexing, or horizontal scaling",
            });
        }
        if rt.p95 > MAX_P95_SECS {
            issues.push(Issue {
                kind: IssueKind::HighP95ResponseTime,
                message: format!("High 95th percentile: {:.2}s", rt.p95),
                recommendation: "Optimize slow queries and add database connection pooling",
            });
        }
    }
    if stats.requests_per_second < MIN_REQUESTS_PER_SEC {
        issues.push(Issue {
            kind: IssueKind::LowThroughput,
            message: format!("Low throughput: {:.2} req/s", stats.requests_per_second),
            recommendation: "Review application bottlenecks and consider async processing",
        });
    }

    Assessment { issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_test::metrics::ResponseTimeStats;

    fn stats(success_rate: f64, rps: f64, mean: f64, p95: f64) -> Statistics {
        Statistics {
            total_requests: 100,
            success_count: success_rate as usize,
            error_count: 100 - success_rate as usize,
            timeout_count: 0,
            success_rate,
            duration_seconds: 1.0,
            requests_per_second: rps,
            response_time: Some(ResponseTimeStats {
                mean,
                median: mean,
                min: mean,
                max: p95,
                p95,
                p99: p95,
            }),
        }
    }

    #[test]
    fn healthy_run_has_no_issues() {
        assert!(assess(&stats(100.0, 50.0, 0.1, 0.2)).is_healthy());
    }

    #[test]
    fn every_threshold_is_checked() {
        let a = assess(&stats(90.0, 5.0, 1.5, 2.5));
        assert_eq!(a.issues.len(), 4);
        assert!(a.has(IssueKind::LowSuccessRate));
        assert!(a.has(IssueKind::HighMeanResponseTime));
        assert!(a.has(IssueKind::HighP95ResponseTime));
        assert!(a.has(IssueKind::LowThroughput));
    }

    #[test]
    fn thresholds_are_exclusive() {
        assert!(assess(&stats(95.0, 10.0, 1.0, 2.0)).is_healthy());
    }
}
