// Load generation: concurrent simulated users against an HTTP target.
//
// Users are futures on one task; each owns its metrics and hands them back
// when done. Nothing is shared while requests are in flight.

pub mod assessment;
pub mod metrics;
pub mod probe;
pub mod scenario;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::time::{Instant, sleep, timeout};

use crate::config::LoadTestConfig;
use crate::emit;
use assessment::{Assessment, assess};
use metrics::{PerformanceMetrics, Statistics};
use probe::Probe;
use scenario::ScenarioProfile;

pub use probe::{HttpProbe, ProbeError};
pub use scenario::Scenario;

pub const HEALTH_PATH: &str = "/health/";

#[derive(Debug, Error)]
pub enum LoadTestError {
    #[error("health check failed for {url}: {reason}")]
    HealthCheck { url: String, reason: String },

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Request timing knobs, independent of the scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub url: String,
    pub endpoints: Vec<String>,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
}

impl From<&LoadTestConfig> for RunSettings {
    fn from(cfg: &LoadTestConfig) -> Self {
        Self {
            url: cfg.url.clone(),
            endpoints: cfg.endpoints.clone(),
            request_timeout: Duration::from_secs(cfg.request_timeout_secs),
            health_timeout: Duration::from_secs(cfg.health_timeout_secs),
        }
    }
}

/// Status codes counted as success; 302 is a login redirect, not a failure.
fn is_success(status: u16) -> bool {
    matches!(status, 200 | 302)
}

pub async fn health_check<P: Probe>(
    probe: &P,
    settings: &RunSettings,
) -> Result<(), LoadTestError> {
    let failed = |reason: String| LoadTestError::HealthCheck {
        url: format!("{}{}", settings.url, HEALTH_PATH),
        reason,
    };
    match timeout(settings.health_timeout, probe.get(HEALTH_PATH)).await {
        Ok(Ok(200)) => Ok(()),
        Ok(Ok(status)) => Err(failed(format!("status {status}"))),
        Ok(Err(e)) => Err(failed(e.to_string())),
        Err(_) => Err(failed(format!(
            "no response within {:?}",
            settings.health_timeout
        ))),
    }
}

async fn simulate_user<P: Probe>(
    probe: &P,
    user: usize,
    profile: &ScenarioProfile,
    settings: &RunSettings,
) -> PerformanceMetrics {
    let mut metrics = PerformanceMetrics::new();
    for i in 0..profile.requests_per_user {
        let path = settings
            .endpoints
            .get(i % settings.endpoints.len().max(1))
            .map_or(HEALTH_PATH, String::as_str);
        let start = Instant::now();
        match timeout(settings.request_timeout, probe.get(path)).await {
            Ok(Ok(status)) if is_success(status) => metrics.record_success(start.elapsed()),
            Ok(Ok(status)) => {
                tracing::debug!(user, path = %path, status, "unexpected status");
                metrics.record_error();
            }
            Ok(Err(e)) => {
                tracing::debug!(user, path = %path, error = %e, "request failed");
                metrics.record_error();
            }
            Err(_) => metrics.record_timeout(),
        }
        if i + 1 < profile.requests_per_user {
            sleep(profile.interval).await;
        }
    }
    metrics
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadTestReport {
    pub scenario: ScenarioProfile,
    pub url: String,
    pub started_at: String,
    pub statistics: Statistics,
    pub assessment: Assessment,
}

impl LoadTestReport {
    pub fn write_json(&self, path: &Path) -> crate::error::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| {
            crate::error::PipelineError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;
        emit::write_atomic(path, &json)
    }
}

/// Health check, then every user concurrently, then one merged report.
pub async fn run<P: Probe>(
    probe: &P,
    profile: &ScenarioProfile,
    settings: &RunSettings,
) -> Result<LoadTestReport, LoadTestError> {
    health_check(probe, settings).await?;

    let started_at = chrono::Local::now().to_rfc3339();
    tracing::info!(
        scenario = profile.name,
        users = profile.users,
        requests_per_user = profile.requests_per_user,
        url = %settings.url,
        "load test started"
    );
    let start = Instant::now();
    let per_user = join_all(
        (0..profile.users).map(|user| simulate_user(probe, user, profile, settings)),
    )
    .await;
    let duration = start.elapsed();

    let mut metrics = PerformanceMetrics::new();
    for m in per_user {
        metrics.merge(m);
    }
    let statistics = metrics.statistics(duration);
    let assessment = assess(&statistics);
    tracing::info!(
        total = statistics.total_requests,
        errors = statistics.error_count,
        timeouts = statistics.timeout_count,
        "load test finished"
    );

    Ok(LoadTestReport {
        scenario: profile.clone(),
        url: settings.url.clone(),
        started_at,
        statistics,
        assessment,
    })
}

impl fmt::Display for LoadTestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(70);
        let s = &self.statistics;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "LOAD TEST RESULTS: {} ({} users x {} requests)",
            self.scenario.name.to_uppercase(),
            self.scenario.users,
            self.scenario.requests_per_user
        )?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total Requests:        {}", s.total_requests)?;
        writeln!(
            f,
            "Successful:            {} ({:.2}%)",
            s.success_count, s.success_rate
        )?;
        writeln!(f, "Errors:                {}", s.error_count)?;
        writeln!(f, "Timeouts:              {}", s.timeout_count)?;
        writeln!(f, "Duration:              {:.2} seconds", s.duration_seconds)?;
        writeln!(f, "Requests/Second:       {:.2}", s.requests_per_second)?;
        if let Some(rt) = &s.response_time {
            writeln!(f, "Response Time Statistics (seconds):")?;
            writeln!(f, "  Average:             {:.4}", rt.mean)?;
            writeln!(f, "  Median:              {:.4}", rt.median)?;
            writeln!(f, "  Min:                 {:.4}", rt.min)?;
            writeln!(f, "  Max:                 {:.4}", rt.max)?;
            writeln!(f, "  95th Percentile:     {:.4}", rt.p95)?;
            writeln!(f, "  99th Percentile:     {:.4}", rt.p99)?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f, "PERFORMANCE ASSESSMENT")?;
        if self.assessment.is_healthy() {
            writeln!(f, "Performance is within acceptable ranges")?;
        } else {
            writeln!(f, "Issues detected:")?;
            for issue in &self.assessment.issues {
                writeln!(f, "  - {}", issue.message)?;
            }
            writeln!(f, "Recommendations:")?;
            for issue in &self.assessment.issues {
                writeln!(f, "  - {}", issue.recommendation)?;
            }
        }
        write!(f, "{rule}")
    }
}
