// Load harness against a scripted probe and a local HTTP server

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::routing::get;
use perfpipe::load_test::assessment::IssueKind;
use perfpipe::load_test::probe::Probe;
use perfpipe::load_test::scenario::ScenarioProfile;
use perfpipe::load_test::{self, HttpProbe, LoadTestError, ProbeError, RunSettings};

/// `/health/` is fine, `/slow` never answers in time, `/broken` is a 500, `/down` a transport error.
struct ScriptedProbe {
    health_status: u16,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    fn new(health_status: u16) -> Self {
        Self {
            health_status,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn get(&self, path: &str) -> Result<u16, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match path {
            "/health/" => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(self.health_status)
            }
            "/login" => Ok(302),
            "/slow" => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(200)
            }
            "/broken" => Ok(500),
            _ => Err(ProbeError::Transport("connection refused".into())),
        }
    }
}

fn settings(endpoints: &[&str]) -> RunSettings {
    RunSettings {
        url: "http://test".into(),
        endpoints: endpoints.iter().map(|s| s.to_string()).collect(),
        request_timeout: Duration::from_secs(10),
        health_timeout: Duration::from_secs(5),
    }
}

fn profile(users: usize, requests_per_user: usize) -> ScenarioProfile {
    ScenarioProfile {
        name: "test",
        users,
        requests_per_user,
        interval: Duration::from_secs(1),
    }
}

#[tokio::test(start_paused = true)]
async fn test_outcomes_are_counted_per_kind() {
    let probe = ScriptedProbe::new(200);
    let endpoints = ["/health/", "/login", "/slow", "/broken", "/down"];
    let report = load_test::run(&probe, &profile(3, 5), &settings(&endpoints))
        .await
        .unwrap();

    let s = &report.statistics;
    assert_eq!(s.total_requests, 15);
    assert_eq!(s.success_count, 6);
    assert_eq!(s.timeout_count, 3);
    assert_eq!(s.error_count, 6);
    assert_eq!(s.success_rate, 40.0);
    // one health check plus every request
    assert_eq!(probe.calls.load(Ordering::SeqCst), 16);

    let rt = s.response_time.as_ref().unwrap();
    assert_eq!(rt.min, 0.0);
    assert!((0.05..0.06).contains(&rt.max), "max {}", rt.max);

    assert!(report.assessment.has(IssueKind::LowSuccessRate));
    assert!(report.assessment.has(IssueKind::LowThroughput));
    assert!(!report.assessment.has(IssueKind::HighMeanResponseTime));
}

#[tokio::test(start_paused = true)]
async fn test_users_run_concurrently_without_trailing_sleep() {
    let probe = ScriptedProbe::new(200);
    let report = load_test::run(&probe, &profile(10, 4), &settings(&["/login"]))
        .await
        .unwrap();
    // three 1 s pauses per user, overlapping across users
    let d = report.statistics.duration_seconds;
    assert!((3.0..3.5).contains(&d), "duration {d}");
    assert_eq!(report.statistics.success_count, 40);
}

#[tokio::test(start_paused = true)]
async fn test_failed_health_check_aborts_the_run() {
    let probe = ScriptedProbe::new(503);
    let err = load_test::run(&probe, &profile(2, 2), &settings(&["/login"]))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadTestError::HealthCheck { .. }));
    assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_health_check_times_out() {
    let probe = ScriptedProbe::new(200);
    let mut s = settings(&["/login"]);
    s.health_timeout = Duration::from_millis(10);
    let err = load_test::health_check(&probe, &s).await.unwrap_err();
    assert!(err.to_string().contains("no response"));
}

#[tokio::test]
async fn test_http_probe_reports_status_without_following_redirects() {
    let app = Router::new()
        .route("/health/", get(|| async { "ok" }))
        .route("/auth/login/", get(|| async { Redirect::to("/elsewhere") }))
        .route("/collectors/manage", get(|| async { StatusCode::FORBIDDEN }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let probe = HttpProbe::new(&format!("http://{addr}/")).unwrap();
    assert_eq!(probe.base_url(), format!("http://{addr}"));
    assert_eq!(probe.get("/health/").await.unwrap(), 200);
    assert_eq!(probe.get("/auth/login/").await.unwrap(), 303);
    assert_eq!(probe.get("/collectors/manage").await.unwrap(), 403);

    let mut s = settings(&["/health/", "/collectors/manage", "/auth/login/"]);
    s.url = format!("http://{addr}");
    s.request_timeout = Duration::from_secs(5);
    let mut quick = profile(2, 3);
    quick.interval = Duration::from_millis(10);
    let report = load_test::run(&probe, &quick, &s).await.unwrap();
    assert_eq!(report.statistics.success_count, 2);
    assert_eq!(report.statistics.error_count, 4);
}

#[tokio::test]
async fn test_http_probe_transport_error() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let probe = HttpProbe::new(&format!("http://{addr}")).unwrap();
    assert!(matches!(probe.get("/health/").await, Err(ProbeError::Transport(_))));
}

#[test]
fn test_report_serializes_to_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("report.json");
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();
    let report = rt
        .block_on(load_test::run(
            &ScriptedProbe::new(200),
            &profile(1, 2),
            &settings(&["/login"]),
        ))
        .unwrap();
    report.write_json(&path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["statistics"]["success_count"], 2);
    assert_eq!(json["scenario"]["interval"], 1.0);
    assert!(json["assessment"]["issues"].is_array());
    assert!(report.to_string().contains("LOAD TEST RESULTS: TEST"));
}
