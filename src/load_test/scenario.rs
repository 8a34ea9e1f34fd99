// Load profiles: how many users, how many requests each, how fast.

use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    #[default]
    Light,
    Medium,
    Heavy,
    Stress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioProfile {
    pub name: &'static str,
    pub users: usize,
    pub requests_per_user: usize,
    /// Pause between a user's consecutive requests.
    #[serde(with = "secs_f64")]
    pub interval: Duration,
}

impl Scenario {
    pub fn profile(self) -> ScenarioProfile {
        let (name, users, requests_per_user, interval_ms) = match self {
            Scenario::Light => ("light", 5, 20, 2000),
            Scenario::Medium => ("medium", 20, 50, 1000),
            Scenario::Heavy => ("heavy", 50, 100, 500),
            Scenario::Stress => ("stress", 100, 200, 100),
        };
        ScenarioProfile {
            name,
            users,
            requests_per_user,
            interval: Duration::from_millis(interval_ms),
        }
    }
}

impl ScenarioProfile {
    pub fn total_requests(&self) -> usize {
        self.users * self.requests_per_user
    }
}

mod secs_f64 {
    use std::time::Duration;

    pub fn serialize<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
