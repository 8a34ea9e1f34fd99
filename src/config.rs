use serde::Deserialize;

use crate::rates::DEFAULT_CPU_PERCENT_CAP;

/// Every section and field is optional; an empty file is a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub selection: SelectionConfig,
    pub rates: RatesConfig,
    pub load_test: LoadTestConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Device used when none is given on the command line.
    pub disk_device: String,
    pub net_interface: String,
    /// Identifiers of the all-cores row, in order of preference.
    pub cpu_aggregate_ids: Vec<String>,
    /// Devices skipped by the merge tool's fallback (loopback, ramdisks, device-mapper).
    pub excluded_disk_prefixes: Vec<String>,
    pub excluded_interface_prefixes: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            disk_device: "sda".into(),
            net_interface: "eth0".into(),
            cpu_aggregate_ids: vec!["-1".into(), "0".into()],
            excluded_disk_prefixes: ["loop", "ram", "zram", "dm-", "sr", "fd"]
                .map(String::from)
                .to_vec(),
            excluded_interface_prefixes: ["lo", "docker", "veth", "br-", "virbr"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    /// Upper bound for derived CPU-time percentages (100 per core).
    pub cpu_percent_cap: f64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            cpu_percent_cap: DEFAULT_CPU_PERCENT_CAP,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadTestConfig {
    pub url: String,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
    /// Paths requested round-robin by every simulated user.
    pub endpoints: Vec<String>,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".into(),
            request_timeout_secs: 10,
            health_timeout_secs: 5,
            endpoints: ["/health/", "/collectors/manage", "/auth/login/"]
                .map(String::from)
                .to_vec(),
        }
    }
}

const DEFAULT_CONFIG_PATH: &str = "perfpipe.toml";

impl AppConfig {
    /// `CONFIG_FILE` if set (must exist), else `perfpipe.toml` when present, else defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = match std::env::var("CONFIG_FILE") {
            Ok(p) => p,
            Err(_) if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
                DEFAULT_CONFIG_PATH.into()
            }
            Err(_) => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
        };
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.selection.disk_device.is_empty(),
            "selection.disk_device must be non-empty"
        );
        anyhow::ensure!(
            !self.selection.net_interface.is_empty(),
            "selection.net_interface must be non-empty"
        );
        anyhow::ensure!(
            !self.selection.cpu_aggregate_ids.is_empty(),
            "selection.cpu_aggregate_ids must be non-empty"
        );
        anyhow::ensure!(
            self.rates.cpu_percent_cap > 0.0,
            "rates.cpu_percent_cap must be > 0, got {}",
            self.rates.cpu_percent_cap
        );
        anyhow::ensure!(
            !self.load_test.url.is_empty(),
            "load_test.url must be non-empty"
        );
        anyhow::ensure!(
            self.load_test.request_timeout_secs > 0,
            "load_test.request_timeout_secs must be > 0, got {}",
            self.load_test.request_timeout_secs
        );
        anyhow::ensure!(
            self.load_test.health_timeout_secs > 0,
            "load_test.health_timeout_secs must be > 0, got {}",
            self.load_test.health_timeout_secs
        );
        anyhow::ensure!(
            !self.load_test.endpoints.is_empty(),
            "load_test.endpoints must be non-empty"
        );
        Ok(())
    }
}
