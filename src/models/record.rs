// Output rows: the unified host record and the per-container record.

use super::Timestamp;
use crate::emit::CsvRow;

/// One row of the unified time series. Every field always carries a value;
/// a source without data for this timestamp leaves its fields at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeRecord {
    pub timestamp: Timestamp,
    pub cpu_user: f64,
    pub cpu_system: f64,
    pub cpu_idle: f64,
    pub cpu_iowait: f64,
    pub cpu_steal: f64,
    pub mem_total_kb: i64,
    pub mem_used_kb: i64,
    pub mem_free_kb: i64,
    pub mem_cached_kb: i64,
    pub disk_read_bytes: i64,
    pub disk_write_bytes: i64,
    pub net_rx_bytes: i64,
    pub net_tx_bytes: i64,
}

impl CompositeRecord {
    pub fn zeroed(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            ..Default::default()
        }
    }
}

impl CsvRow for CompositeRecord {
    const HEADER: &'static [&'static str] = &[
        "timestamp",
        "cpu_user",
        "cpu_system",
        "cpu_idle",
        "cpu_iowait",
        "cpu_steal",
        "mem_total_kb",
        "mem_used_kb",
        "mem_free_kb",
        "mem_cached_kb",
        "disk_read_bytes",
        "disk_write_bytes",
        "net_rx_bytes",
        "net_tx_bytes",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.timestamp.to_string(),
            self.cpu_user.to_string(),
            self.cpu_system.to_string(),
            self.cpu_idle.to_string(),
            self.cpu_iowait.to_string(),
            self.cpu_steal.to_string(),
            self.mem_total_kb.to_string(),
            self.mem_used_kb.to_string(),
            self.mem_free_kb.to_string(),
            self.mem_cached_kb.to_string(),
            self.disk_read_bytes.to_string(),
            self.disk_write_bytes.to_string(),
            self.net_rx_bytes.to_string(),
            self.net_tx_bytes.to_string(),
        ]
    }
}

/// One container at one timestamp, with CPU counters already turned into percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRecord {
    pub timestamp: Timestamp,
    pub container_id: String,
    pub container_name: String,
    pub runtime: String,
    pub cpu_percent: f64,
    pub cpu_user_percent: f64,
    pub cpu_system_percent: f64,
    pub memory_current_bytes: u64,
    pub memory_max_bytes: u64,
    pub memory_percent: f64,
    pub io_read_bytes: u64,
    pub io_write_bytes: u64,
    pub io_read_ops: u64,
    pub io_write_ops: u64,
    pub pids_current: u64,
}

impl CsvRow for ContainerRecord {
    const HEADER: &'static [&'static str] = &[
        "timestamp",
        "container_id",
        "container_name",
        "runtime",
        "cpu_percent",
        "cpu_user_percent",
        "cpu_system_percent",
        "memory_current_bytes",
        "memory_max_bytes",
        "memory_percent",
        "io_read_bytes",
        "io_write_bytes",
        "io_read_ops",
        "io_write_ops",
        "pids_current",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.timestamp.to_string(),
            self.container_id.clone(),
            self.container_name.clone(),
            self.runtime.clone(),
            format!("{:.2}", self.cpu_percent),
            format!("{:.2}", self.cpu_user_percent),
            format!("{:.2}", self.cpu_system_percent),
            self.memory_current_bytes.to_string(),
            self.memory_max_bytes.to_string(),
            format!("{:.2}", self.memory_percent),
            self.io_read_bytes.to_string(),
            self.io_write_bytes.to_string(),
            self.io_read_ops.to_string(),
            self.io_write_ops.to_string(),
            self.pids_current.to_string(),
        ]
    }
}
