// Raw observations, one per source row.

use serde::Deserialize;

use super::Timestamp;

/// Anything a row selector can pick by identifier (CPU id, device, interface).
pub trait Identified {
    fn identifier(&self) -> &str;
}

/// One row of the CPU table. Percentages as reported by sar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuSample {
    /// `-1` (or `0`) marks the all-cores aggregate row.
    pub cpu: String,
    pub user: f64,
    pub system: f64,
    pub idle: f64,
    pub iowait: f64,
    pub steal: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySample {
    pub free_kb: f64,
    pub used_kb: f64,
    pub cached_kb: f64,
    pub buffers_kb: f64,
}

impl MemorySample {
    pub fn total_kb(&self) -> f64 {
        self.free_kb + self.used_kb + self.buffers_kb + self.cached_kb
    }
}

/// One block device row; rates in 512-byte blocks per second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskSample {
    pub device: String,
    pub read_blocks_per_sec: f64,
    pub write_blocks_per_sec: f64,
}

/// One interface row; rates in kilobytes per second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkSample {
    pub interface: String,
    pub rx_kb_per_sec: f64,
    pub tx_kb_per_sec: f64,
}

impl Identified for CpuSample {
    fn identifier(&self) -> &str {
        &self.cpu
    }
}

impl Identified for MemorySample {
    fn identifier(&self) -> &str {
        ""
    }
}

impl Identified for DiskSample {
    fn identifier(&self) -> &str {
        &self.device
    }
}

impl Identified for NetworkSample {
    fn identifier(&self) -> &str {
        &self.interface
    }
}

/// Cumulative cgroup counters decoded from the `measurement` JSON string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContainerMeasurement {
    pub container_id: Option<String>,
    pub cpu_usage_usec: u64,
    pub cpu_user_usec: u64,
    pub cpu_system_usec: u64,
    pub memory_current: u64,
    pub memory_max: u64,
    pub io_read_bytes: u64,
    pub io_write_bytes: u64,
    pub io_read_ops: u64,
    pub io_write_ops: u64,
    pub pids_current: u64,
}

/// A measurement with the envelope fields it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSample {
    pub timestamp: Timestamp,
    pub container_id: String,
    /// Runtime segment of `container/<runtime>/<id>` (docker, containerd, ...).
    pub runtime: String,
    pub measurement: ContainerMeasurement,
}
