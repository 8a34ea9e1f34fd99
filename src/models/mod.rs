// Domain models: raw per-source samples and the unified output rows.

mod record;
mod sample;

pub use record::{CompositeRecord, ContainerRecord};
pub use sample::{
    ContainerMeasurement, ContainerSample, CpuSample, DiskSample, Identified, MemorySample,
    NetworkSample,
};

/// Epoch seconds; the join key across all sources.
pub type Timestamp = i64;

/// Bytes per block in `bread/s` / `bwrtn/s` columns.
pub const DISK_BLOCK_BYTES: f64 = 512.0;

/// Bytes per kilobyte in `rxkB/s` / `txkB/s` columns.
pub const NET_KILOBYTE_BYTES: f64 = 1024.0;
