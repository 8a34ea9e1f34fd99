// Source parsers: one per subsystem table, each producing timestamp -> rows.

pub mod container;
pub mod diskstats;
pub mod meminfo;
pub mod netdev;
pub mod stat;
pub mod table;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::SourceError;
use crate::models::{CpuSample, DiskSample, MemorySample, NetworkSample, Timestamp};
use table::{RawTable, Row};

/// All rows of one subsystem, keyed by timestamp. Rows sharing a timestamp are
/// simultaneous snapshots (one per core, device, interface) in input order.
pub type SourceTable<S> = BTreeMap<Timestamp, Vec<S>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Cpu,
    Memory,
    Disk,
    Network,
}

impl SourceKind {
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Cpu => "cpu",
            SourceKind::Memory => "memory",
            SourceKind::Disk => "disk",
            SourceKind::Network => "network",
        }
    }

    /// Location of this table under a collector output directory.
    pub fn relative_path(self) -> &'static str {
        match self {
            SourceKind::Cpu => "proc/stat",
            SourceKind::Memory => "proc/meminfo",
            SourceKind::Disk => "proc/diskstats",
            SourceKind::Network => "proc/net/dev",
        }
    }
}

/// Builds a table from parsed rows. Rows that fail to parse are skipped with a warning.
pub(crate) fn collect_rows<S>(
    kind: SourceKind,
    table: &RawTable,
    mut parse: impl FnMut(&Row<'_>) -> Result<S, SourceError>,
) -> SourceTable<S> {
    let mut out = SourceTable::new();
    let mut skipped = 0usize;
    for row in table.rows() {
        let parsed = row.and_then(|r| Ok((r.timestamp()?, parse(&r)?)));
        match parsed {
            Ok((ts, sample)) => out.entry(ts).or_insert_with(Vec::new).push(sample),
            Err(e) => {
                skipped += 1;
                tracing::warn!(source = kind.name(), error = %e, "skipping malformed row");
            }
        }
    }
    if skipped > 0 {
        tracing::debug!(source = kind.name(), skipped, "rows skipped");
    }
    out
}

/// Reads a table file; an absent file becomes an empty table.
pub fn read_or_empty(kind: SourceKind, path: &Path) -> Result<RawTable, SourceError> {
    match RawTable::read(path) {
        Ok(t) => Ok(t),
        Err(SourceError::Missing(p)) => {
            tracing::warn!(source = kind.name(), path = %p.display(), "source not found, treating as empty");
            Ok(RawTable::default())
        }
        Err(e) => Err(e),
    }
}

/// The four host tables of one collector run.
#[derive(Debug, Default)]
pub struct HostSources {
    pub cpu: SourceTable<CpuSample>,
    pub memory: SourceTable<MemorySample>,
    pub disk: SourceTable<DiskSample>,
    pub network: SourceTable<NetworkSample>,
}

impl HostSources {
    /// Loads `proc/stat`, `proc/meminfo`, `proc/diskstats` and `proc/net/dev` under `dir`.
    pub fn load(dir: &Path) -> Result<Self, SourceError> {
        let read = |kind: SourceKind| read_or_empty(kind, &dir.join(kind.relative_path()));
        Ok(Self {
            cpu: stat::parse(&read(SourceKind::Cpu)?),
            memory: meminfo::parse(&read(SourceKind::Memory)?),
            disk: diskstats::parse(&read(SourceKind::Disk)?),
            network: netdev::parse(&read(SourceKind::Network)?),
        })
    }
}
