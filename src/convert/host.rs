// Host pipelines: four proc tables -> one unified CSV.

use std::fmt;
use std::path::Path;

use crate::config::SelectionConfig;
use crate::emit;
use crate::error::{PipelineError, Result};
use crate::merge::{Contribution, MergeMode, merge};
use crate::models::CompositeRecord;
use crate::select::RowSelector;
use crate::sources::{HostSources, SourceKind};

/// One selector per host table.
#[derive(Debug, Clone)]
pub struct HostSelectors {
    pub cpu: RowSelector,
    pub memory: RowSelector,
    pub disk: RowSelector,
    pub network: RowSelector,
}

impl HostSelectors {
    /// Only the named device and interface; timestamps without them contribute nothing.
    pub fn strict(disk: Option<&str>, iface: Option<&str>, cfg: &SelectionConfig) -> Self {
        Self {
            cpu: RowSelector::cpu(None, &cfg.cpu_aggregate_ids),
            memory: RowSelector::single_row(),
            disk: RowSelector::strict(disk.unwrap_or(&cfg.disk_device)),
            network: RowSelector::strict(iface.unwrap_or(&cfg.net_interface)),
        }
    }

    /// The named device and interface when present, else the first real one.
    pub fn preferring(disk: Option<&str>, iface: Option<&str>, cfg: &SelectionConfig) -> Self {
        Self {
            cpu: RowSelector::cpu(None, &cfg.cpu_aggregate_ids),
            memory: RowSelector::single_row(),
            disk: RowSelector::preferring(
                Some(disk.unwrap_or(&cfg.disk_device)),
                &cfg.excluded_disk_prefixes,
            ),
            network: RowSelector::preferring(
                Some(iface.unwrap_or(&cfg.net_interface)),
                &cfg.excluded_interface_prefixes,
            ),
        }
    }
}

/// Per-source counts of one host conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCount {
    pub kind: SourceKind,
    /// Distinct timestamps in the table.
    pub timestamps: usize,
    /// Timestamps with a selectable row.
    pub selected: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostSummary {
    pub mode: MergeMode,
    pub sources: Vec<SourceCount>,
    pub rows: usize,
}

impl HostSummary {
    pub fn count(&self, kind: SourceKind) -> Option<&SourceCount> {
        self.sources.iter().find(|c| c.kind == kind)
    }
}

impl fmt::Display for HostSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.sources {
            writeln!(
                f,
                "{:<8} {} timestamps, {} selected",
                c.kind.name(),
                c.timestamps,
                c.selected
            )?;
        }
        let mode = match self.mode {
            MergeMode::Union => "union",
            MergeMode::Intersection { .. } => "intersection",
        };
        write!(f, "merged ({mode}): {} rows", self.rows)
    }
}

/// Selects one row per timestamp in each table and aligns them.
pub fn reconcile(
    sources: &HostSources,
    selectors: &HostSelectors,
    mode: MergeMode,
) -> (Vec<CompositeRecord>, HostSummary) {
    let cpu = selectors.cpu.select(SourceKind::Cpu, &sources.cpu);
    let memory = selectors.memory.select(SourceKind::Memory, &sources.memory);
    let disk = selectors.disk.select(SourceKind::Disk, &sources.disk);
    let network = selectors.network.select(SourceKind::Network, &sources.network);

    let counts = vec![
        SourceCount {
            kind: SourceKind::Cpu,
            timestamps: sources.cpu.len(),
            selected: cpu.len(),
        },
        SourceCount {
            kind: SourceKind::Memory,
            timestamps: sources.memory.len(),
            selected: memory.len(),
        },
        SourceCount {
            kind: SourceKind::Disk,
            timestamps: sources.disk.len(),
            selected: disk.len(),
        },
        SourceCount {
            kind: SourceKind::Network,
            timestamps: sources.network.len(),
            selected: network.len(),
        },
    ];

    let contributions: [&dyn Contribution; 4] = [&cpu, &memory, &disk, &network];
    let records = merge(&contributions, mode);
    let summary = HostSummary {
        mode,
        sources: counts,
        rows: records.len(),
    };
    (records, summary)
}

fn run(
    input_dir: &Path,
    output: &Path,
    selectors: &HostSelectors,
    mode: MergeMode,
) -> Result<HostSummary> {
    let sources = HostSources::load(input_dir)?;
    let (records, summary) = reconcile(&sources, selectors, mode);
    if records.is_empty() {
        return Err(PipelineError::EmptyResult(format!(
            "no timestamps to merge under {}",
            input_dir.display()
        )));
    }
    emit::write_csv(output, &records)?;
    tracing::info!(
        input = %input_dir.display(),
        output = %output.display(),
        rows = summary.rows,
        "host conversion complete"
    );
    Ok(summary)
}

/// Union of all timestamps, strict device and interface selection.
pub fn transform_host(
    input_dir: &Path,
    output: &Path,
    disk: Option<&str>,
    iface: Option<&str>,
    cfg: &SelectionConfig,
) -> Result<HostSummary> {
    run(
        input_dir,
        output,
        &HostSelectors::strict(disk, iface, cfg),
        MergeMode::Union,
    )
}

/// Timestamps shared by CPU and memory, preferred-then-fallback device selection.
pub fn merge_host(
    input_dir: &Path,
    output: &Path,
    disk: Option<&str>,
    iface: Option<&str>,
    cfg: &SelectionConfig,
) -> Result<HostSummary> {
    run(
        input_dir,
        output,
        &HostSelectors::preferring(disk, iface, cfg),
        MergeMode::anchored_on_cpu_and_memory(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::table::RawTable;
    use crate::sources::{diskstats, meminfo, stat};

    fn sources(disk: &str) -> HostSources {
        HostSources {
            cpu: stat::parse(&RawTable::parse(
                "#timestamp,CPU,%usr,%system,%idle,%iowait,%steal\n\
                 100,-1,10,5,80,4,1\n\
                 105,-1,20,5,70,4,1\n",
            )),
            memory: meminfo::parse(&RawTable::parse(
                "#timestamp,kbmemfree,kbmemused,kbcached,kbbuffers\n\
                 100,1000,2000,500,100\n",
            )),
            disk: diskstats::parse(&RawTable::parse(disk)),
            network: Default::default(),
        }
    }

    #[test]
    fn strict_selection_drops_other_devices() {
        let cfg = SelectionConfig::default();
        let s = sources("#timestamp,DEV,bread/s,bwrtn/s\n100,vda,1,1\n");
        let (records, summary) = reconcile(
            &s,
            &HostSelectors::strict(None, None, &cfg),
            MergeMode::Union,
        );
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.disk_read_bytes == 0));
        assert_eq!(summary.count(SourceKind::Disk).unwrap().selected, 0);
        assert_eq!(summary.count(SourceKind::Disk).unwrap().timestamps, 1);
    }

    #[test]
    fn preferring_falls_back_and_intersects() {
        let cfg = SelectionConfig::default();
        let s = sources("#timestamp,DEV,bread/s,bwrtn/s\n100,loop0,9,9\n100,vda,1,2\n");
        let (records, summary) = reconcile(
            &s,
            &HostSelectors::preferring(None, None, &cfg),
            MergeMode::anchored_on_cpu_and_memory(),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].disk_read_bytes, 512);
        assert_eq!(records[0].disk_write_bytes, 1024);
        assert_eq!(records[0].mem_total_kb, 3600);
        assert_eq!(summary.rows, 1);
    }

    #[test]
    fn summary_lists_every_source() {
        let cfg = SelectionConfig::default();
        let (_, summary) = reconcile(
            &sources("#timestamp,DEV,bread/s,bwrtn/s\n"),
            &HostSelectors::strict(Some("sda"), Some("eth0"), &cfg),
            MergeMode::Union,
        );
        let text = summary.to_string();
        for name in ["cpu", "memory", "disk", "network"] {
            assert!(text.contains(name), "{text}");
        }
        assert!(text.ends_with("merged (union): 2 rows"));
    }
}
