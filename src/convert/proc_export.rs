// Proc-format export: unified CSV -> the four sar-style tables the host pipelines read.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::emit::{self, CsvRow};
use crate::error::{PipelineError, Result, SourceError};
use crate::models::{CompositeRecord, DISK_BLOCK_BYTES, NET_KILOBYTE_BYTES, Timestamp};
use crate::rates::{RateState, counter_went_backwards};
use crate::sources::SourceKind;
use crate::sources::table::{RawTable, Row};

const SITE_ID: &str = "1";
const UNKNOWN_HOST: &str = "unknown";
/// Identifier of the all-cores row.
const AGGREGATE_CPU: &str = "-1";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcExportSummary {
    pub rows: usize,
    pub skipped: usize,
    pub counter_resets: usize,
}

impl fmt::Display for ProcExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "exported {} rows to proc tables ({} skipped, {} counter resets)",
            self.rows, self.skipped, self.counter_resets
        )
    }
}

/// A unified row plus the host it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct HostRecord {
    pub host: String,
    pub record: CompositeRecord,
}

fn parse_record(row: &Row<'_>) -> Result<HostRecord, SourceError> {
    let host = match row.get("hostname") {
        Some(h) if !h.is_empty() => h.to_string(),
        _ => UNKNOWN_HOST.to_string(),
    };
    let int = |column: &str| row.required_number(column).map(|v| v as i64);
    // Collector output has no cpu_steal and may omit the other two.
    Ok(HostRecord {
        host,
        record: CompositeRecord {
            timestamp: row.timestamp()?,
            cpu_user: row.required_number("cpu_user")?,
            cpu_system: row.required_number("cpu_system")?,
            cpu_idle: row.required_number("cpu_idle")?,
            cpu_iowait: row.number("cpu_iowait")?,
            cpu_steal: row.number("cpu_steal")?,
            mem_total_kb: int("mem_total_kb")?,
            mem_used_kb: int("mem_used_kb")?,
            mem_free_kb: int("mem_free_kb")?,
            mem_cached_kb: row.number("mem_cached_kb")? as i64,
            disk_read_bytes: int("disk_read_bytes")?,
            disk_write_bytes: int("disk_write_bytes")?,
            net_rx_bytes: int("net_rx_bytes")?,
            net_tx_bytes: int("net_tx_bytes")?,
        },
    })
}

/// Usable rows of a unified table in timestamp order, and how many were skipped.
pub fn read_unified(table: &RawTable) -> (Vec<HostRecord>, usize) {
    let mut out = Vec::with_capacity(table.len());
    let mut skipped = 0;
    for row in table.rows() {
        match row.and_then(|r| parse_record(&r)) {
            Ok(r) => out.push(r),
            Err(e) => {
                skipped += 1;
                tracing::warn!(source = "unified", error = %e, "skipping malformed row");
            }
        }
    }
    out.sort_by_key(|r| r.record.timestamp);
    (out, skipped)
}

struct StatRow<'a> {
    host: &'a str,
    timestamp: Timestamp,
    user: f64,
    system: f64,
    iowait: f64,
    steal: f64,
    idle: f64,
}

impl CsvRow for StatRow<'_> {
    const HEADER: &'static [&'static str] = &[
        "#site", "host", "timestamp", "CPU", "%usr", "%nice", "%system", "%iowait", "%steal",
        "%idle",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            SITE_ID.into(),
            self.host.into(),
            self.timestamp.to_string(),
            AGGREGATE_CPU.into(),
            self.user.to_string(),
            "0".into(),
            self.system.to_string(),
            self.iowait.to_string(),
            self.steal.to_string(),
            self.idle.to_string(),
        ]
    }
}

struct MeminfoRow<'a> {
    host: &'a str,
    timestamp: Timestamp,
    free: i64,
    used: i64,
    buffers: i64,
    cached: i64,
    used_percent: f64,
}

impl CsvRow for MeminfoRow<'_> {
    const HEADER: &'static [&'static str] = &[
        "#site", "host", "timestamp", "kbmemfree", "kbavail", "kbmemused", "%memused",
        "kbbuffers", "kbcached", "kbcommit", "%commit", "kbactive", "kbinact", "kbdirty",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            SITE_ID.into(),
            self.host.into(),
            self.timestamp.to_string(),
            self.free.to_string(),
            self.free.to_string(),
            self.used.to_string(),
            format!("{:.2}", self.used_percent),
            self.buffers.to_string(),
            self.cached.to_string(),
            "0".into(),
            "0.00".into(),
            "0".into(),
            "0".into(),
            "0".into(),
        ]
    }
}

struct DiskstatsRow<'a> {
    host: &'a str,
    timestamp: Timestamp,
    device: &'a str,
    read_blocks: f64,
    write_blocks: f64,
}

impl CsvRow for DiskstatsRow<'_> {
    const HEADER: &'static [&'static str] = &[
        "#site", "host", "timestamp", "DEV", "tps", "rtps", "wtps", "dtps", "bread/s", "bwrtn/s",
        "bdscd/s",
    ];

    fn fields(&self) -> Vec<String> {
        let tps = (self.read_blocks + self.write_blocks) / 2.0;
        let tps = if tps > 0.0 { tps } else { 0.0 };
        vec![
            SITE_ID.into(),
            self.host.into(),
            self.timestamp.to_string(),
            self.device.into(),
            format!("{tps:.2}"),
            "0.00".into(),
            "0.00".into(),
            "0.00".into(),
            format!("{:.2}", self.read_blocks),
            format!("{:.2}", self.write_blocks),
            "0.00".into(),
        ]
    }
}

struct NetdevRow<'a> {
    host: &'a str,
    timestamp: Timestamp,
    interface: &'a str,
    rx_kb: f64,
    tx_kb: f64,
}

impl CsvRow for NetdevRow<'_> {
    const HEADER: &'static [&'static str] = &[
        "#site", "host", "timestamp", "IFACE", "rxpck/s", "txpck/s", "rxkB/s", "txkB/s",
        "rxcmp/s", "txcmp/s", "rxmcst/s", "%ifutil",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            SITE_ID.into(),
            self.host.into(),
            self.timestamp.to_string(),
            self.interface.into(),
            "0.00".into(),
            "0.00".into(),
            format!("{:.2}", self.rx_kb),
            format!("{:.2}", self.tx_kb),
            "0.00".into(),
            "0.00".into(),
            "0.00".into(),
            "0.00".into(),
        ]
    }
}

/// Writes `proc/stat`, `proc/meminfo`, `proc/diskstats` and `proc/net/dev` under `output_dir`.
/// Disk and network columns become per-second rates of the cumulative byte counters,
/// differenced per host. The whole `proc/` directory is replaced at once.
pub fn export_proc(
    input: &Path,
    output_dir: &Path,
    disk_device: &str,
    net_interface: &str,
) -> Result<ProcExportSummary> {
    let table = RawTable::read(input)?;
    let (records, skipped) = read_unified(&table);
    if records.is_empty() {
        return Err(PipelineError::EmptyResult(format!(
            "no usable rows in {}",
            input.display()
        )));
    }

    let mut summary = ProcExportSummary {
        rows: records.len(),
        skipped,
        ..Default::default()
    };
    let mut stat = Vec::with_capacity(records.len());
    let mut meminfo = Vec::with_capacity(records.len());
    let mut diskstats = Vec::with_capacity(records.len());
    let mut netdev = Vec::with_capacity(records.len());
    let mut rates: HashMap<&str, (RateState<2>, RateState<2>)> = HashMap::new();

    for HostRecord { host, record: r } in &records {
        stat.push(StatRow {
            host,
            timestamp: r.timestamp,
            user: r.cpu_user,
            system: r.cpu_system,
            iowait: r.cpu_iowait,
            steal: r.cpu_steal,
            idle: r.cpu_idle,
        });

        let used_percent = if r.mem_total_kb > 0 {
            r.mem_used_kb as f64 / r.mem_total_kb as f64 * 100.0
        } else {
            0.0
        };
        meminfo.push(MeminfoRow {
            host,
            timestamp: r.timestamp,
            free: r.mem_free_kb,
            used: r.mem_used_kb,
            buffers: (r.mem_total_kb - r.mem_free_kb - r.mem_used_kb - r.mem_cached_kb).max(0),
            cached: r.mem_cached_kb,
            used_percent,
        });

        let (disk_rates, net_rates) = rates.entry(host.as_str()).or_default();
        let disk = disk_rates.advance(
            r.timestamp,
            [r.disk_read_bytes as f64, r.disk_write_bytes as f64],
        );
        let net = net_rates.advance(r.timestamp, [r.net_rx_bytes as f64, r.net_tx_bytes as f64]);
        for (kind, rates) in [(SourceKind::Disk, &disk), (SourceKind::Network, &net)] {
            if counter_went_backwards(rates) {
                summary.counter_resets += 1;
                tracing::warn!(
                    source = kind.name(),
                    host = %host,
                    timestamp = r.timestamp,
                    "byte counter went backwards"
                );
            }
        }

        diskstats.push(DiskstatsRow {
            host,
            timestamp: r.timestamp,
            device: disk_device,
            read_blocks: disk[0] / DISK_BLOCK_BYTES,
            write_blocks: disk[1] / DISK_BLOCK_BYTES,
        });
        netdev.push(NetdevRow {
            host,
            timestamp: r.timestamp,
            interface: net_interface,
            rx_kb: net[0] / NET_KILOBYTE_BYTES,
            tx_kb: net[1] / NET_KILOBYTE_BYTES,
        });
    }

    let in_proc = |kind: SourceKind| kind.relative_path().trim_start_matches("proc/");
    emit::replace_dir(
        &output_dir.join("proc"),
        &[
            (in_proc(SourceKind::Cpu), emit::render(&stat)),
            (in_proc(SourceKind::Memory), emit::render(&meminfo)),
            (in_proc(SourceKind::Disk), emit::render(&diskstats)),
            (in_proc(SourceKind::Network), emit::render(&netdev)),
        ],
    )?;

    tracing::info!(
        input = %input.display(),
        output = %output_dir.display(),
        rows = summary.rows,
        "proc export complete"
    );
    Ok(summary)
}
