// Temporal alignment: many selected sources -> one ordered sequence of composite records.

use std::collections::BTreeSet;

use crate::models::{
    CompositeRecord, CpuSample, DISK_BLOCK_BYTES, DiskSample, MemorySample, NET_KILOBYTE_BYTES,
    NetworkSample, Timestamp,
};
use crate::select::Selected;
use crate::sources::SourceKind;

/// Which timestamps make it into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Every timestamp any source has.
    Union,
    /// Only timestamps both anchors have; other sources join when they also have it.
    Intersection { anchors: (SourceKind, SourceKind) },
}

impl MergeMode {
    /// CPU and memory are sampled together by the collector.
    pub fn anchored_on_cpu_and_memory() -> Self {
        MergeMode::Intersection {
            anchors: (SourceKind::Cpu, SourceKind::Memory),
        }
    }
}

/// Writes one sample's fields into a composite record.
pub trait FillRecord {
    fn fill(&self, record: &mut CompositeRecord);
}

impl FillRecord for CpuSample {
    fn fill(&self, record: &mut CompositeRecord) {
        record.cpu_user = self.user;
        record.cpu_system = self.system;
        record.cpu_idle = self.idle;
        record.cpu_iowait = self.iowait;
        record.cpu_steal = self.steal;
    }
}

impl FillRecord for MemorySample {
    fn fill(&self, record: &mut CompositeRecord) {
        record.mem_total_kb = self.total_kb() as i64;
        record.mem_used_kb = self.used_kb as i64;
        record.mem_free_kb = self.free_kb as i64;
        record.mem_cached_kb = self.cached_kb as i64;
    }
}

impl FillRecord for DiskSample {
    fn fill(&self, record: &mut CompositeRecord) {
        record.disk_read_bytes = (self.read_blocks_per_sec * DISK_BLOCK_BYTES) as i64;
        record.disk_write_bytes = (self.write_blocks_per_sec * DISK_BLOCK_BYTES) as i64;
    }
}

impl FillRecord for NetworkSample {
    fn fill(&self, record: &mut CompositeRecord) {
        record.net_rx_bytes = (self.rx_kb_per_sec * NET_KILOBYTE_BYTES) as i64;
        record.net_tx_bytes = (self.tx_kb_per_sec * NET_KILOBYTE_BYTES) as i64;
    }
}

/// A source as the merger sees it: a timestamp set plus a way to fill fields.
pub trait Contribution {
    fn kind(&self) -> SourceKind;
    fn timestamps(&self) -> Vec<Timestamp>;
    fn contains(&self, ts: Timestamp) -> bool;
    /// No-op when the source has nothing at `ts`.
    fn fill(&self, ts: Timestamp, record: &mut CompositeRecord);
}

impl<S: FillRecord> Contribution for Selected<S> {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn timestamps(&self) -> Vec<Timestamp> {
        self.rows.keys().copied().collect()
    }

    fn contains(&self, ts: Timestamp) -> bool {
        self.rows.contains_key(&ts)
    }

    fn fill(&self, ts: Timestamp, record: &mut CompositeRecord) {
        if let Some(sample) = self.rows.get(&ts) {
            sample.fill(record);
        }
    }
}

/// Aligns `sources` by timestamp. Output is ascending by timestamp; fields of
/// sources without data at a timestamp stay zero in both modes.
pub fn merge(sources: &[&dyn Contribution], mode: MergeMode) -> Vec<CompositeRecord> {
    let timestamps: BTreeSet<Timestamp> = match mode {
        MergeMode::Union => sources.iter().flat_map(|s| s.timestamps()).collect(),
        MergeMode::Intersection { anchors: (a, b) } => {
            let find = |kind: SourceKind| sources.iter().find(|s| s.kind() == kind);
            match (find(a), find(b)) {
                (Some(first), Some(second)) => first
                    .timestamps()
                    .into_iter()
                    .filter(|ts| second.contains(*ts))
                    .collect(),
                _ => BTreeSet::new(),
            }
        }
    };

    timestamps
        .into_iter()
        .map(|ts| {
            let mut record = CompositeRecord::zeroed(ts);
            for source in sources {
                source.fill(ts, &mut record);
            }
            record
        })
        .collect()
}
