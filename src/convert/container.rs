// Container conversion: cgroup counter stream -> per-container CSV with CPU percentages.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::emit;
use crate::error::{PipelineError, Result};
use crate::models::{ContainerRecord, ContainerSample};
use crate::rates::{RateState, clamp_percent, counter_went_backwards, usec_rate_to_percent};
use crate::sources::container;

/// Characters of the container id shown when no name is known.
const SHORT_ID_LEN: usize = 12;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerSummary {
    pub containers: usize,
    pub rows: usize,
    /// Percentages replaced by the cap.
    pub clamped: usize,
    /// Samples where a counter went backwards.
    pub counter_resets: usize,
}

impl fmt::Display for ContainerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "converted {} records from {} containers ({} clamped, {} counter resets)",
            self.rows, self.containers, self.clamped, self.counter_resets
        )
    }
}

/// Reads a `{"<container_id>": "<name>"}` mapping.
pub fn load_names(path: &Path) -> Result<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn display_name(id: &str, names: &HashMap<String, String>) -> String {
    match names.get(id) {
        Some(name) => name.clone(),
        None => id.chars().take(SHORT_ID_LEN).collect(),
    }
}

/// Groups by container (first-seen order), orders each group by timestamp and
/// turns cumulative CPU microseconds into percentages.
pub fn derive_records(
    samples: Vec<ContainerSample>,
    names: &HashMap<String, String>,
    cpu_percent_cap: f64,
) -> (Vec<ContainerRecord>, ContainerSummary) {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ContainerSample>> = HashMap::new();
    for sample in samples {
        if !groups.contains_key(&sample.container_id) {
            order.push(sample.container_id.clone());
        }
        groups
            .entry(sample.container_id.clone())
            .or_default()
            .push(sample);
    }

    let mut summary = ContainerSummary {
        containers: order.len(),
        ..Default::default()
    };
    let mut records = Vec::new();

    for id in order {
        let Some(mut group) = groups.remove(&id) else {
            continue;
        };
        group.sort_by_key(|s| s.timestamp);
        let name = display_name(&id, names);
        let mut cpu = RateState::<3>::new();

        for sample in group {
            let m = &sample.measurement;
            let rates = cpu.advance(
                sample.timestamp,
                [
                    m.cpu_usage_usec as f64,
                    m.cpu_user_usec as f64,
                    m.cpu_system_usec as f64,
                ],
            );
            if counter_went_backwards(&rates) {
                summary.counter_resets += 1;
                tracing::warn!(
                    container = %id,
                    timestamp = sample.timestamp,
                    "cpu counter went backwards"
                );
            }

            let [total, user, system] = rates.map(|r| {
                let (pct, clamped) = clamp_percent(usec_rate_to_percent(r), cpu_percent_cap);
                if clamped {
                    summary.clamped += 1;
                    tracing::warn!(
                        container = %id,
                        timestamp = sample.timestamp,
                        cap = cpu_percent_cap,
                        "cpu percentage clamped"
                    );
                }
                pct
            });

            let memory_percent = if m.memory_max > 0 {
                m.memory_current as f64 / m.memory_max as f64 * 100.0
            } else {
                0.0
            };

            records.push(ContainerRecord {
                timestamp: sample.timestamp,
                container_id: id.clone(),
                container_name: name.clone(),
                runtime: sample.runtime.clone(),
                cpu_percent: total,
                cpu_user_percent: user,
                cpu_system_percent: system,
                memory_current_bytes: m.memory_current,
                memory_max_bytes: m.memory_max,
                memory_percent,
                io_read_bytes: m.io_read_bytes,
                io_write_bytes: m.io_write_bytes,
                io_read_ops: m.io_read_ops,
                io_write_ops: m.io_write_ops,
                pids_current: m.pids_current,
            });
        }
    }

    summary.rows = records.len();
    (records, summary)
}

pub fn convert_containers(
    input: &Path,
    output: &Path,
    names: &HashMap<String, String>,
    cpu_percent_cap: f64,
) -> Result<ContainerSummary> {
    let samples = container::read(input)?;
    let (records, summary) = derive_records(samples, names, cpu_percent_cap);
    if records.is_empty() {
        return Err(PipelineError::EmptyResult(format!(
            "no container samples in {}",
            input.display()
        )));
    }
    emit::write_csv(output, &records)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        rows = summary.rows,
        containers = summary.containers,
        "container conversion complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::CsvRow;
    use crate::models::ContainerMeasurement;
    use crate::rates::DEFAULT_CPU_PERCENT_CAP;

    fn sample(id: &str, ts: i64, usage: u64) -> ContainerSample {
        ContainerSample {
            timestamp: ts,
            container_id: id.into(),
            runtime: "docker".into(),
            measurement: ContainerMeasurement {
                cpu_usage_usec: usage,
                memory_current: 50,
                memory_max: 200,
                ..Default::default()
            },
        }
    }

    #[test]
    fn ten_percent_over_five_seconds() {
        let (records, summary) = derive_records(
            vec![sample("abc", 100, 1_000_000), sample("abc", 105, 1_500_000)],
            &HashMap::new(),
            DEFAULT_CPU_PERCENT_CAP,
        );
        assert_eq!(records[0].fields()[4], "0.00");
        assert_eq!(records[1].fields()[4], "10.00");
        assert_eq!(records[1].fields()[9], "25.00");
        assert_eq!(summary.clamped, 0);
    }

    #[test]
    fn clamps_to_cap_and_counts() {
        let (records, summary) = derive_records(
            vec![sample("abc", 0, 0), sample("abc", 1, 20_000_000)],
            &HashMap::new(),
            DEFAULT_CPU_PERCENT_CAP,
        );
        assert_eq!(records[1].cpu_percent, 800.0);
        assert_eq!(summary.clamped, 1);
    }

    #[test]
    fn groups_in_first_seen_order_and_sorts_by_time() {
        let (records, summary) = derive_records(
            vec![
                sample("bbbbbbbbbbbbbbbb", 20, 0),
                sample("aaaa", 10, 0),
                sample("bbbbbbbbbbbbbbbb", 10, 0),
            ],
            &HashMap::from([("aaaa".to_string(), "web".to_string())]),
            DEFAULT_CPU_PERCENT_CAP,
        );
        let keys: Vec<_> = records
            .iter()
            .map(|r| (r.container_name.as_str(), r.timestamp))
            .collect();
        assert_eq!(
            keys,
            vec![("bbbbbbbbbbbb", 10), ("bbbbbbbbbbbb", 20), ("web", 10)]
        );
        assert_eq!(summary.containers, 2);
    }

    #[test]
    fn counter_reset_is_counted_not_corrected() {
        let (records, summary) = derive_records(
            vec![sample("abc", 0, 2_000_000), sample("abc", 10, 1_000_000)],
            &HashMap::new(),
            DEFAULT_CPU_PERCENT_CAP,
        );
        assert_eq!(records[1].cpu_percent, -10.0);
        assert_eq!(summary.counter_resets, 1);
    }

    #[test]
    fn zero_memory_max_gives_zero_percent() {
        let mut s = sample("abc", 0, 0);
        s.measurement.memory_max = 0;
        let (records, _) = derive_records(vec![s], &HashMap::new(), DEFAULT_CPU_PERCENT_CAP);
        assert_eq!(records[0].memory_percent, 0.0);
    }
}
