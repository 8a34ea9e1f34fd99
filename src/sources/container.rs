// Container measurement stream: one JSON envelope per line,
// `{"timestamp":..,"subsystem":"container/<runtime>/<id>","measurement":"<json>"}`.

use std::path::Path;

use serde::Deserialize;

use crate::error::SourceError;
use crate::models::{ContainerMeasurement, ContainerSample, Timestamp};

#[derive(Debug, Deserialize)]
struct Envelope {
    timestamp: Option<Timestamp>,
    #[serde(default)]
    subsystem: String,
    /// Normally a JSON string holding the measurement object; a bare object is accepted too.
    #[serde(default)]
    measurement: Option<serde_json::Value>,
}

/// Reads a measurement stream; an absent file yields no samples.
pub fn read(path: &Path) -> Result<Vec<ContainerSample>, SourceError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(parse(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(source = "container", path = %path.display(), "source not found, treating as empty");
            Ok(Vec::new())
        }
        Err(e) => Err(SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Decodes every non-blank line; undecodable lines are skipped with a warning.
pub fn parse(text: &str) -> Vec<ContainerSample> {
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(i + 1, line) {
            Ok(sample) => out.push(sample),
            Err(e) => tracing::warn!(source = "container", error = %e, "skipping invalid line"),
        }
    }
    out
}

fn parse_line(line_no: usize, line: &str) -> Result<ContainerSample, SourceError> {
    let envelope: Envelope = serde_json::from_str(line)
        .map_err(|e| SourceError::malformed(line_no, e.to_string()))?;
    let timestamp = envelope
        .timestamp
        .ok_or_else(|| SourceError::malformed(line_no, "missing timestamp"))?;

    let mut parts = envelope.subsystem.split('/');
    let (Some(_), Some(runtime), Some(short_id)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(SourceError::malformed(
            line_no,
            format!("unexpected subsystem {:?}", envelope.subsystem),
        ));
    };

    let measurement: ContainerMeasurement = match envelope.measurement {
        None => ContainerMeasurement::default(),
        Some(serde_json::Value::String(s)) => serde_json::from_str(&s)
            .map_err(|e| SourceError::malformed(line_no, format!("measurement: {e}")))?,
        Some(v) => serde_json::from_value(v)
            .map_err(|e| SourceError::malformed(line_no, format!("measurement: {e}")))?,
    };

    let container_id = measurement
        .container_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| short_id.to_string());

    Ok(ContainerSample {
        timestamp,
        container_id,
        runtime: runtime.to_string(),
        measurement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"{"timestamp":1767893329,"subsystem":"container/docker/7892fa5ced3d","measurement":"{\"container_id\":\"7892fa5ced3d0123456789\",\"cpu_usage_usec\":1500,\"memory_current\":2048,\"memory_max\":4096,\"pids_current\":3}"}"#;

    #[test]
    fn decodes_nested_measurement() {
        let samples = parse(LINE);
        assert_eq!(samples.len(), 1);
        let s = &samples[0];
        assert_eq!(s.timestamp, 1767893329);
        assert_eq!(s.runtime, "docker");
        assert_eq!(s.container_id, "7892fa5ced3d0123456789");
        assert_eq!(s.measurement.cpu_usage_usec, 1500);
        assert_eq!(s.measurement.memory_max, 4096);
        assert_eq!(s.measurement.io_read_bytes, 0);
    }

    #[test]
    fn falls_back_to_subsystem_id() {
        let line = r#"{"timestamp":5,"subsystem":"container/containerd/abc","measurement":"{}"}"#;
        let s = &parse(line)[0];
        assert_eq!(s.container_id, "abc");
        assert_eq!(s.runtime, "containerd");
    }

    #[test]
    fn accepts_measurement_object() {
        let line = r#"{"timestamp":5,"subsystem":"container/docker/abc","measurement":{"cpu_usage_usec":7}}"#;
        assert_eq!(parse(line)[0].measurement.cpu_usage_usec, 7);
    }

    #[test]
    fn skips_bad_lines_and_keeps_good_ones() {
        let text = format!(
            "not json\n\n{}\n{}\n{}\n",
            r#"{"timestamp":1,"subsystem":"host/cpu","measurement":"{}"}"#,
            r#"{"subsystem":"container/docker/abc","measurement":"{}"}"#,
            LINE
        );
        let samples = parse(&text);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp, 1767893329);
    }

    #[test]
    fn missing_stream_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(read(&dir.path().join("none.json")).unwrap().is_empty());
    }
}
